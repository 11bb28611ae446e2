//! Endpoint descriptor tests

use std::path::Path;

use super::*;

#[test]
fn test_bare_entry_defaults_to_udp_and_syslog_port() {
    let list = EndpointDescriptor::parse_listen_list("localhost").unwrap();
    assert_eq!(
        list,
        vec![EndpointDescriptor::SocketListen {
            transport: Transport::Udp,
            host: "localhost".into(),
            port: DEFAULT_SYSLOG_PORT,
        }]
    );
}

#[test]
fn test_comma_list_expands_to_one_descriptor_per_entry() {
    let list = EndpointDescriptor::parse_send_list("localhost:6001, localhost:6002").unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(
        list[1],
        EndpointDescriptor::SocketSend {
            transport: Transport::Udp,
            host: "localhost".into(),
            port: 6002,
        }
    );
}

#[test]
fn test_scheme_prefix_selects_transport() {
    let list = EndpointDescriptor::parse_send_list("tcp://10.0.0.1:514,udp://10.0.0.2:514").unwrap();
    assert!(matches!(
        list[0],
        EndpointDescriptor::SocketSend {
            transport: Transport::Tcp,
            ..
        }
    ));
    assert!(matches!(
        list[1],
        EndpointDescriptor::SocketSend {
            transport: Transport::Udp,
            ..
        }
    ));
}

#[test]
fn test_unknown_scheme_rejected() {
    let err = EndpointDescriptor::parse_listen_list("http://host:80").unwrap_err();
    assert!(matches!(err, EndpointError::UnsupportedScheme { .. }));
}

#[test]
fn test_bad_port_rejected() {
    let err = EndpointDescriptor::parse_listen_list("localhost:abc").unwrap_err();
    assert!(matches!(err, EndpointError::InvalidPort { .. }));

    let err = EndpointDescriptor::parse_listen_list("localhost:70000").unwrap_err();
    assert!(matches!(err, EndpointError::InvalidPort { .. }));
}

#[test]
fn test_empty_list_rejected() {
    assert!(matches!(
        EndpointDescriptor::parse_listen_list("").unwrap_err(),
        EndpointError::EmptyList
    ));
    assert!(matches!(
        EndpointDescriptor::parse_listen_list(" , ,").unwrap_err(),
        EndpointError::EmptyList
    ));
}

#[test]
fn test_invalid_hostname_rejected() {
    let err = EndpointDescriptor::parse_listen_list("bad_host!:514").unwrap_err();
    assert!(matches!(err, EndpointError::InvalidHost { .. }));

    let err = EndpointDescriptor::parse_listen_list(".leading.dot:514").unwrap_err();
    assert!(matches!(err, EndpointError::InvalidHost { .. }));
}

#[test]
fn test_connect_list_requires_tcp() {
    let err = EndpointDescriptor::parse_connect_list("localhost:6000").unwrap_err();
    assert!(matches!(err, EndpointError::ConnectRequiresTcp { .. }));

    let list = EndpointDescriptor::parse_connect_list("tcp://localhost:6000").unwrap();
    assert_eq!(
        list,
        vec![EndpointDescriptor::SocketConnect {
            host: "localhost".into(),
            port: 6000,
        }]
    );
}

#[test]
fn test_privileged_port_query() {
    let listen = &EndpointDescriptor::parse_listen_list("0.0.0.0:514").unwrap()[0];
    assert!(listen.is_privileged());

    let listen_high = &EndpointDescriptor::parse_listen_list("0.0.0.0:5140").unwrap()[0];
    assert!(!listen_high.is_privileged());

    // Sending to a privileged port does not bind it
    let send = &EndpointDescriptor::parse_send_list("10.0.0.1:514").unwrap()[0];
    assert!(!send.is_privileged());

    // Port 0 is an ephemeral bind, never privileged
    let ephemeral = &EndpointDescriptor::parse_listen_list("0.0.0.0:0").unwrap()[0];
    assert!(!ephemeral.is_privileged());

    assert!(!EndpointDescriptor::file_read("/tmp/in.log", false).is_privileged());
}

#[test]
fn test_descriptor_roles() {
    assert!(EndpointDescriptor::file_read("in.log", false).is_source());
    assert!(!EndpointDescriptor::file_write("out.log").is_source());
    assert!(EndpointDescriptor::parse_listen_list("h:1").unwrap()[0].is_source());
    assert!(!EndpointDescriptor::parse_send_list("h:1").unwrap()[0].is_source());
}

#[test]
fn test_endpoint_ids() {
    let listen = &EndpointDescriptor::parse_listen_list("tcp://0.0.0.0:5140").unwrap()[0];
    assert_eq!(listen.id().as_str(), "tcp://0.0.0.0:5140");

    let file = EndpointDescriptor::file_write("/var/log/out.log");
    assert_eq!(file.id().as_str(), "file:///var/log/out.log");
}

#[test]
fn test_anchor_path() {
    let base = Path::new("/etc/relog");
    assert_eq!(
        anchor_path(Path::new("capture.log"), Some(base)),
        Path::new("/etc/relog/capture.log")
    );
    assert_eq!(
        anchor_path(Path::new("/var/log/x.log"), Some(base)),
        Path::new("/var/log/x.log")
    );
    assert_eq!(
        anchor_path(Path::new("capture.log"), None),
        Path::new("capture.log")
    );
}
