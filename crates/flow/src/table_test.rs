//! Flow table tests

use relog_protocol::EndpointDescriptor;

use super::*;

fn rule(name: &str, src: &str, dst: &str) -> RuleDescriptor {
    RuleDescriptor {
        name: name.into(),
        sources: EndpointDescriptor::parse_listen_list(src).unwrap(),
        destinations: EndpointDescriptor::parse_send_list(dst).unwrap(),
    }
}

#[test]
fn test_build_single_rule() {
    let table = FlowTable::build(vec![rule("rule1", "localhost:5140", "localhost:6001")]).unwrap();

    assert_eq!(table.len(), 1);
    let flow = table.get("rule1").unwrap();
    assert_eq!(flow.name(), "rule1");
    assert_eq!(flow.sources().len(), 1);
    assert_eq!(flow.destinations().len(), 1);
}

#[test]
fn test_build_preserves_rule_order() {
    let table = FlowTable::build(vec![
        rule("b", "localhost:5141", "localhost:6001"),
        rule("a", "localhost:5142", "localhost:6002"),
        rule("c", "localhost:5143", "localhost:6003"),
    ])
    .unwrap();

    let names: Vec<_> = table.iter().map(Flow::name).collect();
    assert_eq!(names, ["b", "a", "c"]);
}

#[test]
fn test_build_preserves_endpoint_order() {
    let table = FlowTable::build(vec![rule(
        "fanout",
        "localhost:5140",
        "localhost:6001,localhost:6002,localhost:6003",
    )])
    .unwrap();

    let ports: Vec<_> = table
        .get("fanout")
        .unwrap()
        .destinations()
        .iter()
        .map(|d| match d {
            EndpointDescriptor::SocketSend { port, .. } => *port,
            other => panic!("unexpected descriptor: {other:?}"),
        })
        .collect();
    assert_eq!(ports, [6001, 6002, 6003]);
}

#[test]
fn test_empty_table_rejected() {
    assert!(matches!(
        FlowTable::build(Vec::new()).unwrap_err(),
        FlowTableError::Empty
    ));
}

#[test]
fn test_duplicate_rule_name_rejected() {
    let err = FlowTable::build(vec![
        rule("dup", "localhost:5140", "localhost:6001"),
        rule("dup", "localhost:5141", "localhost:6002"),
    ])
    .unwrap_err();

    assert!(matches!(err, FlowTableError::DuplicateRule { .. }));
    assert_eq!(err.rule(), Some("dup"));
}

#[test]
fn test_missing_sources_rejected() {
    let err = FlowTable::build(vec![RuleDescriptor {
        name: "nosrc".into(),
        sources: Vec::new(),
        destinations: EndpointDescriptor::parse_send_list("localhost:6001").unwrap(),
    }])
    .unwrap_err();

    assert!(matches!(err, FlowTableError::NoSources { .. }));
    assert_eq!(err.rule(), Some("nosrc"));
}

#[test]
fn test_missing_destinations_rejected() {
    let err = FlowTable::build(vec![RuleDescriptor {
        name: "nodst".into(),
        sources: EndpointDescriptor::parse_listen_list("localhost:5140").unwrap(),
        destinations: Vec::new(),
    }])
    .unwrap_err();

    assert!(matches!(err, FlowTableError::NoDestinations { .. }));
}

#[test]
fn test_socket_loop_rejected() {
    let err = FlowTable::build(vec![rule(
        "loop",
        "localhost:5140",
        "localhost:6001,localhost:5140",
    )])
    .unwrap_err();

    assert!(matches!(err, FlowTableError::RelayLoop { .. }));
    assert_eq!(err.rule(), Some("loop"));
}

#[test]
fn test_file_loop_rejected() {
    let err = FlowTable::build(vec![RuleDescriptor {
        name: "fileloop".into(),
        sources: vec![EndpointDescriptor::file_read("/tmp/same.log", false)],
        destinations: vec![EndpointDescriptor::file_write("/tmp/same.log")],
    }])
    .unwrap_err();

    assert!(matches!(err, FlowTableError::RelayLoop { .. }));
}

#[test]
fn test_same_address_across_flows_allowed() {
    // Two flows may target the same destination; each gets its own adapter.
    let table = FlowTable::build(vec![
        rule("one", "localhost:5140", "localhost:6001"),
        rule("two", "localhost:5141", "localhost:6001"),
    ])
    .unwrap();
    assert_eq!(table.len(), 2);
}

#[test]
fn test_transport_mismatch_is_not_a_loop() {
    // Listening on UDP 5140 and sending to TCP 5140 does not loop.
    let table = FlowTable::build(vec![rule("ok", "udp://localhost:5140", "tcp://localhost:5140")])
        .unwrap();
    assert_eq!(table.len(), 1);
}

#[test]
fn test_requires_privilege() {
    let low = FlowTable::build(vec![rule("low", "0.0.0.0:514", "localhost:6001")]).unwrap();
    assert!(low.requires_privilege());

    let high = FlowTable::build(vec![rule("high", "0.0.0.0:5140", "localhost:6001")]).unwrap();
    assert!(!high.requires_privilege());

    // A privileged *destination* port does not require privilege.
    let dst = FlowTable::build(vec![rule("dst", "0.0.0.0:5140", "10.0.0.1:514")]).unwrap();
    assert!(!dst.requires_privilege());
}

#[test]
fn test_lookup_unknown_rule() {
    let table = FlowTable::build(vec![rule("known", "localhost:5140", "localhost:6001")]).unwrap();
    assert!(table.get("unknown").is_none());
}
