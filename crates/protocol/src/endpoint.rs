//! Endpoint descriptors
//!
//! A descriptor is the resolved, validated description of one endpoint:
//! where it is (address or path), how it speaks (UDP datagrams, TCP lines,
//! file lines), and - for file reads - whether it replays once or tails.
//!
//! Host lists arrive as comma-separated strings (`"localhost:5140,10.0.0.1"`)
//! and expand into one descriptor per entry. A bare `host:port` is UDP, the
//! transport the original relay spoke; `udp://` and `tcp://` prefixes select
//! the transport explicitly. An entry without a port gets the syslog default.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{EndpointError, EndpointId};

/// Default syslog port (privileged - binding it may need root)
pub const DEFAULT_SYSLOG_PORT: u16 = 514;

/// Highest privileged port number; listening below this needs elevated rights
const PRIVILEGED_PORT_MAX: u16 = 1023;

/// Socket transport for a record stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// One datagram per record (default)
    Udp,
    /// Newline-delimited records over a connection
    Tcp,
}

impl Transport {
    /// Scheme string used in endpoint IDs
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Resolved description of one endpoint
///
/// Immutable once resolved. The role (source or destination) is fixed by the
/// variant; the flow table never has to guess which side an endpoint is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointDescriptor {
    /// Source: bind `host:port` and receive records
    SocketListen {
        /// Datagram or line-oriented stream
        transport: Transport,
        /// Bind host
        host: String,
        /// Bind port
        port: u16,
    },

    /// Source: connect to a remote endpoint and read records until EOF
    /// (less common "read-remote" variant, TCP only)
    SocketConnect {
        /// Remote host
        host: String,
        /// Remote port
        port: u16,
    },

    /// Destination: send each record to `host:port`
    SocketSend {
        /// Datagram or line-oriented stream
        transport: Transport,
        /// Remote host
        host: String,
        /// Remote port
        port: u16,
    },

    /// Source: read a file line by line
    FileRead {
        /// Path to the file
        path: PathBuf,
        /// `false`: stop at EOF (replay); `true`: poll for appended lines
        /// (tail). Declared up front, never inferred.
        follow: bool,
    },

    /// Destination: append each record to a file, one per line
    FileWrite {
        /// Path to the file (created if missing)
        path: PathBuf,
    },
}

impl EndpointDescriptor {
    /// Expand a comma-separated listen list into descriptors
    pub fn parse_listen_list(input: &str) -> Result<Vec<Self>, EndpointError> {
        parse_socket_list(input, |transport, host, port| Self::SocketListen {
            transport,
            host,
            port,
        })
    }

    /// Expand a comma-separated send list into descriptors
    pub fn parse_send_list(input: &str) -> Result<Vec<Self>, EndpointError> {
        parse_socket_list(input, |transport, host, port| Self::SocketSend {
            transport,
            host,
            port,
        })
    }

    /// Expand a comma-separated read-remote list into descriptors
    ///
    /// Entries must carry an explicit `tcp://` prefix; reading records from
    /// a remote peer needs a connection-oriented stream.
    pub fn parse_connect_list(input: &str) -> Result<Vec<Self>, EndpointError> {
        let mut descriptors = Vec::new();

        for entry in input.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (transport, host, port) = parse_host_entry(entry)?;
            if transport != Transport::Tcp {
                return Err(EndpointError::ConnectRequiresTcp {
                    entry: entry.to_string(),
                });
            }
            descriptors.push(Self::SocketConnect { host, port });
        }

        if descriptors.is_empty() {
            return Err(EndpointError::EmptyList);
        }
        Ok(descriptors)
    }

    /// Descriptor for reading a file (replay or tail)
    pub fn file_read(path: impl Into<PathBuf>, follow: bool) -> Self {
        Self::FileRead {
            path: path.into(),
            follow,
        }
    }

    /// Descriptor for appending to a file
    pub fn file_write(path: impl Into<PathBuf>) -> Self {
        Self::FileWrite { path: path.into() }
    }

    /// Display identifier for the adapter built from this descriptor
    pub fn id(&self) -> EndpointId {
        match self {
            Self::SocketListen {
                transport,
                host,
                port,
            }
            | Self::SocketSend {
                transport,
                host,
                port,
            } => EndpointId::new(format!("{transport}://{host}:{port}")),
            Self::SocketConnect { host, port } => EndpointId::new(format!("tcp://{host}:{port}")),
            Self::FileRead { path, .. } | Self::FileWrite { path } => {
                EndpointId::new(format!("file://{}", path.display()))
            }
        }
    }

    /// Whether this endpoint binds a privileged port
    ///
    /// Only listening sockets bind; sends and file endpoints never require
    /// elevated rights. Port 0 asks the OS for an ephemeral port and is
    /// never privileged.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            Self::SocketListen { port, .. } if (1..=PRIVILEGED_PORT_MAX).contains(port)
        )
    }

    /// Whether this descriptor describes a source endpoint
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            Self::SocketListen { .. } | Self::SocketConnect { .. } | Self::FileRead { .. }
        )
    }
}

/// Split a comma-separated host list and build one descriptor per entry
fn parse_socket_list<F>(input: &str, build: F) -> Result<Vec<EndpointDescriptor>, EndpointError>
where
    F: Fn(Transport, String, u16) -> EndpointDescriptor,
{
    let mut descriptors = Vec::new();

    for entry in input.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (transport, host, port) = parse_host_entry(entry)?;
        descriptors.push(build(transport, host, port));
    }

    if descriptors.is_empty() {
        return Err(EndpointError::EmptyList);
    }
    Ok(descriptors)
}

/// Parse one `[scheme://]host[:port]` entry
fn parse_host_entry(entry: &str) -> Result<(Transport, String, u16), EndpointError> {
    let (transport, rest) = match entry.split_once("://") {
        Some(("udp", rest)) => (Transport::Udp, rest),
        Some(("tcp", rest)) => (Transport::Tcp, rest),
        Some((scheme, _)) => {
            return Err(EndpointError::UnsupportedScheme {
                scheme: scheme.to_string(),
                entry: entry.to_string(),
            });
        }
        None => (Transport::Udp, entry),
    };

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port_str)) => {
            let port = port_str
                .parse::<u16>()
                .map_err(|_| EndpointError::InvalidPort {
                    entry: entry.to_string(),
                })?;
            (host, port)
        }
        None => (rest, DEFAULT_SYSLOG_PORT),
    };

    if host.is_empty() {
        return Err(EndpointError::EmptyHost {
            entry: entry.to_string(),
        });
    }
    if !is_valid_host(host) {
        return Err(EndpointError::InvalidHost {
            host: host.to_string(),
        });
    }

    Ok((transport, host.to_string(), port))
}

/// Loose hostname/IP validation: dotted labels of alphanumerics and hyphens
fn is_valid_host(host: &str) -> bool {
    !host.starts_with('.')
        && !host.ends_with('.')
        && host
            .split('.')
            .all(|label| !label.is_empty() && label.chars().all(|c| c.is_alphanumeric() || c == '-'))
}

/// Anchor a relative path against a base directory
///
/// Paths in a config file are resolved against the file's own directory, so
/// a config can be moved together with its capture files.
pub fn anchor_path(path: &Path, base: Option<&Path>) -> PathBuf {
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
#[path = "endpoint_test.rs"]
mod endpoint_test;
