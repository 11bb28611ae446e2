//! Relog Sources
//!
//! Source endpoint adapters: each produces a lazy stream of [`Record`]s
//! from one underlying resource, owned exclusively by the adapter.
//!
//! # Available Sources
//!
//! - **UDP listen** - one datagram per record (primary, matches classic syslog)
//! - **TCP listen** - newline-delimited records from any number of connections
//! - **TCP connect** - read-remote: connect out and read records until EOF
//! - **File** - replay a capture once, or tail it for appended lines
//!
//! # Design Principles
//!
//! - **Pull interface**: the engine drives each adapter with
//!   [`RecordSource::next_record`]; `Ok(None)` is end-of-stream.
//! - **Construction errors are loud**: bind/open/connect failures surface
//!   from [`open_source`] before a flow is considered started.
//! - **Runtime errors are contained**: peer disconnects and transient recv
//!   errors are logged and skipped; only an unrecoverable resource error
//!   ends the stream.

mod error;
mod file;
mod remote;
mod tcp;
mod udp;

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use relog_protocol::{EndpointDescriptor, EndpointId, Record};

pub use error::SourceError;
pub use file::FileSource;
pub use remote::TcpConnectSource;
pub use tcp::TcpListenSource;
pub use udp::UdpListenSource;

/// A live source adapter producing records one at a time
///
/// Implementations own their underlying resource (socket or file handle)
/// exclusively; dropping the adapter releases it.
#[async_trait]
pub trait RecordSource: Send {
    /// Identifier of this adapter (diagnostics and provenance)
    fn id(&self) -> &EndpointId;

    /// Produce the next record
    ///
    /// Suspends until a record is available. Returns `Ok(None)` at
    /// end-of-stream and `Err` only for unrecoverable adapter errors.
    async fn next_record(&mut self) -> Result<Option<Record>, SourceError>;

    /// Actual bound local address, for listening sources
    ///
    /// Lets a port-0 bind be observed (status output, tests).
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}

/// Tuning knobs shared by all source adapters
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Maximum record size; larger datagrams/lines are dropped
    pub max_message_size: usize,

    /// Socket receive buffer size (UDP)
    pub recv_buffer_size: usize,

    /// Internal queue size between connection readers and the adapter (TCP listen)
    pub queue_size: usize,

    /// Connect timeout (TCP connect source)
    pub connect_timeout: Duration,

    /// Poll interval between EOF checks when tailing a file
    pub poll_interval: Duration,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            max_message_size: 8192,
            recv_buffer_size: 256 * 1024,
            queue_size: 1000,
            connect_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Open the source adapter described by a descriptor
///
/// # Errors
///
/// Surfaces bind/open/connect failures immediately, so the caller can
/// refuse to start a flow with a broken adapter. Destination descriptors
/// are rejected with [`SourceError::NotASource`].
pub async fn open_source(
    descriptor: &EndpointDescriptor,
    options: &SourceOptions,
) -> Result<Box<dyn RecordSource>, SourceError> {
    match descriptor {
        EndpointDescriptor::SocketListen {
            transport: relog_protocol::Transport::Udp,
            host,
            port,
        } => Ok(Box::new(UdpListenSource::open(host, *port, options).await?)),
        EndpointDescriptor::SocketListen {
            transport: relog_protocol::Transport::Tcp,
            host,
            port,
        } => Ok(Box::new(TcpListenSource::open(host, *port, options).await?)),
        EndpointDescriptor::SocketConnect { host, port } => Ok(Box::new(
            TcpConnectSource::open(host, *port, options).await?,
        )),
        EndpointDescriptor::FileRead { path, follow } => {
            Ok(Box::new(FileSource::open(path, *follow, options).await?))
        }
        other => Err(SourceError::NotASource {
            endpoint: other.id(),
        }),
    }
}

/// Resolve `host:port` to the first socket address
///
/// Shared by the socket adapters; resolution failures are reported by the
/// caller as bind/connect errors against the endpoint.
pub(crate) async fn resolve_addr(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no addresses resolved for {host}:{port}"),
            )
        })
}
