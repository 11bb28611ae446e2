//! Relog Sinks
//!
//! Destination endpoint adapters: each accepts one [`Record`] at a time and
//! forwards it over its underlying resource, owned exclusively by the
//! adapter.
//!
//! # Available Sinks
//!
//! - **UDP send** - one datagram per record (primary, matches classic syslog)
//! - **TCP send** - newline-framed records over a connection, with bounded
//!   reconnect-and-retry before the adapter is declared dead
//! - **File append** - one line per record, flushed on a cadence by the
//!   owning task
//!
//! # Design Principles
//!
//! - **Construction errors are loud**: resolve/connect/open failures
//!   surface from [`open_sink`] before a flow is considered started.
//! - **Failure stays local**: a dead sink fails only itself; the engine
//!   keeps delivering to the flow's other destinations.

mod error;
mod file;
mod tcp;
mod udp;

use std::time::Duration;

use async_trait::async_trait;
use relog_protocol::{EndpointDescriptor, EndpointId, Record};

pub use error::SinkError;
pub use file::FileSink;
pub use tcp::TcpSink;
pub use udp::UdpSink;

/// A live destination adapter accepting records one at a time
#[async_trait]
pub trait RecordSink: Send {
    /// Identifier of this adapter (diagnostics)
    fn id(&self) -> &EndpointId;

    /// Forward one record
    ///
    /// An `Err` is fatal for this adapter: retries and reconnects have
    /// already been exhausted inside the call where they make sense.
    async fn send(&mut self, record: &Record) -> Result<(), SinkError>;

    /// Flush buffered output, if the sink buffers
    async fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Tuning knobs shared by all destination adapters
#[derive(Debug, Clone)]
pub struct SinkOptions {
    /// Connect timeout (TCP)
    pub connect_timeout: Duration,

    /// Per-record write timeout (TCP)
    pub write_timeout: Duration,

    /// Total write attempts per record before the adapter is dead (TCP)
    pub retry_attempts: usize,

    /// Wait between attempts (TCP)
    pub retry_interval: Duration,

    /// Enable TCP keep-alive
    pub tcp_keepalive: bool,

    /// TCP keep-alive interval
    pub tcp_keepalive_interval: Duration,
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
            retry_attempts: 3,
            retry_interval: Duration::from_secs(1),
            tcp_keepalive: true,
            tcp_keepalive_interval: Duration::from_secs(30),
        }
    }
}

/// Open the destination adapter described by a descriptor
///
/// # Errors
///
/// Surfaces resolve/connect/open failures immediately, so the caller can
/// refuse to start a flow with a broken adapter. Source descriptors are
/// rejected with [`SinkError::NotASink`].
pub async fn open_sink(
    descriptor: &EndpointDescriptor,
    options: &SinkOptions,
) -> Result<Box<dyn RecordSink>, SinkError> {
    match descriptor {
        EndpointDescriptor::SocketSend {
            transport: relog_protocol::Transport::Udp,
            host,
            port,
        } => Ok(Box::new(UdpSink::open(host, *port).await?)),
        EndpointDescriptor::SocketSend {
            transport: relog_protocol::Transport::Tcp,
            host,
            port,
        } => Ok(Box::new(TcpSink::open(host, *port, options.clone()).await?)),
        EndpointDescriptor::FileWrite { path } => Ok(Box::new(FileSink::open(path).await?)),
        other => Err(SinkError::NotASink {
            endpoint: other.id(),
        }),
    }
}
