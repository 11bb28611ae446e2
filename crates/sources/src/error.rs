//! Source adapter errors

use std::io;
use std::path::PathBuf;

use relog_protocol::EndpointId;
use thiserror::Error;

/// Source adapter errors
///
/// `Bind`, `Connect` and `Open` are construction-time: the flow owning the
/// adapter must not be considered started. `Read` is an unrecoverable
/// runtime error that ends one adapter's stream; transient errors never
/// surface here.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to bind a listening socket (address in use, permission denied)
    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        /// The endpoint that failed to bind
        endpoint: EndpointId,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to connect a read-remote socket
    #[error("failed to connect {endpoint}: {source}")]
    Connect {
        /// The endpoint that failed to connect
        endpoint: EndpointId,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to open a file for reading
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Unrecoverable read error; the adapter's stream is over
    #[error("read error on {endpoint}: {source}")]
    Read {
        /// The endpoint the error occurred on
        endpoint: EndpointId,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Descriptor describes a destination, not a source
    #[error("{endpoint} is not a source endpoint")]
    NotASource {
        /// The offending endpoint
        endpoint: EndpointId,
    },
}

/// Whether a socket error is worth retrying instead of ending the stream
pub(crate) fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
    )
}
