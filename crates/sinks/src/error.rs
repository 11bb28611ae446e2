//! Sink adapter errors

use std::io;
use std::path::PathBuf;

use relog_protocol::EndpointId;
use thiserror::Error;

/// Sink adapter errors
///
/// `Connect` and `Open` are construction-time: the flow owning the adapter
/// must not be considered started. `Write` and `RetriesExhausted` are fatal
/// runtime errors for one adapter only.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Failed to resolve or connect to the destination
    #[error("failed to connect {endpoint}: {source}")]
    Connect {
        /// The endpoint that failed to connect
        endpoint: EndpointId,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to open a file for appending
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Write failed and no retry applies (datagram and file sinks)
    #[error("write error on {endpoint}: {source}")]
    Write {
        /// The endpoint the error occurred on
        endpoint: EndpointId,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// All write attempts failed; the adapter is dead
    #[error("all {attempts} write attempts to {endpoint} failed: {last_error}")]
    RetriesExhausted {
        /// The endpoint the attempts were made against
        endpoint: EndpointId,
        /// Number of attempts made
        attempts: usize,
        /// Message of the last failure
        last_error: String,
    },

    /// Descriptor describes a source, not a destination
    #[error("{endpoint} is not a destination endpoint")]
    NotASink {
        /// The offending endpoint
        endpoint: EndpointId,
    },
}
