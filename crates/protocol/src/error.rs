//! Endpoint resolution errors

use thiserror::Error;

/// Errors raised while resolving endpoint descriptors from host lists
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Host list contained no usable entries
    #[error("empty host list")]
    EmptyList,

    /// An entry had no host part
    #[error("empty host in '{entry}'")]
    EmptyHost {
        /// The offending list entry
        entry: String,
    },

    /// Hostname failed validation
    #[error("invalid hostname '{host}'")]
    InvalidHost {
        /// The offending hostname
        host: String,
    },

    /// Port part was not a valid u16
    #[error("invalid port in '{entry}'")]
    InvalidPort {
        /// The offending list entry
        entry: String,
    },

    /// Scheme prefix was not `udp://` or `tcp://`
    #[error("unsupported scheme '{scheme}' in '{entry}' (expected udp:// or tcp://)")]
    UnsupportedScheme {
        /// The unrecognized scheme
        scheme: String,
        /// The offending list entry
        entry: String,
    },

    /// Read-remote endpoints are connection-oriented
    #[error("read-remote endpoint '{entry}' must use tcp://")]
    ConnectRequiresTcp {
        /// The offending list entry
        entry: String,
    },
}
