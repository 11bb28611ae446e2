//! Configuration error types

use std::io;

use relog_protocol::EndpointError;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or resolving configuration
///
/// All of these are fatal before any flow starts: nothing is partially
/// started on a configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Neither a config file with flows nor CLI endpoint flags were given
    #[error("no flows configured - provide a config file or source/destination flags")]
    NoFlows,

    /// A flow section has no name
    #[error("flow section without a name")]
    UnnamedFlow,

    /// A flow has no `src.*` keys
    #[error("flow '{flow}' has no sources - set src.host, src.connect or src.file")]
    NoSources {
        /// The offending flow name
        flow: String,
    },

    /// A flow has no `dst.*` keys
    #[error("flow '{flow}' has no destinations - set dst.host or dst.file")]
    NoDestinations {
        /// The offending flow name
        flow: String,
    },

    /// A host list failed to resolve into endpoints
    #[error("flow '{flow}', key {key}: {source}")]
    InvalidEndpoint {
        /// The offending flow name
        flow: String,
        /// The configuration key being resolved
        key: &'static str,
        /// Underlying endpoint error
        #[source]
        source: EndpointError,
    },

    /// `src.follow` without `src.file` has nothing to tail
    #[error("flow '{flow}' sets src.follow without src.file")]
    FollowWithoutFile {
        /// The offending flow name
        flow: String,
    },
}
