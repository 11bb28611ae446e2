//! Flow table construction errors

use thiserror::Error;

/// Errors raised while building a flow table
///
/// Every variant names the offending rule so configuration mistakes are
/// reported against the section the user wrote.
#[derive(Debug, Error)]
pub enum FlowTableError {
    /// No rules at all
    #[error("no flows configured - at least one flow is required")]
    Empty,

    /// Two rules share a name
    #[error("duplicate flow name '{rule}'")]
    DuplicateRule {
        /// The duplicated rule name
        rule: String,
    },

    /// Rule has no source endpoints
    #[error("flow '{rule}' has no sources - at least one src.* entry is required")]
    NoSources {
        /// The offending rule name
        rule: String,
    },

    /// Rule has no destination endpoints
    #[error("flow '{rule}' has no destinations - at least one dst.* entry is required")]
    NoDestinations {
        /// The offending rule name
        rule: String,
    },

    /// Rule would relay records back into one of its own sources
    #[error("flow '{rule}' loops back into its own source {endpoint}")]
    RelayLoop {
        /// The offending rule name
        rule: String,
        /// The endpoint appearing on both sides
        endpoint: String,
    },
}

impl FlowTableError {
    /// The rule this error refers to, if any
    pub fn rule(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::DuplicateRule { rule }
            | Self::NoSources { rule }
            | Self::NoDestinations { rule }
            | Self::RelayLoop { rule, .. } => Some(rule),
        }
    }
}
