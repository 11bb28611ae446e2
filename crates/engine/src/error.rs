//! Engine orchestration errors

use relog_protocol::EndpointId;
use relog_sinks::SinkError;
use relog_sources::SourceError;
use thiserror::Error;

use crate::EngineState;

/// Errors returned by `start()` / `stop()` orchestration
///
/// Adapter errors during steady state never surface here - they are
/// contained in the owning flow and visible through the status query.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `start()` called from a state it cannot start from
    #[error("engine cannot start from state {state}")]
    InvalidState {
        /// The state the engine was in
        state: EngineState,
    },

    /// A source adapter failed to open; the start was rolled back
    #[error("flow '{flow}': failed to open source {endpoint}: {source}")]
    SourceOpen {
        /// The flow that failed to start
        flow: String,
        /// The offending endpoint
        endpoint: EndpointId,
        /// Underlying adapter error
        #[source]
        source: SourceError,
    },

    /// A destination adapter failed to open; the start was rolled back
    #[error("flow '{flow}': failed to open destination {endpoint}: {source}")]
    SinkOpen {
        /// The flow that failed to start
        flow: String,
        /// The offending endpoint
        endpoint: EndpointId,
        /// Underlying adapter error
        #[source]
        source: SinkError,
    },

    /// Tasks did not observe cancellation within the grace period
    ///
    /// The tasks were aborted, but their adapters may not have been
    /// released cleanly - reported, never swallowed.
    #[error("{} task(s) did not stop within the grace period: {}", tasks.len(), tasks.join(", "))]
    ShutdownTimeout {
        /// Labels of the leaked tasks
        tasks: Vec<String>,
    },
}
