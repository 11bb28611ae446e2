//! Relog Engine
//!
//! The concurrent execution engine behind a [`FlowTable`]: one task per
//! source adapter, fanning every record out to the owning flow's
//! destination tasks, started and stopped as a unit.
//!
//! # Design
//!
//! - **One task per source adapter** - sources block on I/O and must not
//!   block each other or other flows.
//! - **One task per destination adapter** - each destination's handle is
//!   owned by exactly one task; source tasks reach it through a bounded
//!   channel, so a slow destination backpressures only the source tasks of
//!   its own flow.
//! - **Best-effort broadcast** - destinations are tried in configured
//!   order; a dead destination never prevents delivery to the rest.
//! - **All-or-nothing start** - any adapter construction failure tears
//!   down everything already opened and reports the flow and endpoint.
//! - **Contained failure** - adapter errors update the status registry and
//!   never unwind across flow boundaries; a fully dead flow is visible in
//!   status but stops nothing else.
//!
//! # Example
//!
//! ```ignore
//! let table = Arc::new(FlowTable::build(rules)?);
//! let mut engine = RelayEngine::new(table, EngineOptions::default());
//!
//! engine.start().await?;
//! // ... poll engine.status() ...
//! engine.stop().await?;
//! ```
//!
//! [`FlowTable`]: relog_flow::FlowTable

mod engine;
mod error;
mod handle;
mod status;

pub use engine::{EngineOptions, RelayEngine};
pub use error::EngineError;
pub use status::{
    AdapterRole, AdapterState, AdapterStatus, EngineState, EngineStatus, FlowState, FlowStatus,
};
