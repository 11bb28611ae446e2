//! Engine and flow status
//!
//! Shared registry of per-flow, per-adapter slots. Source and destination
//! tasks update their own slot (atomic state, record counter, last error);
//! the surrounding process polls [`snapshot`]s without blocking anything.
//!
//! Flow state is derived, not stored: a flow is `Degraded` once some
//! adapter has failed and `Dead` once every source is finished or failed.
//!
//! [`snapshot`]: StatusRegistry::snapshot

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use relog_flow::FlowTable;
use relog_protocol::EndpointId;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    /// Constructed, never started
    Idle = 0,
    /// Opening adapters
    Starting = 1,
    /// All adapters open, tasks relaying
    Running = 2,
    /// Cancellation signalled, waiting for tasks
    Stopping = 3,
    /// All tasks joined (or aborted and reported)
    Stopped = 4,
}

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Which side of a flow an adapter is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterRole {
    /// Produces records
    Source,
    /// Accepts records
    Destination,
}

impl fmt::Display for AdapterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Destination => "destination",
        })
    }
}

/// Lifecycle state of one adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AdapterState {
    /// Not opened yet
    Pending = 0,
    /// Open and serving
    Active = 1,
    /// Ended cleanly (end-of-stream, drained, or cancelled)
    Finished = 2,
    /// Ended with an unrecoverable error
    Failed = 3,
}

impl AdapterState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Pending,
            1 => Self::Active,
            2 => Self::Finished,
            _ => Self::Failed,
        }
    }

    /// Whether this adapter will produce or accept no further records
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

impl fmt::Display for AdapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Finished => "finished",
            Self::Failed => "failed",
        })
    }
}

/// Derived state of one flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Some adapters not opened yet
    Starting,
    /// All adapters serving
    Running,
    /// Some adapter failed, but sources remain
    Degraded,
    /// Every source is finished or failed; no more records can flow
    Dead,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Degraded => "degraded",
            Self::Dead => "dead",
        })
    }
}

/// Point-in-time status of one adapter
#[derive(Debug, Clone)]
pub struct AdapterStatus {
    /// Endpoint identifier
    pub id: EndpointId,
    /// Source or destination
    pub role: AdapterRole,
    /// Current lifecycle state
    pub state: AdapterState,
    /// Records read (source) or written (destination)
    pub records: u64,
    /// Message of the last unrecoverable error, if any
    pub last_error: Option<String>,
    /// Actual bound address, for listening sources
    pub local_addr: Option<SocketAddr>,
}

/// Point-in-time status of one flow
#[derive(Debug, Clone)]
pub struct FlowStatus {
    /// Rule name
    pub name: String,
    /// Derived flow state
    pub state: FlowState,
    /// Source adapters in configured order
    pub sources: Vec<AdapterStatus>,
    /// Destination adapters in configured order
    pub destinations: Vec<AdapterStatus>,
}

/// Point-in-time status of the whole engine
#[derive(Debug, Clone)]
pub struct EngineStatus {
    /// Engine lifecycle state
    pub state: EngineState,
    /// Per-flow status in table order
    pub flows: Vec<FlowStatus>,
}

/// One adapter's live status slot, updated by its owning task
#[derive(Debug)]
pub(crate) struct AdapterSlot {
    id: EndpointId,
    role: AdapterRole,
    state: AtomicU8,
    records: AtomicU64,
    last_error: Mutex<Option<String>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl AdapterSlot {
    fn new(id: EndpointId, role: AdapterRole) -> Self {
        Self {
            id,
            role,
            state: AtomicU8::new(AdapterState::Pending as u8),
            records: AtomicU64::new(0),
            last_error: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    pub(crate) fn set_active(&self) {
        self.state.store(AdapterState::Active as u8, Ordering::Relaxed);
    }

    /// Mark finished, unless already failed
    pub(crate) fn set_finished(&self) {
        let _ = self.state.compare_exchange(
            AdapterState::Active as u8,
            AdapterState::Finished as u8,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
    }

    pub(crate) fn set_failed(&self, message: String) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(message);
        self.state.store(AdapterState::Failed as u8, Ordering::Relaxed);
    }

    pub(crate) fn set_local_addr(&self, addr: Option<SocketAddr>) {
        *self.local_addr.lock().unwrap_or_else(|e| e.into_inner()) = addr;
    }

    #[inline]
    pub(crate) fn add_record(&self) {
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.state.store(AdapterState::Pending as u8, Ordering::Relaxed);
        self.records.store(0, Ordering::Relaxed);
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = None;
        *self.local_addr.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn snapshot(&self) -> AdapterStatus {
        AdapterStatus {
            id: self.id.clone(),
            role: self.role,
            state: AdapterState::from_u8(self.state.load(Ordering::Relaxed)),
            records: self.records.load(Ordering::Relaxed),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            local_addr: *self.local_addr.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }
}

/// Status slots for one flow
#[derive(Debug)]
struct FlowSlots {
    name: String,
    sources: Vec<Arc<AdapterSlot>>,
    destinations: Vec<Arc<AdapterSlot>>,
}

/// Shared status registry, one slot per adapter in the table
///
/// Built once from the flow table; the slot layout never changes, only the
/// values in the slots.
#[derive(Debug)]
pub(crate) struct StatusRegistry {
    engine_state: AtomicU8,
    flows: Vec<FlowSlots>,
}

impl StatusRegistry {
    pub(crate) fn new(table: &FlowTable) -> Self {
        let flows = table
            .iter()
            .map(|flow| FlowSlots {
                name: flow.name().to_string(),
                sources: flow
                    .sources()
                    .iter()
                    .map(|d| Arc::new(AdapterSlot::new(d.id(), AdapterRole::Source)))
                    .collect(),
                destinations: flow
                    .destinations()
                    .iter()
                    .map(|d| Arc::new(AdapterSlot::new(d.id(), AdapterRole::Destination)))
                    .collect(),
            })
            .collect();

        Self {
            engine_state: AtomicU8::new(EngineState::Idle as u8),
            flows,
        }
    }

    pub(crate) fn set_engine_state(&self, state: EngineState) {
        self.engine_state.store(state as u8, Ordering::Relaxed);
    }

    pub(crate) fn engine_state(&self) -> EngineState {
        EngineState::from_u8(self.engine_state.load(Ordering::Relaxed))
    }

    pub(crate) fn source_slot(&self, flow: usize, index: usize) -> Arc<AdapterSlot> {
        Arc::clone(&self.flows[flow].sources[index])
    }

    pub(crate) fn destination_slot(&self, flow: usize, index: usize) -> Arc<AdapterSlot> {
        Arc::clone(&self.flows[flow].destinations[index])
    }

    /// Reset every slot for a fresh start
    pub(crate) fn reset(&self) {
        for flow in &self.flows {
            for slot in flow.sources.iter().chain(flow.destinations.iter()) {
                slot.reset();
            }
        }
    }

    pub(crate) fn snapshot(&self) -> EngineStatus {
        let flows = self
            .flows
            .iter()
            .map(|flow| {
                let sources: Vec<_> = flow.sources.iter().map(|s| s.snapshot()).collect();
                let destinations: Vec<_> =
                    flow.destinations.iter().map(|s| s.snapshot()).collect();
                FlowStatus {
                    name: flow.name.clone(),
                    state: derive_flow_state(&sources, &destinations),
                    sources,
                    destinations,
                }
            })
            .collect();

        EngineStatus {
            state: self.engine_state(),
            flows,
        }
    }
}

/// Derive a flow's state from its adapter states
fn derive_flow_state(sources: &[AdapterStatus], destinations: &[AdapterStatus]) -> FlowState {
    if sources.iter().all(|s| s.state.is_terminal()) {
        return FlowState::Dead;
    }
    if sources
        .iter()
        .chain(destinations.iter())
        .any(|s| s.state == AdapterState::Failed)
    {
        return FlowState::Degraded;
    }
    if sources
        .iter()
        .chain(destinations.iter())
        .any(|s| s.state == AdapterState::Pending)
    {
        return FlowState::Starting;
    }
    FlowState::Running
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(role: AdapterRole, state: AdapterState) -> AdapterStatus {
        AdapterStatus {
            id: EndpointId::new("test"),
            role,
            state,
            records: 0,
            last_error: None,
            local_addr: None,
        }
    }

    #[test]
    fn test_all_active_is_running() {
        let sources = vec![adapter(AdapterRole::Source, AdapterState::Active)];
        let dests = vec![adapter(AdapterRole::Destination, AdapterState::Active)];
        assert_eq!(derive_flow_state(&sources, &dests), FlowState::Running);
    }

    #[test]
    fn test_pending_adapter_means_starting() {
        let sources = vec![adapter(AdapterRole::Source, AdapterState::Active)];
        let dests = vec![adapter(AdapterRole::Destination, AdapterState::Pending)];
        assert_eq!(derive_flow_state(&sources, &dests), FlowState::Starting);
    }

    #[test]
    fn test_failed_destination_means_degraded() {
        let sources = vec![adapter(AdapterRole::Source, AdapterState::Active)];
        let dests = vec![
            adapter(AdapterRole::Destination, AdapterState::Failed),
            adapter(AdapterRole::Destination, AdapterState::Active),
        ];
        assert_eq!(derive_flow_state(&sources, &dests), FlowState::Degraded);
    }

    #[test]
    fn test_some_sources_failed_means_degraded() {
        let sources = vec![
            adapter(AdapterRole::Source, AdapterState::Failed),
            adapter(AdapterRole::Source, AdapterState::Active),
        ];
        let dests = vec![adapter(AdapterRole::Destination, AdapterState::Active)];
        assert_eq!(derive_flow_state(&sources, &dests), FlowState::Degraded);
    }

    #[test]
    fn test_all_sources_done_means_dead() {
        // Dead even when every source finished cleanly.
        let sources = vec![
            adapter(AdapterRole::Source, AdapterState::Finished),
            adapter(AdapterRole::Source, AdapterState::Failed),
        ];
        let dests = vec![adapter(AdapterRole::Destination, AdapterState::Active)];
        assert_eq!(derive_flow_state(&sources, &dests), FlowState::Dead);
    }

    #[test]
    fn test_failed_slot_not_downgraded_by_finish() {
        let slot = AdapterSlot::new(EndpointId::new("x"), AdapterRole::Source);
        slot.set_active();
        slot.set_failed("boom".into());
        slot.set_finished();
        assert_eq!(slot.snapshot().state, AdapterState::Failed);
        assert_eq!(slot.snapshot().last_error.as_deref(), Some("boom"));
    }
}
