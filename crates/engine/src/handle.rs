//! Destination handle
//!
//! Wraps the channel sender into one destination task, so source tasks can
//! fan records out without knowing the concrete sink type. The destination
//! adapter itself is owned by exactly one task; handles only enqueue.

use std::sync::Arc;

use relog_protocol::{EndpointId, Record};
use tokio::sync::mpsc;

/// Sender half of one destination's record queue
#[derive(Clone)]
pub(crate) struct DestinationHandle {
    id: EndpointId,
    sender: mpsc::Sender<Arc<Record>>,
}

impl DestinationHandle {
    pub(crate) fn new(id: EndpointId, sender: mpsc::Sender<Arc<Record>>) -> Self {
        Self { id, sender }
    }

    /// The destination's endpoint identifier
    #[inline]
    pub(crate) fn id(&self) -> &EndpointId {
        &self.id
    }

    /// Enqueue one record, waiting if the queue is full
    ///
    /// A full queue backpressures the calling source task only. `Err` means
    /// the destination task is gone (its adapter failed or drained).
    #[inline]
    pub(crate) async fn send(&self, record: Arc<Record>) -> Result<(), ()> {
        self.sender.send(record).await.map_err(|_| ())
    }
}

impl std::fmt::Debug for DestinationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationHandle")
            .field("id", &self.id)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}
