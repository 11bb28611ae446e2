//! Relay engine
//!
//! Owns the flow table and executes it: `start()` opens every adapter and
//! spawns the per-endpoint tasks, `stop()` cancels and joins them under a
//! grace period. In between, each source task loops "read one record, fan
//! it out to the flow's destinations in configured order".

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use relog_flow::FlowTable;
use relog_protocol::Record;
use relog_sinks::{open_sink, RecordSink, SinkOptions};
use relog_sources::{open_source, RecordSource, SourceOptions};

use crate::handle::DestinationHandle;
use crate::status::{AdapterSlot, StatusRegistry};
use crate::{EngineError, EngineState, EngineStatus};

/// Engine tuning knobs
///
/// `source` and `sink` are handed through to the adapters; the rest govern
/// the engine's own channels and shutdown behavior.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Records buffered per destination before its sources backpressure
    pub queue_size: usize,

    /// Cadence at which buffering destinations are flushed
    pub flush_interval: Duration,

    /// Grace period per task at shutdown before it is aborted and reported
    pub shutdown_timeout: Duration,

    /// Source adapter tuning
    pub source: SourceOptions,

    /// Destination adapter tuning
    pub sink: SinkOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            queue_size: 1000,
            flush_interval: Duration::from_millis(100),
            shutdown_timeout: Duration::from_secs(5),
            source: SourceOptions::default(),
            sink: SinkOptions::default(),
        }
    }
}

/// A spawned task plus the label it is reported under
struct Task {
    label: String,
    handle: JoinHandle<()>,
}

/// The relay engine
///
/// State machine `Idle -> Starting -> Running -> Stopping -> Stopped`;
/// `start()` is all-or-nothing, `stop()` is idempotent and safe after a
/// partial failure.
pub struct RelayEngine {
    table: Arc<FlowTable>,
    options: EngineOptions,
    cancel: CancellationToken,
    status: Arc<StatusRegistry>,
    source_tasks: Vec<Task>,
    sink_tasks: Vec<Task>,
}

impl RelayEngine {
    /// Create an engine over a built flow table
    pub fn new(table: Arc<FlowTable>, options: EngineOptions) -> Self {
        let status = Arc::new(StatusRegistry::new(&table));
        Self {
            table,
            options,
            cancel: CancellationToken::new(),
            status,
            source_tasks: Vec::new(),
            sink_tasks: Vec::new(),
        }
    }

    /// Current engine lifecycle state
    pub fn state(&self) -> EngineState {
        self.status.engine_state()
    }

    /// Point-in-time status of every flow and adapter
    pub fn status(&self) -> EngineStatus {
        self.status.snapshot()
    }

    /// Open every adapter and spawn the relay tasks
    ///
    /// Destinations of a flow are opened before its sources, so no record
    /// can be read without a place to go. If any adapter fails to open,
    /// everything already started is torn down and the error names the
    /// flow and endpoint - partial startup is never left running.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidState`] unless the engine is `Idle` or
    /// `Stopped`; [`EngineError::SourceOpen`] / [`EngineError::SinkOpen`]
    /// for construction failures.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        match self.state() {
            EngineState::Idle | EngineState::Stopped => {}
            state => return Err(EngineError::InvalidState { state }),
        }

        self.status.reset();
        self.status.set_engine_state(EngineState::Starting);
        self.cancel = CancellationToken::new();

        tracing::info!(flow_count = self.table.len(), "relay engine starting");

        let table = Arc::clone(&self.table);
        for (flow_idx, flow) in table.iter().enumerate() {
            let mut handles = Vec::with_capacity(flow.destinations().len());

            for (dst_idx, descriptor) in flow.destinations().iter().enumerate() {
                let sink = match open_sink(descriptor, &self.options.sink).await {
                    Ok(sink) => sink,
                    Err(e) => {
                        tracing::error!(
                            flow = %flow.name(),
                            endpoint = %descriptor.id(),
                            error = %e,
                            "destination failed to open, aborting start"
                        );
                        self.status
                            .destination_slot(flow_idx, dst_idx)
                            .set_failed(e.to_string());
                        // Release this flow's senders so its already-spawned
                        // destination tasks can drain during rollback.
                        drop(handles);
                        self.abort_start().await;
                        return Err(EngineError::SinkOpen {
                            flow: flow.name().to_string(),
                            endpoint: descriptor.id(),
                            source: e,
                        });
                    }
                };

                let slot = self.status.destination_slot(flow_idx, dst_idx);
                slot.set_active();

                let (tx, rx) = mpsc::channel::<Arc<Record>>(self.options.queue_size);
                handles.push(DestinationHandle::new(descriptor.id(), tx));

                self.sink_tasks.push(Task {
                    label: format!("{}/dst/{}", flow.name(), descriptor.id()),
                    handle: tokio::spawn(run_sink(sink, rx, self.options.flush_interval, slot)),
                });
            }

            for (src_idx, descriptor) in flow.sources().iter().enumerate() {
                let source = match open_source(descriptor, &self.options.source).await {
                    Ok(source) => source,
                    Err(e) => {
                        tracing::error!(
                            flow = %flow.name(),
                            endpoint = %descriptor.id(),
                            error = %e,
                            "source failed to open, aborting start"
                        );
                        self.status
                            .source_slot(flow_idx, src_idx)
                            .set_failed(e.to_string());
                        drop(handles);
                        self.abort_start().await;
                        return Err(EngineError::SourceOpen {
                            flow: flow.name().to_string(),
                            endpoint: descriptor.id(),
                            source: e,
                        });
                    }
                };

                let slot = self.status.source_slot(flow_idx, src_idx);
                slot.set_local_addr(source.local_addr());
                slot.set_active();

                self.source_tasks.push(Task {
                    label: format!("{}/src/{}", flow.name(), descriptor.id()),
                    handle: tokio::spawn(run_source(
                        source,
                        handles.clone(),
                        self.cancel.clone(),
                        slot,
                        flow.name().to_string(),
                    )),
                });
            }
        }

        self.status.set_engine_state(EngineState::Running);
        tracing::info!(
            source_tasks = self.source_tasks.len(),
            destination_tasks = self.sink_tasks.len(),
            "relay engine running"
        );

        Ok(())
    }

    /// Cancel every task and release every adapter
    ///
    /// Idempotent: calling `stop()` on an `Idle` or `Stopped` engine is a
    /// no-op. Safe from `Starting`, `Running`, or after a partial failure.
    ///
    /// # Errors
    ///
    /// [`EngineError::ShutdownTimeout`] if tasks failed to observe
    /// cancellation within the grace period; they were aborted, and the
    /// engine still transitions to `Stopped`.
    pub async fn stop(&mut self) -> Result<(), EngineError> {
        match self.state() {
            EngineState::Idle | EngineState::Stopped => return Ok(()),
            _ => {}
        }

        self.status.set_engine_state(EngineState::Stopping);
        tracing::info!("relay engine stopping");

        self.cancel.cancel();
        let leaked = self.teardown().await;
        self.status.set_engine_state(EngineState::Stopped);

        if leaked.is_empty() {
            tracing::info!("relay engine stopped");
            Ok(())
        } else {
            tracing::error!(tasks = ?leaked, "tasks did not stop within the grace period");
            Err(EngineError::ShutdownTimeout { tasks: leaked })
        }
    }

    /// Roll back a partially completed start
    async fn abort_start(&mut self) {
        self.cancel.cancel();
        let leaked = self.teardown().await;
        if !leaked.is_empty() {
            tracing::error!(tasks = ?leaked, "tasks leaked during start rollback");
        }
        self.status.set_engine_state(EngineState::Stopped);
    }

    /// Join all tasks under the grace period; abort and report stragglers
    ///
    /// Sources first - they hold the destination senders, so once they are
    /// gone the destination queues close and drain on their own.
    async fn teardown(&mut self) -> Vec<String> {
        let mut leaked = Vec::new();
        let grace = self.options.shutdown_timeout;

        for task in self.source_tasks.drain(..) {
            join_or_abort(task, grace, &mut leaked).await;
        }
        for task in self.sink_tasks.drain(..) {
            join_or_abort(task, grace, &mut leaked).await;
        }

        leaked
    }
}

/// Await one task under the grace period; abort and record it on timeout
async fn join_or_abort(task: Task, grace: Duration, leaked: &mut Vec<String>) {
    let abort = task.handle.abort_handle();
    match timeout(grace, task.handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(task = %task.label, error = %e, "task panicked");
        }
        Err(_) => {
            abort.abort();
            leaked.push(task.label);
        }
    }
}

/// One source adapter's read-and-fan-out loop
async fn run_source(
    mut source: Box<dyn RecordSource>,
    handles: Vec<DestinationHandle>,
    cancel: CancellationToken,
    slot: Arc<AdapterSlot>,
    flow_name: String,
) {
    let id = source.id().clone();
    tracing::debug!(flow = %flow_name, endpoint = %id, "source task started");

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                slot.set_finished();
                break;
            }

            result = source.next_record() => match result {
                Ok(Some(record)) => {
                    slot.add_record();
                    let record = Arc::new(record);

                    // Best-effort broadcast in configured order: a dead
                    // destination is skipped, the rest still get the record.
                    for handle in &handles {
                        if handle.send(Arc::clone(&record)).await.is_err() {
                            tracing::trace!(
                                flow = %flow_name,
                                destination = %handle.id(),
                                "destination gone, skipping"
                            );
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!(
                        flow = %flow_name,
                        endpoint = %id,
                        records = slot.records(),
                        "source finished"
                    );
                    slot.set_finished();
                    break;
                }
                Err(e) => {
                    tracing::error!(flow = %flow_name, endpoint = %id, error = %e, "source failed");
                    slot.set_failed(e.to_string());
                    break;
                }
            }
        }
    }

    // Dropping the adapter releases its underlying resource; dropping the
    // handles lets the destination queues close once all siblings are done.
    tracing::debug!(flow = %flow_name, endpoint = %id, "source task stopped");
}

/// One destination adapter's consume loop
///
/// Runs until its queue closes (all of the flow's source tasks are gone),
/// then flushes and exits. A fatal sink error ends only this task; closing
/// the queue makes the failure visible to senders.
async fn run_sink(
    mut sink: Box<dyn RecordSink>,
    mut rx: mpsc::Receiver<Arc<Record>>,
    flush_interval: Duration,
    slot: Arc<AdapterSlot>,
) {
    let id = sink.id().clone();
    let mut flush_timer = interval(flush_interval.max(Duration::from_millis(1)));
    flush_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            maybe = rx.recv() => match maybe {
                Some(record) => {
                    if let Err(e) = sink.send(&record).await {
                        tracing::error!(endpoint = %id, error = %e, "destination failed");
                        slot.set_failed(e.to_string());
                        break;
                    }
                    slot.add_record();
                }
                None => {
                    // Drained: flush what is buffered and end cleanly.
                    if let Err(e) = sink.flush().await {
                        tracing::warn!(endpoint = %id, error = %e, "final flush failed");
                        slot.set_failed(e.to_string());
                    } else {
                        slot.set_finished();
                    }
                    break;
                }
            },

            _ = flush_timer.tick() => {
                if let Err(e) = sink.flush().await {
                    tracing::error!(endpoint = %id, error = %e, "flush failed");
                    slot.set_failed(e.to_string());
                    break;
                }
            }
        }
    }

    tracing::debug!(endpoint = %id, records = slot.records(), "destination task stopped");
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
