//! Serve loop - run the relay engine until a shutdown signal
//!
//! Starts the engine, logs a per-flow status line on a fixed cadence so
//! degraded and dead flows are visible without a query interface, and
//! performs a graceful stop on Ctrl-C / SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use relog_config::GlobalConfig;
use relog_engine::{EngineError, EngineOptions, EngineStatus, RelayEngine};
use relog_flow::FlowTable;
use relog_sinks::SinkOptions;
use relog_sources::SourceOptions;

/// Cadence of the periodic status log
const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// Map the `[global]` config section onto engine options
pub fn engine_options(global: &GlobalConfig) -> EngineOptions {
    EngineOptions {
        queue_size: global.queue_size,
        flush_interval: global.flush_interval,
        shutdown_timeout: global.shutdown_timeout,
        source: SourceOptions {
            max_message_size: global.max_message_size,
            connect_timeout: global.connect_timeout,
            poll_interval: global.file_poll_interval,
            queue_size: global.queue_size,
            ..Default::default()
        },
        sink: SinkOptions {
            connect_timeout: global.connect_timeout,
            write_timeout: global.write_timeout,
            retry_attempts: global.retry_attempts,
            retry_interval: global.retry_interval,
            ..Default::default()
        },
    }
}

/// Run the relay until a shutdown signal arrives
pub async fn run(table: Arc<FlowTable>, options: EngineOptions) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        flow_count = table.len(),
        "relog starting"
    );

    let mut engine = RelayEngine::new(table, options);
    engine.start().await.context("failed to start relay engine")?;

    let mut status_timer = interval(STATUS_LOG_INTERVAL);
    status_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick fires immediately; skip it so the initial status line
    // is not logged twice with startup.
    status_timer.tick().await;

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = status_timer.tick() => log_status(&engine.status()),
        }
    }

    info!("shutdown signal received, stopping relay...");

    match engine.stop().await {
        Ok(()) => {}
        Err(e @ EngineError::ShutdownTimeout { .. }) => {
            // Leaked tasks are an operational error, not a reason to fail
            // the process on its way out.
            error!(error = %e, "shutdown left leaked tasks");
        }
        Err(e) => return Err(e).context("failed to stop relay engine"),
    }

    info!("relog shutdown complete");
    Ok(())
}

/// One status line per flow, plus a warning for flows no longer healthy
fn log_status(status: &EngineStatus) {
    for flow in &status.flows {
        let records_in: u64 = flow.sources.iter().map(|a| a.records).sum();
        let records_out: u64 = flow.destinations.iter().map(|a| a.records).sum();

        info!(
            flow = %flow.name,
            state = %flow.state,
            records_in,
            records_out,
            "flow status"
        );

        for adapter in flow.sources.iter().chain(flow.destinations.iter()) {
            if let Some(ref last_error) = adapter.last_error {
                warn!(
                    flow = %flow.name,
                    endpoint = %adapter.id,
                    role = %adapter.role,
                    error = %last_error,
                    "adapter failed"
                );
            }
        }
    }
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler, using Ctrl-C only");
                let _ = signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}
