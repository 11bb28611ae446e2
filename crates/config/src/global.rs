//! Global configuration settings
//!
//! These settings apply across all flows and provide sensible defaults.

use std::time::Duration;

use serde::Deserialize;

/// Global configuration that applies to every flow
///
/// All fields have sensible defaults - only specify what you want to change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Records buffered per destination before its sources backpressure
    /// Default: 1000
    pub queue_size: usize,

    /// Maximum record size; larger datagrams/lines are dropped
    /// Default: 8192
    pub max_message_size: usize,

    /// Cadence at which buffering destinations are flushed
    /// Default: 100ms
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,

    /// Grace period per task at shutdown before it is reported as leaked
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// Connect timeout for TCP endpoints
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Per-record write timeout for TCP destinations
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// Total write attempts per record before a TCP destination is dead
    /// Default: 3
    pub retry_attempts: usize,

    /// Wait between write attempts
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub retry_interval: Duration,

    /// Poll interval between EOF checks when tailing a file
    /// Default: 500ms
    #[serde(with = "humantime_serde")]
    pub file_poll_interval: Duration,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            queue_size: 1000,
            max_message_size: 8192,
            flush_interval: Duration::from_millis(100),
            shutdown_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
            retry_attempts: 3,
            retry_interval: Duration::from_secs(1),
            file_poll_interval: Duration::from_millis(500),
        }
    }
}
