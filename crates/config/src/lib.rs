//! Relog Configuration
//!
//! TOML-based configuration with sensible defaults - a minimal config only
//! names its flows. Rules live in an ordered `[[flow]]` array of tables;
//! per-flow keys keep the names the classic relay used (`src.host`,
//! `src.file`, `dst.host`, `dst.file`).
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use relog_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(
//!     "[[flow]]\nname = \"rule1\"\nsrc.host = \"localhost:5140\"\ndst.file = \"out.log\"",
//! )
//! .unwrap();
//! assert_eq!(config.flow.len(), 1);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [global]
//! queue_size = 1000
//!
//! [log]
//! level = "info"
//!
//! [[flow]]
//! name = "rule1"
//! src.host = "localhost:5140"
//! dst.host = "localhost:6001,localhost:6002"
//! dst.file = "copy.log"
//! ```

mod error;
mod flows;
mod global;
mod logging;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use relog_flow::RuleDescriptor;

pub use error::{ConfigError, Result};
pub use flows::{DstSection, FlowSection, SrcSection};
pub use global::GlobalConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};

/// Main configuration structure
///
/// All sections are optional with sensible defaults; only the flows carry
/// required content.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings (queue sizes, timeouts, retry policy)
    pub global: GlobalConfig,

    /// Logging configuration
    pub log: LogConfig,

    /// Relay rules, in configured order
    pub flow: Vec<FlowSection>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Resolve every `[[flow]]` section into a rule descriptor
    ///
    /// `base_dir` anchors relative file paths (the config file's directory
    /// when loaded from disk).
    ///
    /// # Errors
    ///
    /// Returns the first resolution failure, naming the flow and key, or
    /// [`ConfigError::NoFlows`] when no flows are configured at all.
    pub fn resolve_rules(&self, base_dir: Option<&Path>) -> Result<Vec<RuleDescriptor>> {
        if self.flow.is_empty() {
            return Err(ConfigError::NoFlows);
        }

        self.flow
            .iter()
            .map(|section| section.resolve(base_dir))
            .collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
