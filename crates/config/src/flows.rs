//! Flow rule sections
//!
//! One `[[flow]]` section per relay rule. Recognized keys match the classic
//! relay's configuration: `src.host`, `src.file`, `dst.host`, `dst.file`,
//! plus `src.connect` (read-remote) and `src.follow` (tail instead of
//! replay). Unknown keys are rejected rather than ignored.
//!
//! # Example
//!
//! ```toml
//! [[flow]]
//! name = "rule1"
//! src.host = "localhost:5140"
//! src.file = "capture.log"
//! src.follow = true
//! dst.host = "udp://10.0.0.1:514,tcp://10.0.0.2:514"
//! dst.file = "copy.log"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use relog_flow::RuleDescriptor;
use relog_protocol::{anchor_path, EndpointDescriptor};

use crate::ConfigError;

/// One `[[flow]]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowSection {
    /// User-chosen rule name, unique across the config
    pub name: String,

    /// Source keys
    #[serde(default)]
    pub src: SrcSection,

    /// Destination keys
    #[serde(default)]
    pub dst: DstSection,
}

/// `src.*` keys of a flow section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SrcSection {
    /// Comma-separated listen list (`host:port`, optional `udp://`/`tcp://`)
    pub host: Option<String>,

    /// Comma-separated read-remote list (`tcp://host:port`)
    pub connect: Option<String>,

    /// File to read, one record per line
    pub file: Option<PathBuf>,

    /// Tail the file for appended lines instead of stopping at EOF
    pub follow: bool,
}

/// `dst.*` keys of a flow section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DstSection {
    /// Comma-separated send list (`host:port`, optional `udp://`/`tcp://`)
    pub host: Option<String>,

    /// File to append to, one record per line
    pub file: Option<PathBuf>,
}

impl FlowSection {
    /// Resolve this section into a rule descriptor
    ///
    /// Expands host lists, anchors relative file paths against `base_dir`,
    /// and enforces "at least one source and one destination" before the
    /// flow table ever sees the rule.
    pub fn resolve(&self, base_dir: Option<&Path>) -> Result<RuleDescriptor, ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::UnnamedFlow);
        }
        let name = self.name.clone();

        let endpoint_err = |key: &'static str| {
            let flow = name.clone();
            move |source| ConfigError::InvalidEndpoint { flow, key, source }
        };

        let mut sources = Vec::new();
        if let Some(ref hosts) = self.src.host {
            sources.extend(
                EndpointDescriptor::parse_listen_list(hosts).map_err(endpoint_err("src.host"))?,
            );
        }
        if let Some(ref connects) = self.src.connect {
            sources.extend(
                EndpointDescriptor::parse_connect_list(connects)
                    .map_err(endpoint_err("src.connect"))?,
            );
        }
        match self.src.file {
            Some(ref file) => {
                sources.push(EndpointDescriptor::file_read(
                    anchor_path(file, base_dir),
                    self.src.follow,
                ));
            }
            None if self.src.follow => {
                return Err(ConfigError::FollowWithoutFile { flow: name.clone() });
            }
            None => {}
        }
        if sources.is_empty() {
            return Err(ConfigError::NoSources { flow: name.clone() });
        }

        let mut destinations = Vec::new();
        if let Some(ref hosts) = self.dst.host {
            destinations.extend(
                EndpointDescriptor::parse_send_list(hosts).map_err(endpoint_err("dst.host"))?,
            );
        }
        if let Some(ref file) = self.dst.file {
            destinations.push(EndpointDescriptor::file_write(anchor_path(file, base_dir)));
        }
        if destinations.is_empty() {
            return Err(ConfigError::NoDestinations { flow: name.clone() });
        }

        Ok(RuleDescriptor {
            name,
            sources,
            destinations,
        })
    }
}
