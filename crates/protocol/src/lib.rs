//! Relog Protocol - shared vocabulary
//!
//! Types spoken by every other crate in the relay:
//!
//! - [`Record`] - one opaque log line plus provenance
//! - [`EndpointId`] - display identifier for one adapter
//! - [`EndpointDescriptor`] - resolved, validated description of one endpoint
//! - [`Transport`] - UDP (datagram per record) or TCP (newline-delimited)
//!
//! # Design Principles
//!
//! - **Records are opaque**: payloads are never parsed or validated; routing
//!   is decided entirely by flow membership, never by content.
//! - **Descriptors are immutable**: host lists are expanded and validated
//!   once, at resolution time; adapters are built from finished descriptors.
//! - **Zero-copy payloads**: `bytes::Bytes` so fan-out clones are cheap.

mod endpoint;
mod error;
mod record;

pub use endpoint::{anchor_path, EndpointDescriptor, Transport, DEFAULT_SYSLOG_PORT};
pub use error::EndpointError;
pub use record::{trim_line, EndpointId, Record};
