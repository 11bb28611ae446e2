//! Relog Flow Table
//!
//! The flow table groups endpoint descriptors into named flows and is the
//! single structure the relay engine executes. It is compiled once from
//! resolved configuration and read-only afterwards; restarting with a new
//! configuration means building a new table.
//!
//! # Example
//!
//! ```
//! use relog_flow::{FlowTable, RuleDescriptor};
//! use relog_protocol::EndpointDescriptor;
//!
//! let rule = RuleDescriptor {
//!     name: "rule1".into(),
//!     sources: EndpointDescriptor::parse_listen_list("localhost:5140").unwrap(),
//!     destinations: EndpointDescriptor::parse_send_list("localhost:6001").unwrap(),
//! };
//!
//! let table = FlowTable::build(vec![rule]).unwrap();
//! assert_eq!(table.len(), 1);
//! assert!(!table.requires_privilege());
//! ```

mod error;
mod table;

pub use error::FlowTableError;
pub use table::{Flow, FlowTable, RuleDescriptor};
