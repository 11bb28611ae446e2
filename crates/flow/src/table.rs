//! Flow table construction and lookup
//!
//! The table is compiled once from resolved rule descriptors. All
//! validation happens here - the engine can assume every flow it is handed
//! has at least one source, at least one destination, and no relay loop.

use std::collections::HashMap;

use relog_protocol::EndpointDescriptor;

use crate::FlowTableError;

/// One resolved relay rule, as produced by the configuration resolver
///
/// Not yet validated; `FlowTable::build` turns a list of these into flows
/// or rejects the whole table.
#[derive(Debug, Clone)]
pub struct RuleDescriptor {
    /// User-chosen rule name (config section name or `cli`)
    pub name: String,

    /// Source endpoints, in configured order
    pub sources: Vec<EndpointDescriptor>,

    /// Destination endpoints, in configured order
    pub destinations: Vec<EndpointDescriptor>,
}

/// One validated flow: a named set of sources fanned out to destinations
///
/// Flows own their descriptors exclusively; two flows targeting the same
/// address still get separate adapters at runtime, so no socket state is
/// ever shared across flows.
#[derive(Debug, Clone)]
pub struct Flow {
    name: String,
    sources: Vec<EndpointDescriptor>,
    destinations: Vec<EndpointDescriptor>,
}

impl Flow {
    /// The rule name, unique within its table
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source endpoints in configured order (never empty)
    #[inline]
    pub fn sources(&self) -> &[EndpointDescriptor] {
        &self.sources
    }

    /// Destination endpoints in configured order (never empty)
    #[inline]
    pub fn destinations(&self) -> &[EndpointDescriptor] {
        &self.destinations
    }
}

/// Ordered, read-only mapping from rule name to flow
///
/// Built once before the engine starts; no entries are added or removed
/// afterwards. Iteration preserves the order rules were configured in.
#[derive(Debug, Clone, Default)]
pub struct FlowTable {
    flows: Vec<Flow>,
    index: HashMap<String, usize>,
}

impl FlowTable {
    /// Build a table from resolved rule descriptors
    ///
    /// # Errors
    ///
    /// Returns the first violation found, naming the offending rule:
    /// an empty table, a duplicate rule name, a rule without sources or
    /// without destinations, or a rule whose destination loops back into
    /// one of its own sources.
    pub fn build(rules: Vec<RuleDescriptor>) -> Result<Self, FlowTableError> {
        if rules.is_empty() {
            return Err(FlowTableError::Empty);
        }

        let mut flows = Vec::with_capacity(rules.len());
        let mut index = HashMap::with_capacity(rules.len());

        for rule in rules {
            if rule.sources.is_empty() {
                return Err(FlowTableError::NoSources { rule: rule.name });
            }
            if rule.destinations.is_empty() {
                return Err(FlowTableError::NoDestinations { rule: rule.name });
            }
            if let Some(endpoint) = detect_loop(&rule) {
                return Err(FlowTableError::RelayLoop {
                    rule: rule.name,
                    endpoint,
                });
            }
            if index.contains_key(&rule.name) {
                return Err(FlowTableError::DuplicateRule { rule: rule.name });
            }

            index.insert(rule.name.clone(), flows.len());
            flows.push(Flow {
                name: rule.name,
                sources: rule.sources,
                destinations: rule.destinations,
            });
        }

        Ok(Self { flows, index })
    }

    /// Iterate flows in configured order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Flow> {
        self.flows.iter()
    }

    /// Look up a flow by rule name
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Flow> {
        self.index.get(name).map(|&i| &self.flows[i])
    }

    /// Number of flows
    #[inline]
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// Whether the table holds no flows (only possible via `Default`)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Whether any flow binds a privileged port
    ///
    /// Consumed by the surrounding process before adapters open: if this is
    /// true and the process lacks the rights to bind low ports, startup is
    /// halted with a permission error instead of failing bind-by-bind.
    pub fn requires_privilege(&self) -> bool {
        self.flows
            .iter()
            .flat_map(|f| f.sources.iter())
            .any(EndpointDescriptor::is_privileged)
    }
}

/// Find a destination that feeds straight back into one of the rule's own
/// sources: same socket address on both sides, or the same file read and
/// written. Returns the endpoint's display id.
fn detect_loop(rule: &RuleDescriptor) -> Option<String> {
    for dst in &rule.destinations {
        for src in &rule.sources {
            let loops = match (dst, src) {
                (
                    EndpointDescriptor::SocketSend {
                        transport: dt,
                        host: dh,
                        port: dp,
                    },
                    EndpointDescriptor::SocketListen {
                        transport: st,
                        host: sh,
                        port: sp,
                    },
                ) => dt == st && dp == sp && dh == sh,
                (
                    EndpointDescriptor::FileWrite { path: dpath },
                    EndpointDescriptor::FileRead { path: spath, .. },
                ) => dpath == spath,
                _ => false,
            };
            if loops {
                return Some(dst.id().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;
