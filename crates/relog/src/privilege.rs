//! Privilege check for privileged listen ports
//!
//! Consulted once, before any adapter opens: if the flow table needs a
//! privileged bind and the process lacks the rights, startup halts with a
//! permission error instead of failing bind-by-bind halfway through.

use anyhow::{bail, Result};
use relog_flow::FlowTable;

/// Halt startup if the table needs a privileged bind the process cannot do
pub fn check_bind_privilege(table: &FlowTable) -> Result<()> {
    if !table.requires_privilege() || has_net_bind_privilege() {
        return Ok(());
    }
    bail!(
        "configuration binds a privileged port (below 1024) but the process \
         is not running as root - rerun with elevated rights or move the \
         listen ports above 1023"
    );
}

/// Whether the process may bind ports below 1024
///
/// Checks the effective uid only; a CAP_NET_BIND_SERVICE grant is not
/// detected and will still be caught by the bind itself.
#[cfg(unix)]
fn has_net_bind_privilege() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn has_net_bind_privilege() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use relog_flow::{FlowTable, RuleDescriptor};
    use relog_protocol::EndpointDescriptor;

    use super::*;

    fn table(listen: &str) -> FlowTable {
        FlowTable::build(vec![RuleDescriptor {
            name: "rule".into(),
            sources: EndpointDescriptor::parse_listen_list(listen).unwrap(),
            destinations: EndpointDescriptor::parse_send_list("localhost:6001").unwrap(),
        }])
        .unwrap()
    }

    #[test]
    fn test_unprivileged_ports_always_pass() {
        check_bind_privilege(&table("localhost:5140")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_privileged_port_requires_root() {
        let result = check_bind_privilege(&table("localhost:514"));
        let is_root = unsafe { libc::geteuid() == 0 };
        assert_eq!(result.is_ok(), is_root);
    }
}
