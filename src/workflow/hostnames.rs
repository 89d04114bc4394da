use async_trait::async_trait;

use crate::domain::hostname::HostnameAllocator;
use crate::domain::node::{Node, NodeId, NodeSet};
use crate::engine::{Report, Step, StepContext};
use crate::error::Result;
use crate::workflow::fleet::Fleet;

/// Converges hostnames: the master to the fixed master hostname, workers to stable numbered names.
///
/// `current_hostname` keeps the probed value after the rename, so the report shows both names.
pub struct RenameHosts {
    fleet: Fleet,
    allocator: HostnameAllocator,
}

impl RenameHosts {
    pub const NAME: &'static str = "Changing hostnames";

    pub fn new(fleet: Fleet, allocator: HostnameAllocator) -> Self {
        RenameHosts { fleet, allocator }
    }
}

#[async_trait]
impl Step for RenameHosts {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn list_title(&self) -> Option<&str> {
        Some("Nodes to change hostname on")
    }

    async fn check(&self, nodes: &mut NodeSet) -> Result<Option<Vec<NodeId>>> {
        let ids = self.fleet.all(nodes);
        let probe = &self.fleet.probe;

        let current = {
            let nodes: &NodeSet = nodes;
            self.fleet.mapper.map(ids.iter().copied(), |id| probe.hostname(nodes.get(id))).await?
        };
        for (id, hostname) in ids.iter().zip(current) {
            nodes.get_mut(*id).current_hostname = Some(hostname);
        }

        // Slot bookkeeping happens here, on the controlling task, after all probes returned.
        let mut changed = self.allocator.allocate(nodes, &ids)?;

        // An excluded worker may hold any number, so none can safely be handed out.
        let excluded = nodes.worker_ids().len() - self.fleet.workers(nodes).len();
        if excluded > 0 {
            let held: Vec<NodeId> = changed.iter().copied().filter(|id| !nodes.get(*id).is_master()).collect();
            for id in &held {
                let node = nodes.get_mut(*id);
                log::warn!(
                    "Not renaming {} to {}: {} unreachable worker(s) may already use that name.",
                    node.ip,
                    node.hostname.as_deref().unwrap_or("?"),
                    excluded
                );
                node.hostname = node.current_hostname.clone();
            }
            changed.retain(|id| !held.contains(id));
        }

        Ok(Some(changed))
    }

    fn has_exec(&self) -> bool {
        true
    }

    async fn exec(&self, nodes: &mut NodeSet, cx: &StepContext) -> Result<()> {
        let probe = &self.fleet.probe;
        let nodes: &NodeSet = nodes;

        self.fleet
            .mapper
            .map(cx.items.iter().copied(), |id| async move {
                let node = nodes.get(id);
                let new_hostname = node.hostname.as_deref().unwrap_or_default();
                let old_hostname = node.current_hostname.as_deref().unwrap_or_default();
                probe.change_hostname(node, new_hostname, old_hostname).await
            })
            .await?;
        Ok(())
    }

    fn report(&self, node: &Node) -> Report {
        Report::Ok(format!(
            "{}    {} -> {}",
            node.ip,
            node.current_hostname.as_deref().unwrap_or("?"),
            node.hostname.as_deref().unwrap_or("?")
        ))
    }
}
