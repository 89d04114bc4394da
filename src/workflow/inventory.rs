use async_trait::async_trait;

use crate::domain::node::{Node, NodeId, NodeSet};
use crate::domain::settings::LivenessPolicy;
use crate::engine::{Report, Step};
use crate::error::{Error, Result};
use crate::workflow::fleet::Fleet;

pub struct ReportMaster;

impl ReportMaster {
    pub const NAME: &'static str = "Master node";
}

#[async_trait]
impl Step for ReportMaster {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn list(&self, nodes: &mut NodeSet) -> Result<Vec<NodeId>> {
        Ok(vec![nodes.master_id()])
    }
}

pub struct ReportWorkers;

impl ReportWorkers {
    pub const NAME: &'static str = "Nodes";
}

#[async_trait]
impl Step for ReportWorkers {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn list(&self, nodes: &mut NodeSet) -> Result<Vec<NodeId>> {
        Ok(nodes.worker_ids())
    }
}

/// Probes every node and records whether it answered.
///
/// Unreachable nodes are flagged. Under [`LivenessPolicy::Exclude`] later steps skip them,
/// and an unreachable master ends the run.
pub struct PingNodes {
    fleet: Fleet,
}

impl PingNodes {
    pub const NAME: &'static str = "Pinging nodes";

    pub fn new(fleet: Fleet) -> Self {
        PingNodes { fleet }
    }
}

#[async_trait]
impl Step for PingNodes {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn list(&self, nodes: &mut NodeSet) -> Result<Vec<NodeId>> {
        let ids = nodes.ids();
        let probe = &self.fleet.probe;

        let alive = {
            let nodes: &NodeSet = nodes;
            self.fleet.mapper.map(ids.iter().copied(), |id| probe.ping(nodes.get(id))).await?
        };
        for (id, alive) in ids.iter().zip(alive) {
            nodes.get_mut(*id).alive = Some(alive);
        }

        if self.fleet.policy == LivenessPolicy::Exclude {
            let master = nodes.master();
            if master.alive != Some(true) {
                return Err(Error::probe(&master.ip, "master is unreachable"));
            }
            let excluded = nodes.iter().filter(|(_, node)| node.alive == Some(false)).count();
            if excluded > 0 {
                log::warn!("{} unreachable node(s) are excluded from the remaining steps.", excluded);
            }
        }

        Ok(ids)
    }

    fn report(&self, node: &Node) -> Report {
        let line = format!("{}   role: {}", node.ip, node.role);
        if node.alive == Some(true) { Report::Ok(line) } else { Report::Flagged(line) }
    }
}
