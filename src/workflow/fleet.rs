use std::sync::Arc;

use crate::domain::mapper::ConcurrentMapper;
use crate::domain::node::{NodeId, NodeSet};
use crate::domain::remote::{ExtraVars, PlaybookRunner, RemoteProbe};
use crate::domain::settings::LivenessPolicy;
use crate::error::Result;

/// The collaborators every convergence step works through.
#[derive(Clone)]
pub struct Fleet {
    pub probe: Arc<dyn RemoteProbe>,
    pub playbooks: Arc<dyn PlaybookRunner>,
    pub mapper: ConcurrentMapper,
    pub policy: LivenessPolicy,
}

impl Fleet {
    pub fn new(probe: Arc<dyn RemoteProbe>, playbooks: Arc<dyn PlaybookRunner>, mapper: ConcurrentMapper, policy: LivenessPolicy) -> Self {
        Fleet { probe, playbooks, mapper, policy }
    }

    fn admitted(&self, nodes: &NodeSet, ids: Vec<NodeId>) -> Vec<NodeId> {
        ids.into_iter().filter(|id| self.policy.admits(nodes.get(*id))).collect()
    }

    /// Every node the liveness policy lets through.
    pub fn all(&self, nodes: &NodeSet) -> Vec<NodeId> {
        self.admitted(nodes, nodes.ids())
    }

    pub fn master(&self, nodes: &NodeSet) -> Vec<NodeId> {
        self.admitted(nodes, vec![nodes.master_id()])
    }

    pub fn workers(&self, nodes: &NodeSet) -> Vec<NodeId> {
        self.admitted(nodes, nodes.worker_ids())
    }

    /// Nodes among `ids` on which `command` does not succeed.
    pub async fn failing_check(&self, nodes: &NodeSet, ids: &[NodeId], command: &str) -> Result<Vec<NodeId>> {
        let probe = &self.probe;
        self.mapper.filter_by_predicate(ids, |id| async move { Ok(!probe.remote_check(nodes.get(id), command).await?) }).await
    }

    pub async fn run_playbook(&self, nodes: &NodeSet, ids: &[NodeId], playbook: &str, extra_vars: ExtraVars) -> Result<()> {
        self.playbooks.run(&nodes.select(ids), playbook, extra_vars).await
    }
}
