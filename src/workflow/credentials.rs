use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::node::{Node, NodeId, NodeSet};
use crate::engine::{Report, Step, StepContext};
use crate::error::Result;
use crate::workflow::fleet::Fleet;

/// Copies the cluster admin kubeconfig from the master unless a local copy already exists.
pub struct FetchCredentials {
    fleet: Fleet,
    remote_path: String,
    local_path: PathBuf,
}

impl FetchCredentials {
    pub const NAME: &'static str = "Copying cluster configuration";

    pub fn new(fleet: Fleet, remote_path: String, local_path: PathBuf) -> Self {
        FetchCredentials { fleet, remote_path, local_path }
    }
}

#[async_trait]
impl Step for FetchCredentials {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn check(&self, nodes: &mut NodeSet) -> Result<Option<Vec<NodeId>>> {
        if tokio::fs::try_exists(&self.local_path).await? {
            return Ok(Some(Vec::new()));
        }
        Ok(Some(vec![nodes.master_id()]))
    }

    fn has_exec(&self) -> bool {
        true
    }

    async fn exec(&self, nodes: &mut NodeSet, cx: &StepContext) -> Result<()> {
        for id in &cx.items {
            log::info!("Downloading kubeconfig to {}", self.local_path.display());
            self.fleet.probe.download(nodes.get(*id), &self.remote_path, &self.local_path).await?;
        }
        Ok(())
    }

    fn report(&self, node: &Node) -> Report {
        Report::Ok(format!("{}:{} -> {}", node.ip, self.remote_path, self.local_path.display()))
    }
}
