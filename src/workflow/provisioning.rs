use async_trait::async_trait;

use crate::domain::node::{NodeId, NodeSet};
use crate::domain::release::ReleaseVersion;
use crate::domain::remote::ExtraVars;
use crate::engine::{Step, StepContext};
use crate::error::Result;
use crate::workflow::fleet::Fleet;

/// Upgrades nodes whose OS release is below the configured minimum.
pub struct UpgradeOs {
    fleet: Fleet,
    release_command: String,
    minimum: ReleaseVersion,
    playbook: String,
}

impl UpgradeOs {
    pub const NAME: &'static str = "Upgrading OS release";

    pub fn new(fleet: Fleet, release_command: String, minimum: ReleaseVersion, playbook: String) -> Self {
        UpgradeOs { fleet, release_command, minimum, playbook }
    }
}

#[async_trait]
impl Step for UpgradeOs {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn list_title(&self) -> Option<&str> {
        Some("Nodes to upgrade")
    }

    async fn check(&self, nodes: &mut NodeSet) -> Result<Option<Vec<NodeId>>> {
        let ids = self.fleet.all(nodes);
        let probe = &self.fleet.probe;
        let command = self.release_command.as_str();
        let nodes: &NodeSet = nodes;

        let releases = self
            .fleet
            .mapper
            .map(ids.iter().copied(), |id| async move {
                let output = probe.remote_command(nodes.get(id), command).await?;
                ReleaseVersion::from_lsb_release(&output)
            })
            .await?;

        let outdated = ids
            .iter()
            .zip(releases)
            .filter(|(id, release)| {
                log::debug!("{} runs release {}", nodes.get(**id).ip, release);
                *release < self.minimum
            })
            .map(|(id, _)| *id)
            .collect();
        Ok(Some(outdated))
    }

    fn has_exec(&self) -> bool {
        true
    }

    async fn exec(&self, nodes: &mut NodeSet, cx: &StepContext) -> Result<()> {
        self.fleet.run_playbook(nodes, &cx.items, &self.playbook, ExtraVars::new()).await
    }
}

/// Which nodes a [`RemoteCheckStep`] looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Master,
}

/// Runs a remote check on every node in scope and a playbook on the nodes where it fails.
pub struct RemoteCheckStep {
    name: &'static str,
    list_title: &'static str,
    fleet: Fleet,
    scope: Scope,
    command: String,
    playbook: String,
}

impl RemoteCheckStep {
    pub const INSTALL_RUNTIME: &'static str = "Installing runtime prerequisites";
    pub const BOOTSTRAP_TOOLING: &'static str = "Bootstrapping cluster tooling";
    pub const INIT_MASTER: &'static str = "Initialising master";

    pub fn new(name: &'static str, list_title: &'static str, fleet: Fleet, scope: Scope, command: String, playbook: String) -> Self {
        RemoteCheckStep { name, list_title, fleet, scope, command, playbook }
    }

    fn in_scope(&self, nodes: &NodeSet) -> Vec<NodeId> {
        match self.scope {
            Scope::All => self.fleet.all(nodes),
            Scope::Master => self.fleet.master(nodes),
        }
    }
}

#[async_trait]
impl Step for RemoteCheckStep {
    fn name(&self) -> &str {
        self.name
    }

    fn list_title(&self) -> Option<&str> {
        Some(self.list_title)
    }

    async fn check(&self, nodes: &mut NodeSet) -> Result<Option<Vec<NodeId>>> {
        let ids = self.in_scope(nodes);
        let missing = self.fleet.failing_check(nodes, &ids, &self.command).await?;
        Ok(Some(missing))
    }

    fn has_exec(&self) -> bool {
        true
    }

    async fn exec(&self, nodes: &mut NodeSet, cx: &StepContext) -> Result<()> {
        self.fleet.run_playbook(nodes, &cx.items, &self.playbook, ExtraVars::new()).await
    }
}
