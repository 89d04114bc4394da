use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::ansible::AnsiblePlaybookRunner;
use crate::domain::mapper::ConcurrentMapper;
use crate::domain::node::NodeSet;
use crate::domain::registry::NodeRegistry;
use crate::domain::settings::Settings;
use crate::domain::ssh::SshProbe;
use crate::engine::{RunReport, TaskEngine};
use crate::error::Result;
use crate::workflow::{ClusterBootstrapWorkflow, Fleet};

pub mod api;
pub mod domain;
pub mod engine;
pub mod error;
pub mod loader;
pub mod logger;
pub mod workflow;

/// Loads the node file and converges the cluster over ssh and ansible-playbook.
pub async fn converge(nodes_path: &Path, settings: Settings, cancel: CancellationToken) -> Result<RunReport> {
    let mut nodes = NodeRegistry::load(nodes_path)?;

    let probe = Arc::new(SshProbe::new(settings.ssh.clone(), settings.remote_timeout, cancel.clone()));
    let playbooks = Arc::new(AnsiblePlaybookRunner::new(settings.ansible.clone(), &settings.ssh, cancel.clone()));
    let fleet = Fleet::new(probe, playbooks, ConcurrentMapper::new(settings.pool_size), settings.liveness_policy);

    converge_with(fleet, settings, &mut nodes, cancel).await
}

/// Converges `nodes` through the given collaborators.
pub async fn converge_with(fleet: Fleet, settings: Settings, nodes: &mut NodeSet, cancel: CancellationToken) -> Result<RunReport> {
    let run = ClusterBootstrapWorkflow::new(fleet, settings).build();
    log::info!("Workflow built with {} steps.", run.steps().len());

    TaskEngine::new(cancel).run(&run, nodes).await
}
