//! The cluster bootstrap workflow: the ordered list of convergence steps.

pub mod credentials;
pub mod fleet;
pub mod hostnames;
pub mod inventory;
pub mod join;
pub mod provisioning;

use crate::domain::settings::Settings;
use crate::engine::{Step, WorkflowRun};

pub use credentials::FetchCredentials;
pub use fleet::Fleet;
pub use hostnames::RenameHosts;
pub use inventory::{PingNodes, ReportMaster, ReportWorkers};
pub use join::{JoinCredentials, JoinWorkers};
pub use provisioning::{RemoteCheckStep, Scope, UpgradeOs};

/// Composition root of a convergence run.
pub struct ClusterBootstrapWorkflow {
    fleet: Fleet,
    settings: Settings,
}

impl ClusterBootstrapWorkflow {
    pub fn new(fleet: Fleet, settings: Settings) -> Self {
        ClusterBootstrapWorkflow { fleet, settings }
    }

    pub fn build(self) -> WorkflowRun {
        let ClusterBootstrapWorkflow { fleet, settings } = self;
        let commands = settings.commands;
        let playbooks = settings.playbooks;

        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(ReportMaster),
            Box::new(ReportWorkers),
            Box::new(PingNodes::new(fleet.clone())),
            Box::new(RenameHosts::new(fleet.clone(), settings.hostnames)),
            Box::new(UpgradeOs::new(fleet.clone(), commands.os_release, settings.minimum_os_release, playbooks.os_upgrade)),
            Box::new(RemoteCheckStep::new(
                RemoteCheckStep::INSTALL_RUNTIME,
                "Nodes to install runtime prerequisites on",
                fleet.clone(),
                Scope::All,
                commands.runtime_check,
                playbooks.runtime_install,
            )),
            Box::new(RemoteCheckStep::new(
                RemoteCheckStep::BOOTSTRAP_TOOLING,
                "Nodes to bootstrap",
                fleet.clone(),
                Scope::All,
                commands.tooling_check,
                playbooks.tooling_bootstrap,
            )),
            Box::new(RemoteCheckStep::new(
                RemoteCheckStep::INIT_MASTER,
                "Master to bootstrap",
                fleet.clone(),
                Scope::Master,
                commands.cluster_info,
                playbooks.master_init,
            )),
            Box::new(JoinWorkers::new(
                fleet.clone(),
                commands.membership_check,
                commands.join_command,
                settings.join_pattern,
                settings.api_server_port,
                playbooks.node_join,
            )),
            Box::new(FetchCredentials::new(fleet, settings.remote_kubeconfig_path, settings.kubeconfig_path)),
        ];

        WorkflowRun::new(steps)
    }
}
