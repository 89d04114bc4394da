#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kube_converge::api::node_dto::NodeDto;
use kube_converge::api::settings_dto::{CommandsDto, PlaybooksDto};
use kube_converge::domain::mapper::ConcurrentMapper;
use kube_converge::domain::node::{Node, NodeSet};
use kube_converge::domain::registry::NodeRegistry;
use kube_converge::domain::remote::{ExtraVars, PlaybookRunner, RemoteProbe};
use kube_converge::domain::settings::LivenessPolicy;
use kube_converge::error::{Error, Result};
use kube_converge::workflow::Fleet;

pub const JOIN_OUTPUT: &str = "kubeadm join 10.0.0.1:6443 --token abcdef.0123456789abcdef --discovery-token-ca-cert-hash sha256:feedbeef\n";

/// One simulated host.
#[derive(Debug, Clone)]
pub struct Machine {
    pub alive: bool,
    pub hostname: String,
    pub release: String,
    pub has_runtime: bool,
    pub has_tooling: bool,
    pub cluster_initialised: bool,
    pub joined: bool,
}

impl Machine {
    /// A freshly installed host that needs every step.
    pub fn fresh(hostname: &str) -> Machine {
        Machine {
            alive: true,
            hostname: hostname.to_string(),
            release: "14.04".to_string(),
            has_runtime: false,
            has_tooling: false,
            cluster_initialised: false,
            joined: false,
        }
    }

    pub fn dead(hostname: &str) -> Machine {
        Machine { alive: false, ..Machine::fresh(hostname) }
    }

    pub fn with_release(mut self, release: &str) -> Machine {
        self.release = release.to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct PlaybookRun {
    pub playbook: String,
    pub ips: Vec<String>,
    pub extra_vars: ExtraVars,
}

#[derive(Debug, Default)]
pub struct ClusterState {
    pub machines: HashMap<String, Machine>,
    pub playbook_runs: Vec<PlaybookRun>,
    pub join_output: String,
}

/// A simulated cluster answering remote checks from shared state. Playbooks and renames
/// mutate that state, so a second run observes the effects of the first.
#[derive(Debug, Clone)]
pub struct MockCluster {
    state: Arc<Mutex<ClusterState>>,
    order: Vec<(String, Option<String>)>,
    commands: CommandsDto,
    playbooks: PlaybooksDto,
}

impl MockCluster {
    /// The first machine is the master, the rest are workers.
    pub fn new(machines: Vec<(&str, Machine)>) -> MockCluster {
        let order = machines
            .iter()
            .enumerate()
            .map(|(index, (ip, _))| (ip.to_string(), if index == 0 { Some("master".to_string()) } else { None }))
            .collect();
        let state = ClusterState {
            machines: machines.into_iter().map(|(ip, machine)| (ip.to_string(), machine)).collect(),
            playbook_runs: Vec::new(),
            join_output: JOIN_OUTPUT.to_string(),
        };

        MockCluster { state: Arc::new(Mutex::new(state)), order, commands: CommandsDto::default(), playbooks: PlaybooksDto::default() }
    }

    pub fn set_join_output(&self, output: &str) {
        self.state.lock().unwrap().join_output = output.to_string();
    }

    pub fn machine(&self, ip: &str) -> Machine {
        self.state.lock().unwrap().machines[ip].clone()
    }

    pub fn playbook_runs(&self) -> Vec<PlaybookRun> {
        self.state.lock().unwrap().playbook_runs.clone()
    }

    pub fn runs_of(&self, playbook: &str) -> Vec<PlaybookRun> {
        self.playbook_runs().into_iter().filter(|run| run.playbook == playbook).collect()
    }

    /// The node set as a node file would describe this cluster.
    pub fn node_set(&self) -> NodeSet {
        let dtos = self.order.iter().map(|(ip, role)| NodeDto::new(ip.clone(), role.as_deref())).collect();
        NodeRegistry::from_dtos(dtos).unwrap()
    }

    pub fn fleet(&self, policy: LivenessPolicy) -> Fleet {
        Fleet::new(Arc::new(self.clone()), Arc::new(self.clone()), ConcurrentMapper::new(4), policy)
    }

    fn reachable<R>(&self, node: &Node, f: impl FnOnce(&mut Machine) -> R) -> Result<R> {
        let mut state = self.state.lock().unwrap();
        let machine = state.machines.get_mut(&node.ip).ok_or_else(|| Error::probe(&node.ip, "unknown host"))?;
        if !machine.alive {
            return Err(Error::probe(&node.ip, "connection refused"));
        }
        Ok(f(machine))
    }
}

#[async_trait]
impl RemoteProbe for MockCluster {
    async fn ping(&self, node: &Node) -> Result<bool> {
        Ok(self.state.lock().unwrap().machines.get(&node.ip).map(|machine| machine.alive).unwrap_or(false))
    }

    async fn hostname(&self, node: &Node) -> Result<String> {
        self.reachable(node, |machine| machine.hostname.clone())
    }

    async fn change_hostname(&self, node: &Node, new_hostname: &str, _old_hostname: &str) -> Result<()> {
        self.reachable(node, |machine| machine.hostname = new_hostname.to_string())
    }

    async fn remote_check(&self, node: &Node, command: &str) -> Result<bool> {
        let commands = &self.commands;
        self.reachable(node, |machine| {
            if command == commands.runtime_check {
                Some(machine.has_runtime)
            } else if command == commands.tooling_check {
                Some(machine.has_tooling)
            } else if command == commands.cluster_info {
                Some(machine.cluster_initialised)
            } else if command == commands.membership_check {
                Some(machine.joined)
            } else {
                None
            }
        })?
        .ok_or_else(|| Error::probe(&node.ip, format!("unexpected check '{}'", command)))
    }

    async fn remote_command(&self, node: &Node, command: &str) -> Result<String> {
        if command == self.commands.os_release {
            return self.reachable(node, |machine| format!("Distributor ID:\tUbuntu\nRelease:\t{}\n", machine.release));
        }
        if command == self.commands.join_command {
            self.reachable(node, |_| ())?;
            return Ok(self.state.lock().unwrap().join_output.clone());
        }
        Err(Error::probe(&node.ip, format!("unexpected command '{}'", command)))
    }

    async fn download(&self, node: &Node, remote_path: &str, local_path: &Path) -> Result<()> {
        self.reachable(node, |_| ())?;
        if let Some(parent) = local_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(local_path, format!("# {} from {}\n", remote_path, node.ip))?;
        Ok(())
    }
}

#[async_trait]
impl PlaybookRunner for MockCluster {
    async fn run(&self, nodes: &[Node], playbook: &str, extra_vars: ExtraVars) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.playbook_runs.push(PlaybookRun {
            playbook: playbook.to_string(),
            ips: nodes.iter().map(|node| node.ip.clone()).collect(),
            extra_vars,
        });

        for node in nodes {
            let machine = state.machines.get_mut(&node.ip).ok_or_else(|| Error::probe(&node.ip, "unknown host"))?;
            if !machine.alive {
                return Err(Error::PlaybookError { playbook: playbook.to_string(), reason: format!("{} unreachable", node.ip) });
            }
            if playbook == self.playbooks.os_upgrade {
                machine.release = "16.04".to_string();
            } else if playbook == self.playbooks.runtime_install {
                machine.has_runtime = true;
            } else if playbook == self.playbooks.tooling_bootstrap {
                machine.has_tooling = true;
            } else if playbook == self.playbooks.master_init {
                machine.cluster_initialised = true;
            } else if playbook == self.playbooks.node_join {
                machine.joined = true;
            }
        }
        Ok(())
    }
}
