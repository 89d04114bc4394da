use serde::{Deserialize, Serialize};

/// Tunables for a convergence run. Every field has a default so an empty
/// settings file (or none at all) is valid.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SettingsDto {
    pub master_hostname: String,
    /// Worker hostname template, `{{number}}` is replaced by the slot number.
    pub worker_hostname: String,
    /// Regex with one capture group for the slot number. Derived from the template when absent.
    pub worker_hostname_pattern: Option<String>,

    pub minimum_os_release: String,
    pub pool_size: usize,
    pub remote_timeout_secs: u64,
    /// `report` or `exclude`.
    pub liveness_policy: String,

    pub kubeconfig_path: String,
    pub remote_kubeconfig_path: String,
    pub api_server_port: u16,

    pub ssh: SshDto,
    pub ansible: AnsibleDto,
    pub commands: CommandsDto,
    pub playbooks: PlaybooksDto,
}

impl Default for SettingsDto {
    fn default() -> Self {
        SettingsDto {
            master_hostname: "kube-master".to_string(),
            worker_hostname: "kube-node-{{number}}".to_string(),
            worker_hostname_pattern: None,
            minimum_os_release: "16".to_string(),
            pool_size: 16,
            remote_timeout_secs: 60,
            liveness_policy: "report".to_string(),
            kubeconfig_path: "config/cluster.conf".to_string(),
            remote_kubeconfig_path: "/etc/kubernetes/admin.conf".to_string(),
            api_server_port: 6443,
            ssh: SshDto::default(),
            ansible: AnsibleDto::default(),
            commands: CommandsDto::default(),
            playbooks: PlaybooksDto::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SshDto {
    pub binary: String,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<String>,
    /// Extra `-o` options, e.g. `StrictHostKeyChecking=no`.
    pub options: Vec<String>,
}

impl Default for SshDto {
    fn default() -> Self {
        SshDto { binary: "ssh".to_string(), user: None, port: None, identity_file: None, options: Vec::new() }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AnsibleDto {
    pub binary: String,
    pub playbook_dir: String,
    pub role_dir: String,
}

impl Default for AnsibleDto {
    fn default() -> Self {
        AnsibleDto {
            binary: "ansible-playbook".to_string(),
            playbook_dir: "ansible/playbooks".to_string(),
            role_dir: "ansible/roles".to_string(),
        }
    }
}

/// Remote commands used by the checks. Opaque to the engine.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CommandsDto {
    pub os_release: String,
    pub runtime_check: String,
    pub tooling_check: String,
    pub cluster_info: String,
    pub membership_check: String,
    pub join_command: String,
    /// Regex with named groups `token` and `hash`, and optionally `endpoint`. Each
    /// alternative of the pattern may name its groups `token_first`/`endpoint_last` instead,
    /// so one pattern matches both argument orders of `kubeadm join`.
    pub join_pattern: String,
}

impl Default for CommandsDto {
    fn default() -> Self {
        CommandsDto {
            os_release: "lsb_release -a".to_string(),
            runtime_check: "which python".to_string(),
            tooling_check: "which kubeadm && which kubelet && which kubectl".to_string(),
            cluster_info: "sudo KUBECONFIG=/etc/kubernetes/admin.conf kubectl cluster-info".to_string(),
            membership_check: "sudo kubectl --kubeconfig /etc/kubernetes/kubelet.conf get nodes".to_string(),
            join_command: "sudo KUBECONFIG=/etc/kubernetes/admin.conf kubeadm token create --print-join-command".to_string(),
            join_pattern: concat!(
                r"kubeadm join\s+(?:--token\s+(?P<token_first>\S+)\s+(?P<endpoint_last>\S+)",
                r"|(?P<endpoint>\S+)\s+--token\s+(?P<token>\S+))",
                r"\s+--discovery-token-ca-cert-hash\s+(?P<hash>\S+)"
            )
            .to_string(),
        }
    }
}

/// Playbook identifiers handed to the playbook runner.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PlaybooksDto {
    pub os_upgrade: String,
    pub runtime_install: String,
    pub tooling_bootstrap: String,
    pub master_init: String,
    pub node_join: String,
}

impl Default for PlaybooksDto {
    fn default() -> Self {
        PlaybooksDto {
            os_upgrade: "16upgrade".to_string(),
            runtime_install: "setup/ansible-bootstrap-ubuntu-16".to_string(),
            tooling_bootstrap: "kubernetes/bootstrap".to_string(),
            master_init: "kubernetes/master-init".to_string(),
            node_join: "kubernetes/node-join".to_string(),
        }
    }
}
