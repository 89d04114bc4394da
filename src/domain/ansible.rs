use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::api::settings_dto::{AnsibleDto, SshDto};
use crate::domain::node::Node;
use crate::domain::remote::{ExtraVars, PlaybookRunner};
use crate::error::{Error, Result};

/// [`PlaybookRunner`] that shells out to `ansible-playbook` with an inline inventory.
///
/// Playbook identifiers are paths relative to the playbook directory, without the `.yml`
/// extension. No timeout applies since provisioning runs are long; cancellation still does.
pub struct AnsiblePlaybookRunner {
    config: AnsibleDto,
    remote_user: Option<String>,
    cancel: CancellationToken,
}

impl AnsiblePlaybookRunner {
    pub fn new(config: AnsibleDto, ssh: &SshDto, cancel: CancellationToken) -> Self {
        AnsiblePlaybookRunner { config, remote_user: ssh.user.clone(), cancel }
    }

    pub fn playbook_path(&self, playbook: &str) -> PathBuf {
        PathBuf::from(&self.config.playbook_dir).join(format!("{}.yml", playbook))
    }

    pub fn playbook_args(&self, nodes: &[Node], playbook: &str, extra_vars: &ExtraVars) -> Vec<String> {
        // Trailing comma makes ansible read the list as hosts, not as an inventory path.
        let inventory: String = nodes.iter().map(|node| format!("{},", node.ip)).collect();

        let mut args = vec!["-i".to_string(), inventory];
        if let Some(user) = &self.remote_user {
            args.extend(["-u".to_string(), user.clone()]);
        }
        if !extra_vars.is_empty() {
            args.extend(["--extra-vars".to_string(), serde_json::Value::Object(extra_vars.clone()).to_string()]);
        }
        args.push(self.playbook_path(playbook).display().to_string());
        args
    }
}

#[async_trait]
impl PlaybookRunner for AnsiblePlaybookRunner {
    async fn run(&self, nodes: &[Node], playbook: &str, extra_vars: ExtraVars) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }

        let mut command = Command::new(&self.config.binary);
        command
            .args(self.playbook_args(nodes, playbook, &extra_vars))
            .env("ANSIBLE_ROLES_PATH", &self.config.role_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let targets: Vec<&str> = nodes.iter().map(|node| node.ip.as_str()).collect();
        log::info!("Running playbook '{}' on {}", playbook, targets.join(", "));
        let started = std::time::Instant::now();

        let status = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            status = command.status() => status.map_err(|e| Error::PlaybookError {
                playbook: playbook.to_string(),
                reason: format!("could not start '{}': {}", self.config.binary, e),
            })?,
        };

        if !status.success() {
            return Err(Error::PlaybookError { playbook: playbook.to_string(), reason: format!("exited with {}", status) });
        }

        log::info!("[TIMING] Playbook '{}' completed in {}ms", playbook, started.elapsed().as_millis());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::Role;
    use serde_json::json;

    #[test]
    fn test_playbook_args() {
        let ssh = SshDto { user: Some("ubuntu".to_string()), ..SshDto::default() };
        let runner = AnsiblePlaybookRunner::new(AnsibleDto::default(), &ssh, CancellationToken::new());
        let nodes = vec![Node::new("10.0.0.2", Role::Worker), Node::new("10.0.0.3", Role::Worker)];
        let mut extra_vars = ExtraVars::new();
        extra_vars.insert("join_token".to_string(), json!("abc.def"));

        let args = runner.playbook_args(&nodes, "kubernetes/node-join", &extra_vars);

        assert_eq!(
            args,
            vec![
                "-i",
                "10.0.0.2,10.0.0.3,",
                "-u",
                "ubuntu",
                "--extra-vars",
                r#"{"join_token":"abc.def"}"#,
                "ansible/playbooks/kubernetes/node-join.yml",
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_playbook_is_an_error() {
        let config = AnsibleDto { binary: "false".to_string(), ..AnsibleDto::default() };
        let runner = AnsiblePlaybookRunner::new(config, &SshDto::default(), CancellationToken::new());

        let result = runner.run(&[Node::new("10.0.0.2", Role::Worker)], "kubernetes/bootstrap", ExtraVars::new()).await;

        assert!(matches!(result, Err(Error::PlaybookError { .. })));
    }

    #[tokio::test]
    async fn test_empty_target_list_is_a_no_op() {
        let config = AnsibleDto { binary: "false".to_string(), ..AnsibleDto::default() };
        let runner = AnsiblePlaybookRunner::new(config, &SshDto::default(), CancellationToken::new());

        assert!(runner.run(&[], "kubernetes/bootstrap", ExtraVars::new()).await.is_ok());
    }
}
