use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::api::settings_dto::SshDto;
use crate::domain::node::Node;
use crate::domain::remote::RemoteProbe;
use crate::error::{Error, Result};

/// Exit status ssh itself uses for connection and authentication failures.
const SSH_TRANSPORT_FAILURE: i32 = 255;

/// [`RemoteProbe`] backed by the system `ssh` client.
///
/// Every call runs under the configured timeout and races the shared cancellation token;
/// the child process is killed when either fires.
pub struct SshProbe {
    config: SshDto,
    timeout: Duration,
    cancel: CancellationToken,
}

impl SshProbe {
    pub fn new(config: SshDto, timeout: Duration, cancel: CancellationToken) -> Self {
        SshProbe { config, timeout, cancel }
    }

    pub fn ssh_args(&self, node: &Node, remote_command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.timeout.as_secs().max(1)),
        ];
        if let Some(port) = self.config.port {
            args.extend(["-p".to_string(), port.to_string()]);
        }
        if let Some(identity_file) = &self.config.identity_file {
            args.extend(["-i".to_string(), identity_file.clone()]);
        }
        for option in &self.config.options {
            args.extend(["-o".to_string(), option.clone()]);
        }

        let destination = match &self.config.user {
            Some(user) => format!("{}@{}", user, node.ip),
            None => node.ip.clone(),
        };
        args.extend([destination, "--".to_string(), remote_command.to_string()]);
        args
    }

    async fn exec(&self, node: &Node, remote_command: &str) -> Result<Output> {
        let mut command = Command::new(&self.config.binary);
        command.args(self.ssh_args(node, remote_command)).stdin(Stdio::null()).kill_on_drop(true);
        log::debug!("[{}] $ {}", node.ip, remote_command);

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(self.timeout, command.output()) => match result {
                Ok(output) => output.map_err(|e| Error::probe(&node.ip, format!("could not start '{}': {}", self.config.binary, e))),
                Err(_) => Err(Error::TimeoutError { node: node.ip.clone(), secs: self.timeout.as_secs() }),
            },
        }
    }

    /// Runs a command that has to succeed.
    async fn exec_success(&self, node: &Node, remote_command: &str) -> Result<Output> {
        let output = self.exec(node, remote_command).await?;
        if !output.status.success() {
            return Err(Error::probe(
                &node.ip,
                format!("'{}' exited with {}: {}", remote_command, output.status, String::from_utf8_lossy(&output.stderr).trim()),
            ));
        }
        Ok(output)
    }
}

fn is_valid_hostname(hostname: &str) -> bool {
    !hostname.is_empty()
        && hostname.len() <= 253
        && hostname.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        && !hostname.starts_with('-')
}

#[async_trait]
impl RemoteProbe for SshProbe {
    async fn ping(&self, node: &Node) -> Result<bool> {
        match self.exec(node, "true").await {
            Ok(output) => Ok(output.status.success()),
            Err(Error::TimeoutError { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn hostname(&self, node: &Node) -> Result<String> {
        let hostname = self.remote_command(node, "hostname").await?.trim().to_string();
        if hostname.is_empty() {
            return Err(Error::probe(&node.ip, "empty hostname"));
        }
        Ok(hostname)
    }

    async fn change_hostname(&self, node: &Node, new_hostname: &str, old_hostname: &str) -> Result<()> {
        if !is_valid_hostname(new_hostname) {
            return Err(Error::ConfigError(format!("refusing to set invalid hostname '{}'", new_hostname)));
        }

        let mut command = format!("sudo hostnamectl set-hostname {}", new_hostname);
        if is_valid_hostname(old_hostname) {
            command.push_str(&format!(" && sudo sed -i 's/\\b{}\\b/{}/g' /etc/hosts", old_hostname.replace('.', "\\."), new_hostname));
        }

        self.exec_success(node, &command).await?;
        log::info!("[{}] hostname {} -> {}", node.ip, old_hostname, new_hostname);
        Ok(())
    }

    async fn remote_check(&self, node: &Node, command: &str) -> Result<bool> {
        let output = self.exec(node, command).await?;
        if output.status.code() == Some(SSH_TRANSPORT_FAILURE) {
            return Err(Error::probe(&node.ip, format!("ssh failed: {}", String::from_utf8_lossy(&output.stderr).trim())));
        }
        Ok(output.status.success())
    }

    async fn remote_command(&self, node: &Node, command: &str) -> Result<String> {
        let output = self.exec_success(node, command).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn download(&self, node: &Node, remote_path: &str, local_path: &Path) -> Result<()> {
        let output = self.exec_success(node, &format!("sudo cat {}", remote_path)).await?;

        if let Some(parent) = local_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, &output.stdout).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::Role;

    fn probe(config: SshDto, cancel: CancellationToken) -> SshProbe {
        SshProbe::new(config, Duration::from_secs(10), cancel)
    }

    #[test]
    fn test_ssh_args() {
        let config = SshDto {
            user: Some("ubuntu".to_string()),
            port: Some(2222),
            identity_file: Some("~/.ssh/cluster".to_string()),
            options: vec!["StrictHostKeyChecking=no".to_string()],
            ..SshDto::default()
        };
        let node = Node::new("10.0.0.5", Role::Worker);

        let args = probe(config, CancellationToken::new()).ssh_args(&node, "which python");

        assert_eq!(
            args,
            vec![
                "-o",
                "BatchMode=yes",
                "-o",
                "ConnectTimeout=10",
                "-p",
                "2222",
                "-i",
                "~/.ssh/cluster",
                "-o",
                "StrictHostKeyChecking=no",
                "ubuntu@10.0.0.5",
                "--",
                "which python",
            ]
        );
    }

    #[test]
    fn test_is_valid_hostname() {
        assert!(is_valid_hostname("kube-node-1"));
        assert!(is_valid_hostname("kube-node-1.lan"));
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("-rf"));
        assert!(!is_valid_hostname("node; reboot"));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits_calls() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let node = Node::new("10.0.0.5", Role::Worker);

        let result = probe(SshDto::default(), cancel).ping(&node).await;

        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_hung_call_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("hanging-ssh");
        std::fs::write(&binary, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = SshDto { binary: binary.display().to_string(), ..SshDto::default() };
        let probe = SshProbe::new(config, Duration::from_millis(300), CancellationToken::new());
        let node = Node::new("10.0.0.5", Role::Worker);

        let started = std::time::Instant::now();
        let result = probe.remote_command(&node, "hostname").await;
        assert!(matches!(result, Err(Error::TimeoutError { ref node, .. }) if node == "10.0.0.5"));

        assert!(!probe.ping(&node).await.unwrap());
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
