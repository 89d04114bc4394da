use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use crate::domain::node::{NodeId, NodeSet};
use crate::domain::remote::ExtraVars;
use crate::domain::settings::{JOIN_ENDPOINT_GROUPS, JOIN_HASH_GROUP, JOIN_TOKEN_GROUPS};
use crate::engine::{Step, StepContext};
use crate::error::{Error, Result};
use crate::workflow::fleet::Fleet;

/// Join data printed by `kubeadm token create --print-join-command` on the master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCredentials {
    pub token: String,
    pub ca_cert_hash: String,
    pub endpoint: Option<String>,
}

impl JoinCredentials {
    /// Both argument orders of `kubeadm join` are understood by the default pattern.
    pub fn parse(pattern: &Regex, output: &str) -> Result<Self> {
        let captures = pattern
            .captures(output)
            .ok_or_else(|| Error::parse("join command", format!("{:?} does not match the join pattern", output.trim())))?;
        let group = |names: &[&str]| names.iter().find_map(|name| captures.name(name)).map(|m| m.as_str().to_string());

        let token = group(&JOIN_TOKEN_GROUPS[..]).ok_or_else(|| Error::parse("join command", "no token captured"))?;
        let ca_cert_hash = group(&[JOIN_HASH_GROUP]).ok_or_else(|| Error::parse("join command", "no CA cert hash captured"))?;

        Ok(JoinCredentials { token, ca_cert_hash, endpoint: group(&JOIN_ENDPOINT_GROUPS[..]) })
    }
}

/// Joins workers that are not cluster members yet, using fresh join data from the master.
pub struct JoinWorkers {
    fleet: Fleet,
    membership_check: String,
    join_command: String,
    join_pattern: Regex,
    api_server_port: u16,
    playbook: String,
}

impl JoinWorkers {
    pub const NAME: &'static str = "Joining nodes to cluster";

    pub fn new(fleet: Fleet, membership_check: String, join_command: String, join_pattern: Regex, api_server_port: u16, playbook: String) -> Self {
        JoinWorkers { fleet, membership_check, join_command, join_pattern, api_server_port, playbook }
    }
}

#[async_trait]
impl Step for JoinWorkers {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn list_title(&self) -> Option<&str> {
        Some("Nodes to join")
    }

    async fn check(&self, nodes: &mut NodeSet) -> Result<Option<Vec<NodeId>>> {
        let ids = self.fleet.workers(nodes);
        let outside = self.fleet.failing_check(nodes, &ids, &self.membership_check).await?;
        Ok(Some(outside))
    }

    fn has_exec(&self) -> bool {
        true
    }

    async fn exec(&self, nodes: &mut NodeSet, cx: &StepContext) -> Result<()> {
        let master = nodes.master();
        let output = self.fleet.probe.remote_command(master, &self.join_command).await?;
        let credentials = JoinCredentials::parse(&self.join_pattern, &output)?;
        log::info!("Obtained join data from master {}.", master.ip);

        let mut extra_vars = ExtraVars::new();
        extra_vars.insert("join_token".to_string(), json!(credentials.token));
        extra_vars.insert("cert_hash".to_string(), json!(credentials.ca_cert_hash));
        extra_vars.insert("master_ip".to_string(), json!(format!("{}:{}", master.ip, self.api_server_port)));
        if let Some(endpoint) = credentials.endpoint {
            extra_vars.insert("join_endpoint".to_string(), json!(endpoint));
        }

        self.fleet.run_playbook(nodes, &cx.items, &self.playbook, extra_vars).await
    }
}
