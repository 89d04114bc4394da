use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::node::Node;
use crate::error::Result;

/// Extra variables handed to a playbook run.
pub type ExtraVars = Map<String, Value>;

/// Executes commands on a single machine.
///
/// A negative answer (`Ok(false)` from [`RemoteProbe::ping`] or [`RemoteProbe::remote_check`])
/// is a normal outcome. `Err` is reserved for calls that could not be carried out at all.
#[async_trait]
pub trait RemoteProbe: Send + Sync {
    async fn ping(&self, node: &Node) -> Result<bool>;

    async fn hostname(&self, node: &Node) -> Result<String>;

    async fn change_hostname(&self, node: &Node, new_hostname: &str, old_hostname: &str) -> Result<()>;

    /// Runs `command` and reports whether it exited successfully.
    async fn remote_check(&self, node: &Node, command: &str) -> Result<bool>;

    /// Runs `command`, which must succeed, and returns its standard output.
    async fn remote_command(&self, node: &Node, command: &str) -> Result<String>;

    /// Copies `remote_path` from the node to `local_path`, creating the parent directory.
    async fn download(&self, node: &Node, remote_path: &str, local_path: &Path) -> Result<()>;
}

/// Runs a named provisioning procedure against a set of nodes.
///
/// A failure reported for any targeted node fails the whole call.
#[async_trait]
pub trait PlaybookRunner: Send + Sync {
    async fn run(&self, nodes: &[Node], playbook: &str, extra_vars: ExtraVars) -> Result<()>;
}
