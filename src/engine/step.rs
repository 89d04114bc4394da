use async_trait::async_trait;

use crate::domain::node::{Node, NodeId, NodeSet};
use crate::error::Result;

/// One report line for a listed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Ok(String),
    /// The item is marked in the output; the step carries on.
    Flagged(String),
}

/// Per-step state handed from check (or list) to exec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    /// Actionable nodes when the step has a check, listed nodes otherwise.
    pub items: Vec<NodeId>,
}

/// A named, idempotent unit of the workflow.
///
/// * `check` returns the actionable subset, or `None` when the step has no check. An empty
///   subset means the step has converged and `exec` is skipped.
/// * `list` produces the items of a step without a check.
/// * `exec` applies the step's effect. Without a check it always runs.
/// * `report` renders one line per item after exec.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    /// Heading printed above the items.
    fn list_title(&self) -> Option<&str> {
        None
    }

    async fn list(&self, _nodes: &mut NodeSet) -> Result<Vec<NodeId>> {
        Ok(Vec::new())
    }

    async fn check(&self, _nodes: &mut NodeSet) -> Result<Option<Vec<NodeId>>> {
        Ok(None)
    }

    fn has_exec(&self) -> bool {
        false
    }

    async fn exec(&self, _nodes: &mut NodeSet, _cx: &StepContext) -> Result<()> {
        Ok(())
    }

    fn report(&self, node: &Node) -> Report {
        Report::Ok(node.ip.clone())
    }
}
