use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master,
    Worker,
}

impl Role {
    /// Parses the role column of the node file. `None` and the legacy `node` spelling mean worker.
    pub fn parse(role: Option<&str>) -> Result<Role> {
        match role {
            None | Some("worker") | Some("node") => Ok(Role::Worker),
            Some("master") => Ok(Role::Master),
            Some(other) => Err(Error::ConfigError(format!("invalid node role '{}'", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => write!(f, "master"),
            Role::Worker => write!(f, "worker"),
        }
    }
}

/// Position of a node inside its [`NodeSet`], in configuration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub ip: String,
    pub role: Role,
    /// `None` until the liveness probe ran.
    pub alive: Option<bool>,
    /// Hostname reported by the machine itself.
    pub current_hostname: Option<String>,
    /// Hostname the machine should converge to.
    pub hostname: Option<String>,
}

impl Node {
    pub fn new(ip: impl Into<String>, role: Role) -> Self {
        Node { ip: ip.into(), role, alive: None, current_hostname: None, hostname: None }
    }

    pub fn is_master(&self) -> bool {
        self.role == Role::Master
    }

    /// True when the target hostname is known and differs from the current one.
    pub fn needs_rename(&self) -> bool {
        self.hostname.is_some() && self.hostname != self.current_hostname
    }
}

/// The validated node set: configuration order is kept and exactly one node is the master.
///
/// Master and worker views are index views onto the same storage, so a mutation through
/// [`NodeSet::get_mut`] is visible from every view.
#[derive(Debug, Clone)]
pub struct NodeSet {
    nodes: Vec<Node>,
    master: NodeId,
}

impl NodeSet {
    pub fn new(nodes: Vec<Node>) -> Result<Self> {
        let mut masters = nodes.iter().enumerate().filter(|(_, node)| node.is_master()).map(|(index, _)| NodeId(index));

        let master = masters.next().ok_or_else(|| Error::ConfigError("no master node".to_string()))?;
        if masters.next().is_some() {
            return Err(Error::ConfigError("only 1 master node is supported".to_string()));
        }

        Ok(NodeSet { nodes, master })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(index, node)| (NodeId(index), node))
    }

    pub fn ids(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).map(NodeId).collect()
    }

    pub fn master_id(&self) -> NodeId {
        self.master
    }

    pub fn master(&self) -> &Node {
        self.get(self.master)
    }

    pub fn worker_ids(&self) -> Vec<NodeId> {
        self.iter().filter(|(_, node)| !node.is_master()).map(|(id, _)| id).collect()
    }

    pub fn workers(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| !node.is_master())
    }

    /// Clones the nodes behind `ids`, for collaborators that take owned node lists.
    pub fn select(&self, ids: &[NodeId]) -> Vec<Node> {
        ids.iter().map(|id| self.get(*id).clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> NodeSet {
        NodeSet::new(vec![
            Node::new("10.0.0.2", Role::Worker),
            Node::new("10.0.0.1", Role::Master),
            Node::new("10.0.0.3", Role::Worker),
        ])
        .unwrap()
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse(None).unwrap(), Role::Worker);
        assert_eq!(Role::parse(Some("node")).unwrap(), Role::Worker);
        assert_eq!(Role::parse(Some("master")).unwrap(), Role::Master);
        assert!(matches!(Role::parse(Some("etcd")), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_views_alias_the_same_nodes() {
        let mut nodes = cluster();
        assert_eq!(nodes.master_id(), NodeId(1));
        assert_eq!(nodes.worker_ids(), vec![NodeId(0), NodeId(2)]);

        let master = nodes.master_id();
        nodes.get_mut(master).hostname = Some("kube-master".to_string());
        nodes.get_mut(NodeId(2)).alive = Some(false);

        assert_eq!(nodes.master().hostname.as_deref(), Some("kube-master"));
        assert_eq!(nodes.workers().map(|n| n.alive).collect::<Vec<_>>(), vec![None, Some(false)]);
    }

    #[test]
    fn test_needs_rename() {
        let mut node = Node::new("10.0.0.1", Role::Worker);
        assert!(!node.needs_rename());

        node.current_hostname = Some("kube-node-1".to_string());
        node.hostname = Some("kube-node-1".to_string());
        assert!(!node.needs_rename());

        node.hostname = Some("kube-node-2".to_string());
        assert!(node.needs_rename());
    }
}
