use std::path::Path;

use crate::api::node_dto::NodeDto;
use crate::domain::node::{Node, NodeSet, Role};
use crate::error::{Error, Result};
use crate::loader::parser::parse_config_file;

/// Loads the node file and turns it into a validated [`NodeSet`].
pub struct NodeRegistry;

impl NodeRegistry {
    pub fn load(file_path: &Path) -> Result<NodeSet> {
        let dtos: Vec<NodeDto> = parse_config_file(file_path)?;
        log::info!("Loaded {} node entries from '{}'.", dtos.len(), file_path.display());

        Self::from_dtos(dtos)
    }

    /// Drops nodes flagged for removal, then partitions by role.
    pub fn from_dtos(dtos: Vec<NodeDto>) -> Result<NodeSet> {
        let mut nodes = Vec::with_capacity(dtos.len());

        for dto in dtos.into_iter().filter(|dto| dto.remove != Some(true)) {
            if dto.ip.trim().is_empty() {
                return Err(Error::ConfigError("node entry without ip".to_string()));
            }
            let role = Role::parse(dto.role.as_deref())?;
            nodes.push(Node::new(dto.ip, role));
        }

        let node_set = NodeSet::new(nodes)?;
        log::info!("Node set: master {} and {} worker(s).", node_set.master().ip, node_set.workers().count());

        Ok(node_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_masters_are_rejected() {
        let result = NodeRegistry::from_dtos(vec![NodeDto::new("10.0.0.1", Some("master")), NodeDto::new("10.0.0.2", Some("master"))]);

        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_zero_masters_are_rejected() {
        let result = NodeRegistry::from_dtos(vec![NodeDto::new("10.0.0.1", None)]);

        match result {
            Err(Error::ConfigError(message)) => assert_eq!(message, "no master node"),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = NodeRegistry::from_dtos(vec![NodeDto::new("10.0.0.1", Some("master")), NodeDto::new("10.0.0.2", Some("etcd"))]);

        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_removed_nodes_are_filtered_before_partitioning() {
        let mut removed_master = NodeDto::new("10.0.0.9", Some("master"));
        removed_master.remove = Some(true);
        let mut removed_worker = NodeDto::new("10.0.0.8", None);
        removed_worker.remove = Some(true);

        let nodes = NodeRegistry::from_dtos(vec![
            removed_master,
            NodeDto::new("10.0.0.1", Some("master")),
            removed_worker,
            NodeDto::new("10.0.0.2", None),
            NodeDto::new("10.0.0.3", Some("node")),
        ])
        .unwrap();

        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes.master().ip, "10.0.0.1");
        assert_eq!(nodes.workers().map(|n| n.ip.as_str()).collect::<Vec<_>>(), vec!["10.0.0.2", "10.0.0.3"]);
        assert!(nodes.workers().all(|n| n.role == Role::Worker));
    }

    #[test]
    fn test_master_only_cluster_is_valid() {
        let nodes = NodeRegistry::from_dtos(vec![NodeDto::new("10.0.0.1", Some("master"))]).unwrap();

        assert_eq!(nodes.len(), 1);
        assert!(nodes.worker_ids().is_empty());
    }
}
