use std::collections::BTreeSet;

use regex::Regex;

use crate::domain::node::{NodeId, NodeSet};
use crate::error::{Error, Result};

const NUMBER_PLACEHOLDER: &str = "{{number}}";

/// Claimed worker hostname numbers. Slot 0 is never handed out.
///
/// Any number a worker already carries can be claimed, however large, so removing a
/// worker from the node file never renumbers the ones that remain.
#[derive(Debug, Default)]
struct SlotTable {
    claimed: BTreeSet<usize>,
}

impl SlotTable {
    /// Claims `slot` if it is still free.
    fn claim(&mut self, slot: usize) -> bool {
        slot != 0 && self.claimed.insert(slot)
    }

    fn claim_lowest_free(&mut self) -> usize {
        let mut slot = 1;
        while !self.claimed.insert(slot) {
            slot += 1;
        }
        slot
    }
}

/// Deterministic hostname assignment that is stable across re-runs.
///
/// The master always gets the fixed master hostname. A worker keeps its current hostname
/// when it already matches the worker pattern and its number is still free; every other
/// worker gets the lowest free number. Workers are processed in configuration order, so
/// when two workers present the same number the first one keeps it.
#[derive(Debug, Clone)]
pub struct HostnameAllocator {
    master_hostname: String,
    template: String,
    pattern: Regex,
}

impl HostnameAllocator {
    pub fn new(master_hostname: String, template: String, pattern: Option<&str>) -> Result<Self> {
        let Some((prefix, suffix)) = template.split_once(NUMBER_PLACEHOLDER) else {
            return Err(Error::ConfigError(format!("worker hostname template '{}' lacks {}", template, NUMBER_PLACEHOLDER)));
        };

        let pattern = match pattern {
            Some(pattern) => pattern.to_string(),
            None => format!(r"^{}(\d+){}$", regex::escape(prefix), regex::escape(suffix)),
        };
        let pattern = Regex::new(&pattern).map_err(|e| Error::ConfigError(format!("invalid worker hostname pattern: {}", e)))?;
        if pattern.captures_len() < 2 {
            return Err(Error::ConfigError(format!("worker hostname pattern '{}' needs a capture group", pattern)));
        }

        let allocator = HostnameAllocator { master_hostname, template, pattern };
        if allocator.slot_of(&allocator.master_hostname).is_some() {
            return Err(Error::ConfigError(format!("master hostname '{}' matches the worker pattern", allocator.master_hostname)));
        }

        Ok(allocator)
    }

    pub fn master_hostname(&self) -> &str {
        &self.master_hostname
    }

    pub fn worker_hostname(&self, slot: usize) -> String {
        self.template.replace(NUMBER_PLACEHOLDER, &slot.to_string())
    }

    /// Number encoded in a hostname that matches the worker pattern.
    pub fn slot_of(&self, hostname: &str) -> Option<usize> {
        self.pattern.captures(hostname)?.get(1)?.as_str().parse().ok()
    }

    /// Sets the target hostname of every node in `ids` and returns the ones that must be renamed.
    ///
    /// Workers must have their current hostname probed already.
    pub fn allocate(&self, nodes: &mut NodeSet, ids: &[NodeId]) -> Result<Vec<NodeId>> {
        let workers: Vec<NodeId> = ids.iter().copied().filter(|id| !nodes.get(*id).is_master()).collect();
        let mut slots = SlotTable::default();

        if let Some(master) = ids.iter().copied().find(|id| nodes.get(*id).is_master()) {
            nodes.get_mut(master).hostname = Some(self.master_hostname.clone());
        }

        let mut unassigned = Vec::new();
        for id in workers {
            let node = nodes.get(id);
            let current = node.current_hostname.clone().ok_or_else(|| Error::probe(&node.ip, "current hostname was not probed"))?;

            match self.slot_of(&current) {
                Some(slot) if slots.claim(slot) => nodes.get_mut(id).hostname = Some(current),
                _ => unassigned.push(id),
            }
        }

        for id in unassigned {
            let slot = slots.claim_lowest_free();
            let hostname = self.worker_hostname(slot);
            log::debug!("Worker {} gets slot {} ({}).", nodes.get(id).ip, slot, hostname);
            nodes.get_mut(id).hostname = Some(hostname);
        }

        Ok(ids.iter().copied().filter(|id| nodes.get(*id).needs_rename()).collect())
    }
}
