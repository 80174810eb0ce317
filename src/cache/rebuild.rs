//! Cache rebuild
//!
//! Recomputes every cache record from the stored parent pointers. This is the
//! recovery path for caches left stale by best-effort ripple failures: it
//! reads the whole store once, builds every subtree bottom-up in memory and
//! writes each record back.

use crate::cache::fingerprint::compute_fingerprint;
use crate::cache::maintainer::HierarchyCache;
use crate::cache::record::{CacheRecord, DescendantSnapshot, SnapshotEntry};
use crate::error::ApiError;
use crate::store::Node;
use crate::types::NodeID;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Summary of a rebuild
#[derive(Debug, Clone, Default, Serialize)]
pub struct RebuildReport {
    pub nodes: usize,
    /// Records whose persisted content changed
    pub rewritten: usize,
    /// Nodes naming a parent that does not exist; cached as top level
    pub orphans: Vec<NodeID>,
    /// Nodes caught in a parent cycle; left untouched
    pub unreachable: Vec<NodeID>,
}

struct Forest {
    nodes: BTreeMap<NodeID, Node>,
    children: HashMap<NodeID, Vec<NodeID>>,
    roots: Vec<NodeID>,
    orphans: Vec<NodeID>,
}

impl Forest {
    fn new(all: Vec<Node>) -> Self {
        let nodes: BTreeMap<NodeID, Node> = all
            .into_iter()
            .filter_map(|n| n.id.map(|id| (id, n)))
            .collect();
        let mut children: HashMap<NodeID, Vec<NodeID>> = HashMap::new();
        let mut roots = Vec::new();
        let mut orphans = Vec::new();
        for (id, node) in &nodes {
            match node.parent {
                Some(parent) if nodes.contains_key(&parent) => {
                    children.entry(parent).or_default().push(*id);
                }
                Some(_) => {
                    orphans.push(*id);
                    roots.push(*id);
                }
                None => roots.push(*id),
            }
        }
        Self {
            nodes,
            children,
            roots,
            orphans,
        }
    }

    /// Post-order walk from `root`, filling `built` with every subtree under it
    fn build(&self, root: NodeID, built: &mut HashMap<NodeID, DescendantSnapshot>) {
        // (node, children already queued)
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            let children = self.children.get(&id).map(Vec::as_slice).unwrap_or(&[]);
            if !expanded {
                stack.push((id, true));
                stack.extend(children.iter().map(|child| (*child, false)));
                continue;
            }
            let mut snapshot = DescendantSnapshot::new();
            for child in children {
                if let (Some(node), Some(sub)) = (self.nodes.get(child), built.get(child)) {
                    snapshot.insert(*child, SnapshotEntry::of(node, sub.clone()));
                }
            }
            built.insert(id, snapshot);
        }
    }
}

impl HierarchyCache {
    /// Recompute and persist the cache record of every stored node
    pub fn rebuild_all(&self) -> Result<RebuildReport, ApiError> {
        let forest = Forest::new(self.store.list_all()?);
        let mut built: HashMap<NodeID, DescendantSnapshot> = HashMap::new();
        for root in &forest.roots {
            forest.build(*root, &mut built);
        }

        let mut report = RebuildReport {
            nodes: forest.nodes.len(),
            orphans: forest.orphans.clone(),
            ..Default::default()
        };
        for id in forest.nodes.keys() {
            let Some(snapshot) = built.remove(id) else {
                report.unreachable.push(*id);
                continue;
            };

            let lock = self.locks.get_lock(*id);
            let _guard = lock.write();
            // Re-read under the lock so fields edited meanwhile are kept
            let Some(mut current) = self.store.get(*id)? else {
                continue;
            };
            let mut record = CacheRecord {
                fingerprint: Some(compute_fingerprint(&current, &snapshot)),
                previous_parent: current.parent,
                descendants: snapshot,
                ..Default::default()
            };
            record.reindex();
            if CacheRecord::from_node(&current).ok().as_ref() == Some(&record) {
                continue;
            }
            record.write_into(&mut current.properties)?;
            self.store.save(&mut current)?;
            report.rewritten += 1;
        }
        self.store.flush()?;

        if !report.unreachable.is_empty() {
            warn!(count = report.unreachable.len(), "nodes in parent cycles were skipped");
        }
        info!(
            nodes = report.nodes,
            rewritten = report.rewritten,
            orphans = report.orphans.len(),
            "hierarchy cache rebuilt"
        );
        Ok(report)
    }
}
