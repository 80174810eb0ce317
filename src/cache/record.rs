//! Cache Record
//!
//! The engine's reserved sub-structure inside a node's properties blob. The
//! blob is only touched here: `CacheRecord::from_node` decodes the reserved
//! key into typed form and `CacheRecord::write_into` encodes it back, leaving
//! every other property untouched.

use crate::cache::flatten::flatten;
use crate::error::{ApiError, StorageError};
use crate::store::Node;
use crate::types::{NodeID, Properties};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

/// Properties key holding the cache record
pub const CACHE_NAMESPACE: &str = "hierarchy";

/// One descendant as cached on an ancestor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub alias: String,
    pub title: String,
    pub published: bool,
    pub position: i64,
    #[serde(default)]
    pub children: DescendantSnapshot,
}

impl SnapshotEntry {
    /// Entry describing `node` with the given subtree
    pub fn of(node: &Node, children: DescendantSnapshot) -> Self {
        Self {
            alias: node.alias.clone(),
            title: node.title.clone(),
            published: node.published,
            position: node.position,
            children,
        }
    }
}

/// Descendant Snapshot: nested map of every descendant, keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescendantSnapshot(BTreeMap<NodeID, SnapshotEntry>);

impl DescendantSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeID) -> Option<&SnapshotEntry> {
        self.0.get(&id)
    }

    pub fn insert(&mut self, id: NodeID, entry: SnapshotEntry) -> Option<SnapshotEntry> {
        self.0.insert(id, entry)
    }

    pub fn remove(&mut self, id: NodeID) -> Option<SnapshotEntry> {
        self.0.remove(&id)
    }

    /// Whether `id` is an immediate child in this snapshot
    pub fn contains(&self, id: NodeID) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Immediate children in id order
    pub fn iter(&self) -> btree_map::Iter<'_, NodeID, SnapshotEntry> {
        self.0.iter()
    }

    /// Immediate children ordered by (position, id), the order a listing shows
    pub fn ordered(&self) -> Vec<(NodeID, &SnapshotEntry)> {
        let mut out: Vec<(NodeID, &SnapshotEntry)> =
            self.0.iter().map(|(id, e)| (*id, e)).collect();
        out.sort_by(|(id_a, a), (id_b, b)| a.position.cmp(&b.position).then(id_a.cmp(id_b)));
        out
    }
}

impl FromIterator<(NodeID, SnapshotEntry)> for DescendantSnapshot {
    fn from_iter<I: IntoIterator<Item = (NodeID, SnapshotEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Descendant Index: flat id set, persisted as `{"<id>": true}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescendantIndex(BTreeMap<NodeID, bool>);

impl DescendantIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NodeID) {
        self.0.insert(id, true);
    }

    pub fn remove(&mut self, id: NodeID) -> bool {
        self.0.remove(&id).is_some()
    }

    pub fn contains(&self, id: NodeID) -> bool {
        self.0.get(&id).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.values().filter(|v| **v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> BTreeSet<NodeID> {
        self.0
            .iter()
            .filter_map(|(id, present)| present.then_some(*id))
            .collect()
    }
}

impl FromIterator<NodeID> for DescendantIndex {
    fn from_iter<I: IntoIterator<Item = NodeID>>(iter: I) -> Self {
        Self(iter.into_iter().map(|id| (id, true)).collect())
    }
}

/// Cache Record: what a node remembers about its last save and its subtree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Fingerprint as of the last save; `None` before the first one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Parent as of the last save
    #[serde(default)]
    pub previous_parent: Option<NodeID>,
    #[serde(default, rename = "children")]
    pub descendants: DescendantSnapshot,
    #[serde(default, rename = "children_ids")]
    pub index: DescendantIndex,
}

impl CacheRecord {
    /// Decode the record from a node's properties. A missing key is an empty record.
    pub fn from_node(node: &Node) -> Result<Self, ApiError> {
        match node.properties.get(CACHE_NAMESPACE) {
            None => Ok(Self::default()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                ApiError::CorruptCacheRecord {
                    node_id: node.id.unwrap_or_default(),
                    reason: e.to_string(),
                }
            }),
        }
    }

    /// Encode the record under the reserved key, replacing only that key
    pub fn write_into(&self, properties: &mut Properties) -> Result<(), ApiError> {
        let value = serde_json::to_value(self).map_err(StorageError::from)?;
        properties.insert(CACHE_NAMESPACE.to_string(), value);
        Ok(())
    }

    /// Whether the node has completed at least one save
    pub fn is_settled(&self) -> bool {
        self.fingerprint.is_some()
    }

    /// Insert or replace a child's entry and re-derive the index
    pub fn set_child(&mut self, child: NodeID, entry: SnapshotEntry) {
        self.descendants.insert(child, entry);
        self.reindex();
    }

    /// Drop a child's entry (and with it the child's subtree) and re-derive the index
    pub fn forget_child(&mut self, child: NodeID) -> Option<SnapshotEntry> {
        let removed = self.descendants.remove(child);
        self.index.remove(child);
        self.reindex();
        removed
    }

    /// Rebuild the index from the snapshot so the two never diverge
    pub fn reindex(&mut self) {
        self.index = flatten(&self.descendants, DescendantIndex::new());
    }
}
