//! In-memory node store
//!
//! Used by tests and benches, and by anything embedding the engine without a
//! persistent backend. Supports injecting save failures for a chosen id.

use super::{check_parent, Node, NodeStore};
use crate::error::StorageError;
use crate::types::NodeID;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct MemoryNodeStore {
    nodes: RwLock<BTreeMap<NodeID, Node>>,
    next_id: AtomicU64,
    failing_saves: RwLock<HashSet<NodeID>>,
    save_counts: RwLock<HashMap<NodeID, usize>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            failing_saves: RwLock::new(HashSet::new()),
            save_counts: RwLock::new(HashMap::new()),
        }
    }

    /// Make every subsequent save of `id` fail until `heal` is called
    pub fn fail_saves_for(&self, id: NodeID) {
        self.failing_saves.write().insert(id);
    }

    pub fn heal(&self, id: NodeID) {
        self.failing_saves.write().remove(&id);
    }

    /// Number of successful saves of `id` since the store was created
    pub fn saves_of(&self, id: NodeID) -> usize {
        self.save_counts.read().get(&id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

impl Default for MemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore for MemoryNodeStore {
    fn get(&self, id: NodeID) -> Result<Option<Node>, StorageError> {
        Ok(self.nodes.read().get(&id).cloned())
    }

    fn save(&self, node: &mut Node) -> Result<NodeID, StorageError> {
        let id = match node.id {
            Some(id) => id,
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        if self.failing_saves.read().contains(&id) {
            return Err(StorageError::Injected(id));
        }
        check_parent(id, node)?;

        node.id = Some(id);
        self.nodes.write().insert(id, node.clone());
        *self.save_counts.write().entry(id).or_insert(0) += 1;
        Ok(id)
    }

    fn remove(&self, id: NodeID) -> Result<bool, StorageError> {
        Ok(self.nodes.write().remove(&id).is_some())
    }

    fn list_all(&self) -> Result<Vec<Node>, StorageError> {
        Ok(self.nodes.read().values().cloned().collect())
    }
}
