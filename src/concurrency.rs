//! Per-node write serialization for cache maintenance
//!
//! Every settle of a node, whether it is the node being saved or an ancestor
//! reached by a ripple, runs under that node's write lock. This closes the
//! lost-update race on an ancestor's cache record between writers sharing
//! one `HierarchyCache`. Locks are only ever taken upward along a chain, so
//! lock order follows tree depth.

use crate::types::NodeID;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-node lock manager
pub struct NodeLockManager {
    /// Map from NodeID to per-node read-write lock
    locks: RwLock<HashMap<NodeID, Arc<RwLock<()>>>>,
}

impl NodeLockManager {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the lock for a node
    pub fn get_lock(&self, node_id: NodeID) -> Arc<RwLock<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(&node_id) {
                return lock.clone();
            }
        }

        // Double-check after acquiring write lock (another thread might have created it)
        let mut map = self.locks.write();
        map.entry(node_id)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Drop the lock entry of a deleted node
    pub fn forget(&self, node_id: NodeID) {
        self.locks.write().remove(&node_id);
    }

    pub fn tracked(&self) -> usize {
        self.locks.read().len()
    }
}

impl Default for NodeLockManager {
    fn default() -> Self {
        Self::new()
    }
}
