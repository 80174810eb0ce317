//! Removal Handler
//!
//! Strips a node from its parent's cache before the node itself is deleted.
//! Parent cleanup is best effort: the deletion always goes ahead.

use crate::cache::events::AncestorRole;
use crate::cache::maintainer::{Edit, HierarchyCache, Hop};
use crate::error::ApiError;
use crate::store::Node;
use tracing::info;

impl HierarchyCache {
    /// Remove `node` from its parent's snapshot and index, then ripple upward.
    ///
    /// Never fails; a missing or unwritable parent is reported as an event.
    /// The parent is taken from the stored copy when there is one, since
    /// the caller's copy may predate a move.
    pub fn on_node_removing(&self, node: &Node) {
        let Some(id) = node.id else {
            return;
        };
        let parent = match self.store.get(id) {
            Ok(Some(stored)) => stored.parent,
            _ => node.parent,
        };
        let Some(parent_id) = parent else {
            return;
        };

        self.propagate(
            id,
            vec![Hop {
                child: id,
                ancestor: parent_id,
                role: AncestorRole::Parent,
                edit: Edit::Forget,
            }],
        );
    }

    /// Clean the parent's cache, then delete the node from the store.
    ///
    /// Only the node's own deletion can fail this call.
    pub fn remove(&self, node: &Node) -> Result<(), ApiError> {
        let id = node.require_id()?;
        {
            let lock = self.locks.get_lock(id);
            let _guard = lock.write();
            if self.store.get(id)?.is_none() {
                return Err(ApiError::NodeNotFound(id));
            }
            self.on_node_removing(node);
            self.store.remove(id)?;
        }
        self.locks.forget(id);
        info!(node_id = id, "node removed");
        Ok(())
    }
}
