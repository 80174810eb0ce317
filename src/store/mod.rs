//! Node Store
//!
//! The persistent object store the hierarchy cache is layered on. A node is a
//! generic tree entry: parent reference, ordering key, display and short
//! names, a publication flag and an opaque properties blob. The cache engine
//! only needs get/save/remove, so any backend implementing `NodeStore` works.

pub mod memory;
pub mod persistence;

pub use memory::MemoryNodeStore;
pub use persistence::SledNodeStore;

use crate::error::{ApiError, StorageError};
use crate::types::{NodeID, Properties};
use serde::{Deserialize, Serialize};

/// Node: one entry of the stored tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Assigned by the store on first save
    pub id: Option<NodeID>,
    /// `None` places the node at the top level
    pub parent: Option<NodeID>,
    /// Sibling ordering key
    pub position: i64,
    /// Display name
    pub title: String,
    /// Short name / slug
    pub alias: String,
    pub published: bool,
    #[serde(default)]
    pub properties: Properties,
}

impl Node {
    /// Create an unsaved, published top-level node
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        let alias = title.to_lowercase().replace(' ', "-");
        Self {
            id: None,
            parent: None,
            position: 0,
            title,
            alias,
            published: true,
            properties: Properties::new(),
        }
    }

    pub fn with_parent(mut self, parent: Option<NodeID>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_position(mut self, position: i64) -> Self {
        self.position = position;
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    /// Id of a node that has been saved at least once
    pub fn require_id(&self) -> Result<NodeID, ApiError> {
        self.id.ok_or(ApiError::NotPersisted)
    }
}

/// Node Store interface
pub trait NodeStore: Send + Sync {
    fn get(&self, id: NodeID) -> Result<Option<Node>, StorageError>;

    /// Persist the node's current in-memory state.
    ///
    /// Assigns an id to a node saved for the first time and writes it back
    /// into `node.id`. Rejects a node that names itself as parent.
    fn save(&self, node: &mut Node) -> Result<NodeID, StorageError>;

    /// Delete a node. Returns whether a record existed.
    ///
    /// Children are left in place; re-parenting them is the caller's concern.
    fn remove(&self, id: NodeID) -> Result<bool, StorageError>;

    /// List every stored node, ordered by id
    fn list_all(&self) -> Result<Vec<Node>, StorageError>;

    /// Flush any buffered writes to disk. Default implementation is a no-op.
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Shared self-parent check for store implementations
pub(crate) fn check_parent(id: NodeID, node: &Node) -> Result<(), StorageError> {
    if node.parent == Some(id) {
        return Err(StorageError::InvalidParent(id));
    }
    Ok(())
}
