//! Sled-backed node store
//!
//! Nodes live in a dedicated `nodes` tree keyed by the big-endian id, so
//! iteration order is id order. Values are JSON because the properties blob
//! is arbitrary JSON.

use super::{check_parent, Node, NodeStore};
use crate::error::StorageError;
use crate::types::NodeID;
use serde::Deserialize;
use std::path::Path;

const NODES_TREE: &str = "nodes";

/// Nesting decoded directly; serde_json refuses more than 128 levels
const INLINE_DECODE_DEPTH: usize = 64;
const DECODE_STACK_BASE: usize = 256 * 1024;
const DECODE_STACK_PER_LEVEL: usize = 8 * 1024;

/// Deepest object/array nesting in a JSON document, skipping string contents
fn nesting_depth(bytes: &[u8]) -> usize {
    let (mut depth, mut deepest) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);
    for &b in bytes {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

pub struct SledNodeStore {
    db: sled::Db,
    nodes: sled::Tree,
}

impl SledNodeStore {
    /// Open (or create) a store at `path`
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Io(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Open a throwaway store that is deleted when dropped
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let nodes = db.open_tree(NODES_TREE)?;
        Ok(Self { db, nodes })
    }

    /// Decode a stored node. Deep subtrees nest the JSON well past
    /// serde_json's default recursion limit, so those are parsed without the
    /// limit on a stack sized to the nesting.
    fn decode(bytes: &[u8]) -> Result<Node, StorageError> {
        let depth = nesting_depth(bytes);
        if depth <= INLINE_DECODE_DEPTH {
            return Ok(serde_json::from_slice(bytes)?);
        }
        let stack_size = DECODE_STACK_BASE + depth * DECODE_STACK_PER_LEVEL;
        stacker::grow(stack_size, || -> Result<Node, StorageError> {
            let mut de = serde_json::Deserializer::from_slice(bytes);
            de.disable_recursion_limit();
            let node = Node::deserialize(&mut de)?;
            de.end()?;
            Ok(node)
        })
    }
}

impl NodeStore for SledNodeStore {
    fn get(&self, id: NodeID) -> Result<Option<Node>, StorageError> {
        match self.nodes.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, node: &mut Node) -> Result<NodeID, StorageError> {
        let id = match node.id {
            Some(id) => id,
            // generate_id starts at zero; ids are kept non-zero
            None => self.db.generate_id()? + 1,
        };
        check_parent(id, node)?;

        node.id = Some(id);
        let bytes = serde_json::to_vec(node)?;
        self.nodes.insert(id.to_be_bytes(), bytes)?;
        Ok(id)
    }

    fn remove(&self, id: NodeID) -> Result<bool, StorageError> {
        Ok(self.nodes.remove(id.to_be_bytes())?.is_some())
    }

    fn list_all(&self) -> Result<Vec<Node>, StorageError> {
        let mut out = Vec::new();
        for item in self.nodes.iter() {
            let (_, bytes) = item?;
            out.push(Self::decode(&bytes)?);
        }
        Ok(out)
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}
