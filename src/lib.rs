//! Canopy: materialized descendant caches for mutable node trees
//!
//! Each node in a stored tree carries a snapshot of its entire subtree and a
//! flat index of its descendant ids. Saves and deletes ripple changes up the
//! ancestor chain, detecting moves and no-op saves by fingerprint, so reads
//! never have to walk the tree.

pub mod cache;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod tooling;
pub mod types;

pub use cache::{HierarchyCache, SaveOutcome};
pub use error::{ApiError, StorageError};
pub use store::{MemoryNodeStore, Node, NodeStore, SledNodeStore};
pub use types::NodeID;
