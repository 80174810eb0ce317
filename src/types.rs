//! Core types shared across the store, the cache engine and the CLI.

/// NodeID: Store-assigned identifier of a tree node, stable for the node's lifetime
pub type NodeID = u64;

/// Properties: Opaque structured blob carried by every node
pub type Properties = serde_json::Map<String, serde_json::Value>;
