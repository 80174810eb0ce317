//! Error types
//!
//! `StorageError` is raised at the node store boundary; `ApiError` is what the
//! cache engine, configuration and CLI layers return.

use crate::types::NodeID;
use thiserror::Error;

/// Errors produced by a `NodeStore` implementation
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Node {0} cannot be its own parent")]
    InvalidParent(NodeID),

    /// Failure injected by a test store
    #[error("Injected failure for node {0}")]
    Injected(NodeID),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors surfaced by the hierarchy cache API and its tooling
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeID),

    /// The node has no id yet, so nothing can be read or removed for it
    #[error("Node has not been saved yet")]
    NotPersisted,

    #[error("Corrupt cache record on node {node_id}: {reason}")]
    CorruptCacheRecord { node_id: NodeID, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
