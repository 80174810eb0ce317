//! Hierarchy Cache
//!
//! Every node caches a snapshot of its whole descendant subtree plus a flat
//! index of descendant ids, so "all descendants" never needs a recursive
//! query. The cache is kept consistent at save and delete time by rippling
//! changes up the ancestor chain.

pub mod events;
pub mod fingerprint;
pub mod flatten;
pub mod maintainer;
pub mod rebuild;
pub mod record;
pub mod removal;
pub mod verify;

pub use events::{AncestorRole, CacheEvent, CacheObserver, RecordingObserver};
pub use fingerprint::compute_fingerprint;
pub use flatten::flatten;
pub use maintainer::{HierarchyCache, SaveOutcome};
pub use rebuild::RebuildReport;
pub use record::{CacheRecord, DescendantIndex, DescendantSnapshot, SnapshotEntry, CACHE_NAMESPACE};
pub use verify::{verify_all, IssueKind, VerifyIssue, VerifyReport};
