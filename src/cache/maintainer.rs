//! Hierarchy Cache Maintainer
//!
//! Keeps every ancestor's descendant snapshot consistent with the stored
//! tree using only single-node reads and writes. A save compares the node's
//! fingerprint with the one recorded at its previous save; if they differ it
//! detaches the node from its previous parent (on a move), writes its entry
//! into its current parent, and settles that parent the same way. The ripple
//! stops at the first ancestor whose fingerprint does not change, or at the
//! top of the tree.
//!
//! The upward walk is an explicit loop over a path of frames, so tree depth
//! never turns into native stack depth.

use crate::cache::events::{AncestorRole, CacheEvent, CacheObserver};
use crate::cache::fingerprint::compute_fingerprint;
use crate::cache::record::{CacheRecord, DescendantSnapshot, SnapshotEntry, CACHE_NAMESPACE};
use crate::concurrency::NodeLockManager;
use crate::config::PropagationConfig;
use crate::error::ApiError;
use crate::store::{Node, NodeStore};
use crate::types::NodeID;
use parking_lot::{ArcRwLockWriteGuard, RawRwLock};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of settling one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Fingerprint matched the previous save; no ancestor was touched
    Unchanged,
    /// Fingerprint changed and the change was propagated upward
    Propagated,
}

/// Change to make to an ancestor's snapshot
#[derive(Debug)]
pub(crate) enum Edit {
    /// Insert or replace the child's entry
    Set(SnapshotEntry),
    /// Drop the child's entry together with its subtree
    Forget,
}

/// One upward step: apply `edit` for `child` to the cache of `ancestor`
#[derive(Debug)]
pub(crate) struct Hop {
    pub(crate) child: NodeID,
    pub(crate) ancestor: NodeID,
    pub(crate) role: AncestorRole,
    pub(crate) edit: Edit,
}

/// A node settled on the current upward path and the hops it still owes
struct Frame {
    id: NodeID,
    /// Released once every hop above this node is done; `None` for the
    /// origin, whose lock the caller holds
    _guard: Option<ArcRwLockWriteGuard<RawRwLock, ()>>,
    hops: std::vec::IntoIter<Hop>,
}

/// Hierarchy cache engine over a `NodeStore`
pub struct HierarchyCache {
    pub(crate) store: Arc<dyn NodeStore>,
    pub(crate) locks: NodeLockManager,
    observers: Vec<Arc<dyn CacheObserver>>,
    max_depth: usize,
}

impl HierarchyCache {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self::with_config(store, &PropagationConfig::default())
    }

    pub fn with_config(store: Arc<dyn NodeStore>, config: &PropagationConfig) -> Self {
        Self {
            store,
            locks: NodeLockManager::new(),
            observers: Vec::new(),
            max_depth: config.max_depth.max(1),
        }
    }

    /// Register an observer for decision-point events
    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    pub(crate) fn emit(&self, event: CacheEvent) {
        event.log();
        for observer in &self.observers {
            observer.observe(&event);
        }
    }

    /// Decode a node's cache record, discarding one that cannot be read.
    ///
    /// A discarded record has no fingerprint, so the next settle rewrites it.
    pub(crate) fn load_record(&self, node: &Node) -> CacheRecord {
        match CacheRecord::from_node(node) {
            Ok(record) => record,
            Err(e) => {
                warn!(node_id = node.id.unwrap_or_default(), error = %e, "discarding unreadable cache record");
                CacheRecord::default()
            }
        }
    }

    /// Save a node through the store and propagate the change upward.
    ///
    /// The cache keys of `node` are replaced by the stored ones first, so a
    /// caller holding an old copy cannot overwrite ripple updates that
    /// reached this node since it was loaded. A node with no stored row
    /// starts from an empty record, even if it was copied from another
    /// node. Only the node's own save failing is an error; ancestor
    /// failures are logged and reported as events.
    pub fn save(&self, node: &mut Node) -> Result<NodeID, ApiError> {
        match node.id {
            Some(id) => {
                let lock = self.locks.get_lock(id);
                let _guard = lock.write();
                match self.store.get(id)? {
                    Some(stored) => self.load_record(&stored).write_into(&mut node.properties)?,
                    None => {
                        node.properties.remove(CACHE_NAMESPACE);
                    }
                }
                self.store.save(node)?;
                self.settle_and_propagate(node)?;
                Ok(id)
            }
            None => {
                node.properties.remove(CACHE_NAMESPACE);
                let id = self.store.save(node)?;
                let lock = self.locks.get_lock(id);
                let _guard = lock.write();
                self.settle_and_propagate(node)?;
                Ok(id)
            }
        }
    }

    /// Run the ripple for a node the store has just saved.
    pub fn on_node_saved(&self, node: &mut Node) -> Result<SaveOutcome, ApiError> {
        let id = node.require_id()?;
        let lock = self.locks.get_lock(id);
        let _guard = lock.write();
        self.settle_and_propagate(node)
    }

    /// `node` is persisted and its lock is held by the caller
    fn settle_and_propagate(&self, node: &mut Node) -> Result<SaveOutcome, ApiError> {
        let id = node.require_id()?;
        match self.settle(node)? {
            None => Ok(SaveOutcome::Unchanged),
            Some(hops) => {
                self.propagate(id, hops);
                Ok(SaveOutcome::Propagated)
            }
        }
    }

    /// Compare fingerprints and persist the node's new record.
    ///
    /// Returns the hops the change requires (detach from the previous
    /// parent first, then attach to the current one), or `None` when the
    /// fingerprint matched. `node` is already persisted and locked.
    fn settle(&self, node: &mut Node) -> Result<Option<Vec<Hop>>, ApiError> {
        let id = node.require_id()?;
        let mut record = self.load_record(node);
        let current = compute_fingerprint(node, &record.descendants);

        if record.fingerprint.as_deref() == Some(current.as_str()) {
            self.emit(CacheEvent::FingerprintMatched { node_id: id });
            return Ok(None);
        }
        self.emit(CacheEvent::FingerprintChanged {
            node_id: id,
            previous: record.fingerprint.clone(),
            current: current.clone(),
        });

        let mut hops = Vec::with_capacity(2);
        if record.is_settled() && record.previous_parent != node.parent {
            self.emit(CacheEvent::MoveDetected {
                node_id: id,
                from: record.previous_parent,
                to: node.parent,
            });
            if let Some(from) = record.previous_parent {
                hops.push(Hop {
                    child: id,
                    ancestor: from,
                    role: AncestorRole::PreviousParent,
                    edit: Edit::Forget,
                });
            }
        }
        if let Some(parent) = node.parent {
            // A parent inside the node's own subtree would close a cycle
            if record.index.contains(parent) {
                self.emit(CacheEvent::CycleRefused {
                    node_id: id,
                    ancestor_id: parent,
                });
            } else {
                hops.push(Hop {
                    child: id,
                    ancestor: parent,
                    role: AncestorRole::Parent,
                    edit: Edit::Set(SnapshotEntry::of(node, record.descendants.clone())),
                });
            }
        }

        record.fingerprint = Some(current);
        record.previous_parent = node.parent;
        record.write_into(&mut node.properties)?;
        self.store.save(node)?;
        Ok(Some(hops))
    }

    /// Walk `hops` upward from `origin`, depth first.
    ///
    /// Each settled ancestor stays locked until the hops above it are done,
    /// and a move's detach path is released before its attach path starts.
    /// Failures end their own branch and never reach the caller.
    pub(crate) fn propagate(&self, origin: NodeID, hops: Vec<Hop>) {
        let mut path = vec![Frame {
            id: origin,
            _guard: None,
            hops: hops.into_iter(),
        }];
        while let Some(frame) = path.last_mut() {
            let Some(hop) = frame.hops.next() else {
                path.pop();
                continue;
            };
            if !self.admit(&hop, &path) {
                continue;
            }
            let ancestor_id = hop.ancestor;
            let guard = self.locks.get_lock(ancestor_id).write_arc();
            if let Some(next) = self.apply(hop) {
                path.push(Frame {
                    id: ancestor_id,
                    _guard: Some(guard),
                    hops: next.into_iter(),
                });
            }
        }
    }

    /// Whether a hop may proceed from the current path
    fn admit(&self, hop: &Hop, path: &[Frame]) -> bool {
        if path.iter().any(|frame| frame.id == hop.ancestor) {
            self.emit(CacheEvent::CycleRefused {
                node_id: hop.child,
                ancestor_id: hop.ancestor,
            });
            return false;
        }
        if path.len() >= self.max_depth {
            self.emit(CacheEvent::DepthLimitReached {
                node_id: hop.child,
                depth: path.len(),
            });
            return false;
        }
        true
    }

    /// Load the ancestor a hop targets, reporting why it is unavailable
    fn fetch_ancestor(&self, hop: &Hop) -> Option<Node> {
        match self.store.get(hop.ancestor) {
            Ok(Some(ancestor)) => Some(ancestor),
            Ok(None) => {
                self.emit(CacheEvent::AncestorMissing {
                    node_id: hop.child,
                    ancestor_id: hop.ancestor,
                    role: hop.role,
                });
                None
            }
            Err(e) => {
                self.emit(CacheEvent::AncestorReadFailed {
                    ancestor_id: hop.ancestor,
                    error: e.to_string(),
                });
                None
            }
        }
    }

    /// Apply one hop under the ancestor's lock: edit its snapshot, persist
    /// it, then settle it. Returns the ancestor's own hops when its
    /// fingerprint changed.
    fn apply(&self, hop: Hop) -> Option<Vec<Hop>> {
        let mut ancestor = self.fetch_ancestor(&hop)?;
        let Hop {
            child,
            ancestor: ancestor_id,
            role,
            edit,
        } = hop;

        let mut record = self.load_record(&ancestor);
        match edit {
            Edit::Set(entry) => record.set_child(child, entry),
            Edit::Forget => {
                record.forget_child(child);
                if role == AncestorRole::Parent {
                    self.emit(CacheEvent::ParentCleaned {
                        parent_id: ancestor_id,
                        child_id: child,
                    });
                }
            }
        }

        let written = match record.write_into(&mut ancestor.properties) {
            Ok(()) => self.store.save(&mut ancestor).map_err(ApiError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            self.emit(CacheEvent::AncestorSaveFailed {
                ancestor_id,
                error: e.to_string(),
            });
            return None;
        }
        self.emit(CacheEvent::AncestorUpdated {
            ancestor_id,
            child_id: child,
            role,
        });

        match self.settle(&mut ancestor) {
            Ok(Some(hops)) => Some(hops),
            Ok(None) => {
                debug!(ancestor_id, "ancestor unchanged; ripple stops");
                None
            }
            Err(e) => {
                self.emit(CacheEvent::AncestorSaveFailed {
                    ancestor_id,
                    error: e.to_string(),
                });
                None
            }
        }
    }
}

/// Read accessors over the cached hierarchy
impl HierarchyCache {
    fn stored(&self, id: NodeID) -> Result<Node, ApiError> {
        self.store.get(id)?.ok_or(ApiError::NodeNotFound(id))
    }

    /// The node's cache record as last persisted
    pub fn record(&self, id: NodeID) -> Result<CacheRecord, ApiError> {
        CacheRecord::from_node(&self.stored(id)?)
    }

    /// Every descendant id, from the flattened index
    pub fn descendant_ids(&self, id: NodeID) -> Result<BTreeSet<NodeID>, ApiError> {
        Ok(self.record(id)?.index.ids())
    }

    /// The nested snapshot of the node's subtree
    pub fn descendant_snapshot(&self, id: NodeID) -> Result<DescendantSnapshot, ApiError> {
        Ok(self.record(id)?.descendants)
    }

    /// Whether `candidate` is cached as a descendant of `ancestor`
    pub fn is_descendant(&self, ancestor: NodeID, candidate: NodeID) -> Result<bool, ApiError> {
        Ok(self.record(ancestor)?.index.contains(candidate))
    }
}
