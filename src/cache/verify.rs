//! Cache verification
//!
//! Reads every stored node and reports where the cached hierarchy disagrees
//! with the stored tree or with itself.

use crate::cache::fingerprint::compute_fingerprint;
use crate::cache::flatten::flatten;
use crate::cache::record::{CacheRecord, DescendantIndex, SnapshotEntry};
use crate::error::ApiError;
use crate::store::{Node, NodeStore};
use crate::types::NodeID;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    CorruptRecord { reason: String },
    /// Ids present in the snapshot but not in the index
    IndexMissing { ids: Vec<NodeID> },
    /// Ids in the index that the snapshot no longer holds
    IndexStale { ids: Vec<NodeID> },
    /// Stored fingerprint does not match the node's current state
    FingerprintStale,
    /// Never saved through the cache
    Unsettled,
    ParentMissing { parent: NodeID },
    MissingFromParent { parent: NodeID },
    ParentEntryMismatch { parent: NodeID },
    /// Snapshot lists a child that is gone or now has another parent
    StaleChild { child: NodeID },
}

impl IssueKind {
    /// Violations break a stated invariant; the rest is recoverable lag
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            IssueKind::CorruptRecord { .. } | IssueKind::IndexMissing { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyIssue {
    pub node_id: NodeID,
    #[serde(flatten)]
    pub kind: IssueKind,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub checked: usize,
    pub issues: Vec<VerifyIssue>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn violations(&self) -> usize {
        self.issues.iter().filter(|i| i.kind.is_violation()).count()
    }
}

/// Check every node in `store`
pub fn verify_all(store: &dyn NodeStore) -> Result<VerifyReport, ApiError> {
    let nodes: BTreeMap<NodeID, Node> = store
        .list_all()?
        .into_iter()
        .filter_map(|n| n.id.map(|id| (id, n)))
        .collect();

    let mut records: BTreeMap<NodeID, CacheRecord> = BTreeMap::new();
    let mut issues = Vec::new();
    for (id, node) in &nodes {
        match CacheRecord::from_node(node) {
            Ok(record) => {
                records.insert(*id, record);
            }
            Err(e) => issues.push(VerifyIssue {
                node_id: *id,
                kind: IssueKind::CorruptRecord {
                    reason: e.to_string(),
                },
            }),
        }
    }

    for (id, record) in &records {
        let node = &nodes[id];
        let mut push = |kind| issues.push(VerifyIssue { node_id: *id, kind });

        let expected = flatten(&record.descendants, DescendantIndex::new()).ids();
        let actual = record.index.ids();
        let missing: Vec<NodeID> = expected.difference(&actual).copied().collect();
        let stale: Vec<NodeID> = actual.difference(&expected).copied().collect();
        if !missing.is_empty() {
            push(IssueKind::IndexMissing { ids: missing });
        }
        if !stale.is_empty() {
            push(IssueKind::IndexStale { ids: stale });
        }

        match &record.fingerprint {
            None => push(IssueKind::Unsettled),
            Some(fp) if *fp != compute_fingerprint(node, &record.descendants) => {
                push(IssueKind::FingerprintStale)
            }
            Some(_) => {}
        }

        if let Some(parent) = node.parent {
            match (nodes.contains_key(&parent), records.get(&parent)) {
                (false, _) => push(IssueKind::ParentMissing { parent }),
                (true, None) => {}
                (true, Some(parent_record)) => match parent_record.descendants.get(*id) {
                    None => push(IssueKind::MissingFromParent { parent }),
                    Some(entry) => {
                        if *entry != SnapshotEntry::of(node, record.descendants.clone()) {
                            push(IssueKind::ParentEntryMismatch { parent });
                        }
                    }
                },
            }
        }

        let stale_children: BTreeSet<NodeID> = record
            .descendants
            .iter()
            .map(|(child, _)| *child)
            .filter(|child| nodes.get(child).map(|n| n.parent) != Some(Some(*id)))
            .collect();
        for child in stale_children {
            push(IssueKind::StaleChild { child });
        }
    }

    Ok(VerifyReport {
        checked: nodes.len(),
        issues,
    })
}
