//! Decision-point events
//!
//! Every branch the maintainer takes is reported as one `CacheEvent`. The
//! event is logged through `tracing` and handed to any registered observers.

use crate::types::NodeID;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

/// Which ancestor a lookup was for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorRole {
    /// The parent recorded at the last save, being detached from
    PreviousParent,
    /// The parent the node currently names
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CacheEvent {
    /// Fingerprint unchanged since the last save; nothing propagates
    FingerprintMatched { node_id: NodeID },
    FingerprintChanged {
        node_id: NodeID,
        previous: Option<String>,
        current: String,
    },
    /// Parent differs from the one recorded at the last save
    MoveDetected {
        node_id: NodeID,
        from: Option<NodeID>,
        to: Option<NodeID>,
    },
    AncestorMissing {
        node_id: NodeID,
        ancestor_id: NodeID,
        role: AncestorRole,
    },
    /// The ancestor's snapshot entry for `child_id` was written
    AncestorUpdated {
        ancestor_id: NodeID,
        child_id: NodeID,
        role: AncestorRole,
    },
    AncestorReadFailed { ancestor_id: NodeID, error: String },
    AncestorSaveFailed { ancestor_id: NodeID, error: String },
    /// Propagating into `ancestor_id` would make the tree cyclic
    CycleRefused { node_id: NodeID, ancestor_id: NodeID },
    DepthLimitReached { node_id: NodeID, depth: usize },
    /// A node about to be deleted was stripped from its parent's cache
    ParentCleaned { parent_id: NodeID, child_id: NodeID },
}

impl CacheEvent {
    /// Short machine name, used as the `event` field in logs
    pub fn name(&self) -> &'static str {
        match self {
            CacheEvent::FingerprintMatched { .. } => "fingerprint_matched",
            CacheEvent::FingerprintChanged { .. } => "fingerprint_changed",
            CacheEvent::MoveDetected { .. } => "move_detected",
            CacheEvent::AncestorMissing { .. } => "ancestor_missing",
            CacheEvent::AncestorUpdated { .. } => "ancestor_updated",
            CacheEvent::AncestorReadFailed { .. } => "ancestor_read_failed",
            CacheEvent::AncestorSaveFailed { .. } => "ancestor_save_failed",
            CacheEvent::CycleRefused { .. } => "cycle_refused",
            CacheEvent::DepthLimitReached { .. } => "depth_limit_reached",
            CacheEvent::ParentCleaned { .. } => "parent_cleaned",
        }
    }

    /// Recovered failures; everything else is a normal decision
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            CacheEvent::AncestorMissing { .. }
                | CacheEvent::AncestorReadFailed { .. }
                | CacheEvent::AncestorSaveFailed { .. }
                | CacheEvent::CycleRefused { .. }
                | CacheEvent::DepthLimitReached { .. }
        )
    }

    pub(crate) fn log(&self) {
        let detail = serde_json::to_string(self).unwrap_or_default();
        if self.is_warning() {
            warn!(event = self.name(), %detail, "hierarchy cache");
        } else {
            debug!(event = self.name(), %detail, "hierarchy cache");
        }
    }
}

/// Receives every event the maintainer emits
pub trait CacheObserver: Send + Sync {
    fn observe(&self, event: &CacheEvent);
}

/// Observer that keeps every event in memory
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<CacheEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().clone()
    }

    /// Return and clear the recorded events
    pub fn drain(&self) -> Vec<CacheEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl CacheObserver for RecordingObserver {
    fn observe(&self, event: &CacheEvent) {
        self.events.lock().push(event.clone());
    }
}
