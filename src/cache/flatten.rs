//! Descendant Index Flattener

use crate::cache::record::{DescendantIndex, DescendantSnapshot};

/// Collapse a nested snapshot into a flat id set, merging into `existing`.
///
/// Additive: ids already in `existing` are kept even if the snapshot no
/// longer holds them. Pass an empty index to get exactly the snapshot's ids.
pub fn flatten(snapshot: &DescendantSnapshot, existing: DescendantIndex) -> DescendantIndex {
    let mut index = existing;
    let mut pending: Vec<&DescendantSnapshot> = vec![snapshot];
    while let Some(level) = pending.pop() {
        for (id, entry) in level.iter() {
            index.insert(*id);
            if !entry.children.is_empty() {
                pending.push(&entry.children);
            }
        }
    }
    index
}
