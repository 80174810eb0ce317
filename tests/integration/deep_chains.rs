use canopy::cache::{CacheEvent, DescendantSnapshot, RecordingObserver};
use canopy::config::DEFAULT_MAX_DEPTH;
use canopy::{HierarchyCache, MemoryNodeStore, Node, NodeID, NodeStore};
use std::sync::Arc;

/// A single chain written straight to the store, then settled by a rebuild
fn settled_chain(
    len: usize,
) -> (
    Arc<MemoryNodeStore>,
    Arc<RecordingObserver>,
    HierarchyCache,
    Vec<NodeID>,
) {
    let store = Arc::new(MemoryNodeStore::new());
    let mut ids = Vec::with_capacity(len);
    let mut parent = None;
    for depth in 0..len {
        let mut node = Node::new(format!("level {}", depth)).with_parent(parent);
        let id = store.save(&mut node).unwrap();
        ids.push(id);
        parent = Some(id);
    }
    let observer = Arc::new(RecordingObserver::new());
    let cache = HierarchyCache::new(store.clone()).with_observer(observer.clone());
    cache.rebuild_all().unwrap();
    (store, observer, cache, ids)
}

/// Title of the deepest entry, following the single-child chain down
fn deepest_title(snapshot: &DescendantSnapshot) -> Option<String> {
    let mut current = snapshot;
    let mut title = None;
    while let Some((_, entry)) = current.iter().next() {
        title = Some(entry.title.clone());
        current = &entry.children;
    }
    title
}

fn rename_leaf(store: &MemoryNodeStore, cache: &HierarchyCache, leaf: NodeID) {
    let mut node = store.get(leaf).unwrap().unwrap();
    node.title = "renamed leaf".to_string();
    cache.save(&mut node).unwrap();
}

#[test]
fn chain_at_depth_limit_ripples_to_the_top() {
    let (store, observer, cache, ids) = settled_chain(DEFAULT_MAX_DEPTH);
    let leaf = *ids.last().unwrap();
    observer.drain();

    rename_leaf(&store, &cache, leaf);

    assert!(!observer
        .events()
        .iter()
        .any(|e| matches!(e, CacheEvent::DepthLimitReached { .. })));
    let top = cache.descendant_snapshot(ids[0]).unwrap();
    assert_eq!(deepest_title(&top).as_deref(), Some("renamed leaf"));
    assert_eq!(cache.descendant_ids(ids[0]).unwrap().len(), DEFAULT_MAX_DEPTH - 1);
}

#[test]
fn chain_past_depth_limit_stops_without_failing() {
    let (store, observer, cache, ids) = settled_chain(DEFAULT_MAX_DEPTH + 1);
    let leaf = *ids.last().unwrap();
    observer.drain();

    rename_leaf(&store, &cache, leaf);

    assert!(observer
        .events()
        .iter()
        .any(|e| matches!(e, CacheEvent::DepthLimitReached { node_id, .. } if *node_id == ids[1])));
    let top = cache.descendant_snapshot(ids[0]).unwrap();
    assert_eq!(
        deepest_title(&top),
        Some(format!("level {}", DEFAULT_MAX_DEPTH))
    );
    let below_top = cache.descendant_snapshot(ids[1]).unwrap();
    assert_eq!(deepest_title(&below_top).as_deref(), Some("renamed leaf"));
}

#[test]
fn chain_built_by_saves_settles_every_level() {
    let store = Arc::new(MemoryNodeStore::new());
    let cache = HierarchyCache::new(store.clone());
    let mut parent = None;
    let mut ids = Vec::new();
    for depth in 0..96 {
        let mut node = Node::new(format!("level {}", depth)).with_parent(parent);
        let id = cache.save(&mut node).unwrap();
        ids.push(id);
        parent = Some(id);
    }
    assert_eq!(cache.descendant_ids(ids[0]).unwrap().len(), 95);
    assert_eq!(cache.descendant_ids(ids[50]).unwrap().len(), 45);
}
