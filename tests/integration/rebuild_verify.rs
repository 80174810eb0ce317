use canopy::cache::{verify_all, IssueKind};
use canopy::{HierarchyCache, MemoryNodeStore, Node, NodeStore};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::support::Harness;

fn raw(store: &MemoryNodeStore, title: &str, parent: Option<u64>) -> u64 {
    let mut node = Node::new(title).with_parent(parent);
    store.save(&mut node).unwrap()
}

#[test]
fn rebuild_settles_a_store_written_without_the_cache() {
    let store = Arc::new(MemoryNodeStore::new());
    let root = raw(&store, "Root", None);
    let a = raw(&store, "A", Some(root));
    let b = raw(&store, "B", Some(a));
    let c = raw(&store, "C", Some(root));

    let before = verify_all(store.as_ref()).unwrap();
    assert_eq!(before.checked, 4);
    assert!(before
        .issues
        .iter()
        .any(|i| i.node_id == root && i.kind == IssueKind::Unsettled));

    let cache = HierarchyCache::new(store.clone());
    let report = cache.rebuild_all().unwrap();
    assert_eq!(report.nodes, 4);
    assert_eq!(report.rewritten, 4);
    assert!(report.orphans.is_empty());

    assert!(verify_all(store.as_ref()).unwrap().is_clean());
    assert_eq!(cache.descendant_ids(root).unwrap(), BTreeSet::from([a, b, c]));
    assert_eq!(cache.descendant_ids(a).unwrap(), BTreeSet::from([b]));

    let again = cache.rebuild_all().unwrap();
    assert_eq!(again.rewritten, 0);
}

#[test]
fn rebuild_repairs_a_failed_ripple() {
    let h = Harness::new();
    let root = h.create("Root", None);
    let a = h.create("A", Some(root));
    let b = h.create("B", Some(a));

    h.store.fail_saves_for(root);
    let mut node = h.load(b);
    node.title = "B renamed".to_string();
    h.cache.save(&mut node).unwrap();

    let report = verify_all(h.store.as_ref()).unwrap();
    assert!(report
        .issues
        .iter()
        .any(|i| i.node_id == a && i.kind == IssueKind::ParentEntryMismatch { parent: root }));

    h.store.heal(root);
    h.cache.rebuild_all().unwrap();

    assert!(verify_all(h.store.as_ref()).unwrap().is_clean());
    let root_snapshot = h.cache.descendant_snapshot(root).unwrap();
    let b_entry = root_snapshot.get(a).unwrap().children.get(b).unwrap();
    assert_eq!(b_entry.title, "B renamed");
}

#[test]
fn orphan_is_cached_as_top_level() {
    let store = Arc::new(MemoryNodeStore::new());
    let root = raw(&store, "Root", None);
    let lost = raw(&store, "Lost", Some(999));
    let child = raw(&store, "Child", Some(lost));

    let cache = HierarchyCache::new(store.clone());
    let report = cache.rebuild_all().unwrap();
    assert_eq!(report.orphans, vec![lost]);
    assert_eq!(cache.descendant_ids(lost).unwrap(), BTreeSet::from([child]));
    assert!(cache.descendant_ids(root).unwrap().is_empty());

    let verify = verify_all(store.as_ref()).unwrap();
    assert_eq!(verify.violations(), 0);
    assert!(verify
        .issues
        .iter()
        .any(|i| i.node_id == lost && i.kind == IssueKind::ParentMissing { parent: 999 }));
}

#[test]
fn corrupt_record_is_a_violation_until_rebuilt() {
    let h = Harness::new();
    let root = h.create("Root", None);
    h.create("A", Some(root));

    let mut node = h.load(root);
    node.properties
        .insert("hierarchy".to_string(), serde_json::json!("not a record"));
    h.store.save(&mut node).unwrap();

    let report = verify_all(h.store.as_ref()).unwrap();
    assert_eq!(report.violations(), 1);

    h.cache.rebuild_all().unwrap();
    assert!(verify_all(h.store.as_ref()).unwrap().is_clean());
}
