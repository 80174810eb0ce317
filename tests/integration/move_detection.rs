use canopy::cache::{verify_all, AncestorRole, CacheEvent};
use canopy::NodeStore;
use std::collections::BTreeSet;

use super::support::Harness;

#[test]
fn move_between_siblings() {
    let h = Harness::new();
    let root = h.create("Root", None);
    let a = h.create("A", Some(root));
    let b = h.create("B", Some(root));
    let c = h.create("C", Some(b));
    let d = h.create("D", Some(c));

    h.observer.drain();
    h.move_to(c, Some(a));

    assert!(h.observer.events().contains(&CacheEvent::MoveDetected {
        node_id: c,
        from: Some(b),
        to: Some(a),
    }));

    let a_snapshot = h.cache.descendant_snapshot(a).unwrap();
    assert!(a_snapshot.get(c).unwrap().children.get(d).is_some());
    assert_eq!(h.cache.descendant_ids(a).unwrap(), BTreeSet::from([c, d]));

    assert!(h.cache.descendant_snapshot(b).unwrap().is_empty());
    assert!(h.cache.descendant_ids(b).unwrap().is_empty());

    assert_eq!(
        h.cache.descendant_ids(root).unwrap(),
        BTreeSet::from([a, b, c, d])
    );
    let root_snapshot = h.cache.descendant_snapshot(root).unwrap();
    assert!(root_snapshot.get(b).unwrap().children.is_empty());
    assert!(root_snapshot.get(a).unwrap().children.get(c).is_some());

    assert!(verify_all(h.store.as_ref()).unwrap().is_clean());
}

#[test]
fn move_up_to_grandparent() {
    let h = Harness::new();
    let root = h.create("Root", None);
    let a = h.create("A", Some(root));
    let b = h.create("B", Some(a));
    let c = h.create("C", Some(b));

    h.move_to(c, Some(a));

    assert_eq!(h.cache.descendant_ids(a).unwrap(), BTreeSet::from([b, c]));
    assert!(h.cache.descendant_ids(b).unwrap().is_empty());
    assert_eq!(h.cache.descendant_ids(root).unwrap(), BTreeSet::from([a, b, c]));
    assert!(verify_all(h.store.as_ref()).unwrap().is_clean());
}

#[test]
fn move_down_into_sibling() {
    let h = Harness::new();
    let root = h.create("Root", None);
    let a = h.create("A", Some(root));
    let b = h.create("B", Some(a));
    let c = h.create("C", Some(a));

    h.move_to(c, Some(b));

    assert_eq!(h.cache.descendant_ids(b).unwrap(), BTreeSet::from([c]));
    let a_snapshot = h.cache.descendant_snapshot(a).unwrap();
    assert!(a_snapshot.get(c).is_none());
    assert!(a_snapshot.get(b).unwrap().children.get(c).is_some());
    assert!(verify_all(h.store.as_ref()).unwrap().is_clean());
}

#[test]
fn move_to_top_level() {
    let h = Harness::new();
    let root = h.create("Root", None);
    let a = h.create("A", Some(root));
    let b = h.create("B", Some(a));

    h.move_to(a, None);

    assert!(h.cache.descendant_ids(root).unwrap().is_empty());
    assert_eq!(h.cache.descendant_ids(a).unwrap(), BTreeSet::from([b]));
    assert_eq!(h.cache.record(a).unwrap().previous_parent, None);
}

#[test]
fn missing_previous_parent_is_tolerated() {
    let h = Harness::new();
    let a = h.create("A", None);
    let b = h.create("B", None);
    let c = h.create("C", Some(a));

    // Previous parent vanished behind the cache's back
    h.store.remove(a).unwrap();
    h.observer.drain();
    h.move_to(c, Some(b));

    assert!(h.observer.events().contains(&CacheEvent::AncestorMissing {
        node_id: c,
        ancestor_id: a,
        role: AncestorRole::PreviousParent,
    }));
    assert!(h.cache.is_descendant(b, c).unwrap());
}

#[test]
fn move_into_own_subtree_is_refused() {
    let h = Harness::new();
    let root = h.create("Root", None);
    let a = h.create("A", Some(root));
    let b = h.create("B", Some(a));

    h.observer.drain();
    h.move_to(a, Some(b));

    assert!(h.observer.events().contains(&CacheEvent::CycleRefused {
        node_id: a,
        ancestor_id: b,
    }));
    assert!(!h.cache.is_descendant(b, a).unwrap());
    assert!(!h.cache.is_descendant(a, a).unwrap());
}
