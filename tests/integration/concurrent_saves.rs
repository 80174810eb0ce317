use canopy::cache::verify_all;
use canopy::{HierarchyCache, MemoryNodeStore, Node, NodeID, NodeStore, SledNodeStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

const WRITERS: usize = 8;
const PER_WRITER: usize = 25;

/// Each writer adds its own children, and a grandchild under each, beneath one root
fn fan_in(cache: Arc<HierarchyCache>, root: NodeID) -> BTreeSet<NodeID> {
    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let cache = cache.clone();
            thread::spawn(move || {
                let mut saved = Vec::new();
                for n in 0..PER_WRITER {
                    let child = cache
                        .save(&mut Node::new(format!("w{} child {}", writer, n)).with_parent(Some(root)))
                        .unwrap();
                    let grandchild = cache
                        .save(&mut Node::new(format!("w{} leaf {}", writer, n)).with_parent(Some(child)))
                        .unwrap();
                    saved.push(child);
                    saved.push(grandchild);
                }
                saved
            })
        })
        .collect();

    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

#[test]
fn parallel_children_all_reach_the_root() {
    let store = Arc::new(MemoryNodeStore::new());
    let cache = Arc::new(HierarchyCache::new(store.clone()));
    let root = cache.save(&mut Node::new("Root")).unwrap();

    let expected = fan_in(cache.clone(), root);

    assert_eq!(expected.len(), WRITERS * PER_WRITER * 2);
    assert_eq!(cache.descendant_ids(root).unwrap(), expected);
    assert_eq!(cache.descendant_snapshot(root).unwrap().len(), WRITERS * PER_WRITER);
    assert!(verify_all(store.as_ref()).unwrap().is_clean());
}

#[test]
fn parallel_renames_of_siblings_keep_every_title() {
    let store = Arc::new(MemoryNodeStore::new());
    let cache = Arc::new(HierarchyCache::new(store.clone()));
    let root = cache.save(&mut Node::new("Root")).unwrap();
    let children: Vec<NodeID> = (0..WRITERS * 4)
        .map(|n| {
            cache
                .save(&mut Node::new(format!("child {}", n)).with_parent(Some(root)))
                .unwrap()
        })
        .collect();

    let handles: Vec<_> = children
        .chunks(4)
        .map(|chunk| {
            let cache = cache.clone();
            let store = store.clone();
            let chunk = chunk.to_vec();
            thread::spawn(move || {
                for id in chunk {
                    let mut node = store.get(id).unwrap().unwrap();
                    node.title = format!("renamed {}", id);
                    cache.save(&mut node).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = cache.descendant_snapshot(root).unwrap();
    for id in &children {
        assert_eq!(snapshot.get(*id).unwrap().title, format!("renamed {}", id));
    }
    assert!(verify_all(store.as_ref()).unwrap().is_clean());
}

#[test]
fn parallel_children_over_sled() {
    let store = Arc::new(SledNodeStore::temporary().unwrap());
    let cache = Arc::new(HierarchyCache::new(store.clone()));
    let root = cache.save(&mut Node::new("Root")).unwrap();

    let expected = fan_in(cache.clone(), root);

    assert_eq!(cache.descendant_ids(root).unwrap(), expected);
    assert!(verify_all(store.as_ref()).unwrap().is_clean());
}
