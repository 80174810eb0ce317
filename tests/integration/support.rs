use canopy::cache::RecordingObserver;
use canopy::{HierarchyCache, MemoryNodeStore, Node, NodeID, NodeStore};
use std::sync::Arc;

pub struct Harness {
    pub store: Arc<MemoryNodeStore>,
    pub observer: Arc<RecordingObserver>,
    pub cache: HierarchyCache,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryNodeStore::new());
        let observer = Arc::new(RecordingObserver::new());
        let cache = HierarchyCache::new(store.clone()).with_observer(observer.clone());
        Self {
            store,
            observer,
            cache,
        }
    }

    pub fn create(&self, title: &str, parent: Option<NodeID>) -> NodeID {
        let mut node = Node::new(title).with_parent(parent);
        self.cache.save(&mut node).unwrap()
    }

    pub fn load(&self, id: NodeID) -> Node {
        self.store.get(id).unwrap().unwrap()
    }

    pub fn move_to(&self, id: NodeID, parent: Option<NodeID>) {
        let mut node = self.load(id);
        node.parent = parent;
        self.cache.save(&mut node).unwrap();
    }
}
