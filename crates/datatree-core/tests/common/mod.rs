use std::sync::{Arc, Mutex};

use datatree_core::{DataTree, DataTreeListener, Identifier};

/// A notification as seen by a listener, with nodes reduced to their type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PropertyChanged(String),
    ChildAdded(String),
    ChildRemoved(String, usize),
    ChildMoved(String, usize, usize),
}

/// Listener that records every notification it receives
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

#[allow(dead_code)]
impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl DataTreeListener for RecordingListener {
    fn property_changed(&self, _tree: &DataTree, key: &Identifier) {
        self.push(Event::PropertyChanged(key.to_string()));
    }

    fn child_added(&self, _parent: &DataTree, child: &DataTree) {
        self.push(Event::ChildAdded(child.get_type().to_string()));
    }

    fn child_removed(&self, _parent: &DataTree, child: &DataTree, former_index: usize) {
        self.push(Event::ChildRemoved(child.get_type().to_string(), former_index));
    }

    fn child_moved(&self, _parent: &DataTree, child: &DataTree, old_index: usize, new_index: usize) {
        self.push(Event::ChildMoved(
            child.get_type().to_string(),
            old_index,
            new_index,
        ));
    }
}

/// Create a root of type `root_type` with one child per entry in `children`
#[allow(dead_code)]
pub fn tree_with_children(root_type: &str, children: &[&str]) -> DataTree {
    let root = DataTree::new(root_type);
    root.with_transaction(|tx| {
        for name in children {
            tx.add_child(&DataTree::new(*name))?;
        }
        Ok(())
    })
    .unwrap();
    root
}

/// Child types of `tree` in order
#[allow(dead_code)]
pub fn child_types(tree: &DataTree) -> Vec<String> {
    tree.children()
        .iter()
        .map(|child| child.get_type().to_string())
        .collect()
}
