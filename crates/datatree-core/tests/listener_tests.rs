#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::{Arc, Mutex};

use common::{tree_with_children, Event, RecordingListener};
use datatree_core::{DataTree, DataTreeListener, Identifier};

#[test]
fn test_listener_is_held_weakly() {
    // GIVEN a listener registered and then dropped by its owner
    let tree = DataTree::new("Node");
    let listener = RecordingListener::new();
    tree.add_listener(&listener);
    assert_eq!(tree.get_num_listeners(), 1);
    drop(listener);

    // WHEN a change is committed
    tree.with_transaction(|tx| tx.set_property("k", 1)).unwrap();

    // THEN the dead handle is simply skipped
    assert_eq!(tree.get_num_listeners(), 0);
}

#[test]
fn test_remove_listener_stops_notifications() {
    let tree = DataTree::new("Node");
    let listener = RecordingListener::new();
    tree.add_listener(&listener);

    assert!(tree.remove_listener(&listener));
    assert!(!tree.remove_listener(&listener));
    tree.with_transaction(|tx| tx.set_property("k", 1)).unwrap();

    assert_eq!(listener.len(), 0);
}

#[test]
fn test_remove_all_listeners() {
    let tree = DataTree::new("Node");
    let first = RecordingListener::new();
    let second = RecordingListener::new();
    tree.add_listener(&first);
    tree.add_listener(&second);

    tree.remove_all_listeners();
    tree.with_transaction(|tx| tx.set_property("k", 1)).unwrap();

    assert_eq!(first.len() + second.len(), 0);
}

#[test]
fn test_changes_are_reported_on_the_changed_node_only() {
    // GIVEN listeners on a parent and on its child
    let parent = tree_with_children("Parent", &["Child"]);
    let child = parent.get_child(0).unwrap();
    let parent_listener = RecordingListener::new();
    let child_listener = RecordingListener::new();
    parent.add_listener(&parent_listener);
    child.add_listener(&child_listener);

    // WHEN the child's property changes
    child.with_transaction(|tx| tx.set_property("k", 1)).unwrap();

    // THEN only the child's listener hears about it
    assert_eq!(child_listener.events(), vec![Event::PropertyChanged("k".into())]);
    assert_eq!(parent_listener.len(), 0);
}

/// Unregisters a peer the first time it is notified
struct Unregisterer {
    tree: DataTree,
    peer: Arc<RecordingListener>,
    calls: Mutex<usize>,
}

impl DataTreeListener for Unregisterer {
    fn property_changed(&self, _tree: &DataTree, _key: &Identifier) {
        *self.calls.lock().unwrap() += 1;
        self.tree.remove_listener(&self.peer);
    }
}

#[test]
fn test_listener_may_unregister_others_mid_broadcast() {
    // GIVEN a listener that removes its peer while being notified
    let tree = DataTree::new("Node");
    let peer = RecordingListener::new();
    let remover = Arc::new(Unregisterer {
        tree: tree.clone(),
        peer: Arc::clone(&peer),
        calls: Mutex::new(0),
    });
    tree.add_listener(&remover);
    tree.add_listener(&peer);

    // WHEN the first notification fires
    tree.with_transaction(|tx| tx.set_property("a", 1)).unwrap();

    // THEN the snapshot still delivers to the peer this time
    assert_eq!(peer.len(), 1);

    // AND the peer is gone for the next broadcast
    tree.with_transaction(|tx| tx.set_property("b", 1)).unwrap();
    assert_eq!(peer.len(), 1);
    assert_eq!(*remover.calls.lock().unwrap(), 2);
}

/// Reads the tree from inside a callback
struct Reader {
    seen: Mutex<Vec<i64>>,
}

impl DataTreeListener for Reader {
    fn property_changed(&self, tree: &DataTree, key: &Identifier) {
        let value = tree.get_property(key).unwrap().as_i64().unwrap();
        self.seen.lock().unwrap().push(value);
    }
}

#[test]
fn test_listener_can_read_tree_during_callback() {
    let tree = DataTree::new("Node");
    let reader = Arc::new(Reader {
        seen: Mutex::new(Vec::new()),
    });
    tree.add_listener(&reader);

    tree.with_transaction(|tx| tx.set_property("n", 5)).unwrap();

    assert_eq!(*reader.seen.lock().unwrap(), vec![5]);
}

#[test]
fn test_default_callbacks_are_no_ops() {
    struct OnlyAdds(Mutex<usize>);
    impl DataTreeListener for OnlyAdds {
        fn child_added(&self, _parent: &DataTree, _child: &DataTree) {
            *self.0.lock().unwrap() += 1;
        }
    }

    let tree = DataTree::new("Node");
    let listener = Arc::new(OnlyAdds(Mutex::new(0)));
    tree.add_listener(&listener);

    tree.with_transaction(|tx| {
        tx.set_property("k", 1)?;
        tx.add_child(&DataTree::new("C"))?;
        tx.move_child(0, 0)?;
        tx.remove_child(0).map(|_| ())
    })
    .unwrap();

    assert_eq!(*listener.0.lock().unwrap(), 1);
}
