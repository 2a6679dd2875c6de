#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{child_types, tree_with_children, Event, RecordingListener};
use datatree_core::{DataTree, DataTreeError, UndoManager, Value};

#[test]
fn test_ops_apply_immediately_but_notify_on_commit() {
    // GIVEN a tree with a listener
    let tree = DataTree::new("Node");
    let listener = RecordingListener::new();
    tree.add_listener(&listener);

    // WHEN staging a change
    let mut tx = tree.begin_transaction();
    tx.set_property("k", "v").unwrap();

    // THEN the change is visible but nobody has been told yet
    assert_eq!(tree.get_property("k").unwrap(), Value::from("v"));
    assert_eq!(listener.len(), 0);

    // WHEN committing
    tx.commit().unwrap();

    // THEN the notification fires
    assert_eq!(listener.events(), vec![Event::PropertyChanged("k".into())]);
}

#[test]
fn test_commit_notifies_once_per_op_in_staging_order() {
    // GIVEN a parent with two children and a listener
    let parent = tree_with_children("Parent", &["A", "B"]);
    let listener = RecordingListener::new();
    parent.add_listener(&listener);

    // WHEN staging four different operations
    let mut tx = parent.begin_transaction();
    tx.set_property("title", "x").unwrap();
    tx.add_child(&DataTree::new("C")).unwrap();
    tx.move_child(2, 0).unwrap();
    tx.remove_child(1).unwrap();
    assert_eq!(tx.len(), 4);
    tx.commit().unwrap();

    // THEN exactly four notifications arrive, in order
    assert_eq!(
        listener.events(),
        vec![
            Event::PropertyChanged("title".into()),
            Event::ChildAdded("C".into()),
            Event::ChildMoved("C".into(), 2, 0),
            Event::ChildRemoved("A".into(), 1),
        ]
    );
    assert_eq!(child_types(&parent), vec!["C", "B"]);
}

#[test]
fn test_abort_restores_state_silently() {
    // GIVEN a populated tree with a listener
    let parent = tree_with_children("Parent", &["A", "B", "C"]);
    parent
        .with_transaction(|tx| tx.set_property("keep", 1))
        .unwrap();
    let before = parent.deep_clone();
    let removed = parent.get_child(1).unwrap();
    let listener = RecordingListener::new();
    parent.add_listener(&listener);

    // WHEN staging a mix of edits and aborting
    let mut tx = parent.begin_transaction();
    tx.set_property("keep", 2).unwrap();
    tx.set_property("new", true).unwrap();
    tx.remove_property("keep").unwrap();
    tx.remove_child(1).unwrap();
    tx.move_child(0, 1).unwrap();
    tx.add_child(&DataTree::new("D")).unwrap();
    tx.remove_all_children().unwrap();
    tx.abort().unwrap();

    // THEN the tree is back where it started and no one was notified
    assert!(parent.is_equivalent_to(&before));
    assert_eq!(child_types(&parent), vec!["A", "B", "C"]);
    assert!(parent.get_child(1).unwrap().is_same_node(&removed));
    assert_eq!(removed.get_parent(), parent);
    assert_eq!(parent.get_property_name(0), "keep");
    assert_eq!(listener.len(), 0);
}

#[test]
fn test_drop_auto_commits() {
    let tree = DataTree::new("Node");
    let listener = RecordingListener::new();
    tree.add_listener(&listener);

    {
        let mut tx = tree.begin_transaction();
        tx.set_property("k", 1).unwrap();
    }

    assert_eq!(tree.get_property("k").unwrap(), Value::Int(1));
    assert_eq!(listener.len(), 1);
}

#[test]
fn test_second_finalize_fails() {
    let tree = DataTree::new("Node");

    let mut committed = tree.begin_transaction();
    committed.commit().unwrap();
    assert!(!committed.is_active());
    assert_eq!(committed.commit(), Err(DataTreeError::TransactionAlreadyFinalized));
    assert_eq!(committed.abort(), Err(DataTreeError::TransactionAlreadyFinalized));
    assert_eq!(
        committed.set_property("k", 1),
        Err(DataTreeError::TransactionAlreadyFinalized)
    );

    let mut aborted = tree.begin_transaction();
    aborted.abort().unwrap();
    assert_eq!(aborted.commit(), Err(DataTreeError::TransactionAlreadyFinalized));
}

#[test]
fn test_add_child_rejects_attached_node() {
    // GIVEN a child already attached elsewhere
    let first = DataTree::new("First");
    let second = DataTree::new("Second");
    let child = DataTree::new("Child");
    first.with_transaction(|tx| tx.add_child(&child)).unwrap();

    // WHEN adding it to another parent
    let result = second.with_transaction(|tx| tx.add_child(&child));

    // THEN it fails fast and stays put
    assert_eq!(
        result,
        Err(DataTreeError::AlreadyAttached {
            node_type: "Child".to_string()
        })
    );
    assert_eq!(child.get_parent(), first);
    assert_eq!(second.get_num_children(), 0);
}

#[test]
fn test_add_child_rejects_cycles() {
    let root = DataTree::new("Root");
    let child = DataTree::new("Child");
    root.with_transaction(|tx| tx.add_child(&child)).unwrap();

    let onto_self = root.with_transaction(|tx| tx.add_child(&root));
    let onto_descendant = child.with_transaction(|tx| tx.add_child(&root));

    assert!(matches!(onto_self, Err(DataTreeError::CycleDetected { .. })));
    assert!(matches!(onto_descendant, Err(DataTreeError::CycleDetected { .. })));
}

#[test]
fn test_insert_child_positions() {
    let parent = tree_with_children("Parent", &["A", "C"]);

    parent
        .with_transaction(|tx| {
            tx.insert_child(&DataTree::new("B"), 1)?;
            tx.insert_child(&DataTree::new("D"), 3)
        })
        .unwrap();
    assert_eq!(child_types(&parent), vec!["A", "B", "C", "D"]);

    let result = parent.with_transaction(|tx| tx.insert_child(&DataTree::new("X"), 9));
    assert_eq!(result, Err(DataTreeError::IndexOutOfRange { index: 9, len: 4 }));
}

#[test]
fn test_remove_child_returns_detached_subtree() {
    let parent = tree_with_children("Parent", &["A", "B"]);

    let removed = parent.with_transaction(|tx| tx.remove_child(0)).unwrap();

    assert_eq!(removed.get_type(), "A");
    assert!(!removed.get_parent().is_valid());
    assert_eq!(child_types(&parent), vec!["B"]);
    assert_eq!(
        parent.with_transaction(|tx| tx.remove_child(5)),
        Err(DataTreeError::IndexOutOfRange { index: 5, len: 1 })
    );
}

#[test]
fn test_remove_child_node_by_identity() {
    let parent = tree_with_children("Parent", &["A", "B"]);
    let b = parent.get_child(1).unwrap();

    let index = parent.with_transaction(|tx| tx.remove_child_node(&b)).unwrap();

    assert_eq!(index, 1);
    assert_eq!(child_types(&parent), vec!["A"]);
}

#[test]
fn test_remove_property_missing_key() {
    let tree = DataTree::new("Node");
    assert_eq!(
        tree.with_transaction(|tx| tx.remove_property("nope")),
        Err(DataTreeError::KeyNotFound {
            key: "nope".to_string()
        })
    );
}

#[test]
fn test_aborted_property_removal_keeps_position() {
    // GIVEN three properties in insertion order
    let tree = DataTree::new("Node");
    tree.with_transaction(|tx| {
        tx.set_property("a", 1)?;
        tx.set_property("b", 2)?;
        tx.set_property("c", 3)
    })
    .unwrap();

    // WHEN the middle one is removed and the removal aborted
    let mut tx = tree.begin_transaction();
    tx.remove_property("b").unwrap();
    assert_eq!(tx.len(), 1);
    tx.abort().unwrap();

    // THEN it returns to its old slot
    let names: Vec<String> = (0..tree.get_num_properties())
        .map(|i| tree.get_property_name(i).to_string())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_removing_all_from_empty_node_stages_nothing() {
    let tree = DataTree::new("Node");
    let mut tx = tree.begin_transaction();
    tx.remove_all_properties().unwrap();
    assert!(tx.is_empty());
}

#[test]
fn test_bulk_removals_notify_per_item() {
    // GIVEN a node with two properties and three children
    let parent = tree_with_children("Parent", &["A", "B", "C"]);
    parent
        .with_transaction(|tx| {
            tx.set_property("x", 1)?;
            tx.set_property("y", 2)
        })
        .unwrap();
    let listener = RecordingListener::new();
    parent.add_listener(&listener);

    // WHEN removing everything
    parent
        .with_transaction(|tx| {
            tx.remove_all_properties()?;
            tx.remove_all_children()
        })
        .unwrap();

    // THEN one notification per key and per child, children last to first
    assert_eq!(
        listener.events(),
        vec![
            Event::PropertyChanged("x".into()),
            Event::PropertyChanged("y".into()),
            Event::ChildRemoved("C".into(), 2),
            Event::ChildRemoved("B".into(), 1),
            Event::ChildRemoved("A".into(), 0),
        ]
    );
    assert_eq!(parent.get_num_properties(), 0);
    assert_eq!(parent.get_num_children(), 0);
}

#[test]
fn test_move_child_to_same_index_is_not_staged() {
    let parent = tree_with_children("Parent", &["A", "B"]);
    let listener = RecordingListener::new();
    parent.add_listener(&listener);

    let mut tx = parent.begin_transaction();
    tx.move_child(1, 1).unwrap();
    assert!(tx.is_empty());
    tx.commit().unwrap();

    assert!(listener.events().is_empty());
    assert_eq!(child_types(&parent), vec!["A", "B"]);
}

#[test]
fn test_setting_unchanged_value_is_not_staged() {
    // GIVEN a property already holding a value
    let manager = UndoManager::new();
    let tree = DataTree::new("Node");
    tree.with_transaction(|tx| tx.set_property("k", 1)).unwrap();
    let listener = RecordingListener::new();
    tree.add_listener(&listener);

    // WHEN setting the same value again in a recorded transaction
    let mut tx = tree.begin_undoable_transaction(&manager);
    tx.set_property("k", 1).unwrap();
    assert!(tx.is_empty());
    tx.commit().unwrap();

    // THEN nobody is notified and nothing is recorded
    assert_eq!(listener.len(), 0);
    assert!(!manager.can_undo());

    // AND a different variant with the same number is a real change
    tree.with_transaction(|tx| tx.set_property("k", 1.0)).unwrap();
    assert_eq!(listener.events(), vec![Event::PropertyChanged("k".into())]);
}

#[test]
fn test_move_child_out_of_range() {
    let parent = tree_with_children("Parent", &["A", "B"]);
    assert_eq!(
        parent.with_transaction(|tx| tx.move_child(0, 2)),
        Err(DataTreeError::IndexOutOfRange { index: 2, len: 2 })
    );
    assert_eq!(
        parent.with_transaction(|tx| tx.move_child(3, 0)),
        Err(DataTreeError::IndexOutOfRange { index: 3, len: 2 })
    );
}

#[test]
fn test_with_transaction_aborts_on_error() {
    // GIVEN a closure that stages a change and then fails
    let tree = DataTree::new("Node");
    let listener = RecordingListener::new();
    tree.add_listener(&listener);

    let result: datatree_core::Result<()> = tree.with_transaction(|tx| {
        tx.set_property("partial", 1)?;
        tx.remove_property("missing")
    });

    // THEN the error propagates and the staged change is rolled back
    assert!(matches!(result, Err(DataTreeError::KeyNotFound { .. })));
    assert!(!tree.has_property("partial"));
    assert_eq!(listener.len(), 0);
}

#[test]
fn test_nested_transactions_on_same_thread() {
    // GIVEN a transaction open on the root
    let root = tree_with_children("Root", &["Child"]);
    let child = root.get_child(0).unwrap();
    let mut outer = root.begin_transaction();
    outer.set_property("outer", 1).unwrap();

    // WHEN a second transaction on a descendant runs on the same thread
    child
        .with_transaction(|tx| tx.set_property("inner", 2))
        .unwrap();
    outer.commit().unwrap();

    // THEN both complete without deadlock
    assert!(root.has_property("outer"));
    assert!(child.has_property("inner"));
}

#[test]
fn test_description_and_identity() {
    let tree = DataTree::new("Node");
    let mut first = tree.begin_transaction();
    assert_eq!(first.description(), "DataTree Changes");
    first.set_description("Rename");
    assert_eq!(first.description(), "Rename");
    assert!(first.is_empty());
    assert!(first.target().is_same_node(&tree));
    let first_id = first.id().clone();
    first.commit().unwrap();

    let second = tree.begin_transaction();
    assert_ne!(second.id(), &first_id);
}
