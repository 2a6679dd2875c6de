#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end scenarios for configuration-style trees

mod common;

use common::{child_types, tree_with_children};
use datatree_core::{DataTree, UndoManager, Value};

#[test]
fn test_scenario_set_config_properties() {
    // GIVEN a config tree
    let tree = DataTree::new("Config");

    // WHEN a transaction sets two properties and commits
    let mut tx = tree.begin_transaction();
    tx.set_property("version", "1.0").unwrap();
    tx.set_property("debug", true).unwrap();
    tx.commit().unwrap();

    // THEN both are present
    assert_eq!(tree.get_num_properties(), 2);
    assert_eq!(tree.get_property("version").unwrap(), Value::from("1.0"));
    assert_eq!(tree.get_property("debug").unwrap(), Value::Bool(true));
}

#[test]
fn test_scenario_reorder_children() {
    // GIVEN a parent with three children
    let parent = tree_with_children("Parent", &["First", "Second", "Third"]);

    // WHEN moving the second child to the front
    parent.with_transaction(|tx| tx.move_child(1, 0)).unwrap();

    // THEN the order reflects the move
    assert_eq!(child_types(&parent), vec!["Second", "First", "Third"]);
}

#[test]
fn test_scenario_undo_redo_property() {
    // GIVEN an undo manager and a tree edited through it
    let manager = UndoManager::new();
    let tree = DataTree::new("Node");
    tree.with_undoable_transaction(&manager, |tx| tx.set_property("key", "value"))
        .unwrap();

    // WHEN undoing
    assert!(manager.undo());

    // THEN the property is gone
    assert!(!tree.has_property("key"));

    // WHEN redoing
    assert!(manager.redo());

    // THEN it is back with its original value
    assert!(tree.has_property("key"));
    assert_eq!(tree.get_property("key").unwrap(), Value::from("value"));
}

#[test]
fn test_scenario_undo_detached_subtree_and_reattach() {
    // GIVEN a recorded removal of a populated subtree
    let manager = UndoManager::new();
    let root = tree_with_children("Root", &["Keep", "Branch"]);
    let branch = root.get_child(1).unwrap();
    branch
        .with_transaction(|tx| {
            tx.set_property("depth", 1)?;
            tx.add_child(&DataTree::new("Leaf"))
        })
        .unwrap();
    let snapshot = root.deep_clone();
    root.with_undoable_transaction(&manager, |tx| tx.remove_child(1).map(|_| ()))
        .unwrap();
    assert_eq!(child_types(&root), vec!["Keep"]);

    // WHEN undoing
    assert!(manager.undo());

    // THEN the same subtree is reattached in place
    assert!(root.is_equivalent_to(&snapshot));
    assert!(root.get_child(1).unwrap().is_same_node(&branch));
    assert_eq!(branch.get_parent(), root);
}
