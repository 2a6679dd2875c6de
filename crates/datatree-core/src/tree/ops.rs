//! Staged tree operations and their inverses
//!
//! Every mutation a transaction performs is captured as a [`TreeOp`] holding
//! enough state to replay it forwards (redo) or backwards (abort, undo).
//! Applying an op touches node state only; notifications are produced
//! separately so callers control when listeners run.

use std::sync::Arc;

use super::DataTree;
use crate::errors::{DataTreeError, Result};
use crate::identifier::Identifier;
use crate::value::Value;

#[derive(Debug, Clone)]
pub(crate) enum TreeOp {
    SetProperty {
        key: Identifier,
        value: Value,
        previous: Option<Value>,
    },
    RemoveProperty {
        key: Identifier,
        value: Value,
        index: usize,
    },
    RemoveAllProperties {
        entries: Vec<(Identifier, Value)>,
    },
    AddChild {
        child: DataTree,
        index: usize,
    },
    RemoveChild {
        child: DataTree,
        index: usize,
    },
    RemoveAllChildren {
        children: Vec<DataTree>,
    },
    MoveChild {
        child: DataTree,
        from: usize,
        to: usize,
    },
}

/// A change report waiting to be delivered to a node's listeners
#[derive(Debug, Clone)]
pub(crate) enum Notification {
    PropertyChanged {
        key: Identifier,
    },
    ChildAdded {
        child: DataTree,
    },
    ChildRemoved {
        child: DataTree,
        former_index: usize,
    },
    ChildMoved {
        child: DataTree,
        old_index: usize,
        new_index: usize,
    },
}

impl Notification {
    /// Deliver to every live listener on `tree`
    pub(crate) fn dispatch(&self, tree: &DataTree) {
        let Some(object) = tree.object() else {
            return;
        };
        object.listeners.call(|listener| {
            match self {
                Notification::PropertyChanged { key } => listener.property_changed(tree, key),
                Notification::ChildAdded { child } => listener.child_added(tree, child),
                Notification::ChildRemoved {
                    child,
                    former_index,
                } => listener.child_removed(tree, child, *former_index),
                Notification::ChildMoved {
                    child,
                    old_index,
                    new_index,
                } => listener.child_moved(tree, child, *old_index, *new_index),
            }
        });
    }
}

impl TreeOp {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            TreeOp::SetProperty { .. } => "set_property",
            TreeOp::RemoveProperty { .. } => "remove_property",
            TreeOp::RemoveAllProperties { .. } => "remove_all_properties",
            TreeOp::AddChild { .. } => "add_child",
            TreeOp::RemoveChild { .. } => "remove_child",
            TreeOp::RemoveAllChildren { .. } => "remove_all_children",
            TreeOp::MoveChild { .. } => "move_child",
        }
    }

    /// Re-apply this op to `target`
    pub(crate) fn apply(&self, target: &DataTree) -> Result<()> {
        let object = target.object().ok_or(DataTreeError::InvalidNode)?;
        match self {
            TreeOp::SetProperty { key, value, .. } => {
                object.write().properties.set(key.clone(), value.clone());
            }
            TreeOp::RemoveProperty { key, .. } => {
                object
                    .write()
                    .properties
                    .remove(key.as_str())
                    .ok_or_else(|| DataTreeError::KeyNotFound {
                        key: key.to_string(),
                    })?;
            }
            TreeOp::RemoveAllProperties { .. } => {
                object.write().properties.take_all();
            }
            TreeOp::AddChild { child, index } => insert_child(target, child, *index)?,
            TreeOp::RemoveChild { child, index } => {
                detach_child(target, child, *index)?;
            }
            TreeOp::RemoveAllChildren { .. } => {
                let removed = std::mem::take(&mut object.write().children);
                for child in &removed {
                    clear_parent(child);
                }
            }
            TreeOp::MoveChild { from, to, .. } => rotate_child(target, *from, *to)?,
        }
        Ok(())
    }

    /// Undo the effect of this op on `target`
    pub(crate) fn revert(&self, target: &DataTree) -> Result<()> {
        let object = target.object().ok_or(DataTreeError::InvalidNode)?;
        match self {
            TreeOp::SetProperty { key, previous, .. } => {
                let mut state = object.write();
                match previous {
                    Some(old) => {
                        state.properties.set(key.clone(), old.clone());
                    }
                    None => {
                        state.properties.remove(key.as_str());
                    }
                }
            }
            TreeOp::RemoveProperty { key, value, index } => {
                object
                    .write()
                    .properties
                    .restore(*index, key.clone(), value.clone());
            }
            TreeOp::RemoveAllProperties { entries } => {
                object.write().properties.restore_all(entries.clone());
            }
            TreeOp::AddChild { child, index } => {
                detach_child(target, child, *index)?;
            }
            TreeOp::RemoveChild { child, index } => insert_child(target, child, *index)?,
            TreeOp::RemoveAllChildren { children } => {
                let _child_gates: Vec<_> =
                    children.iter().filter_map(DataTree::lock_root).collect();
                for child in children {
                    if child.get_parent().is_valid() {
                        return Err(DataTreeError::AlreadyAttached {
                            node_type: child.get_type().to_string(),
                        });
                    }
                }
                let parent = target.downgrade();
                for child in children {
                    if let Some(child_object) = child.object() {
                        child_object.write().parent = parent.clone();
                    }
                }
                let mut state = object.write();
                let later = std::mem::replace(&mut state.children, children.clone());
                state.children.extend(later);
            }
            TreeOp::MoveChild { from, to, .. } => rotate_child(target, *to, *from)?,
        }
        Ok(())
    }

    /// Reports describing [`TreeOp::apply`]
    pub(crate) fn applied_notifications(&self) -> Vec<Notification> {
        match self {
            TreeOp::SetProperty { key, .. } | TreeOp::RemoveProperty { key, .. } => {
                vec![Notification::PropertyChanged { key: key.clone() }]
            }
            TreeOp::RemoveAllProperties { entries } => property_reports(entries),
            TreeOp::AddChild { child, .. } => vec![Notification::ChildAdded {
                child: child.clone(),
            }],
            TreeOp::RemoveChild { child, index } => vec![Notification::ChildRemoved {
                child: child.clone(),
                former_index: *index,
            }],
            TreeOp::RemoveAllChildren { children } => children
                .iter()
                .enumerate()
                .rev()
                .map(|(index, child)| Notification::ChildRemoved {
                    child: child.clone(),
                    former_index: index,
                })
                .collect(),
            TreeOp::MoveChild { child, from, to } => vec![Notification::ChildMoved {
                child: child.clone(),
                old_index: *from,
                new_index: *to,
            }],
        }
    }

    /// Reports describing [`TreeOp::revert`]
    pub(crate) fn reverted_notifications(&self) -> Vec<Notification> {
        match self {
            TreeOp::SetProperty { key, .. } | TreeOp::RemoveProperty { key, .. } => {
                vec![Notification::PropertyChanged { key: key.clone() }]
            }
            TreeOp::RemoveAllProperties { entries } => property_reports(entries),
            TreeOp::AddChild { child, index } => vec![Notification::ChildRemoved {
                child: child.clone(),
                former_index: *index,
            }],
            TreeOp::RemoveChild { child, .. } => vec![Notification::ChildAdded {
                child: child.clone(),
            }],
            TreeOp::RemoveAllChildren { children } => children
                .iter()
                .map(|child| Notification::ChildAdded {
                    child: child.clone(),
                })
                .collect(),
            TreeOp::MoveChild { child, from, to } => vec![Notification::ChildMoved {
                child: child.clone(),
                old_index: *to,
                new_index: *from,
            }],
        }
    }
}

fn property_reports(entries: &[(Identifier, Value)]) -> Vec<Notification> {
    entries
        .iter()
        .map(|(key, _)| Notification::PropertyChanged { key: key.clone() })
        .collect()
}

fn clear_parent(child: &DataTree) {
    if let Some(object) = child.object() {
        object.write().parent = Default::default();
    }
}

/// Check that `child` may be attached beneath `parent`
pub(crate) fn check_attachable(parent: &DataTree, child: &DataTree) -> Result<()> {
    if !child.is_valid() {
        return Err(DataTreeError::InvalidNode);
    }
    if child.is_same_node(parent) || parent.is_a_child_of(child) {
        return Err(DataTreeError::CycleDetected {
            node_type: child.get_type().to_string(),
        });
    }
    if child.get_parent().is_valid() {
        return Err(DataTreeError::AlreadyAttached {
            node_type: child.get_type().to_string(),
        });
    }
    Ok(())
}

/// Attach `child` under `parent` at `index`
///
/// The caller holds the gate of `parent`'s root. A detached child is a root
/// of its own, so its gate is taken as well: a transaction still open on it
/// from another thread finishes before the child joins the new tree.
fn insert_child(parent: &DataTree, child: &DataTree, index: usize) -> Result<()> {
    let _child_gate = child.lock_root();
    check_attachable(parent, child)?;
    let object = parent.object().ok_or(DataTreeError::InvalidNode)?;
    {
        let mut state = object.write();
        let len = state.children.len();
        if index > len {
            return Err(DataTreeError::IndexOutOfRange { index, len });
        }
        state.children.insert(index, child.clone());
    }
    if let Some(child_object) = child.object() {
        child_object.write().parent = Arc::downgrade(object);
    }
    Ok(())
}

/// Remove `child` from `parent`, preferring the recorded position
fn detach_child(parent: &DataTree, child: &DataTree, index: usize) -> Result<()> {
    let object = parent.object().ok_or(DataTreeError::InvalidNode)?;
    {
        let mut state = object.write();
        let position = if state
            .children
            .get(index)
            .is_some_and(|c| c.is_same_node(child))
        {
            index
        } else {
            state
                .children
                .iter()
                .position(|c| c.is_same_node(child))
                .ok_or(DataTreeError::IndexOutOfRange {
                    index,
                    len: state.children.len(),
                })?
        };
        state.children.remove(position);
    }
    clear_parent(child);
    Ok(())
}

fn rotate_child(parent: &DataTree, from: usize, to: usize) -> Result<()> {
    let object = parent.object().ok_or(DataTreeError::InvalidNode)?;
    let mut state = object.write();
    let len = state.children.len();
    if from >= len || to >= len {
        return Err(DataTreeError::IndexOutOfRange {
            index: from.max(to),
            len,
        });
    }
    let child = state.children.remove(from);
    state.children.insert(to, child);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn key(s: &str) -> Identifier {
        Identifier::new(s).unwrap()
    }

    #[test]
    fn test_set_property_revert_removes_new_key() {
        let tree = DataTree::new("Root");
        let op = TreeOp::SetProperty {
            key: key("k"),
            value: Value::from(1),
            previous: None,
        };

        op.apply(&tree).unwrap();
        assert_eq!(tree.get_property("k").unwrap(), Value::Int(1));
        op.revert(&tree).unwrap();
        assert!(!tree.has_property("k"));
    }

    #[test]
    fn test_add_child_apply_and_revert() {
        let parent = DataTree::new("Parent");
        let child = DataTree::new("Child");
        let op = TreeOp::AddChild {
            child: child.clone(),
            index: 0,
        };

        op.apply(&parent).unwrap();
        assert_eq!(child.get_parent(), parent);
        op.revert(&parent).unwrap();
        assert_eq!(parent.get_num_children(), 0);
        assert!(!child.get_parent().is_valid());
    }

    #[test]
    fn test_rotate_out_of_range() {
        let parent = DataTree::new("Parent");
        let op = TreeOp::MoveChild {
            child: DataTree::new("C"),
            from: 0,
            to: 1,
        };
        assert!(matches!(
            op.apply(&parent),
            Err(DataTreeError::IndexOutOfRange { len: 0, .. })
        ));
    }

    #[test]
    fn test_remove_all_children_reports_last_to_first() {
        let children = vec![DataTree::new("A"), DataTree::new("B")];
        let op = TreeOp::RemoveAllChildren {
            children: children.clone(),
        };
        let indices: Vec<usize> = op
            .applied_notifications()
            .into_iter()
            .map(|n| match n {
                Notification::ChildRemoved { former_index, .. } => former_index,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(indices, vec![1, 0]);
    }
}
