//! Scoped, atomic edits to a single node
//!
//! A transaction applies each staged operation to the target node right
//! away, so reads made through the tree during the transaction already see
//! the new state. Listeners hear nothing until [`Transaction::commit`],
//! which replays one notification per staged operation in staging order.
//! [`Transaction::abort`] reverts the staged operations in reverse order and
//! notifies nobody.
//!
//! While a transaction is open it holds the write gate of its target's
//! root, so concurrent writers on other threads wait. Dropping an open
//! transaction commits it.

use std::time::Instant;

use datatree_core_types::TransactionId;
use tracing::warn;

use super::edit_action::TreeEditAction;
use super::ops::{check_attachable, TreeOp};
use super::{DataTree, GateGuard};
use crate::errors::{DataTreeError, ExError, Result};
use crate::identifier::Identifier;
use crate::undo::UndoManager;
use crate::value::Value;
use crate::{log_op_end, log_op_error, log_op_start};

/// Description used when a transaction is not given one
pub const DEFAULT_DESCRIPTION: &str = "DataTree Changes";

/// Staged edits to one node, finalized by commit, abort or drop
///
/// # Example
///
/// ```
/// use datatree_core::{DataTree, UndoManager, Value};
///
/// let undo = UndoManager::new();
/// let tree = DataTree::new("Settings");
///
/// let mut tx = tree.begin_undoable_transaction(&undo);
/// tx.set_property("volume", 11).unwrap();
/// tx.commit().unwrap();
///
/// assert_eq!(tree.get_property("volume").unwrap(), Value::Int(11));
/// assert!(undo.undo());
/// assert!(!tree.has_property("volume"));
/// ```
pub struct Transaction<'a> {
    id: TransactionId,
    target: DataTree,
    description: String,
    ops: Vec<TreeOp>,
    undo_manager: Option<&'a UndoManager>,
    finalized: bool,
    started: Instant,
    // Released when the transaction is finalized or dropped
    gate: Option<GateGuard>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(target: &DataTree, undo_manager: Option<&'a UndoManager>) -> Self {
        let gate = target.lock_root();
        Self {
            id: TransactionId::new(),
            target: target.clone(),
            description: DEFAULT_DESCRIPTION.to_string(),
            ops: Vec::new(),
            undo_manager,
            finalized: false,
            started: Instant::now(),
            gate,
        }
    }

    pub(crate) fn run<T, F>(mut self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        match edit(&mut self) {
            Ok(output) => {
                if self.is_active() {
                    self.commit()?;
                }
                Ok(output)
            }
            Err(err) => {
                if self.is_active() {
                    self.abort()?;
                }
                Err(err)
            }
        }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    /// The node this transaction edits
    pub fn target(&self) -> &DataTree {
        &self.target
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Name used for the undo group this transaction records into
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Whether the transaction can still stage, commit or abort
    pub fn is_active(&self) -> bool {
        !self.finalized
    }

    /// Number of staged operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn check_open(&self) -> Result<()> {
        if self.finalized {
            return Err(DataTreeError::TransactionAlreadyFinalized);
        }
        if !self.target.is_valid() {
            return Err(DataTreeError::InvalidNode);
        }
        Ok(())
    }

    fn stage(&mut self, op: TreeOp) -> Result<()> {
        op.apply(&self.target)?;
        self.ops.push(op);
        Ok(())
    }

    // ===== Property edits =====

    /// Set `key` to `value`, creating the property if absent
    ///
    /// Setting a property to the value it already holds stages nothing.
    ///
    /// # Errors
    /// * `TransactionAlreadyFinalized` - After commit or abort
    /// * `InvalidNode` - If the target is the invalid sentinel
    /// * `InvalidIdentifier` - If `key` is null
    pub fn set_property(&mut self, key: impl Into<Identifier>, value: impl Into<Value>) -> Result<()> {
        self.check_open()?;
        let key = key.into();
        if key.is_null() {
            return Err(DataTreeError::InvalidIdentifier {
                input: String::new(),
            });
        }
        let value = value.into();
        let previous = self.target.get_property(&key).ok();
        if previous.as_ref() == Some(&value) {
            return Ok(());
        }
        self.stage(TreeOp::SetProperty {
            key,
            value,
            previous,
        })
    }

    /// Remove a property
    ///
    /// # Errors
    /// * `TransactionAlreadyFinalized` - After commit or abort
    /// * `InvalidNode` - If the target is the invalid sentinel
    /// * `KeyNotFound` - If the property is absent
    pub fn remove_property(&mut self, key: impl AsRef<str>) -> Result<()> {
        self.check_open()?;
        let key = key.as_ref();
        let (index, value) = self
            .target
            .property_entry(key)
            .ok_or_else(|| DataTreeError::KeyNotFound {
                key: key.to_string(),
            })?;
        self.stage(TreeOp::RemoveProperty {
            key: Identifier::from(key),
            value,
            index,
        })
    }

    /// Remove every property; a no-op when there are none
    ///
    /// # Errors
    /// * `TransactionAlreadyFinalized` - After commit or abort
    /// * `InvalidNode` - If the target is the invalid sentinel
    pub fn remove_all_properties(&mut self) -> Result<()> {
        self.check_open()?;
        let entries = self.target.properties();
        if entries.is_empty() {
            return Ok(());
        }
        self.stage(TreeOp::RemoveAllProperties { entries })
    }

    // ===== Child edits =====

    /// Append `child` after the existing children
    ///
    /// # Errors
    /// * `TransactionAlreadyFinalized` - After commit or abort
    /// * `InvalidNode` - If the target or `child` is the invalid sentinel
    /// * `CycleDetected` - If `child` is the target or one of its ancestors
    /// * `AlreadyAttached` - If `child` already has a parent
    pub fn add_child(&mut self, child: &DataTree) -> Result<()> {
        let index = self.target.get_num_children();
        self.insert_child(child, index)
    }

    /// Insert `child` at `index`; `index == get_num_children()` appends
    ///
    /// # Errors
    /// As [`Transaction::add_child`], plus:
    /// * `IndexOutOfRange` - If `index > get_num_children()`
    pub fn insert_child(&mut self, child: &DataTree, index: usize) -> Result<()> {
        self.check_open()?;
        check_attachable(&self.target, child)?;
        let len = self.target.get_num_children();
        if index > len {
            return Err(DataTreeError::IndexOutOfRange { index, len });
        }
        self.stage(TreeOp::AddChild {
            child: child.clone(),
            index,
        })
    }

    /// Detach and return the child at `index`
    ///
    /// # Errors
    /// * `TransactionAlreadyFinalized` - After commit or abort
    /// * `InvalidNode` - If the target is the invalid sentinel
    /// * `IndexOutOfRange` - If `index >= get_num_children()`
    pub fn remove_child(&mut self, index: usize) -> Result<DataTree> {
        self.check_open()?;
        let child = self.target.get_child(index)?;
        self.stage(TreeOp::RemoveChild {
            child: child.clone(),
            index,
        })?;
        Ok(child)
    }

    /// Detach `child`, returning the index it occupied
    ///
    /// # Errors
    /// * `TransactionAlreadyFinalized` - After commit or abort
    /// * `InvalidNode` - If the target is the invalid sentinel, or `child`
    ///   is not one of its children
    pub fn remove_child_node(&mut self, child: &DataTree) -> Result<usize> {
        self.check_open()?;
        let index = self.target.index_of(child).ok_or(DataTreeError::InvalidNode)?;
        self.remove_child(index)?;
        Ok(index)
    }

    /// Detach every child; a no-op when there are none
    ///
    /// # Errors
    /// * `TransactionAlreadyFinalized` - After commit or abort
    /// * `InvalidNode` - If the target is the invalid sentinel
    pub fn remove_all_children(&mut self) -> Result<()> {
        self.check_open()?;
        let children = self.target.children();
        if children.is_empty() {
            return Ok(());
        }
        self.stage(TreeOp::RemoveAllChildren { children })
    }

    /// Move the child at `from` so it ends up at `to`
    ///
    /// Children between the two positions shift by one. A move to the same
    /// index stages nothing.
    ///
    /// # Errors
    /// * `TransactionAlreadyFinalized` - After commit or abort
    /// * `InvalidNode` - If the target is the invalid sentinel
    /// * `IndexOutOfRange` - If either index is `>= get_num_children()`
    pub fn move_child(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_open()?;
        let len = self.target.get_num_children();
        if to >= len {
            return Err(DataTreeError::IndexOutOfRange { index: to, len });
        }
        let child = self.target.get_child(from)?;
        if from == to {
            return Ok(());
        }
        self.stage(TreeOp::MoveChild { child, from, to })
    }

    // ===== Finalization =====

    /// Publish the staged edits
    ///
    /// Fires one notification per staged operation in staging order, then,
    /// when bound to an [`UndoManager`], records the edits as one action in
    /// its current group (opening a group named after the description if
    /// none is open) and clears its redo history.
    ///
    /// # Errors
    /// * `TransactionAlreadyFinalized` - If already committed or aborted
    pub fn commit(&mut self) -> Result<()> {
        let op = "commit";
        log_op_start!(op, transaction_id = %self.id, op_count = self.ops.len());

        if self.finalized {
            let err = DataTreeError::TransactionAlreadyFinalized;
            log_op_error!(
                op,
                ExError::from(err.clone()).with_transaction_id(self.id.clone()),
                duration_ms = self.started.elapsed().as_millis() as u64,
                transaction_id = %self.id
            );
            return Err(err);
        }
        self.finalized = true;

        let ops = std::mem::take(&mut self.ops);
        for staged in &ops {
            for notification in staged.applied_notifications() {
                notification.dispatch(&self.target);
            }
        }

        let op_count = ops.len();
        if let Some(manager) = self.undo_manager {
            if !ops.is_empty() {
                let action = TreeEditAction::new(&self.target, ops, self.id.clone());
                manager.record(Box::new(action), &self.description);
            }
        }

        self.gate = None;
        log_op_end!(
            op,
            duration_ms = self.started.elapsed().as_millis() as u64,
            transaction_id = %self.id,
            op_count = op_count
        );
        Ok(())
    }

    /// Revert the staged edits in reverse order without notifying listeners
    /// or touching undo history
    ///
    /// # Errors
    /// * `TransactionAlreadyFinalized` - If already committed or aborted
    pub fn abort(&mut self) -> Result<()> {
        let op = "abort";
        log_op_start!(op, transaction_id = %self.id, op_count = self.ops.len());

        if self.finalized {
            let err = DataTreeError::TransactionAlreadyFinalized;
            log_op_error!(
                op,
                ExError::from(err.clone()).with_transaction_id(self.id.clone()),
                duration_ms = self.started.elapsed().as_millis() as u64,
                transaction_id = %self.id
            );
            return Err(err);
        }
        self.finalized = true;

        let ops = std::mem::take(&mut self.ops);
        for staged in ops.iter().rev() {
            if let Err(err) = staged.revert(&self.target) {
                warn!(
                    transaction_id = %self.id,
                    staged_op = staged.name(),
                    error = %err,
                    "Failed to revert staged operation"
                );
            }
        }

        self.gate = None;
        log_op_end!(
            op,
            duration_ms = self.started.elapsed().as_millis() as u64,
            transaction_id = %self.id,
            op_count = ops.len()
        );
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.is_active() {
            let _ = self.commit();
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("description", &self.description)
            .field("staged", &self.ops.len())
            .field("finalized", &self.finalized)
            .finish()
    }
}
