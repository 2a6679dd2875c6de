//! Undo history entry for a committed transaction

use std::sync::Weak;

use datatree_core_types::TransactionId;
use tracing::warn;

use super::ops::TreeOp;
use super::{DataObject, DataTree};
use crate::undo::{UndoDirection, UndoableAction};

/// The operations of one committed transaction, replayable in either
/// direction
///
/// The target node is held weakly: once every handle to it is gone the
/// entry reports itself invalid and the undo manager drops it. Children
/// removed by the transaction are held strongly so redo can reattach them.
pub(crate) struct TreeEditAction {
    target: Weak<DataObject>,
    ops: Vec<TreeOp>,
    transaction_id: TransactionId,
}

impl TreeEditAction {
    pub(crate) fn new(target: &DataTree, ops: Vec<TreeOp>, transaction_id: TransactionId) -> Self {
        Self {
            target: target.downgrade(),
            ops,
            transaction_id,
        }
    }
}

impl UndoableAction for TreeEditAction {
    fn is_valid(&self) -> bool {
        self.target.strong_count() > 0 && !self.ops.is_empty()
    }

    /// Replays every op, even after one fails, and keeps only the ops that
    /// replayed so a later undo or redo does not retry the broken ones
    fn perform(&mut self, direction: UndoDirection) -> bool {
        let Some(object) = self.target.upgrade() else {
            return false;
        };
        let target = DataTree::from_object(object);
        let _gate = target.lock_root();

        let order: Vec<usize> = match direction {
            UndoDirection::Undo => (0..self.ops.len()).rev().collect(),
            UndoDirection::Redo => (0..self.ops.len()).collect(),
        };
        let mut replayed = vec![false; self.ops.len()];
        for index in order {
            let op = &self.ops[index];
            let (result, notifications) = match direction {
                UndoDirection::Undo => (op.revert(&target), op.reverted_notifications()),
                UndoDirection::Redo => (op.apply(&target), op.applied_notifications()),
            };
            match result {
                Ok(()) => {
                    for notification in notifications {
                        notification.dispatch(&target);
                    }
                    replayed[index] = true;
                }
                Err(err) => warn!(
                    transaction_id = %self.transaction_id,
                    staged_op = op.name(),
                    direction = ?direction,
                    error = %err,
                    "Dropping transaction operation that failed to replay"
                ),
            }
        }

        let mut flags = replayed.into_iter();
        self.ops.retain(|_| flags.next().unwrap_or(false));
        !self.ops.is_empty()
    }
}
