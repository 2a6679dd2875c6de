//! Reversible units of work

use std::fmt;
use std::sync::{Arc, Weak};

/// Which way an action is being replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoDirection {
    /// Apply the change (initial perform and redo)
    Redo,
    /// Revert the change
    Undo,
}

impl fmt::Display for UndoDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoDirection::Redo => f.write_str("redo"),
            UndoDirection::Undo => f.write_str("undo"),
        }
    }
}

/// A change that can be applied and reverted
///
/// Implementations must be symmetric: performing `Undo` after `Redo` (or
/// the reverse) returns the affected state to where it started.
pub trait UndoableAction: Send {
    /// Whether the action can still run; invalid actions are discarded
    fn is_valid(&self) -> bool {
        true
    }

    /// Apply or revert the change, returning whether it succeeded
    fn perform(&mut self, direction: UndoDirection) -> bool;
}

/// Action bound to a weakly held object
///
/// Becomes invalid, and is discarded from history, once the object is
/// dropped. The callback receives the object and the direction to apply.
pub struct WeakCallbackAction<T, F> {
    target: Weak<T>,
    callback: F,
}

impl<T, F> WeakCallbackAction<T, F>
where
    T: Send + Sync,
    F: FnMut(&T, UndoDirection) -> bool + Send,
{
    pub fn new(target: &Arc<T>, callback: F) -> Self {
        Self {
            target: Arc::downgrade(target),
            callback,
        }
    }
}

impl<T, F> UndoableAction for WeakCallbackAction<T, F>
where
    T: Send + Sync,
    F: FnMut(&T, UndoDirection) -> bool + Send,
{
    fn is_valid(&self) -> bool {
        self.target.strong_count() > 0
    }

    fn perform(&mut self, direction: UndoDirection) -> bool {
        match self.target.upgrade() {
            Some(target) => (self.callback)(&target, direction),
            None => false,
        }
    }
}
