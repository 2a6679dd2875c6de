//! Undo history
//!
//! An [`UndoManager`] keeps a stack of named groups of
//! [`UndoableAction`]s. Committed undoable transactions are recorded as
//! actions; arbitrary reversible work can be recorded through
//! [`UndoManager::perform`].

mod action;
mod manager;

pub use action::{UndoDirection, UndoableAction, WeakCallbackAction};
pub use manager::{ScopedTransaction, UndoManager};
