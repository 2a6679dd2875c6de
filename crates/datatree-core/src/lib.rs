//! DataTree Core - Transactional, observable property trees
//!
//! This crate provides a hierarchical model of typed nodes, each carrying an
//! ordered set of named primitive properties and an ordered list of
//! children, including:
//! - Interned identifiers and tagged property values
//! - Atomic transactions with commit, abort and auto-commit on drop
//! - Change listeners held by weak reference
//! - Typed property caches that follow changes
//! - Grouped undo/redo history with bounded depth
//! - Lossless JSON serialization
//! - Structured logging with a test capture layer
//!
//! # Example
//!
//! ```
//! use datatree_core::{DataTree, UndoManager, Value};
//!
//! let undo = UndoManager::new();
//! let root = DataTree::new("Project");
//! let track = DataTree::new("Track");
//!
//! root.with_undoable_transaction(&undo, |tx| {
//!     tx.set_property("name", "Demo")?;
//!     tx.add_child(&track)
//! })
//! .unwrap();
//!
//! assert_eq!(root.get_num_children(), 1);
//! assert_eq!(track.get_parent(), root);
//!
//! undo.undo();
//! assert_eq!(root.get_num_children(), 0);
//! assert!(root.get_property("name").is_err());
//! ```

pub mod config;
pub mod errors;
pub mod identifier;
pub mod listener;
pub mod logging_facility;
pub mod serializer;
pub mod tree;
pub mod undo;
pub mod value;

// Re-export commonly used types
pub use config::UndoManagerConfig;
pub use errors::{DataTreeError, ExError, ExErrorKind, Result};
pub use identifier::Identifier;
pub use tree::{CachedValue, DataTree, DataTreeListener, Transaction};
pub use undo::{ScopedTransaction, UndoDirection, UndoManager, UndoableAction, WeakCallbackAction};
pub use value::{FromValue, Value};
