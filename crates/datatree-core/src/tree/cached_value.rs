//! Typed, cached view of a single property
//!
//! A [`CachedValue`] binds to one property of one node and keeps a converted
//! copy of it. The copy is refreshed from the node's `property_changed`
//! notifications, so it follows commits, undo and redo without polling.
//! When the property is absent, or holds a variant that does not convert to
//! `T`, the cached value falls back to its default.
//!
//! The cache is guarded by its own lock and may be read from any thread.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{DataTree, DataTreeListener};
use crate::errors::{DataTreeError, Result};
use crate::identifier::Identifier;
use crate::undo::UndoManager;
use crate::value::{FromValue, Value};

struct Slot<T> {
    tree: DataTree,
    key: Identifier,
    cached: T,
    default: Option<T>,
    using_default: bool,
}

impl<T> Slot<T> {
    fn is_bound(&self) -> bool {
        self.tree.is_valid() && !self.key.is_null()
    }
}

impl<T: FromValue + Clone + Default> Slot<T> {
    fn unbound() -> Self {
        Self {
            tree: DataTree::invalid(),
            key: Identifier::null(),
            cached: T::default(),
            default: None,
            using_default: false,
        }
    }

    fn refresh(&mut self) {
        if self.is_bound() {
            if let Ok(value) = self.tree.get_property(&self.key) {
                match T::from_value(&value) {
                    Some(typed) => {
                        self.cached = typed;
                        self.using_default = false;
                        return;
                    }
                    None => debug!(
                        key = %self.key,
                        found = value.type_name(),
                        "Cached property does not convert, using default"
                    ),
                }
            }
        }
        self.using_default = self.default.is_some();
        self.cached = self.default.clone().unwrap_or_default();
    }
}

// The listener half of a CachedValue; the tree holds it weakly
struct Binding<T> {
    slot: RwLock<Slot<T>>,
}

impl<T> Binding<T> {
    fn read(&self) -> RwLockReadGuard<'_, Slot<T>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slot<T>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> DataTreeListener for Binding<T>
where
    T: FromValue + Clone + Default + Send + Sync + 'static,
{
    fn property_changed(&self, tree: &DataTree, key: &Identifier) {
        let mut slot = self.write();
        if slot.tree.is_same_node(tree) && slot.key == *key {
            slot.refresh();
        }
    }
}

/// Cached, typed value of one property of one node
///
/// Dropping the cached value unregisters it: the node only holds a weak
/// handle to it.
///
/// # Example
///
/// ```
/// use datatree_core::{CachedValue, DataTree};
///
/// let tree = DataTree::new("Mixer");
/// let volume = CachedValue::<i64>::with_default(&tree, "volume", 50);
/// assert_eq!(volume.get(), 50);
/// assert!(volume.is_using_default());
///
/// tree.with_transaction(|tx| tx.set_property("volume", 80)).unwrap();
/// assert_eq!(volume.get(), 80);
///
/// volume.set(20).unwrap();
/// assert_eq!(tree.get_property("volume").unwrap().as_i64(), Some(20));
/// ```
pub struct CachedValue<T>
where
    T: FromValue + Clone + Default + Send + Sync + 'static,
{
    binding: Arc<Binding<T>>,
}

impl<T> Default for CachedValue<T>
where
    T: FromValue + Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CachedValue<T>
where
    T: FromValue + Clone + Default + Send + Sync + 'static,
{
    /// Unbound value reading as `T::default()`
    pub fn new() -> Self {
        Self {
            binding: Arc::new(Binding {
                slot: RwLock::new(Slot::unbound()),
            }),
        }
    }

    pub fn bound(tree: &DataTree, key: impl Into<Identifier>) -> Self {
        let mut value = Self::new();
        value.bind(tree, key);
        value
    }

    pub fn with_default(tree: &DataTree, key: impl Into<Identifier>, default: T) -> Self {
        let mut value = Self::new();
        value.bind_with_default(tree, key, default);
        value
    }

    /// Follow `key` on `tree` instead, keeping the current default
    pub fn bind(&mut self, tree: &DataTree, key: impl Into<Identifier>) {
        self.rebind(tree.clone(), key.into(), None);
    }

    pub fn bind_with_default(&mut self, tree: &DataTree, key: impl Into<Identifier>, default: T) {
        self.rebind(tree.clone(), key.into(), Some(default));
    }

    fn rebind(&mut self, tree: DataTree, key: Identifier, default: Option<T>) {
        let mut slot = self.binding.write();
        slot.tree.remove_listener(&self.binding);
        slot.tree = tree;
        slot.key = key;
        if default.is_some() {
            slot.default = default;
        }
        if slot.is_bound() {
            slot.tree.add_listener(&self.binding);
        }
        slot.refresh();
    }

    /// Stop following the property and forget the default
    pub fn unbind(&mut self) {
        let mut slot = self.binding.write();
        slot.tree.remove_listener(&self.binding);
        *slot = Slot::unbound();
    }

    pub fn is_bound(&self) -> bool {
        self.binding.read().is_bound()
    }

    pub fn get(&self) -> T {
        self.binding.read().cached.clone()
    }

    /// Whether the current value came from the default rather than the tree
    pub fn is_using_default(&self) -> bool {
        self.binding.read().using_default
    }

    /// The fallback value; `T::default()` when none was given
    pub fn get_default(&self) -> T {
        self.binding.read().default.clone().unwrap_or_default()
    }

    pub fn set_default(&mut self, default: T) {
        let mut slot = self.binding.write();
        slot.default = Some(default);
        slot.refresh();
    }

    /// Re-read the property from the tree
    pub fn refresh(&self) {
        self.binding.write().refresh();
    }

    /// The bound node; invalid when unbound
    pub fn tree(&self) -> DataTree {
        self.binding.read().tree.clone()
    }

    /// The bound property name; null when unbound
    pub fn property_name(&self) -> Identifier {
        self.binding.read().key.clone()
    }

    /// Write `value` to the property in its own transaction
    ///
    /// # Errors
    /// * `InvalidNode` - If the value is not bound
    pub fn set(&self, value: T) -> Result<()>
    where
        T: Into<Value>,
    {
        let (tree, key) = self.target()?;
        tree.with_transaction(|tx| tx.set_property(key, value))
    }

    /// As [`CachedValue::set`], recording the change into `undo_manager`
    ///
    /// # Errors
    /// * `InvalidNode` - If the value is not bound
    pub fn set_undoable(&self, value: T, undo_manager: &UndoManager) -> Result<()>
    where
        T: Into<Value>,
    {
        let (tree, key) = self.target()?;
        tree.with_undoable_transaction(undo_manager, |tx| tx.set_property(key, value))
    }

    fn target(&self) -> Result<(DataTree, Identifier)> {
        let slot = self.binding.read();
        if !slot.is_bound() {
            return Err(DataTreeError::InvalidNode);
        }
        Ok((slot.tree.clone(), slot.key.clone()))
    }
}

impl<T> fmt::Debug for CachedValue<T>
where
    T: FromValue + Clone + Default + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.binding.read();
        f.debug_struct("CachedValue")
            .field("key", &slot.key)
            .field("cached", &slot.cached)
            .field("using_default", &slot.using_default)
            .finish()
    }
}
