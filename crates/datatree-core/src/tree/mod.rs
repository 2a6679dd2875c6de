//! Hierarchical property tree
//!
//! A [`DataTree`] is a cheap, shareable handle to a node. Cloning the handle
//! never copies the node: all clones observe the same properties, children
//! and listeners. Use [`DataTree::deep_clone`] for an independent copy.
//!
//! Reads go straight to the node. Writes go through a
//! [`Transaction`](transaction::Transaction), which applies each staged
//! operation immediately and emits change notifications on commit.
//!
//! Each node guards its own state with an `RwLock`. Operations never hold
//! two node locks at once: parent links, child lists and listener lists are
//! snapshotted under a short lock and then walked lock-free.

mod cached_value;
mod edit_action;
mod gate;
mod listener;
mod ops;
mod properties;
mod transaction;
mod traversal;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

pub use cached_value::CachedValue;
pub use listener::DataTreeListener;
pub use transaction::{Transaction, DEFAULT_DESCRIPTION};

pub(crate) use gate::GateGuard;

use crate::errors::{DataTreeError, Result};
use crate::identifier::Identifier;
use crate::listener::ListenerRegistry;
use crate::undo::UndoManager;
use crate::value::Value;
use gate::WriteGate;
pub(crate) use properties::PropertyMap;

#[derive(Default)]
pub(crate) struct NodeState {
    pub(crate) properties: PropertyMap,
    pub(crate) children: Vec<DataTree>,
    pub(crate) parent: Weak<DataObject>,
}

pub(crate) struct DataObject {
    node_type: Identifier,
    state: RwLock<NodeState>,
    listeners: ListenerRegistry<dyn DataTreeListener>,
    gate: WriteGate,
}

impl DataObject {
    fn new(node_type: Identifier) -> Self {
        Self {
            node_type,
            state: RwLock::new(NodeState::default()),
            listeners: ListenerRegistry::new(),
            gate: WriteGate::default(),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, NodeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a node in a property tree, or the invalid sentinel
///
/// The default handle is invalid: reads return empty defaults and
/// transactions on it fail with [`DataTreeError::InvalidNode`].
///
/// Equality (`==`) is node identity. Use [`DataTree::is_equivalent_to`] for
/// structural comparison.
#[derive(Clone, Default)]
pub struct DataTree {
    object: Option<Arc<DataObject>>,
}

impl DataTree {
    /// Create a detached node with no properties or children
    ///
    /// Invalid identifier text yields a node with the null type; use
    /// [`DataTree::try_new`] to reject it instead.
    pub fn new(node_type: impl Into<Identifier>) -> Self {
        Self::from_object(Arc::new(DataObject::new(node_type.into())))
    }

    /// Create a detached node, rejecting empty or whitespace-only types
    ///
    /// # Errors
    /// * `InvalidIdentifier` - If `node_type` is not a valid identifier
    pub fn try_new(node_type: &str) -> Result<Self> {
        Ok(Self::new(Identifier::new(node_type)?))
    }

    /// The invalid sentinel
    pub fn invalid() -> Self {
        Self::default()
    }

    pub(crate) fn from_object(object: Arc<DataObject>) -> Self {
        Self {
            object: Some(object),
        }
    }

    fn from_weak(handle: &Weak<DataObject>) -> Self {
        Self {
            object: handle.upgrade(),
        }
    }

    pub(crate) fn object(&self) -> Option<&Arc<DataObject>> {
        self.object.as_ref()
    }

    pub(crate) fn downgrade(&self) -> Weak<DataObject> {
        self.object.as_ref().map(Arc::downgrade).unwrap_or_default()
    }

    pub fn is_valid(&self) -> bool {
        self.object.is_some()
    }

    /// Whether both handles refer to the same node
    pub fn is_same_node(&self, other: &DataTree) -> bool {
        match (&self.object, &other.object) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    // ===== Properties =====

    /// Node type; null for the invalid sentinel
    pub fn get_type(&self) -> Identifier {
        self.object
            .as_ref()
            .map(|o| o.node_type.clone())
            .unwrap_or_default()
    }

    pub fn get_num_properties(&self) -> usize {
        self.object.as_ref().map_or(0, |o| o.read().properties.len())
    }

    /// Name of the property at `index` in insertion order; null if out of range
    pub fn get_property_name(&self, index: usize) -> Identifier {
        self.object
            .as_ref()
            .and_then(|o| o.read().properties.name_at(index).cloned())
            .unwrap_or_default()
    }

    pub fn has_property(&self, key: impl AsRef<str>) -> bool {
        self.object
            .as_ref()
            .is_some_and(|o| o.read().properties.contains(key.as_ref()))
    }

    /// Read a property
    ///
    /// # Errors
    /// * `KeyNotFound` - If the property is absent (a stored `Value::Null`
    ///   is returned as `Ok`)
    pub fn get_property(&self, key: impl AsRef<str>) -> Result<Value> {
        let key = key.as_ref();
        self.object
            .as_ref()
            .and_then(|o| o.read().properties.get(key).cloned())
            .ok_or_else(|| DataTreeError::KeyNotFound {
                key: key.to_string(),
            })
    }

    /// Read a property, falling back to `default` when absent
    pub fn get_property_or(&self, key: impl AsRef<str>, default: impl Into<Value>) -> Value {
        self.get_property(key).unwrap_or_else(|_| default.into())
    }

    /// Position and value of `key`, if present
    pub(crate) fn property_entry(&self, key: &str) -> Option<(usize, Value)> {
        let object = self.object.as_ref()?;
        let state = object.read();
        state.properties.entry(key)
    }

    /// Snapshot of all properties in insertion order
    pub fn properties(&self) -> Vec<(Identifier, Value)> {
        self.object
            .as_ref()
            .map(|o| o.read().properties.to_vec())
            .unwrap_or_default()
    }

    // ===== Children =====

    pub fn get_num_children(&self) -> usize {
        self.object.as_ref().map_or(0, |o| o.read().children.len())
    }

    /// # Errors
    /// * `IndexOutOfRange` - If `index >= get_num_children()`
    pub fn get_child(&self, index: usize) -> Result<DataTree> {
        let Some(object) = &self.object else {
            return Err(DataTreeError::IndexOutOfRange { index, len: 0 });
        };
        let state = object.read();
        state
            .children
            .get(index)
            .cloned()
            .ok_or(DataTreeError::IndexOutOfRange {
                index,
                len: state.children.len(),
            })
    }

    /// First child whose type is `node_type`; invalid if none
    pub fn get_child_with_name(&self, node_type: impl AsRef<str>) -> DataTree {
        let node_type = node_type.as_ref();
        self.find_child(|child| child.get_type() == node_type)
    }

    /// Position of `child` among this node's children
    pub fn index_of(&self, child: &DataTree) -> Option<usize> {
        let object = self.object.as_ref()?;
        let state = object.read();
        state.children.iter().position(|c| c.is_same_node(child))
    }

    /// Snapshot of the current children in order
    pub fn children(&self) -> Vec<DataTree> {
        self.object
            .as_ref()
            .map(|o| o.read().children.clone())
            .unwrap_or_default()
    }

    // ===== Ancestry =====

    /// Parent node; invalid for roots and the invalid sentinel
    pub fn get_parent(&self) -> DataTree {
        match &self.object {
            Some(object) => DataTree::from_weak(&object.read().parent),
            None => DataTree::invalid(),
        }
    }

    /// Topmost ancestor; the node itself when it has no parent
    pub fn get_root(&self) -> DataTree {
        let mut current = self.clone();
        loop {
            let parent = current.get_parent();
            if !parent.is_valid() {
                return current;
            }
            current = parent;
        }
    }

    /// Number of ancestors above this node
    pub fn get_depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.get_parent();
        while current.is_valid() {
            depth += 1;
            current = current.get_parent();
        }
        depth
    }

    /// Whether `ancestor` appears anywhere above this node
    pub fn is_a_child_of(&self, ancestor: &DataTree) -> bool {
        if !ancestor.is_valid() {
            return false;
        }
        let mut current = self.get_parent();
        while current.is_valid() {
            if current.is_same_node(ancestor) {
                return true;
            }
            current = current.get_parent();
        }
        false
    }

    // ===== Structure =====

    /// Independent copy of this subtree
    ///
    /// The copy has no parent and no listeners; its type, properties and
    /// children (recursively) are equal to the original's.
    pub fn deep_clone(&self) -> DataTree {
        let Some(object) = &self.object else {
            return DataTree::invalid();
        };
        let (properties, children) = {
            let state = object.read();
            (state.properties.clone(), state.children.clone())
        };

        let copy = DataTree::new(object.node_type.clone());
        let copies: Vec<DataTree> = children.iter().map(DataTree::deep_clone).collect();
        copy.attach_initial(properties, copies);
        copy
    }

    /// Structural equality: type, properties (ignoring order) and children
    /// (in order, recursively). Identity and listeners are ignored.
    pub fn is_equivalent_to(&self, other: &DataTree) -> bool {
        let (a, b) = match (&self.object, &other.object) {
            (None, None) => return true,
            (Some(a), Some(b)) => (a, b),
            _ => return false,
        };
        if Arc::ptr_eq(a, b) {
            return true;
        }
        if a.node_type != b.node_type {
            return false;
        }

        let (a_props, a_children) = {
            let state = a.read();
            (state.properties.clone(), state.children.clone())
        };
        let (b_props, b_children) = {
            let state = b.read();
            (state.properties.clone(), state.children.clone())
        };

        a_props.same_entries(&b_props)
            && a_children.len() == b_children.len()
            && a_children
                .iter()
                .zip(b_children.iter())
                .all(|(x, y)| x.is_equivalent_to(y))
    }

    /// Populate a freshly created node without transactions or notifications
    pub(crate) fn attach_initial(&self, properties: PropertyMap, children: Vec<DataTree>) {
        let Some(object) = &self.object else {
            return;
        };
        let weak = Arc::downgrade(object);
        for child in &children {
            if let Some(child_object) = child.object() {
                child_object.write().parent = weak.clone();
            }
        }
        let mut state = object.write();
        state.properties = properties;
        state.children = children;
    }

    /// Hold the write gate of this node's current root
    ///
    /// The node may be attached under another root while this thread waits,
    /// so the root is looked up again once the gate is held.
    pub(crate) fn lock_root(&self) -> Option<GateGuard> {
        loop {
            let root = self.get_root();
            let guard = GateGuard::acquire(Arc::clone(root.object()?));
            if self.get_root().is_same_node(&root) {
                return Some(guard);
            }
        }
    }

    // ===== Listeners =====

    /// Register an observer for changes to this node
    ///
    /// Only this node's own changes are reported; descendants' changes are
    /// not forwarded. The registry keeps a weak handle.
    pub fn add_listener<L>(&self, listener: &Arc<L>)
    where
        L: DataTreeListener + 'static,
    {
        if let Some(object) = &self.object {
            let listener: Arc<dyn DataTreeListener> = listener.clone();
            object.listeners.add(&listener);
        }
    }

    /// Returns whether the observer was registered
    pub fn remove_listener<L>(&self, listener: &Arc<L>) -> bool
    where
        L: DataTreeListener + 'static,
    {
        match &self.object {
            Some(object) => {
                let listener: Arc<dyn DataTreeListener> = listener.clone();
                object.listeners.remove(&listener)
            }
            None => false,
        }
    }

    pub fn remove_all_listeners(&self) {
        if let Some(object) = &self.object {
            object.listeners.clear();
        }
    }

    pub fn get_num_listeners(&self) -> usize {
        self.object.as_ref().map_or(0, |o| o.listeners.len())
    }

    // ===== Transactions =====

    /// Start a transaction whose changes are not recorded for undo
    ///
    /// Blocks while another thread holds a transaction on the same root.
    pub fn begin_transaction(&self) -> Transaction<'static> {
        Transaction::begin(self, None)
    }

    /// Start a transaction whose changes are recorded into `undo_manager`
    /// on commit
    pub fn begin_undoable_transaction<'a>(&self, undo_manager: &'a UndoManager) -> Transaction<'a> {
        Transaction::begin(self, Some(undo_manager))
    }

    /// Run `edit` inside a transaction: commit on `Ok`, abort on `Err`
    ///
    /// # Errors
    /// Returns the error produced by `edit`, after rolling back its changes.
    pub fn with_transaction<T, F>(&self, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'static>) -> Result<T>,
    {
        Transaction::run(self.begin_transaction(), edit)
    }

    /// As [`DataTree::with_transaction`], recording into `undo_manager`
    ///
    /// # Errors
    /// Returns the error produced by `edit`, after rolling back its changes.
    pub fn with_undoable_transaction<'a, T, F>(&self, undo_manager: &'a UndoManager, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'a>) -> Result<T>,
    {
        Transaction::run(self.begin_undoable_transaction(undo_manager), edit)
    }
}

impl PartialEq for DataTree {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_node(other)
    }
}

impl Eq for DataTree {}

impl fmt::Debug for DataTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.object {
            None => f.write_str("DataTree(invalid)"),
            Some(object) => {
                let state = object.read();
                f.debug_struct("DataTree")
                    .field("type", &object.node_type)
                    .field("properties", &state.properties.len())
                    .field("children", &state.children.len())
                    .finish()
            }
        }
    }
}
