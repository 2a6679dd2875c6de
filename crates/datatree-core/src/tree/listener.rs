//! Change observers for a single node

use super::DataTree;
use crate::identifier::Identifier;

/// Receives change notifications for the node it is registered on
///
/// Notifications fire once per committed operation, on the thread that
/// committed (or undid/redid) the change, with no node lock held. Every
/// method has a no-op default so observers implement only what they need.
///
/// Observers are held weakly: dropping the last `Arc` to an observer
/// unregisters it.
pub trait DataTreeListener: Send + Sync {
    /// A property was set or removed on `tree`
    fn property_changed(&self, tree: &DataTree, key: &Identifier) {
        let _ = (tree, key);
    }

    /// `child` was attached to `parent`
    fn child_added(&self, parent: &DataTree, child: &DataTree) {
        let _ = (parent, child);
    }

    /// `child` was detached from `parent`; `former_index` is where it was
    fn child_removed(&self, parent: &DataTree, child: &DataTree, former_index: usize) {
        let _ = (parent, child, former_index);
    }

    /// `child` moved within `parent` from `old_index` to `new_index`
    fn child_moved(&self, parent: &DataTree, child: &DataTree, old_index: usize, new_index: usize) {
        let _ = (parent, child, old_index, new_index);
    }
}
