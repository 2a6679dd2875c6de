//! Child and descendant walks
//!
//! Every walk works on a snapshot of each child list, so callbacks may
//! mutate the tree without invalidating the walk. Callbacks return `true`
//! to stop early.

use super::DataTree;

impl DataTree {
    /// Visit direct children in order until `visit` returns `true`
    pub fn for_each_child<F>(&self, mut visit: F)
    where
        F: FnMut(&DataTree) -> bool,
    {
        for child in self.children() {
            if visit(&child) {
                break;
            }
        }
    }

    /// Visit every descendant depth-first, pre-order, until `visit` returns
    /// `true`
    pub fn for_each_descendant<F>(&self, mut visit: F)
    where
        F: FnMut(&DataTree) -> bool,
    {
        self.walk_descendants(&mut visit);
    }

    fn walk_descendants(&self, visit: &mut dyn FnMut(&DataTree) -> bool) -> bool {
        for child in self.children() {
            if visit(&child) || child.walk_descendants(visit) {
                return true;
            }
        }
        false
    }

    /// First direct child matching `predicate`; invalid if none
    pub fn find_child<P>(&self, mut predicate: P) -> DataTree
    where
        P: FnMut(&DataTree) -> bool,
    {
        let mut found = DataTree::invalid();
        self.for_each_child(|child| {
            if predicate(child) {
                found = child.clone();
                return true;
            }
            false
        });
        found
    }

    /// All direct children matching `predicate`, in order
    pub fn find_children<P>(&self, mut predicate: P) -> Vec<DataTree>
    where
        P: FnMut(&DataTree) -> bool,
    {
        self.children()
            .into_iter()
            .filter(|child| predicate(child))
            .collect()
    }

    /// First descendant (pre-order) matching `predicate`; invalid if none
    pub fn find_descendant<P>(&self, mut predicate: P) -> DataTree
    where
        P: FnMut(&DataTree) -> bool,
    {
        let mut found = DataTree::invalid();
        self.for_each_descendant(|node| {
            if predicate(node) {
                found = node.clone();
                return true;
            }
            false
        });
        found
    }

    /// All descendants matching `predicate`, in pre-order
    pub fn find_descendants<P>(&self, mut predicate: P) -> Vec<DataTree>
    where
        P: FnMut(&DataTree) -> bool,
    {
        let mut matches = Vec::new();
        self.for_each_descendant(|node| {
            if predicate(node) {
                matches.push(node.clone());
            }
            false
        });
        matches
    }
}
