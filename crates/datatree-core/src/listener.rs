//! Weak-reference observer registry
//!
//! Registries hold `Weak` handles only, so a registered observer's lifetime
//! is owned entirely by the caller. Broadcasts snapshot the live observers
//! before invoking any of them, so callbacks may add or remove observers
//! (including themselves) without disturbing the broadcast in progress.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

pub struct ListenerRegistry<L: ?Sized> {
    listeners: Mutex<Vec<Weak<L>>>,
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> ListenerRegistry<L> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Weak<L>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an observer; registering the same observer twice is a no-op
    pub fn add(&self, listener: &Arc<L>) {
        let handle = Arc::downgrade(listener);
        let mut entries = self.entries();
        entries.retain(|existing| existing.strong_count() > 0);
        if !entries.iter().any(|existing| Weak::ptr_eq(existing, &handle)) {
            entries.push(handle);
        }
    }

    /// Deregister an observer, returning whether it was registered
    pub fn remove(&self, listener: &Arc<L>) -> bool {
        let handle = Arc::downgrade(listener);
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|existing| !Weak::ptr_eq(existing, &handle));
        entries.len() != before
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of observers that are still alive
    pub fn len(&self) -> usize {
        self.entries()
            .iter()
            .filter(|existing| existing.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upgrade every live observer, pruning the ones that were dropped
    pub fn snapshot(&self) -> Vec<Arc<L>> {
        let mut entries = self.entries();
        let mut live = Vec::with_capacity(entries.len());
        entries.retain(|handle| match handle.upgrade() {
            Some(listener) => {
                live.push(listener);
                true
            }
            None => false,
        });
        live
    }

    /// Invoke `callback` on each live observer in registration order
    ///
    /// The registry lock is released before any observer runs.
    pub fn call<F>(&self, mut callback: F)
    where
        F: FnMut(&L),
    {
        for listener in self.snapshot() {
            callback(&listener);
        }
    }
}
