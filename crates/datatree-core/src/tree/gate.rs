//! Per-root write gate
//!
//! A reentrant, thread-owned lock. The thread holding a root's gate may
//! acquire it again (nested transactions); any other thread blocks until
//! the owner's depth returns to zero.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use super::DataObject;

#[derive(Default)]
pub(crate) struct WriteGate {
    owner: Mutex<Option<(ThreadId, usize)>>,
    released: Condvar,
}

impl WriteGate {
    fn owner(&self) -> MutexGuard<'_, Option<(ThreadId, usize)>> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) {
        let me = thread::current().id();
        let mut owner = self.owner();
        loop {
            match *owner {
                None => {
                    *owner = Some((me, 1));
                    return;
                }
                Some((thread, depth)) if thread == me => {
                    *owner = Some((thread, depth + 1));
                    return;
                }
                Some(_) => {
                    owner = self
                        .released
                        .wait(owner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    fn release(&self) {
        let mut owner = self.owner();
        match *owner {
            Some((thread, depth)) if depth > 1 => *owner = Some((thread, depth - 1)),
            _ => {
                *owner = None;
                self.released.notify_all();
            }
        }
    }
}

/// Holds a root's gate until dropped
pub(crate) struct GateGuard {
    root: Arc<DataObject>,
}

impl GateGuard {
    pub(crate) fn acquire(root: Arc<DataObject>) -> Self {
        root.gate.acquire();
        Self { root }
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.root.gate.release();
    }
}
