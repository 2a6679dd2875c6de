//! Grouped undo/redo history

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::debug;

use super::action::{UndoDirection, UndoableAction, WeakCallbackAction};
use crate::config::UndoManagerConfig;
use crate::{log_op_end, log_op_start};

/// Named list of actions undone and redone as one step
struct ActionGroup {
    name: String,
    actions: Vec<Box<dyn UndoableAction>>,
}

impl ActionGroup {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Replay every action, dropping the ones that are invalid or fail
    ///
    /// Undo walks newest to oldest; redo walks oldest to newest.
    fn perform(&mut self, direction: UndoDirection) {
        match direction {
            UndoDirection::Undo => {
                let mut index = self.actions.len();
                while index > 0 {
                    index -= 1;
                    let action = &mut self.actions[index];
                    if !(action.is_valid() && action.perform(direction)) {
                        self.actions.remove(index);
                    }
                }
            }
            UndoDirection::Redo => {
                let mut index = 0;
                while index < self.actions.len() {
                    let action = &mut self.actions[index];
                    if action.is_valid() && action.perform(direction) {
                        index += 1;
                    } else {
                        self.actions.remove(index);
                    }
                }
            }
        }
    }
}

struct History {
    undo_stack: Vec<ActionGroup>,
    redo_stack: Vec<ActionGroup>,
    current: Option<ActionGroup>,
    enabled: bool,
    max_levels: Option<usize>,
    default_group_name: String,
}

impl History {
    /// Move the open group, if it holds anything, onto the undo stack
    fn flush(&mut self) {
        if let Some(group) = self.current.take() {
            if !group.is_empty() {
                self.undo_stack.push(group);
                self.trim();
            }
        }
    }

    fn trim(&mut self) {
        if let Some(max) = self.max_levels {
            if self.undo_stack.len() > max {
                let excess = self.undo_stack.len() - max;
                self.undo_stack.drain(..excess);
            }
        }
    }

    fn record(&mut self, action: Box<dyn UndoableAction>, group_name: &str) {
        self.current
            .get_or_insert_with(|| ActionGroup::new(group_name))
            .actions
            .push(action);
        self.redo_stack.clear();
    }

    fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = None;
    }

    fn pending_current(&self) -> Option<&ActionGroup> {
        self.current.as_ref().filter(|group| !group.is_empty())
    }
}

/// Stack-based undo/redo history of grouped actions
///
/// All methods take `&self`; the history is guarded by an internal mutex
/// that is released while actions run, so actions may notify listeners
/// that in turn query the manager.
///
/// Actions recorded between two [`UndoManager::begin_new_transaction`]
/// calls form one group and are undone together. [`UndoManager::undo`]
/// closes the open group before reverting it.
pub struct UndoManager {
    history: Mutex<History>,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoManager {
    /// Enabled manager keeping the default 100 groups of history
    pub fn new() -> Self {
        Self::from_config(&UndoManagerConfig::default())
    }

    /// `None` keeps unlimited history
    pub fn with_max_levels(max_levels: Option<usize>) -> Self {
        Self::from_config(&UndoManagerConfig {
            max_levels,
            ..UndoManagerConfig::default()
        })
    }

    pub fn from_config(config: &UndoManagerConfig) -> Self {
        Self {
            history: Mutex::new(History {
                undo_stack: Vec::new(),
                redo_stack: Vec::new(),
                current: None,
                enabled: config.enabled,
                max_levels: config.history_limit(),
                default_group_name: config.default_group_name.clone(),
            }),
        }
    }

    fn history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Recording =====

    /// Run `action` forwards and, on success, add it to the open group
    ///
    /// Returns `false` without running the action when the manager is
    /// disabled or the action reports itself invalid. A successful perform
    /// clears the redo history.
    pub fn perform<A>(&self, action: A) -> bool
    where
        A: UndoableAction + 'static,
    {
        self.perform_boxed(Box::new(action))
    }

    pub fn perform_boxed(&self, mut action: Box<dyn UndoableAction>) -> bool {
        let group_name = {
            let history = self.history();
            if !history.enabled {
                return false;
            }
            history.default_group_name.clone()
        };
        if !action.is_valid() || !action.perform(UndoDirection::Redo) {
            return false;
        }
        self.record(action, &group_name);
        true
    }

    /// Perform a closure bound to a weakly held object
    ///
    /// The resulting history entry is discarded once `target` is dropped.
    pub fn perform_with<T, F>(&self, target: &Arc<T>, callback: F) -> bool
    where
        T: Send + Sync + 'static,
        F: FnMut(&T, UndoDirection) -> bool + Send + 'static,
    {
        self.perform(WeakCallbackAction::new(target, callback))
    }

    /// Add an already-applied action to the open group
    pub(crate) fn record(&self, action: Box<dyn UndoableAction>, group_name: &str) {
        let mut history = self.history();
        if history.enabled {
            history.record(action, group_name);
            debug!(group_name = group_name, "Recorded undoable action");
        }
    }

    /// Close the open group and start a new one named `name`
    pub fn begin_new_transaction(&self, name: impl Into<String>) {
        let mut history = self.history();
        history.flush();
        history.current = Some(ActionGroup::new(name));
    }

    /// Close the open group without starting another
    pub fn flush(&self) {
        self.history().flush();
    }

    // ===== Undo / redo =====

    /// Revert the most recent group
    ///
    /// Actions that fail or have become invalid are dropped from the group;
    /// a group left empty is discarded. Returns whether anything was
    /// reverted.
    pub fn undo(&self) -> bool {
        self.replay(UndoDirection::Undo)
    }

    /// Re-apply the most recently undone group
    pub fn redo(&self) -> bool {
        self.replay(UndoDirection::Redo)
    }

    fn replay(&self, direction: UndoDirection) -> bool {
        let op = match direction {
            UndoDirection::Undo => "undo",
            UndoDirection::Redo => "redo",
        };
        let start = Instant::now();

        let mut group = {
            let mut history = self.history();
            if !history.enabled {
                return false;
            }
            history.flush();
            let popped = match direction {
                UndoDirection::Undo => history.undo_stack.pop(),
                UndoDirection::Redo => history.redo_stack.pop(),
            };
            match popped {
                Some(group) => group,
                None => return false,
            }
        };

        log_op_start!(op, group_name = %group.name, action_count = group.actions.len());
        group.perform(direction);
        let performed = !group.is_empty();
        log_op_end!(
            op,
            duration_ms = start.elapsed().as_millis() as u64,
            group_name = %group.name,
            action_count = group.actions.len()
        );

        if performed {
            let mut history = self.history();
            match direction {
                UndoDirection::Undo => history.redo_stack.push(group),
                UndoDirection::Redo => {
                    history.undo_stack.push(group);
                    history.trim();
                }
            }
        }
        performed
    }

    pub fn can_undo(&self) -> bool {
        let history = self.history();
        history.enabled && (!history.undo_stack.is_empty() || history.pending_current().is_some())
    }

    pub fn can_redo(&self) -> bool {
        let history = self.history();
        history.enabled && !history.redo_stack.is_empty()
    }

    /// Name of the group [`UndoManager::undo`] would revert
    pub fn undo_description(&self) -> Option<String> {
        let history = self.history();
        history
            .pending_current()
            .or_else(|| history.undo_stack.last())
            .map(|group| group.name.clone())
    }

    /// Name of the group [`UndoManager::redo`] would re-apply
    pub fn redo_description(&self) -> Option<String> {
        self.history().redo_stack.last().map(|group| group.name.clone())
    }

    // ===== Introspection =====

    /// Number of undoable groups, counting the open group if non-empty
    pub fn get_num_transactions(&self) -> usize {
        let history = self.history();
        history.undo_stack.len() + usize::from(history.pending_current().is_some())
    }

    /// Name of the undoable group at `index`, oldest first
    pub fn get_transaction_name(&self, index: usize) -> Option<String> {
        let history = self.history();
        history
            .undo_stack
            .iter()
            .chain(history.pending_current())
            .nth(index)
            .map(|group| group.name.clone())
    }

    /// Name of the open group, if one is open
    pub fn get_current_transaction_name(&self) -> Option<String> {
        self.history().current.as_ref().map(|group| group.name.clone())
    }

    /// Rename the open group; does nothing when no group is open
    pub fn set_current_transaction_name(&self, name: impl Into<String>) {
        if let Some(group) = self.history().current.as_mut() {
            group.name = name.into();
        }
    }

    // ===== Configuration =====

    pub fn is_enabled(&self) -> bool {
        self.history().enabled
    }

    /// Disabling discards all history; re-enabling starts empty
    pub fn set_enabled(&self, enabled: bool) {
        let mut history = self.history();
        if history.enabled != enabled {
            history.enabled = enabled;
            if !enabled {
                history.clear();
            }
        }
    }

    pub fn max_levels(&self) -> Option<usize> {
        self.history().max_levels
    }

    /// Change the history limit, dropping the oldest groups beyond it
    pub fn set_max_levels(&self, max_levels: Option<usize>) {
        let mut history = self.history();
        history.max_levels = max_levels;
        history.trim();
    }

    /// Discard all undo and redo history
    pub fn clear(&self) {
        self.history().clear();
    }
}

impl std::fmt::Debug for UndoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let history = self.history();
        f.debug_struct("UndoManager")
            .field("enabled", &history.enabled)
            .field("undo_groups", &history.undo_stack.len())
            .field("redo_groups", &history.redo_stack.len())
            .field("max_levels", &history.max_levels)
            .finish()
    }
}

/// Opens a named undo group for its lifetime
///
/// Everything recorded while the guard is alive lands in one group, which
/// is closed when the guard drops.
pub struct ScopedTransaction<'a> {
    manager: &'a UndoManager,
}

impl<'a> ScopedTransaction<'a> {
    pub fn new(manager: &'a UndoManager, name: impl Into<String>) -> Self {
        manager.begin_new_transaction(name);
        Self { manager }
    }
}

impl Drop for ScopedTransaction<'_> {
    fn drop(&mut self) {
        self.manager.flush();
    }
}
