//! Insertion-ordered property storage

use crate::identifier::Identifier;
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub(crate) struct PropertyMap {
    entries: Vec<(Identifier, Value)>,
}

impl PropertyMap {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.as_str() == key)
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub(crate) fn entry(&self, key: &str) -> Option<(usize, Value)> {
        self.position(key).map(|i| (i, self.entries[i].1.clone()))
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub(crate) fn name_at(&self, index: usize) -> Option<&Identifier> {
        self.entries.get(index).map(|(k, _)| k)
    }

    /// Overwrites in place, or appends a new key; returns the previous value
    pub(crate) fn set(&mut self, key: Identifier, value: Value) -> Option<Value> {
        match self.position(key.as_str()) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Removes a key, returning its former position and value
    pub(crate) fn remove(&mut self, key: &str) -> Option<(usize, Value)> {
        let index = self.position(key)?;
        let (_, value) = self.entries.remove(index);
        Some((index, value))
    }

    /// Reinserts a key at the position it was removed from
    pub(crate) fn restore(&mut self, index: usize, key: Identifier, value: Value) {
        if let Some(i) = self.position(key.as_str()) {
            self.entries.remove(i);
        }
        let index = index.min(self.entries.len());
        self.entries.insert(index, (key, value));
    }

    pub(crate) fn take_all(&mut self) -> Vec<(Identifier, Value)> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn restore_all(&mut self, entries: Vec<(Identifier, Value)>) {
        let later = std::mem::replace(&mut self.entries, entries);
        for (key, value) in later {
            self.set(key, value);
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<(Identifier, Value)> {
        self.entries.clone()
    }

    /// Same keys with equal values, ignoring order
    pub(crate) fn same_entries(&self, other: &PropertyMap) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key.as_str()) == Some(value))
    }
}
