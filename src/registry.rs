// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Ordered, identity-deduplicated collections backing all list-like state.

/// Access to the identity key an entry is deduplicated by.
///
/// Devices, modules, and clients key on their graph object id; preset name
/// lists key on the name itself.
pub trait Keyed {
    type Key: PartialEq + ?Sized;

    fn key(&self) -> &Self::Key;
}

impl Keyed for String {
    type Key = str;

    fn key(&self) -> &str {
        self
    }
}

/// An ordered collection that external readers iterate.
///
/// Iteration order is insertion order, except after `replace_all`, which
/// installs the caller's order verbatim. All operations are single-threaded
/// and never fail: a duplicate insert is a no-op signalled by the returned
/// bool, a missing key is a no-op returning `None`.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<T>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Discard all current entries and install the given sequence, keeping
    /// the caller's order. No re-sorting happens at this layer.
    pub fn replace_all(&mut self, entries: Vec<T>) {
        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Keyed> Registry<T> {
    /// Append the entry unless one with the same key is already present.
    /// Returns whether an insertion occurred.
    pub fn insert(&mut self, entry: T) -> bool {
        if self.contains(entry.key()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Replace the entry sharing this entry's key, keeping its position.
    /// Returns whether a replacement occurred; absent keys are ignored.
    pub fn update(&mut self, entry: T) -> bool {
        match self.entries.iter().position(|e| e.key() == entry.key()) {
            Some(pos) => {
                self.entries[pos] = entry;
                true
            }
            None => false,
        }
    }

    /// Remove and return the first entry with the given key, if any.
    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        self.entries
            .iter()
            .position(|e| e.key() == key)
            .map(|pos| self.entries.remove(pos))
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.entries.iter().find(|e| e.key() == key)
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.entries.iter().any(|e| e.key() == key)
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        label: String,
    }

    impl Keyed for Item {
        type Key = u32;

        fn key(&self) -> &u32 {
            &self.id
        }
    }

    fn item(id: u32, label: &str) -> Item {
        Item {
            id,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_insert_is_idempotent_per_key() {
        let mut reg = Registry::new();
        assert!(reg.insert(item(1, "first")));
        assert!(!reg.insert(item(1, "duplicate")));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(&1).map(|i| i.label.as_str()), Some("first"));
    }

    #[test]
    fn test_iteration_order_is_insertion_order() {
        let mut reg = Registry::new();
        reg.insert(item(3, "c"));
        reg.insert(item(1, "a"));
        reg.insert(item(2, "b"));

        let ids: Vec<u32> = reg.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_remove_is_silent_on_missing_key() {
        let mut reg = Registry::new();
        reg.insert(item(1, "a"));
        assert!(reg.remove(&99).is_none());
        assert_eq!(reg.len(), 1);

        let removed = reg.remove(&1);
        assert_eq!(removed.map(|i| i.label), Some("a".to_string()));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let mut reg = Registry::new();
        for id in [5, 6, 7, 8] {
            reg.insert(item(id, "x"));
        }
        reg.remove(&6);
        reg.remove(&8);

        let ids: Vec<u32> = reg.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![5, 7]);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut reg = Registry::new();
        reg.insert(item(1, "a"));
        reg.insert(item(2, "b"));

        assert!(reg.update(item(1, "renamed")));
        let labels: Vec<&str> = reg.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["renamed", "b"]);

        assert!(!reg.update(item(9, "ghost")));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_replace_all_installs_caller_order() {
        let mut reg = Registry::new();
        reg.insert(item(1, "stale"));
        reg.insert(item(2, "stale"));

        reg.replace_all(vec![item(9, "z"), item(4, "y")]);
        let ids: Vec<u32> = reg.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![9, 4]);
    }

    #[test]
    fn test_string_registry_dedups_by_name() {
        let mut names: Registry<String> = Registry::new();
        assert!(names.insert("Podcast".to_string()));
        assert!(!names.insert("Podcast".to_string()));
        assert!(names.insert("Music".to_string()));
        assert_eq!(names.len(), 2);

        names.remove("Podcast");
        assert!(!names.contains("Podcast"));
        assert!(names.insert("Podcast".to_string()));
        assert_eq!(names.len(), 2);
    }
}
