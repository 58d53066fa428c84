//! Persistent, insertion-ordered association list.
//!
//! Backed by an `im::Vector` of entries, oldest first. Every operation returns
//! a new list and leaves the receiver untouched; clones share structure.
//! Lookups walk from the most recently added entry, so a later binding
//! shadows an earlier one.

use im::Vector;
use std::fmt;

pub struct Assoc<K, V> {
    entries: Vector<(K, V)>,
}

impl<K: Clone, V: Clone> Clone for Assoc<K, V> {
    fn clone(&self) -> Self {
        Assoc {
            entries: self.entries.clone(),
        }
    }
}

impl<K: Clone, V: Clone> Default for Assoc<K, V> {
    fn default() -> Self {
        Assoc {
            entries: Vector::new(),
        }
    }
}

impl<K: Clone, V: Clone> Assoc<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&self, key: K, value: V) -> Self {
        let mut entries = self.entries.clone();
        entries.push_back((key, value));
        Assoc { entries }
    }

    /// Entries from the most recently added to the oldest.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries.iter().rev(),
        }
    }

    /// Entries from the oldest to the most recently added.
    pub fn entries(&self) -> Vec<(&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v)).collect()
    }

    /// The most recently added entry and the list as it was before it.
    pub fn split_newest(&self) -> Option<(&K, &V, Assoc<K, V>)> {
        let (key, value) = self.entries.back()?;
        let mut older = self.entries.clone();
        older.pop_back();
        Some((key, value, Assoc { entries: older }))
    }

    /// Value of the most recent entry whose key satisfies `matches`.
    pub fn find(&self, mut matches: impl FnMut(&K) -> bool) -> Option<&V> {
        self.iter().find(|(k, _)| matches(k)).map(|(_, v)| v)
    }
}

impl<K: PartialEq + Clone, V: Clone> Assoc<K, V> {
    pub fn lookup(&self, key: &K) -> Option<&V> {
        self.find(|k| k == key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lookup(key).is_some()
    }

    /// Drops every binding of `key`.
    pub fn remove(&self, key: &K) -> Self {
        if !self.contains(key) {
            return self.clone();
        }
        let mut entries = self.entries.clone();
        entries.retain(|(k, _)| k != key);
        Assoc { entries }
    }
}

impl<K: PartialEq + Clone, V: PartialEq + Clone> PartialEq for Assoc<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq + Clone, V: Eq + Clone> Eq for Assoc<K, V> {}

impl<K: fmt::Debug + Clone, V: fmt::Debug + Clone> fmt::Debug for Assoc<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

/// Builds a list from entries given oldest first.
impl<K: Clone, V: Clone> FromIterator<(K, V)> for Assoc<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Assoc {
            entries: iter.into_iter().collect(),
        }
    }
}

pub struct Iter<'a, K: Clone, V: Clone> {
    inner: std::iter::Rev<im::vector::Iter<'a, (K, V)>>,
}

impl<'a, K: Clone, V: Clone> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }
}
