//! Undo journal for the pool's sparse ledgers.
//!
//! Every mutating pool operation opens a journal on each ledger it may
//! touch. Writes made while a journal is open remember the value they
//! replaced, so a failed operation can restore the exact prior state.

use crate::FastMap;
use std::hash::Hash;

/// State that can be rolled back to the moment a journal was opened.
pub trait Journaled {
    /// Starts recording prior values.
    fn begin(&mut self);
    /// Keeps all writes since [`Journaled::begin`] and stops recording.
    fn commit(&mut self);
    /// Restores the state seen by [`Journaled::begin`] and stops recording.
    fn rollback(&mut self);
}

/// A `FastMap` whose writes can be undone.
#[derive(Debug, Clone)]
pub struct JournaledMap<K, V> {
    map: FastMap<K, V>,
    undo: Vec<(K, Option<V>)>,
    recording: bool,
}

impl<K, V> Default for JournaledMap<K, V> {
    fn default() -> Self {
        Self {
            map: FastMap::default(),
            undo: Vec::new(),
            recording: false,
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> JournaledMap<K, V> {
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        let previous = self.map.insert(key.clone(), value);
        if self.recording {
            self.undo.push((key, previous));
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let previous = self.map.remove(key);
        if self.recording && previous.is_some() {
            self.undo.push((key.clone(), previous.clone()));
        }
        previous
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Journaled for JournaledMap<K, V> {
    fn begin(&mut self) {
        self.undo.clear();
        self.recording = true;
    }

    fn commit(&mut self) {
        self.undo.clear();
        self.recording = false;
    }

    fn rollback(&mut self) {
        while let Some((key, previous)) = self.undo.pop() {
            match previous {
                Some(value) => {
                    self.map.insert(key, value);
                }
                None => {
                    self.map.remove(&key);
                }
            }
        }
        self.recording = false;
    }
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for JournaledMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K: Eq + Hash, V: Eq> Eq for JournaledMap<K, V> {}
