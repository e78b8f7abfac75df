// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Dense Keyed Record Store
///
/// Backing store shared by the button and panel databases. Records live in one
/// vector kept in ascending key order; keys are handed out strictly increasingly
/// and deletion is an ordered compaction, so the vector never needs sorting and
/// a record's index is always <= its key.

use crate::lngc_core::Key;

/// A record that carries its own surrogate key
pub trait Keyed: Clone + Default {
    fn key(&self) -> Key;
    fn set_key(&mut self, key: Key);
}

/// Index into the store, valid only for the generation it was taken in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    index: usize,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct KeyedStore<T: Keyed> {
    list: Vec<T>,
    next_key: Key,
    // Bumped on every insert, delete and reset
    generation: u64,
}

impl<T: Keyed> Default for KeyedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> KeyedStore<T> {
    pub fn new() -> Self {
        Self {
            list: Vec::new(),
            next_key: 0,
            generation: 0,
        }
    }

    /// Drop every record and restart key assignment at 0
    pub fn reset(&mut self) {
        self.list.clear();
        self.next_key = 0;
        self.generation += 1;
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Append a default record under the next key
    /// Returns None (store untouched) if the vector cannot grow or keys ran out
    pub fn create_key(&mut self) -> Option<Key> {
        let key = self.next_key;
        let following = key.checked_add(1)?;
        self.list.try_reserve(1).ok()?;

        let mut record = T::default();
        record.set_key(key);
        self.list.push(record);
        self.next_key = following;
        self.generation += 1;
        Some(key)
    }

    /// Remove a record, shifting every later record down one slot
    pub fn delete_key(&mut self, key: Key) {
        if let Some(index) = self.find(key) {
            self.list.remove(index);
            self.generation += 1;
        }
    }

    /// Ascending key enumeration: None yields the first key, the last key yields None
    pub fn next_key(&self, prior: Option<Key>) -> Option<Key> {
        match prior {
            None => self.list.first().map(Keyed::key),
            Some(prior) => {
                // First record whose key exceeds prior (prior may have been deleted)
                let start = self.list.partition_point(|r| r.key() <= prior);
                self.list.get(start).map(Keyed::key)
            }
        }
    }

    /// Copy-out accessor
    pub fn info(&self, key: Key) -> Option<T> {
        self.get(key).cloned()
    }

    /// Borrowed accessor; the borrow ends before any mutation can happen
    pub fn get(&self, key: Key) -> Option<&T> {
        self.locate(key).and_then(|slot| self.at(slot))
    }

    /// Overwrite a record's fields, keeping its key
    pub fn set_info(&mut self, key: Key, record: &T) -> bool {
        match self.find(key) {
            Some(index) => {
                let mut copy = record.clone();
                copy.set_key(key);
                self.list[index] = copy;
                true
            }
            None => false,
        }
    }

    /// Resolve a key to a generation-stamped slot
    pub fn locate(&self, key: Key) -> Option<Slot> {
        self.find(key).map(|index| Slot { index, generation: self.generation })
    }

    /// Read through a slot; stale slots (taken before an insert/delete) read as None
    pub fn at(&self, slot: Slot) -> Option<&T> {
        if slot.generation != self.generation {
            return None;
        }
        self.list.get(slot.index)
    }

    /// Key to index: start at min(key, len-1) and walk back past larger keys
    pub(crate) fn find(&self, key: Key) -> Option<usize> {
        if self.list.is_empty() {
            return None;
        }
        let mut index = (key as usize).min(self.list.len() - 1);
        while self.list[index].key() > key {
            if index == 0 {
                return None;
            }
            index -= 1;
        }
        (self.list[index].key() == key).then_some(index)
    }
}
