// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Per-panel icon index: the buttons a panel currently shows, with their
/// reflowed grid positions and toolkit handles. Rebuilt wholesale on every
/// reflow; iteration is always in insertion order.

use crate::lngc_core::{GridPoint, IconHandle, Key, WindowHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconEntry {
    /// Back reference into the button database
    pub key: Key,
    pub window: Option<WindowHandle>,
    pub icon: Option<IconHandle>,
    /// Validation string handed to the toolkit (sprite reference)
    pub validation: String,
    pub label: String,
    /// Collision-resolved position; may differ from the nominal one
    pub position: GridPoint,
}

#[derive(Debug, Default)]
pub struct IconIndex {
    entries: Vec<IconEntry>,
}

impl IconIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn create_entry(&mut self, key: Key, position: GridPoint) -> &mut IconEntry {
        self.entries.push(IconEntry {
            key,
            window: None,
            icon: None,
            validation: String::new(),
            label: String::new(),
            position,
        });
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Remove an entry, keeping the order of the rest
    pub fn delete(&mut self, key: Key) -> bool {
        match self.entries.iter().position(|e| e.key == key) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn list(&self) -> impl Iterator<Item = &IconEntry> {
        self.entries.iter()
    }

    pub fn list_mut(&mut self) -> impl Iterator<Item = &mut IconEntry> {
        self.entries.iter_mut()
    }

    /// Map a toolkit click back to its entry
    pub fn find_by_handle(&self, window: WindowHandle, icon: IconHandle) -> Option<&IconEntry> {
        self.entries
            .iter()
            .find(|e| e.window == Some(window) && e.icon == Some(icon))
    }

    pub fn find_by_key(&self, key: Key) -> Option<&IconEntry> {
        self.entries.iter().find(|e| e.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_survives_delete() {
        let mut index = IconIndex::new();
        for key in [4, 1, 9] {
            index.create_entry(key, GridPoint::new(0, key as i32));
        }
        assert!(index.delete(1));
        assert!(!index.delete(1));
        let keys: Vec<Key> = index.list().map(|e| e.key).collect();
        assert_eq!(keys, vec![4, 9]);
    }

    #[test]
    fn test_find_by_handle() {
        let mut index = IconIndex::new();
        let entry = index.create_entry(3, GridPoint::ORIGIN);
        entry.window = Some(WindowHandle(10));
        entry.icon = Some(IconHandle(2));
        index.create_entry(5, GridPoint::new(0, 1));

        assert_eq!(index.find_by_handle(WindowHandle(10), IconHandle(2)).map(|e| e.key), Some(3));
        assert!(index.find_by_handle(WindowHandle(11), IconHandle(2)).is_none());
        assert_eq!(index.find_by_key(5).map(|e| e.position), Some(GridPoint::new(0, 1)));
    }

    #[test]
    fn test_reset_empties() {
        let mut index = IconIndex::new();
        index.create_entry(0, GridPoint::ORIGIN);
        index.reset();
        assert!(index.is_empty());
    }
}
