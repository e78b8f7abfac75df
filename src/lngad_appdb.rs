// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Button database: one record per launch button, keyed and kept in key order.

use tracing::debug;

use crate::lngc_core::{BootAction, GridPoint, Key};
use crate::lngks_keystore::{Keyed, KeyedStore};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonRecord {
    pub key: Key,
    pub name: String,
    /// Nominal grid position relative to the owning panel's origin
    pub position: GridPoint,
    pub sprite: String,
    pub local_copy: bool,
    pub command: String,
    pub boot: BootAction,
    /// Owning panel; None when the button is not attached to any panel
    pub panel: Option<Key>,
}

impl Keyed for ButtonRecord {
    fn key(&self) -> Key {
        self.key
    }

    fn set_key(&mut self, key: Key) {
        self.key = key;
    }
}

#[derive(Debug, Default)]
pub struct AppDatabase {
    store: KeyedStore<ButtonRecord>,
}

impl AppDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.store.reset();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn create_key(&mut self) -> Option<Key> {
        self.store.create_key()
    }

    pub fn delete_key(&mut self, key: Key) {
        self.store.delete_key(key);
    }

    pub fn next_key(&self, prior: Option<Key>) -> Option<Key> {
        self.store.next_key(prior)
    }

    pub fn button_info(&self, key: Key) -> Option<ButtonRecord> {
        self.store.info(key)
    }

    pub fn get(&self, key: Key) -> Option<&ButtonRecord> {
        self.store.get(key)
    }

    pub fn set_button_info(&mut self, key: Key, data: &ButtonRecord) -> bool {
        self.store.set_info(key, data)
    }

    /// Keys of every button owned by a panel, ascending
    pub fn buttons_on_panel(&self, panel: Key) -> Vec<Key> {
        let mut owned = Vec::new();
        let mut prior = None;
        while let Some(key) = self.store.next_key(prior) {
            prior = Some(key);
            if self.store.get(key).is_some_and(|b| b.panel == Some(panel)) {
                owned.push(key);
            }
        }
        owned
    }

    /// Delete every button owned by a panel; returns how many went
    pub fn delete_panel_buttons(&mut self, panel: Key) -> usize {
        let doomed = self.buttons_on_panel(panel);
        for key in &doomed {
            self.store.delete_key(*key);
        }
        debug!("APPDB: removed {} buttons of panel {}", doomed.len(), panel);
        doomed.len()
    }
}
