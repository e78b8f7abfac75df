// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Panel database: one record per screen-edge panel, keyed and kept in key order.

use tracing::debug;

use crate::lngc_core::{Edge, Key, SlabSize};
use crate::lngks_keystore::{Keyed, KeyedStore};

/// Name of the panel synthesized for legacy single-panel files
pub const DEFAULT_PANEL_NAME: &str = "Default";

pub const DEFAULT_WIDTH: i32 = 100;
pub const DEFAULT_SORT: i32 = 1;
pub const LEGACY_DEPTH: i32 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRecord {
    pub key: Key,
    /// Unique; the durable cross reference used by the buttons file
    pub name: String,
    pub position: Edge,
    /// Share of the edge, relative to the other panels on it
    pub width: i32,
    pub sort: i32,
    pub slab: SlabSize,
    /// Configured column count
    pub depth: i32,
}

impl Default for PanelRecord {
    fn default() -> Self {
        Self {
            key: 0,
            name: String::new(),
            position: Edge::Left,
            width: DEFAULT_WIDTH,
            sort: DEFAULT_SORT,
            slab: SlabSize::UNIT,
            depth: 1,
        }
    }
}

impl Keyed for PanelRecord {
    fn key(&self) -> Key {
        self.key
    }

    fn set_key(&mut self, key: Key) {
        self.key = key;
    }
}

#[derive(Debug, Default)]
pub struct PanelDatabase {
    store: KeyedStore<PanelRecord>,
}

impl PanelDatabase {
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

    pub fn panel_info(&self, key: Key) -> Option<PanelRecord> {
        self.store.info(key)
    }

    pub fn get(&self, key: Key) -> Option<&PanelRecord> {
        self.store.get(key)
    }

    pub fn set_panel_info(&mut self, key: Key, data: &PanelRecord) -> bool {
        self.store.set_info(key, data)
    }

    /// First panel, in key order, carrying this name
    pub fn find_by_name(&self, name: &str) -> Option<Key> {
        self.find_named(name, None)
    }

    /// True if another panel (not `except`) already carries this name
    pub fn name_in_use(&self, name: &str, except: Option<Key>) -> bool {
        self.find_named(name, except).is_some()
    }

    fn find_named(&self, name: &str, except: Option<Key>) -> Option<Key> {
        let mut prior = None;
        while let Some(key) = self.store.next_key(prior) {
            prior = Some(key);
            if Some(key) != except && self.store.get(key).is_some_and(|p| p.name == name) {
                return Some(key);
            }
        }
        None
    }

    /// Create the implicit panel that owns every button of a legacy file
    pub fn create_old_panel(&mut self) -> Option<Key> {
        let key = self.store.create_key()?;
        let record = PanelRecord {
            name: DEFAULT_PANEL_NAME.to_string(),
            depth: LEGACY_DEPTH,
            ..PanelRecord::default()
        };
        self.store.set_info(key, &record);
        debug!("PANELDB: synthesized legacy panel key={}", key);
        Some(key)
    }
}
