// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Panel Engine
/// Owns both databases and one PanelBlock per panel; turns records into
/// windows and icons, and routes toolkit events and edit dialogues back into
/// the records.
///
/// Layout is recomputed in two steps:
/// - placing: edge apportionment, row capacity and reflow for every panel,
///   repeated until panel thicknesses settle (an open panel's thickness
///   depends on its reflowed columns, and it pushes in on neighbouring edges)
/// - rendering: resize each window and create the icons placing left behind

use std::io::BufRead;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::lngad_appdb::{AppDatabase, ButtonRecord};
use crate::lngc_core::{BootAction, GridPoint, Key, ScreenSize, SlabSize, WindowHandle};
use crate::lngcf_config::Choices;
use crate::lngdv_dialogue::{ButtonForm, PanelForm, ValidationError};
use crate::lnge_error::{FilingError, Status};
use crate::lngfl_filing;
use crate::lngic_icondb::IconIndex;
use crate::lngpd_paneldb::{PanelDatabase, PanelRecord};
use crate::lngpg_geometry::{apportion, EdgeMember, GridGeometry, PanelGeometry};
use crate::lngph_hold::{AutoHide, HoldAction, HoldReasons, TimerKind};
use crate::lngpr_reflow::reflow_buttons;
use crate::lngtk_toolkit::{CommandRunner, Dialogue, Event, MouseButton, Severity, TimerPayload, Toolkit};

/// Sprite shown for a button that names none
pub const DEFAULT_SPRITE: &str = "application";

const MAX_LAYOUT_PASSES: usize = 4;

/// Toolkit validation string for a button's sprite
pub fn validation_string(sprite: &str) -> String {
    if sprite.trim().is_empty() {
        format!("S{}", DEFAULT_SPRITE)
    } else {
        format!("S{}", sprite.trim())
    }
}

// ============================================================================
// SECTION 1: Panel block
// ============================================================================

/// Runtime state of one panel
#[derive(Debug)]
pub struct PanelBlock {
    pub key: Key,
    pub window: Option<WindowHandle>,
    pub geometry: PanelGeometry,
    pub hold: AutoHide,
    pub icons: IconIndex,
}

impl PanelBlock {
    fn new(record: &PanelRecord, choices: &Choices, screen: ScreenSize) -> Self {
        let mut grid = GridGeometry::new(choices.grid_size, choices.grid_spacing);
        grid.columns = record.depth.max(1);
        Self {
            key: record.key,
            window: None,
            geometry: PanelGeometry {
                edge: record.position,
                min_longitude: 0,
                max_longitude: 0,
                grid,
                slab: record.slab,
                screen,
                thickness: choices.strip_size,
            },
            hold: AutoHide::new(choices.auto_open_delay, choices.mouse_over),
            icons: IconIndex::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.hold.is_open()
    }

    /// Icon entry whose slab covers a grid cell
    fn entry_at(&self, cell: GridPoint) -> Option<Key> {
        let slab = self.geometry.slab;
        self.icons
            .list()
            .find(|e| {
                let p = e.position;
                cell.x >= p.x
                    && cell.x < p.x.saturating_add(slab.x)
                    && cell.y >= p.y
                    && cell.y < p.y.saturating_add(slab.y)
            })
            .map(|e| e.key)
    }
}

// ============================================================================
// SECTION 2: Engine
// ============================================================================

pub struct PanelEngine<T: Toolkit, R: CommandRunner, D: Dialogue> {
    toolkit: T,
    runner: R,
    dialogue: D,
    choices: Choices,
    apps: AppDatabase,
    panels: PanelDatabase,
    /// One per panel record, in key order
    blocks: Vec<PanelBlock>,
    screen: ScreenSize,
    buttons_path: Option<PathBuf>,
    /// Panel that owns the open menu, if any
    menu_panel: Option<Key>,
}

impl<T: Toolkit, R: CommandRunner, D: Dialogue> PanelEngine<T, R, D> {
    pub fn new(toolkit: T, runner: R, dialogue: D, choices: Choices) -> Self {
        let screen = toolkit.screen_size();
        Self {
            toolkit,
            runner,
            dialogue,
            choices,
            apps: AppDatabase::new(),
            panels: PanelDatabase::new(),
            blocks: Vec::new(),
            screen,
            buttons_path: None,
            menu_panel: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn apps(&self) -> &AppDatabase {
        &self.apps
    }

    pub fn panels(&self) -> &PanelDatabase {
        &self.panels
    }

    pub fn blocks(&self) -> &[PanelBlock] {
        &self.blocks
    }

    pub fn block(&self, key: Key) -> Option<&PanelBlock> {
        self.blocks.iter().find(|b| b.key == key)
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    pub fn toolkit_mut(&mut self) -> &mut T {
        &mut self.toolkit
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn dialogue_mut(&mut self) -> &mut D {
        &mut self.dialogue
    }

    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    fn block_index(&self, key: Key) -> Option<usize> {
        self.blocks.iter().position(|b| b.key == key)
    }

    fn block_for_window(&self, window: WindowHandle) -> Option<usize> {
        self.blocks.iter().position(|b| b.window == Some(window))
    }

    // ------------------------------------------------------------------
    // Loading and saving
    // ------------------------------------------------------------------

    /// Load the buttons file at `path` and remember it for later saves
    ///
    /// A missing file starts an empty layout. Failures are reported once
    /// through the toolkit and leave both databases empty.
    pub fn load(&mut self, path: &Path) -> Status {
        self.buttons_path = Some(path.to_path_buf());
        let result = lngfl_filing::load_file(path, &mut self.apps, &mut self.panels);
        let status = match result {
            Err(FilingError::Io(ref e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("PANEL: no buttons file at {}, starting empty", path.display());
                self.apps.reset();
                self.panels.reset();
                Status::Ok
            }
            other => self.finish_load(other),
        };
        self.rebuild();
        status
    }

    /// Load from any reader; the engine keeps its current save path
    pub fn load_from<B: BufRead>(&mut self, reader: B) -> Status {
        let result = lngfl_filing::load(reader, &mut self.apps, &mut self.panels);
        let status = self.finish_load(result);
        self.rebuild();
        status
    }

    fn finish_load(&mut self, result: Result<lngfl_filing::LoadReport, FilingError>) -> Status {
        match result {
            Ok(report) => {
                if report.status == Status::UnexpectedContent {
                    self.toolkit.report(
                        Severity::Warning,
                        "The buttons file contained entries that were not understood and have been ignored",
                    );
                }
                report.status
            }
            Err(e) => {
                error!("PANEL: buttons file rejected: {}", e);
                self.toolkit
                    .report(Severity::Error, &format!("Could not load the buttons file: {}", e));
                e.status()
            }
        }
    }

    /// Rewrite the buttons file; a no-op when no path is set
    pub fn save(&self) -> Result<(), FilingError> {
        match &self.buttons_path {
            Some(path) => lngfl_filing::save_file(path, &self.apps, &self.panels),
            None => Ok(()),
        }
    }

    fn commit(&mut self) {
        if let Err(e) = self.save() {
            error!("PANEL: save failed: {}", e);
            self.toolkit
                .report(Severity::Error, &format!("Could not save the buttons file: {}", e));
        }
    }

    // ------------------------------------------------------------------
    // Blocks and layout
    // ------------------------------------------------------------------

    /// Throw away every block and recreate one per panel record
    pub fn rebuild(&mut self) {
        while let Some(block) = self.blocks.pop() {
            self.destroy_block(block);
        }
        self.menu_panel = None;

        let mut prior = None;
        while let Some(key) = self.panels.next_key(prior) {
            prior = Some(key);
            self.add_block(key);
        }
        info!("PANEL: rebuilt {} panels", self.blocks.len());
        self.update_positions();
    }

    fn add_block(&mut self, key: Key) {
        let Some(record) = self.panels.get(key) else {
            return;
        };
        let mut block = PanelBlock::new(record, &self.choices, self.screen);
        block.window = Some(self.toolkit.create_window(block.geometry.window_extent()));
        let at = self.blocks.partition_point(|b| b.key < key);
        self.blocks.insert(at, block);
    }

    fn destroy_block(&mut self, block: PanelBlock) {
        if let Some(window) = block.window {
            for entry in block.icons.list() {
                if let Some(icon) = entry.icon {
                    self.toolkit.delete_icon(window, icon);
                }
            }
            self.toolkit.delete_window(window);
        }
    }

    /// Recompute every panel's extents, rows and reflow, then redraw
    pub fn update_positions(&mut self) {
        self.place_all();
        for index in 0..self.blocks.len() {
            self.render_block(index);
        }
    }

    /// Reflow one panel; widens into a full update if its thickness changes
    pub fn reflow_panel(&mut self, key: Key) {
        let Some(index) = self.block_index(key) else {
            return;
        };
        let before = self.blocks[index].geometry.thickness;
        self.reflow_block(index);
        if self.blocks[index].geometry.thickness != before {
            self.update_positions();
        } else {
            self.render_block(index);
        }
    }

    fn place_all(&mut self) {
        for pass in 0..MAX_LAYOUT_PASSES {
            for block in &mut self.blocks {
                if let Some(record) = self.panels.get(block.key) {
                    block.geometry.edge = record.position;
                    block.geometry.slab = record.slab;
                }
                block.geometry.screen = self.screen;
            }

            let members: Vec<EdgeMember> = self
                .blocks
                .iter()
                .filter_map(|b| {
                    let record = self.panels.get(b.key)?;
                    Some(EdgeMember {
                        key: b.key,
                        edge: record.position,
                        width: record.width,
                        sort: record.sort,
                        thickness: b.geometry.thickness,
                    })
                })
                .collect();

            let mut changed = false;
            for span in apportion(&members, self.screen) {
                let Some(index) = self.block_index(span.key) else {
                    continue;
                };
                let geometry = &mut self.blocks[index].geometry;
                geometry.min_longitude = span.min_longitude;
                geometry.max_longitude = span.max_longitude;
                geometry.grid.rows = geometry.grid.rows_for_extent(geometry.extent());

                let before = geometry.thickness;
                self.reflow_block(index);
                changed |= self.blocks[index].geometry.thickness != before;
            }
            if !changed {
                debug!("PANEL: layout settled after {} passes", pass + 1);
                return;
            }
        }
        warn!("PANEL: WARNING layout did not settle in {} passes", MAX_LAYOUT_PASSES);
    }

    /// Rebuild a panel's icon index from a fresh reflow of its buttons
    fn reflow_block(&mut self, index: usize) {
        let key = self.blocks[index].key;
        let Some(record) = self.panels.get(key) else {
            return;
        };
        let (slab, depth) = (record.slab, record.depth);
        let buttons: Vec<(Key, GridPoint)> = self
            .apps
            .buttons_on_panel(key)
            .into_iter()
            .filter_map(|k| self.apps.get(k).map(|b| (k, b.position)))
            .collect();

        let block = &mut self.blocks[index];
        let reflow = reflow_buttons(&buttons, slab, block.geometry.grid.rows, depth);

        if let Some(window) = block.window {
            for entry in block.icons.list() {
                if let Some(icon) = entry.icon {
                    self.toolkit.delete_icon(window, icon);
                }
            }
        }
        block.icons.reset();
        for placement in &reflow.placements {
            let entry = block.icons.create_entry(placement.key, placement.position);
            if let Some(button) = self.apps.get(placement.key) {
                entry.validation = validation_string(&button.sprite);
                entry.label = button.name.clone();
            }
        }

        block.geometry.grid.columns = reflow.columns;
        block.geometry.thickness = if block.hold.is_open() {
            block.geometry.open_thickness()
        } else {
            self.choices.strip_size
        };
        debug!(
            "PANEL: reflow key={} buttons={} rows={} columns={}",
            key,
            reflow.placements.len(),
            block.geometry.grid.rows,
            reflow.columns
        );
    }

    fn render_block(&mut self, index: usize) {
        let block = &mut self.blocks[index];
        let Some(window) = block.window else {
            return;
        };
        let geometry = block.geometry;
        self.toolkit.resize_window(window, geometry.window_extent());
        for entry in block.icons.list_mut() {
            if entry.icon.is_none() {
                let rect = geometry.cell_rect(entry.position);
                entry.window = Some(window);
                entry.icon = Some(self.toolkit.create_icon(window, rect, &entry.validation, &entry.label));
            }
        }
    }

    /// Button under a screen point, for hit testing outside the toolkit's own icons
    pub fn button_at(&self, x: i32, y: i32) -> Option<Key> {
        self.blocks
            .iter()
            .filter(|b| b.geometry.window_extent().contains(x, y))
            .find_map(|b| b.entry_at(b.geometry.screen_to_grid(x, y)?))
    }

    // ------------------------------------------------------------------
    // Hold-open state
    // ------------------------------------------------------------------

    fn apply_hold(&mut self, key: Key, action: HoldAction) {
        match action {
            HoldAction::Nothing => {}
            HoldAction::Open | HoldAction::Close => {
                debug!("PANEL: key={} {:?}", key, action);
                self.update_positions();
            }
            HoldAction::Schedule { kind, delay_ms } => {
                let payload = match kind {
                    TimerKind::AutoOpen => TimerPayload::AutoOpen(key),
                    TimerKind::AutoClose => TimerPayload::AutoClose(key),
                };
                self.toolkit.schedule(delay_ms, payload);
            }
        }
    }

    fn hold(&mut self, key: Key, reason: HoldReasons) {
        if let Some(index) = self.block_index(key) {
            let action = self.blocks[index].hold.hold(reason);
            self.apply_hold(key, action);
        }
    }

    fn release(&mut self, key: Key, reason: HoldReasons) {
        if let Some(index) = self.block_index(key) {
            let action = self.blocks[index].hold.release(reason);
            self.apply_hold(key, action);
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Click { window, icon, button } => {
                let Some(index) = self.block_for_window(window) else {
                    debug!("PANEL: click on unknown window {:?}", window);
                    return;
                };
                let key = self.blocks[index].key;
                match (icon, button) {
                    (_, MouseButton::Menu) => {
                        if let Some(prev) = self.menu_panel.replace(key) {
                            self.release(prev, HoldReasons::MENU);
                        }
                        self.hold(key, HoldReasons::MENU);
                    }
                    (Some(icon), _) => {
                        let target = self.blocks[index].icons.find_by_handle(window, icon).map(|e| e.key);
                        match target {
                            Some(button) => self.launch(button),
                            None => debug!("PANEL: click on stale icon {:?}", icon),
                        }
                    }
                    (None, _) => {
                        let action = self.blocks[index].hold.click_open();
                        self.apply_hold(key, action);
                    }
                }
            }
            Event::MenuClosed => {
                if let Some(key) = self.menu_panel.take() {
                    self.release(key, HoldReasons::MENU);
                }
            }
            Event::PointerEnter(window) => {
                if let Some(index) = self.block_for_window(window) {
                    let key = self.blocks[index].key;
                    let action = self.blocks[index].hold.pointer_enter();
                    self.apply_hold(key, action);
                }
            }
            Event::PointerLeave(window) => {
                if let Some(index) = self.block_for_window(window) {
                    let key = self.blocks[index].key;
                    let action = self.blocks[index].hold.pointer_leave();
                    self.apply_hold(key, action);
                }
            }
            Event::ModeChange(screen) => {
                info!("PANEL: screen mode {}x{}", screen.width, screen.height);
                self.screen = screen;
                self.update_positions();
            }
            Event::Timer(payload) => {
                let (key, kind) = match payload {
                    TimerPayload::AutoOpen(key) => (key, TimerKind::AutoOpen),
                    TimerPayload::AutoClose(key) => (key, TimerKind::AutoClose),
                };
                if let Some(index) = self.block_index(key) {
                    let action = self.blocks[index].hold.timer(kind);
                    self.apply_hold(key, action);
                }
            }
        }
    }

    fn launch(&mut self, key: Key) {
        let Some(button) = self.apps.get(key) else {
            return;
        };
        if let Err(e) = self.runner.run(&button.command) {
            warn!("PANEL: launch of '{}' failed: {}", button.name, e);
            let message = format!("Could not run '{}': {}", button.name, e);
            self.toolkit.report(Severity::Error, &message);
        }
    }

    /// Run the boot action of every button that has one, in key order
    pub fn boot_all(&mut self) -> usize {
        let mut booted = 0;
        let mut prior = None;
        while let Some(key) = self.apps.next_key(prior) {
            prior = Some(key);
            let Some(button) = self.apps.get(key) else {
                continue;
            };
            if button.boot == BootAction::None {
                continue;
            }
            match self.runner.boot(&button.command, button.boot) {
                Ok(()) => booted += 1,
                Err(e) => {
                    warn!("PANEL: boot of '{}' failed: {}", button.name, e);
                    let message = format!("Could not boot '{}': {}", button.name, e);
                    self.toolkit.report(Severity::Warning, &message);
                }
            }
        }
        info!("PANEL: booted {} buttons", booted);
        booted
    }

    // ------------------------------------------------------------------
    // Edit dialogues
    // ------------------------------------------------------------------

    /// Present a button form until it validates or the user cancels
    fn button_dialogue(&mut self, mut form: ButtonForm, mut message: Option<String>) -> Option<ButtonRecord> {
        loop {
            let reply = self.dialogue.edit_button(&form, message.as_deref())?;
            match reply.validate(&self.panels) {
                Ok(record) => return Some(record),
                Err(e) => {
                    debug!("PANEL: button form rejected: {}", e);
                    message = Some(e.to_string());
                    form = reply;
                }
            }
        }
    }

    fn panel_dialogue(
        &mut self,
        mut form: PanelForm,
        mut message: Option<String>,
        editing: Option<Key>,
    ) -> Option<PanelRecord> {
        loop {
            let reply = self.dialogue.edit_panel(&form, message.as_deref())?;
            match reply.validate(&self.panels, editing) {
                Ok(record) => return Some(record),
                Err(e) => {
                    debug!("PANEL: panel form rejected: {}", e);
                    message = Some(e.to_string());
                    form = reply;
                }
            }
        }
    }

    /// Create a button on `panel` at a grid cell through the button dialogue
    pub fn new_button(&mut self, panel: Key, at: GridPoint) -> Option<Key> {
        if self.panels.get(panel).is_none() {
            return None;
        }
        let base = ButtonRecord {
            position: at,
            panel: Some(panel),
            ..ButtonRecord::default()
        };
        let mut form = ButtonForm::from_record(&base, &self.panels);
        let mut message = None;

        self.hold(panel, HoldReasons::DIALOGUE);
        let created = loop {
            let Some(record) = self.button_dialogue(form, message.take()) else {
                break None;
            };
            match self.apps.create_key() {
                Some(key) => {
                    self.apps.set_button_info(key, &record);
                    break Some((key, record.panel));
                }
                None => {
                    error!("PANEL: button database is full");
                    form = ButtonForm::from_record(&record, &self.panels);
                    message = Some(ValidationError::OutOfMemory.to_string());
                }
            }
        };
        self.release(panel, HoldReasons::DIALOGUE);

        let (key, target) = created?;
        info!("PANEL: new button key={}", key);
        if let Some(target) = target {
            self.reflow_panel(target);
        }
        self.commit();
        Some(key)
    }

    /// Edit a button in place; reassigning its panel reflows both panels
    pub fn edit_button(&mut self, key: Key) -> bool {
        let Some(existing) = self.apps.button_info(key) else {
            return false;
        };
        let form = ButtonForm::from_record(&existing, &self.panels);

        if let Some(panel) = existing.panel {
            self.hold(panel, HoldReasons::DIALOGUE);
        }
        let result = self.button_dialogue(form, None);
        if let Some(panel) = existing.panel {
            self.release(panel, HoldReasons::DIALOGUE);
        }

        let Some(record) = result else {
            return false;
        };
        self.apps.set_button_info(key, &record);
        info!("PANEL: edited button key={}", key);

        if let Some(old) = existing.panel {
            self.reflow_panel(old);
        }
        if let Some(new) = record.panel.filter(|p| Some(*p) != existing.panel) {
            self.reflow_panel(new);
        }
        self.commit();
        true
    }

    pub fn delete_button(&mut self, key: Key) -> bool {
        let Some(existing) = self.apps.button_info(key) else {
            return false;
        };
        if self.choices.confirm_delete {
            if let Some(panel) = existing.panel {
                self.hold(panel, HoldReasons::DIALOGUE);
            }
            let confirmed = self
                .dialogue
                .confirm(&format!("Delete the button '{}'?", existing.name));
            if let Some(panel) = existing.panel {
                self.release(panel, HoldReasons::DIALOGUE);
            }
            if !confirmed {
                return false;
            }
        }

        self.apps.delete_key(key);
        info!("PANEL: deleted button key={}", key);
        if let Some(panel) = existing.panel {
            self.reflow_panel(panel);
        }
        self.commit();
        true
    }

    /// Create a panel through the panel dialogue, using the choices defaults
    pub fn new_panel(&mut self) -> Option<Key> {
        let base = PanelRecord {
            slab: SlabSize::new(self.choices.slab_x, self.choices.slab_y),
            depth: self.choices.columns,
            ..PanelRecord::default()
        };
        let mut form = PanelForm::from_record(&base);
        let mut message = None;

        let key = loop {
            let record = self.panel_dialogue(form, message.take(), None)?;
            match self.panels.create_key() {
                Some(key) => {
                    self.panels.set_panel_info(key, &record);
                    break key;
                }
                None => {
                    error!("PANEL: panel database is full");
                    form = PanelForm::from_record(&record);
                    message = Some(ValidationError::OutOfMemory.to_string());
                }
            }
        };

        info!("PANEL: new panel key={}", key);
        self.add_block(key);
        self.update_positions();
        self.commit();
        Some(key)
    }

    pub fn edit_panel(&mut self, key: Key) -> bool {
        let Some(existing) = self.panels.panel_info(key) else {
            return false;
        };
        self.hold(key, HoldReasons::DIALOGUE);
        let result = self.panel_dialogue(PanelForm::from_record(&existing), None, Some(key));
        self.release(key, HoldReasons::DIALOGUE);

        let Some(record) = result else {
            return false;
        };
        self.panels.set_panel_info(key, &record);
        info!("PANEL: edited panel key={} '{}'", key, record.name);
        self.update_positions();
        self.commit();
        true
    }

    /// Delete a panel and every button on it
    pub fn delete_panel(&mut self, key: Key) -> bool {
        let Some(existing) = self.panels.panel_info(key) else {
            return false;
        };
        if self.choices.confirm_delete {
            self.hold(key, HoldReasons::DIALOGUE);
            let confirmed = self.dialogue.confirm(&format!(
                "Delete the panel '{}' and all of its buttons?",
                existing.name
            ));
            self.release(key, HoldReasons::DIALOGUE);
            if !confirmed {
                return false;
            }
        }

        if let Some(index) = self.block_index(key) {
            let block = self.blocks.remove(index);
            self.destroy_block(block);
        }
        if self.menu_panel == Some(key) {
            self.menu_panel = None;
        }
        let removed = self.apps.delete_panel_buttons(key);
        self.panels.delete_key(key);
        info!("PANEL: deleted panel key={} with {} buttons", key, removed);

        self.update_positions();
        self.commit();
        true
    }
}
