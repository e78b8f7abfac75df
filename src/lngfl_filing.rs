// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Buttons File Load/Save
/// Streams the buttons file into the button and panel databases and writes them back
///
/// Responsibilities:
/// - Format version check (files newer than CURRENT_FORMAT are refused)
/// - Legacy (< 2.00) layout: one `[ButtonName]` section per button, single implicit panel
/// - Current layout: `[Panels]` and `[Buttons]` sections of `@:`-keyed records
/// - Panel-name cross references resolved after the pass (either section may come first)
/// - Whole-file save in the current format

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use lazy_static::lazy_static;
use tracing::{debug, info, warn};

use crate::lngad_appdb::{AppDatabase, ButtonRecord};
use crate::lngc_core::{BootAction, Edge, Key};
use crate::lnge_error::{FilingError, Status};
use crate::lngft_tokens::{format_version, parse_format, Item, Line, Tokenizer};
use crate::lngpd_paneldb::{PanelDatabase, PanelRecord};

// ============================================================================
// SECTION 1: Format constants and field limits
// ============================================================================

/// Newest format this build reads, and the one it writes
pub const CURRENT_FORMAT: u32 = 200;
/// First format with explicit `[Panels]`/`[Buttons]` sections
pub const NEW_FORMAT_CUTOVER: u32 = 200;

pub const NAME_LIMIT: usize = 64;
pub const SPRITE_LIMIT: usize = 64;
pub const COMMAND_LIMIT: usize = 1024;

/// Inclusive bounds for numeric fields, shared with the edit dialogues
pub const COORD_RANGE: (i32, i32) = (0, 999);
pub const WEIGHT_RANGE: (i32, i32) = (1, 9999);
pub const SLAB_RANGE: (i32, i32) = (1, 9);
pub const DEPTH_RANGE: (i32, i32) = (1, 99);

const SECTION_PANELS: &str = "Panels";
const SECTION_BUTTONS: &str = "Buttons";
const TOKEN_FORMAT: &str = "Format";
const TOKEN_RECORD: &str = "@";

#[derive(Debug, Clone, Copy)]
enum PanelToken {
    Position,
    Sort,
    Width,
    SlabXSize,
    SlabYSize,
    Depth,
}

#[derive(Debug, Clone, Copy)]
enum ButtonToken {
    Panel,
    XPos,
    YPos,
    Sprite,
    RunPath,
    Boot,
    Local,
}

// Keyed by lower-cased token name
lazy_static! {
    static ref PANEL_TOKENS: HashMap<&'static str, PanelToken> = {
        let mut map = HashMap::new();
        map.insert("position", PanelToken::Position);
        map.insert("sort", PanelToken::Sort);
        map.insert("width", PanelToken::Width);
        map.insert("slabxsize", PanelToken::SlabXSize);
        map.insert("slabysize", PanelToken::SlabYSize);
        map.insert("depth", PanelToken::Depth);
        map
    };
    static ref BUTTON_TOKENS: HashMap<&'static str, ButtonToken> = {
        let mut map = HashMap::new();
        map.insert("panel", ButtonToken::Panel);
        map.insert("xpos", ButtonToken::XPos);
        map.insert("ypos", ButtonToken::YPos);
        map.insert("sprite", ButtonToken::Sprite);
        map.insert("runpath", ButtonToken::RunPath);
        map.insert("boot", ButtonToken::Boot);
        map.insert("local", ButtonToken::Local);
        map
    };
}

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Ok, or UnexpectedContent when something was skipped
    pub status: Status,
    /// Declared format in hundredths (0 when absent)
    pub format: u32,
    pub panels: usize,
    pub buttons: usize,
}

// ============================================================================
// SECTION 2: Loader state
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Panels,
    Buttons,
    Legacy,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
enum Current {
    None,
    Panel(Key),
    Button(Key),
}

/// Cross reference for one panel name; key stays None until the panel is defined
#[derive(Debug, Default)]
struct PanelLink {
    key: Option<Key>,
    pending: Vec<Key>,
    first_line: usize,
}

struct Loader<'a> {
    apps: &'a mut AppDatabase,
    panels: &'a mut PanelDatabase,
    format: Option<u32>,
    seen_section: bool,
    section: Section,
    current: Current,
    status: Status,
    links: HashMap<String, PanelLink>,
    legacy_panel: Option<Key>,
}

impl<'a> Loader<'a> {
    fn new(apps: &'a mut AppDatabase, panels: &'a mut PanelDatabase) -> Self {
        Self {
            apps,
            panels,
            format: None,
            seen_section: false,
            section: Section::None,
            current: Current::None,
            status: Status::Ok,
            links: HashMap::new(),
            legacy_panel: None,
        }
    }

    fn is_legacy(&self) -> bool {
        self.format.map_or(true, |f| f < NEW_FORMAT_CUTOVER)
    }

    /// Soft failure: remember it, keep going
    fn flag(&mut self, line: usize, what: &str) {
        warn!("FILING: line {}: unexpected {}", line, what);
        if self.status == Status::Ok {
            self.status = Status::UnexpectedContent;
        }
    }

    fn process(&mut self, line: Line) -> Result<(), FilingError> {
        match line.item {
            Item::Section(name) => self.open_section(line.number, name),
            Item::Token { name, value } => self.token(line.number, &name, value),
            Item::Junk(text) => {
                self.flag(line.number, &format!("line '{}'", text));
                Ok(())
            }
        }
    }

    fn open_section(&mut self, line: usize, name: String) -> Result<(), FilingError> {
        self.seen_section = true;
        self.current = Current::None;

        if self.is_legacy() {
            // Every legacy section is one button on the implicit panel
            self.section = Section::Legacy;
            let panel = match self.legacy_panel {
                Some(key) => key,
                None => {
                    let key = self
                        .panels
                        .create_old_panel()
                        .ok_or(FilingError::OutOfMemory { line })?;
                    self.legacy_panel = Some(key);
                    key
                }
            };
            let key = self.new_button(line, &name)?;
            self.update_button(key, |b| b.panel = Some(panel));
            self.current = Current::Button(key);
            return Ok(());
        }

        self.section = match name.as_str() {
            SECTION_PANELS => Section::Panels,
            SECTION_BUTTONS => Section::Buttons,
            _ => {
                self.flag(line, &format!("section [{}]", name));
                Section::Unknown
            }
        };
        Ok(())
    }

    fn token(&mut self, line: usize, name: &str, value: String) -> Result<(), FilingError> {
        match self.section {
            Section::None => self.header_token(line, name, &value),
            Section::Unknown => Ok(()),
            Section::Panels => self.panel_token(line, name, value),
            Section::Buttons => self.button_token(line, name, value, true),
            Section::Legacy => self.button_token(line, name, value, false),
        }
    }

    fn header_token(&mut self, line: usize, name: &str, value: &str) -> Result<(), FilingError> {
        if !name.eq_ignore_ascii_case(TOKEN_FORMAT) || self.seen_section || self.format.is_some() {
            self.flag(line, &format!("token '{}'", name));
            return Ok(());
        }

        let version = parse_format(value)
            .ok_or_else(|| FilingError::corrupt(line, format!("bad format '{}'", value)))?;
        if version > CURRENT_FORMAT {
            return Err(FilingError::UnknownVersion {
                found: format_version(version),
                supported: format_version(CURRENT_FORMAT),
            });
        }
        debug!("FILING: format {}", format_version(version));
        self.format = Some(version);
        Ok(())
    }

    fn panel_token(&mut self, line: usize, name: &str, value: String) -> Result<(), FilingError> {
        if name == TOKEN_RECORD {
            let key = self.define_panel(line, value)?;
            self.current = Current::Panel(key);
            return Ok(());
        }

        let key = match self.current {
            Current::Panel(key) => key,
            _ => {
                self.flag(line, &format!("token '{}' outside a panel record", name));
                return Ok(());
            }
        };
        let token = match PANEL_TOKENS.get(name.to_ascii_lowercase().as_str()) {
            Some(token) => *token,
            None => {
                self.flag(line, &format!("panel token '{}'", name));
                return Ok(());
            }
        };

        let mut record = match self.panels.panel_info(key) {
            Some(record) => record,
            None => return Ok(()),
        };
        match token {
            PanelToken::Position => {
                record.position = Edge::from_keyword(&value)
                    .ok_or_else(|| FilingError::corrupt(line, format!("bad position '{}'", value)))?;
            }
            PanelToken::Sort => record.sort = parse_int(line, &value, "Sort", WEIGHT_RANGE)?,
            PanelToken::Width => record.width = parse_int(line, &value, "Width", WEIGHT_RANGE)?,
            PanelToken::SlabXSize => record.slab.x = parse_int(line, &value, "SlabXSize", SLAB_RANGE)?,
            PanelToken::SlabYSize => record.slab.y = parse_int(line, &value, "SlabYSize", SLAB_RANGE)?,
            PanelToken::Depth => record.depth = parse_int(line, &value, "Depth", DEPTH_RANGE)?,
        }
        self.panels.set_panel_info(key, &record);
        Ok(())
    }

    fn button_token(
        &mut self,
        line: usize,
        name: &str,
        value: String,
        keyed: bool,
    ) -> Result<(), FilingError> {
        if keyed && name == TOKEN_RECORD {
            let key = self.new_button(line, &value)?;
            self.current = Current::Button(key);
            return Ok(());
        }

        let key = match self.current {
            Current::Button(key) => key,
            _ => {
                self.flag(line, &format!("token '{}' outside a button record", name));
                return Ok(());
            }
        };
        let token = match BUTTON_TOKENS.get(name.to_ascii_lowercase().as_str()) {
            // Legacy buttons all belong to the implicit panel
            Some(ButtonToken::Panel) if !keyed => None,
            Some(token) => Some(*token),
            None => None,
        };
        let token = match token {
            Some(token) => token,
            None => {
                self.flag(line, &format!("button token '{}'", name));
                return Ok(());
            }
        };

        if let ButtonToken::Panel = token {
            let panel_name = copy_field(&value, NAME_LIMIT, "Panel", line)?;
            return self.reference_panel(line, key, panel_name);
        }

        let mut record = match self.apps.button_info(key) {
            Some(record) => record,
            None => return Ok(()),
        };
        match token {
            ButtonToken::XPos => record.position.x = parse_int(line, &value, "XPos", COORD_RANGE)?,
            ButtonToken::YPos => record.position.y = parse_int(line, &value, "YPos", COORD_RANGE)?,
            ButtonToken::Sprite => record.sprite = copy_field(&value, SPRITE_LIMIT, "Sprite", line)?,
            ButtonToken::RunPath => {
                record.command = copy_field(&value, COMMAND_LIMIT, "RunPath", line)?
            }
            ButtonToken::Boot => {
                record.boot = BootAction::from_keyword(&value)
                    .ok_or_else(|| FilingError::corrupt(line, format!("bad boot action '{}'", value)))?;
            }
            ButtonToken::Local => record.local_copy = parse_flag(line, &value)?,
            ButtonToken::Panel => {}
        }
        self.apps.set_button_info(key, &record);
        Ok(())
    }

    fn new_button(&mut self, line: usize, name: &str) -> Result<Key, FilingError> {
        let name = copy_field(name, NAME_LIMIT, "name", line)?;
        let key = self.apps.create_key().ok_or(FilingError::OutOfMemory { line })?;
        self.update_button(key, |b| b.name = name);
        Ok(key)
    }

    fn update_button(&mut self, key: Key, edit: impl FnOnce(&mut ButtonRecord)) {
        // Refetch after create_key: earlier copies predate the insert
        if let Some(mut record) = self.apps.button_info(key) {
            edit(&mut record);
            self.apps.set_button_info(key, &record);
        }
    }

    /// `@: name` in [Panels]: a second definition of the same name is corrupt
    fn define_panel(&mut self, line: usize, name: String) -> Result<Key, FilingError> {
        let name = copy_field(&name, NAME_LIMIT, "name", line)?;
        if self.links.get(&name).is_some_and(|l| l.key.is_some()) {
            return Err(FilingError::corrupt(line, format!("duplicate panel '{}'", name)));
        }

        let key = self.panels.create_key().ok_or(FilingError::OutOfMemory { line })?;
        let record = PanelRecord {
            name: name.clone(),
            ..PanelRecord::default()
        };
        self.panels.set_panel_info(key, &record);

        let link = self.links.entry(name).or_insert_with(|| PanelLink {
            first_line: line,
            ..PanelLink::default()
        });
        link.key = Some(key);
        Ok(key)
    }

    /// `Panel: name` in [Buttons]: attach now if known, otherwise leave a phantom
    fn reference_panel(&mut self, line: usize, button: Key, name: String) -> Result<(), FilingError> {
        let link = self.links.entry(name).or_insert_with(|| PanelLink {
            first_line: line,
            ..PanelLink::default()
        });
        match link.key {
            Some(panel) => self.update_button(button, |b| b.panel = Some(panel)),
            None => link.pending.push(button),
        }
        Ok(())
    }

    /// Attach buttons that named their panel before it was defined
    fn link_up(&mut self) -> Result<(), FilingError> {
        let mut unresolved: Vec<(usize, &String)> = self
            .links
            .iter()
            .filter(|(_, l)| l.key.is_none() && !l.pending.is_empty())
            .map(|(name, l)| (l.first_line, name))
            .collect();
        unresolved.sort();
        if let Some((line, name)) = unresolved.first() {
            return Err(FilingError::corrupt(*line, format!("undefined panel '{}'", name)));
        }

        let resolved: Vec<(Key, Vec<Key>)> = self
            .links
            .values_mut()
            .filter_map(|l| l.key.map(|k| (k, std::mem::take(&mut l.pending))))
            .collect();
        for (panel, buttons) in resolved {
            for button in buttons {
                self.update_button(button, |b| b.panel = Some(panel));
            }
        }
        Ok(())
    }
}

fn copy_field(value: &str, limit: usize, field: &str, line: usize) -> Result<String, FilingError> {
    if limit == 0 {
        return Err(FilingError::BadMemory { field: field.to_string(), line });
    }
    if value.len() > limit {
        return Err(FilingError::corrupt(
            line,
            format!("{} is {} bytes, limit {}", field, value.len(), limit),
        ));
    }
    Ok(value.to_string())
}

fn parse_int(line: usize, value: &str, field: &str, (min, max): (i32, i32)) -> Result<i32, FilingError> {
    let n = value
        .trim()
        .parse::<i32>()
        .map_err(|_| FilingError::corrupt(line, format!("invalid number '{}'", value)))?;
    if n < min || n > max {
        return Err(FilingError::corrupt(
            line,
            format!("{} {} outside {}..={}", field, n, min, max),
        ));
    }
    Ok(n)
}

fn parse_flag(line: usize, value: &str) -> Result<bool, FilingError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(FilingError::corrupt(line, format!("invalid flag '{}'", value))),
    }
}

fn flag_keyword(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

// ============================================================================
// SECTION 3: Load
// ============================================================================

/// Load a buttons file into freshly reset databases
/// On a hard failure both databases are left empty
pub fn load<R: BufRead>(
    reader: R,
    apps: &mut AppDatabase,
    panels: &mut PanelDatabase,
) -> Result<LoadReport, FilingError> {
    apps.reset();
    panels.reset();

    let result = run_load(reader, apps, panels);
    if let Err(ref e) = result {
        warn!("FILING: load failed ({:?}): {}", e.status(), e);
        apps.reset();
        panels.reset();
    }
    result
}

fn run_load<R: BufRead>(
    reader: R,
    apps: &mut AppDatabase,
    panels: &mut PanelDatabase,
) -> Result<LoadReport, FilingError> {
    let mut loader = Loader::new(apps, panels);
    for line in Tokenizer::new(reader) {
        loader.process(line?)?;
    }
    loader.link_up()?;

    let report = LoadReport {
        status: loader.status,
        format: loader.format.unwrap_or(0),
        panels: loader.panels.len(),
        buttons: loader.apps.len(),
    };
    info!(
        "FILING: loaded format {} | panels={} buttons={} status={:?}",
        format_version(report.format),
        report.panels,
        report.buttons,
        report.status
    );
    Ok(report)
}

pub fn load_file(
    path: &Path,
    apps: &mut AppDatabase,
    panels: &mut PanelDatabase,
) -> Result<LoadReport, FilingError> {
    let file = fs::File::open(path)?;
    load(BufReader::new(file), apps, panels)
}

// ============================================================================
// SECTION 4: Save
// ============================================================================

pub fn save<W: Write>(
    writer: &mut W,
    apps: &AppDatabase,
    panels: &PanelDatabase,
) -> Result<(), FilingError> {
    writeln!(writer, "# >Buttons")?;
    writeln!(writer, "#")?;
    writeln!(writer, "# Saved by Launcher.")?;
    writeln!(writer)?;
    writeln!(writer, "{}: {}", TOKEN_FORMAT, format_version(CURRENT_FORMAT))?;
    writeln!(writer)?;

    writeln!(writer, "[{}]", SECTION_PANELS)?;
    let mut prior = None;
    while let Some(key) = panels.next_key(prior) {
        prior = Some(key);
        let Some(panel) = panels.get(key) else {
            continue;
        };
        writeln!(writer, "{}: {}", TOKEN_RECORD, panel.name)?;
        writeln!(writer, "Position: {}", panel.position.keyword())?;
        writeln!(writer, "Sort: {}", panel.sort)?;
        writeln!(writer, "Width: {}", panel.width)?;
        writeln!(writer, "SlabXSize: {}", panel.slab.x)?;
        writeln!(writer, "SlabYSize: {}", panel.slab.y)?;
        writeln!(writer, "Depth: {}", panel.depth)?;
        writeln!(writer)?;
    }

    writeln!(writer, "[{}]", SECTION_BUTTONS)?;
    let mut prior = None;
    while let Some(key) = apps.next_key(prior) {
        prior = Some(key);
        let Some(button) = apps.get(key) else {
            continue;
        };
        writeln!(writer, "{}: {}", TOKEN_RECORD, button.name)?;
        match button.panel.map(|k| panels.get(k)) {
            Some(Some(panel)) => writeln!(writer, "Panel: {}", panel.name)?,
            Some(None) => warn!("FILING: button '{}' has a dangling panel key", button.name),
            None => {}
        }
        writeln!(writer, "XPos: {}", button.position.x)?;
        writeln!(writer, "YPos: {}", button.position.y)?;
        writeln!(writer, "Sprite: {}", button.sprite)?;
        writeln!(writer, "RunPath: {}", button.command)?;
        writeln!(writer, "Boot: {}", button.boot.keyword())?;
        writeln!(writer, "Local: {}", flag_keyword(button.local_copy))?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Rewrite the whole file, creating its directory if needed
pub fn save_file(path: &Path, apps: &AppDatabase, panels: &PanelDatabase) -> Result<(), FilingError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    save(&mut writer, apps, panels)?;
    info!(
        "FILING: saved {} panels, {} buttons to {}",
        panels.len(),
        apps.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lngc_core::{GridPoint, SlabSize};
    use proptest::prelude::*;

    const SAMPLE: &str = "# >Buttons
#
# Saved by Launcher.

Format: 2.00

[Panels]
@: Default
Position: Left
Sort: 1
Width: 100
SlabXSize: 1
SlabYSize: 1
Depth: 7

[Buttons]
@: Calculator
Panel: Default
XPos: 0
YPos: 0
Sprite: calc
RunPath: Filer_Run Resources:$.Apps.!Calc
Boot: No
";

    fn load_str(text: &str) -> (Result<LoadReport, FilingError>, AppDatabase, PanelDatabase) {
        let mut apps = AppDatabase::new();
        let mut panels = PanelDatabase::new();
        let result = load(text.as_bytes(), &mut apps, &mut panels);
        (result, apps, panels)
    }

    fn button_records(apps: &AppDatabase) -> Vec<ButtonRecord> {
        let mut records = Vec::new();
        let mut prior = None;
        while let Some(key) = apps.next_key(prior) {
            prior = Some(key);
            records.extend(apps.button_info(key));
        }
        records
    }

    fn panel_records(panels: &PanelDatabase) -> Vec<PanelRecord> {
        let mut records = Vec::new();
        let mut prior = None;
        while let Some(key) = panels.next_key(prior) {
            prior = Some(key);
            records.extend(panels.panel_info(key));
        }
        records
    }

    fn save_string(apps: &AppDatabase, panels: &PanelDatabase) -> String {
        let mut out = Vec::new();
        save(&mut out, apps, panels).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_load_sample() {
        let (result, apps, panels) = load_str(SAMPLE);
        let report = result.unwrap();
        assert_eq!(report.status, Status::Ok);
        assert_eq!(report.format, 200);
        assert_eq!(panels.len(), 1);
        assert_eq!(apps.len(), 1);

        let panel = panels.panel_info(0).unwrap();
        assert_eq!(panel.name, "Default");
        assert_eq!(panel.depth, 7);

        let button = apps.button_info(0).unwrap();
        assert_eq!(button.name, "Calculator");
        assert_eq!(button.panel, Some(0));
        assert_eq!(button.sprite, "calc");
        assert_eq!(button.command, "Filer_Run Resources:$.Apps.!Calc");
        assert_eq!(button.boot, BootAction::None);
    }

    #[test]
    fn test_buttons_before_panels_are_linked() {
        let text = "Format: 2.00
[Buttons]
@: Edit
Panel: Tools
XPos: 1
[Panels]
@: Apps
@: Tools
Position: Right
";
        let (result, apps, panels) = load_str(text);
        assert_eq!(result.unwrap().status, Status::Ok);
        let tools = panels.find_by_name("Tools").unwrap();
        assert_eq!(apps.button_info(0).unwrap().panel, Some(tools));
        assert_eq!(panels.get(tools).unwrap().position, Edge::Right);
    }

    #[test]
    fn test_undefined_panel_is_corrupt() {
        let text = "Format: 2.00\n[Buttons]\n@: Edit\nPanel: Nowhere\n";
        let (result, apps, panels) = load_str(text);
        match result {
            Err(FilingError::Corrupt { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected corrupt, got {:?}", other),
        }
        assert!(apps.is_empty());
        assert!(panels.is_empty());
    }

    #[test]
    fn test_duplicate_panel_is_corrupt() {
        let text = "Format: 2.00\n[Panels]\n@: Apps\n@: Apps\n";
        let (result, _, panels) = load_str(text);
        assert_eq!(result.unwrap_err().status(), Status::Corrupt);
        assert!(panels.is_empty());
    }

    #[test]
    fn test_unknown_token_is_soft() {
        let text = SAMPLE.replace("Boot: No", "Boot: No\nColour: Red");
        let (result, apps, _) = load_str(&text);
        let report = result.unwrap();
        assert_eq!(report.status, Status::UnexpectedContent);
        assert_eq!(apps.len(), 1);
    }

    #[test]
    fn test_unknown_section_skipped() {
        let text = format!("{}\n[Extras]\nAnything: goes\n", SAMPLE);
        let (result, apps, _) = load_str(&text);
        assert_eq!(result.unwrap().status, Status::UnexpectedContent);
        assert_eq!(apps.len(), 1);
    }

    #[test]
    fn test_future_format_rejected() {
        let (result, _, _) = load_str("Format: 9.99\n[Panels]\n@: Default\n");
        assert_eq!(result.unwrap_err().status(), Status::UnknownVersion);
    }

    #[test]
    fn test_malformed_format_is_corrupt() {
        let (result, _, _) = load_str("Format: two\n");
        assert_eq!(result.unwrap_err().status(), Status::Corrupt);
    }

    #[test]
    fn test_oversized_field_is_corrupt() {
        let long = "x".repeat(SPRITE_LIMIT + 1);
        let text = SAMPLE.replace("Sprite: calc", &format!("Sprite: {}", long));
        let (result, apps, _) = load_str(&text);
        assert_eq!(result.unwrap_err().status(), Status::Corrupt);
        assert!(apps.is_empty());
    }

    #[test]
    fn test_out_of_range_numbers_are_corrupt() {
        let cases = [
            "[Panels]\n@: P\n[Buttons]\n@: B\nPanel: P\nXPos: 2147483647\n",
            "Format: 2.00\n[Panels]\n@: P\n[Buttons]\n@: B\nPanel: P\nYPos: -1\n",
            "Format: 2.00\n[Panels]\n@: P\nDepth: 100000000\n",
            "Format: 2.00\n[Panels]\n@: P\nDepth: 0\n",
            "Format: 2.00\n[Panels]\n@: P\nSlabXSize: 10\n",
            "Format: 2.00\n[Panels]\n@: P\nSlabYSize: 2147483647\n",
            "Format: 2.00\n[Panels]\n@: P\nWidth: 0\n",
            "Format: 2.00\n[Panels]\n@: P\nSort: 10000\n",
        ];
        for text in cases {
            let (result, apps, panels) = load_str(text);
            let err = result.unwrap_err();
            assert_eq!(err.status(), Status::Corrupt, "{:?}", text);
            assert!(err.status().is_hard());
            assert!(apps.is_empty() && panels.is_empty());
        }
    }

    #[test]
    fn test_range_limits_are_inclusive() {
        let text = "Format: 2.00\n[Panels]\n@: P\nWidth: 9999\nSort: 1\nSlabXSize: 9\nSlabYSize: 1\nDepth: 99\n\
                    [Buttons]\n@: B\nPanel: P\nXPos: 999\nYPos: 0\n";
        let (result, apps, panels) = load_str(text);
        assert_eq!(result.unwrap().status, Status::Ok);
        let panel = panels.get(panels.find_by_name("P").unwrap()).unwrap();
        assert_eq!((panel.width, panel.slab, panel.depth), (9999, SlabSize::new(9, 1), 99));
        let button = apps.get(apps.next_key(None).unwrap()).unwrap();
        assert_eq!(button.position, GridPoint::new(999, 0));
    }

    #[test]
    fn test_zero_limit_is_bad_memory() {
        let err = copy_field("calc", 0, "Sprite", 3).unwrap_err();
        assert_eq!(err.status(), Status::BadMemory);
    }

    #[test]
    fn test_legacy_file_gets_one_panel() {
        let text = "# old style
Format: 1.00

[Calculator]
XPos: 0
YPos: 0
Sprite: calc
RunPath: Filer_Run calc
Boot: Yes

[Draw]
XPos: 0
YPos: 1
RunPath: Filer_Run draw
";
        let (result, apps, panels) = load_str(text);
        let report = result.unwrap();
        assert_eq!(report.status, Status::Ok);
        assert_eq!(panels.len(), 1);
        let panel = panels.panel_info(0).unwrap();
        assert_eq!(panel.name, "Default");
        assert_eq!(apps.len(), 2);
        for button in button_records(&apps) {
            assert_eq!(button.panel, Some(panel.key));
        }
        assert_eq!(apps.button_info(0).unwrap().boot, BootAction::Boot);
        assert_eq!(apps.button_info(1).unwrap().position, GridPoint::new(0, 1));
    }

    #[test]
    fn test_missing_format_is_legacy() {
        let (result, apps, panels) = load_str("[Edit]\nRunPath: edit\n");
        assert_eq!(result.unwrap().format, 0);
        assert_eq!(panels.len(), 1);
        assert_eq!(apps.button_info(0).unwrap().name, "Edit");
    }

    #[test]
    fn test_save_matches_documented_layout() {
        let (result, apps, panels) = load_str(SAMPLE);
        result.unwrap();
        let text = save_string(&apps, &panels);
        assert!(text.starts_with("# >Buttons\n#\n# Saved by Launcher.\n\nFormat: 2.00\n\n[Panels]\n@: Default\nPosition: Left\nSort: 1\nWidth: 100\nSlabXSize: 1\nSlabYSize: 1\nDepth: 7\n"));
        assert!(text.contains("[Buttons]\n@: Calculator\nPanel: Default\nXPos: 0\nYPos: 0\nSprite: calc\n"));
        assert!(text.contains("Boot: No\nLocal: No\n"));
    }

    #[test]
    fn test_save_file_round_trip() {
        let (result, apps, panels) = load_str(SAMPLE);
        result.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher").join("Buttons");
        save_file(&path, &apps, &panels).unwrap();

        let mut apps2 = AppDatabase::new();
        let mut panels2 = PanelDatabase::new();
        load_file(&path, &mut apps2, &mut panels2).unwrap();
        assert_eq!(apps2.button_info(0), apps.button_info(0));
        assert_eq!(panels2.panel_info(0), panels.panel_info(0));
    }

    // ------------------------------------------------------------------------
    // Round trip over arbitrary states
    // ------------------------------------------------------------------------

    #[derive(Debug, Clone)]
    struct PanelShape {
        position: Edge,
        width: i32,
        sort: i32,
        slab: (i32, i32),
        depth: i32,
    }

    #[derive(Debug, Clone)]
    struct ButtonShape {
        name: String,
        panel: Option<usize>,
        position: (i32, i32),
        sprite: String,
        command: String,
        boot: BootAction,
        local_copy: bool,
    }

    fn panel_strategy() -> impl Strategy<Value = PanelShape> {
        (
            prop::sample::select(Edge::ALL.to_vec()),
            1i32..10000,
            1i32..10000,
            (1i32..10, 1i32..10),
            1i32..100,
        )
            .prop_map(|(position, width, sort, slab, depth)| PanelShape {
                position,
                width,
                sort,
                slab,
                depth,
            })
    }

    fn button_strategy() -> impl Strategy<Value = ButtonShape> {
        (
            "[A-Za-z][A-Za-z0-9_ !]{0,20}[A-Za-z0-9]",
            prop::option::of(0usize..4),
            (0i32..50, 0i32..50),
            "[a-z_]{0,12}",
            "[A-Za-z]([A-Za-z0-9_ .:$!<>-]{0,60}[A-Za-z0-9])?",
            prop::sample::select(vec![BootAction::None, BootAction::Boot, BootAction::Sprites]),
            any::<bool>(),
        )
            .prop_map(|(name, panel, position, sprite, command, boot, local_copy)| ButtonShape {
                name,
                panel,
                position,
                sprite,
                command,
                boot,
                local_copy,
            })
    }

    fn build(panel_shapes: &[PanelShape], button_shapes: &[ButtonShape]) -> (AppDatabase, PanelDatabase) {
        let mut apps = AppDatabase::new();
        let mut panels = PanelDatabase::new();
        let mut keys = Vec::new();
        for (i, shape) in panel_shapes.iter().enumerate() {
            let key = panels.create_key().unwrap();
            panels.set_panel_info(
                key,
                &PanelRecord {
                    key,
                    name: format!("Panel {}", i),
                    position: shape.position,
                    width: shape.width,
                    sort: shape.sort,
                    slab: SlabSize::new(shape.slab.0, shape.slab.1),
                    depth: shape.depth,
                },
            );
            keys.push(key);
        }
        for shape in button_shapes {
            let key = apps.create_key().unwrap();
            let panel = shape.panel.and_then(|i| keys.get(i).copied());
            apps.set_button_info(
                key,
                &ButtonRecord {
                    key,
                    name: shape.name.clone(),
                    position: GridPoint::new(shape.position.0, shape.position.1),
                    sprite: shape.sprite.clone(),
                    local_copy: shape.local_copy,
                    command: shape.command.clone(),
                    boot: shape.boot,
                    panel,
                },
            );
        }
        (apps, panels)
    }

    proptest! {
        #[test]
        fn save_then_load_reproduces_state(
            panel_shapes in prop::collection::vec(panel_strategy(), 0..4),
            button_shapes in prop::collection::vec(button_strategy(), 0..12),
            churn in 0usize..3,
        ) {
            let (mut apps, panels) = build(&panel_shapes, &button_shapes);
            // Leave gaps in the key space so renumbering is exercised
            for _ in 0..churn {
                if let Some(first) = apps.next_key(None) {
                    apps.delete_key(first);
                }
            }

            let text = save_string(&apps, &panels);
            let mut apps2 = AppDatabase::new();
            let mut panels2 = PanelDatabase::new();
            let report = load(text.as_bytes(), &mut apps2, &mut panels2).unwrap();
            prop_assert_eq!(report.status, Status::Ok);

            let before = panel_records(&panels);
            let after = panel_records(&panels2);
            prop_assert_eq!(before.len(), after.len());
            for (a, b) in before.iter().zip(&after) {
                prop_assert_eq!(&a.name, &b.name);
                prop_assert_eq!(a.position, b.position);
                prop_assert_eq!(a.width, b.width);
                prop_assert_eq!(a.sort, b.sort);
                prop_assert_eq!(a.slab, b.slab);
                prop_assert_eq!(a.depth, b.depth);
            }

            let before = button_records(&apps);
            let after = button_records(&apps2);
            prop_assert_eq!(before.len(), after.len());
            for (i, (a, b)) in before.iter().zip(&after).enumerate() {
                prop_assert_eq!(b.key, i as Key);
                prop_assert_eq!(&a.name, &b.name);
                prop_assert_eq!(a.position, b.position);
                prop_assert_eq!(&a.sprite, &b.sprite);
                prop_assert_eq!(&a.command, &b.command);
                prop_assert_eq!(a.boot, b.boot);
                prop_assert_eq!(a.local_copy, b.local_copy);
                let name_a = a.panel.and_then(|k| panels.get(k)).map(|p| p.name.clone());
                let name_b = b.panel.and_then(|k| panels2.get(k)).map(|p| p.name.clone());
                prop_assert_eq!(name_a, name_b);
            }
        }
    }
}
