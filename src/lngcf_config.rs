// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Choices Configuration
/// Parses <config_dir>/launcher/choices.xml and resolves the buttons file path
///
/// Unknown settings and bad values warn and keep the built-in default. A
/// missing file is deployed from the embedded default; an unparsable one is
/// left alone and the embedded default is used instead.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

// Embed the default choices at compile time
const DEFAULT_CHOICES_XML: &str = include_str!("../choices.default.xml");

#[derive(Debug, Error)]
pub enum ChoicesError {
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("no <Choices> element found")]
    MissingRoot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choices {
    pub grid_size: i32,
    pub grid_spacing: i32,
    /// Depth given to new panels
    pub columns: i32,
    pub slab_x: i32,
    pub slab_y: i32,
    pub confirm_delete: bool,
    pub auto_open_delay: u32,
    pub mouse_over: bool,
    pub strip_size: i32,
}

impl Default for Choices {
    fn default() -> Self {
        Self {
            grid_size: 68,
            grid_spacing: 8,
            columns: 1,
            slab_x: 1,
            slab_y: 1,
            confirm_delete: true,
            auto_open_delay: 300,
            mouse_over: true,
            strip_size: 8,
        }
    }
}

// ============================================================================
// SECTION 1: Path resolution
// ============================================================================

fn config_dir() -> PathBuf {
    let mut path = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    path.push("launcher");
    path
}

pub fn choices_path() -> PathBuf {
    config_dir().join("choices.xml")
}

pub fn buttons_path() -> PathBuf {
    config_dir().join("Buttons")
}

// ============================================================================
// SECTION 2: Loading
// ============================================================================

impl Choices {
    /// Load from the standard location, creating the default file if missing
    pub fn load_from_file() -> Self {
        Self::load_from_path(&choices_path())
    }

    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(xml) => {
                debug!("CHOICES: parsing {}", path.display());
                match Self::parse_xml(&xml) {
                    Ok(choices) => choices,
                    Err(e) => {
                        warn!("CHOICES: parse error ({}), using built-in defaults", e);
                        Self::embedded()
                    }
                }
            }
            Err(_) => {
                if let Some(parent) = path.parent() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        warn!("CHOICES: failed to create config directory: {}", e);
                        return Self::embedded();
                    }
                }
                match fs::write(path, DEFAULT_CHOICES_XML) {
                    Ok(()) => info!("CHOICES: created default choices at {}", path.display()),
                    Err(e) => warn!("CHOICES: failed to write default choices: {}", e),
                }
                Self::embedded()
            }
        }
    }

    fn embedded() -> Self {
        Self::parse_xml(DEFAULT_CHOICES_XML).unwrap_or_default()
    }

    fn parse_xml(xml: &str) -> Result<Self, ChoicesError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut choices = Self::default();
        let mut seen_root = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == b"Choices" => seen_root = true,
                Event::Empty(ref e) if e.name().as_ref() == b"Choices" => seen_root = true,
                Event::Empty(ref e) if e.name().as_ref() == b"Setting" => {
                    let mut name: Option<String> = None;
                    let mut value: Option<String> = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"name" => name = Some(String::from_utf8_lossy(&attr.value).to_string()),
                            b"value" => value = Some(String::from_utf8_lossy(&attr.value).to_string()),
                            _ => {}
                        }
                    }
                    match (name, value) {
                        (Some(name), Some(value)) => choices.apply(&name, value.trim()),
                        _ => warn!("CHOICES: WARNING Setting without name or value"),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if seen_root {
            Ok(choices)
        } else {
            Err(ChoicesError::MissingRoot)
        }
    }

    fn apply(&mut self, name: &str, value: &str) {
        let ok = match name {
            "GridSize" => set_int(&mut self.grid_size, value, 1, 1024),
            "GridSpacing" => set_int(&mut self.grid_spacing, value, 0, 256),
            "Columns" => set_int(&mut self.columns, value, 1, 99),
            "SlabXSize" => set_int(&mut self.slab_x, value, 1, 9),
            "SlabYSize" => set_int(&mut self.slab_y, value, 1, 9),
            "StripSize" => set_int(&mut self.strip_size, value, 0, 256),
            "AutoOpenDelay" => match value.parse::<u32>() {
                Ok(ms) => {
                    self.auto_open_delay = ms;
                    true
                }
                Err(_) => false,
            },
            "ConfirmDelete" => set_bool(&mut self.confirm_delete, value),
            "MouseOver" => set_bool(&mut self.mouse_over, value),
            _ => {
                warn!("CHOICES: WARNING unknown setting '{}'", name);
                return;
            }
        };
        if !ok {
            warn!("CHOICES: WARNING bad value '{}' for {}, keeping default", value, name);
        }
    }
}

fn set_int(slot: &mut i32, value: &str, min: i32, max: i32) -> bool {
    match value.parse::<i32>() {
        Ok(n) if (min..=max).contains(&n) => {
            *slot = n;
            true
        }
        _ => false,
    }
}

fn set_bool(slot: &mut bool, value: &str) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "1" => *slot = true,
        "no" | "false" | "off" | "0" => *slot = false,
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_matches_builtin() {
        assert_eq!(Choices::parse_xml(DEFAULT_CHOICES_XML).unwrap(), Choices::default());
    }

    #[test]
    fn test_parse_overrides() {
        let xml = r#"
            <Choices>
                <Setting name="GridSize" value="34"/>
                <Setting name="MouseOver" value="no"/>
                <Setting name="AutoOpenDelay" value="0"/>
            </Choices>
        "#;
        let choices = Choices::parse_xml(xml).unwrap();
        assert_eq!(choices.grid_size, 34);
        assert!(!choices.mouse_over);
        assert_eq!(choices.auto_open_delay, 0);
        assert_eq!(choices.grid_spacing, 8);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let xml = r#"
            <Choices>
                <Setting name="SlabXSize" value="12"/>
                <Setting name="ConfirmDelete" value="maybe"/>
                <Setting name="Colour" value="red"/>
            </Choices>
        "#;
        let choices = Choices::parse_xml(xml).unwrap();
        assert_eq!(choices, Choices::default());
    }

    #[test]
    fn test_missing_root_is_error() {
        assert!(matches!(Choices::parse_xml("<Other/>"), Err(ChoicesError::MissingRoot)));
    }

    #[test]
    fn test_missing_file_deploys_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher").join("choices.xml");
        let choices = Choices::load_from_path(&path);
        assert_eq!(choices, Choices::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CHOICES_XML);
    }

    #[test]
    fn test_broken_file_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("choices.xml");
        fs::write(&path, "<Choices><Setting name=").unwrap();
        assert_eq!(Choices::load_from_path(&path), Choices::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "<Choices><Setting name=");
    }
}
