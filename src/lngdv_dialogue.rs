// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Edit dialogue forms and their validation
///
/// Forms carry the text the user typed. Validation turns a form into a record
/// or a message to show inline when the dialogue is presented again.

use thiserror::Error;

use crate::lngad_appdb::ButtonRecord;
use crate::lngc_core::{BootAction, Edge, GridPoint, Key, SlabSize};
use crate::lngfl_filing::{
    COMMAND_LIMIT, COORD_RANGE, DEPTH_RANGE, NAME_LIMIT, SLAB_RANGE, SPRITE_LIMIT, WEIGHT_RANGE,
};
use crate::lngpd_paneldb::{PanelDatabase, PanelRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The name must not be empty")]
    EmptyName,

    #[error("The command must not be empty")]
    EmptyCommand,

    #[error("{field} must be a whole number, not '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: i32, max: i32 },

    #[error("{field} must be at most {limit} characters")]
    TooLong { field: &'static str, limit: usize },

    #[error("{field} must not contain control characters")]
    ControlCharacter { field: &'static str },

    #[error("A panel called '{0}' already exists")]
    NameInUse(String),

    #[error("There is no panel called '{0}'")]
    UnknownPanel(String),

    #[error("Not enough memory to create a new entry")]
    OutOfMemory,
}

// ============================================================================
// Button form
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonForm {
    pub name: String,
    pub x: String,
    pub y: String,
    pub sprite: String,
    pub command: String,
    pub boot: BootAction,
    pub local_copy: bool,
    /// Owning panel by name; empty leaves the button unattached
    pub panel: String,
}

impl ButtonForm {
    pub fn from_record(record: &ButtonRecord, panels: &PanelDatabase) -> Self {
        let panel = record
            .panel
            .and_then(|key| panels.get(key))
            .map(|p| p.name.clone())
            .unwrap_or_default();
        Self {
            name: record.name.clone(),
            x: record.position.x.to_string(),
            y: record.position.y.to_string(),
            sprite: record.sprite.clone(),
            command: record.command.clone(),
            boot: record.boot,
            local_copy: record.local_copy,
            panel,
        }
    }

    /// Validate against the current panels, producing the record to store
    pub fn validate(&self, panels: &PanelDatabase) -> Result<ButtonRecord, ValidationError> {
        let name = required(&self.name, NAME_LIMIT, ValidationError::EmptyName, "Name")?;
        let command = required(&self.command, COMMAND_LIMIT, ValidationError::EmptyCommand, "Command")?;
        let sprite = limited(&self.sprite, SPRITE_LIMIT, "Sprite")?;
        let x = number(&self.x, "X position", COORD_RANGE)?;
        let y = number(&self.y, "Y position", COORD_RANGE)?;

        let panel_name = limited(&self.panel, NAME_LIMIT, "Panel")?;
        let panel = if panel_name.is_empty() {
            None
        } else {
            match panels.find_by_name(&panel_name) {
                Some(key) => Some(key),
                None => return Err(ValidationError::UnknownPanel(panel_name)),
            }
        };

        Ok(ButtonRecord {
            key: 0,
            name,
            position: GridPoint::new(x, y),
            sprite,
            local_copy: self.local_copy,
            command,
            boot: self.boot,
            panel,
        })
    }
}

// ============================================================================
// Panel form
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelForm {
    pub name: String,
    pub position: Edge,
    pub width: String,
    pub sort: String,
    pub slab_x: String,
    pub slab_y: String,
    pub depth: String,
}

impl PanelForm {
    pub fn from_record(record: &PanelRecord) -> Self {
        Self {
            name: record.name.clone(),
            position: record.position,
            width: record.width.to_string(),
            sort: record.sort.to_string(),
            slab_x: record.slab.x.to_string(),
            slab_y: record.slab.y.to_string(),
            depth: record.depth.to_string(),
        }
    }

    /// Validate; `editing` is the panel being edited, which may keep its own name
    pub fn validate(&self, panels: &PanelDatabase, editing: Option<Key>) -> Result<PanelRecord, ValidationError> {
        let name = required(&self.name, NAME_LIMIT, ValidationError::EmptyName, "Name")?;
        if panels.name_in_use(&name, editing) {
            return Err(ValidationError::NameInUse(name));
        }

        Ok(PanelRecord {
            key: 0,
            name,
            position: self.position,
            width: number(&self.width, "Width", WEIGHT_RANGE)?,
            sort: number(&self.sort, "Sort", WEIGHT_RANGE)?,
            slab: SlabSize::new(
                number(&self.slab_x, "Slab width", SLAB_RANGE)?,
                number(&self.slab_y, "Slab height", SLAB_RANGE)?,
            ),
            depth: number(&self.depth, "Depth", DEPTH_RANGE)?,
        })
    }
}

// ============================================================================
// Field helpers
// ============================================================================

/// Trimmed single-line text within the saved field limit
fn limited(value: &str, limit: usize, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.len() > limit {
        return Err(ValidationError::TooLong { field, limit });
    }
    if value.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacter { field });
    }
    Ok(value.to_string())
}

fn required(
    value: &str,
    limit: usize,
    empty: ValidationError,
    field: &'static str,
) -> Result<String, ValidationError> {
    let value = limited(value, limit, field)?;
    if value.is_empty() {
        return Err(empty);
    }
    Ok(value)
}

fn number(value: &str, field: &'static str, (min, max): (i32, i32)) -> Result<i32, ValidationError> {
    let n: i32 = value.trim().parse().map_err(|_| ValidationError::NotANumber {
        field,
        value: value.trim().to_string(),
    })?;
    if n < min || n > max {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panels_with(names: &[&str]) -> PanelDatabase {
        let mut panels = PanelDatabase::new();
        for name in names {
            let key = panels.create_key().unwrap();
            let record = PanelRecord { name: name.to_string(), ..PanelRecord::default() };
            panels.set_panel_info(key, &record);
        }
        panels
    }

    fn button_form() -> ButtonForm {
        ButtonForm {
            name: "Editor".into(),
            x: "0".into(),
            y: "2".into(),
            sprite: "!edit".into(),
            command: "edit".into(),
            boot: BootAction::Boot,
            local_copy: false,
            panel: "Tools".into(),
        }
    }

    #[test]
    fn test_button_form_resolves_panel() {
        let panels = panels_with(&["Apps", "Tools"]);
        let record = button_form().validate(&panels).unwrap();
        assert_eq!(record.panel, Some(1));
        assert_eq!(record.position, GridPoint::new(0, 2));
        assert_eq!(record.boot, BootAction::Boot);
    }

    #[test]
    fn test_button_form_errors() {
        let panels = panels_with(&["Tools"]);

        let form = ButtonForm { name: "  ".into(), ..button_form() };
        assert_eq!(form.validate(&panels), Err(ValidationError::EmptyName));

        let form = ButtonForm { command: String::new(), ..button_form() };
        assert_eq!(form.validate(&panels), Err(ValidationError::EmptyCommand));

        let form = ButtonForm { x: "1000".into(), ..button_form() };
        assert!(matches!(form.validate(&panels), Err(ValidationError::OutOfRange { max: 999, .. })));

        let form = ButtonForm { y: "two".into(), ..button_form() };
        assert!(matches!(form.validate(&panels), Err(ValidationError::NotANumber { .. })));

        let form = ButtonForm { panel: "Nowhere".into(), ..button_form() };
        assert_eq!(form.validate(&panels), Err(ValidationError::UnknownPanel("Nowhere".into())));

        let form = ButtonForm { name: "n".repeat(NAME_LIMIT + 1), ..button_form() };
        assert!(matches!(form.validate(&panels), Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn test_control_characters_rejected() {
        let panels = panels_with(&["Tools"]);

        let form = ButtonForm { command: "run\nPanel: Nope".into(), ..button_form() };
        assert_eq!(form.validate(&panels), Err(ValidationError::ControlCharacter { field: "Command" }));

        let form = ButtonForm { name: "Edit\tor".into(), ..button_form() };
        assert_eq!(form.validate(&panels), Err(ValidationError::ControlCharacter { field: "Name" }));

        let form = ButtonForm { sprite: "a\rb".into(), ..button_form() };
        assert_eq!(form.validate(&panels), Err(ValidationError::ControlCharacter { field: "Sprite" }));

        let form = ButtonForm { panel: "Too\u{7f}ls".into(), ..button_form() };
        assert_eq!(form.validate(&panels), Err(ValidationError::ControlCharacter { field: "Panel" }));

        let base = PanelForm::from_record(&PanelRecord::default());
        let form = PanelForm { name: "Apps\n[Buttons]".into(), ..base };
        assert_eq!(form.validate(&panels, None), Err(ValidationError::ControlCharacter { field: "Name" }));

        // Surrounding newlines are trimmed, not rejected
        let form = ButtonForm { command: "edit\n".into(), ..button_form() };
        assert_eq!(form.validate(&panels).unwrap().command, "edit");
    }

    #[test]
    fn test_button_form_without_panel() {
        let panels = panels_with(&[]);
        let form = ButtonForm { panel: String::new(), ..button_form() };
        assert_eq!(form.validate(&panels).unwrap().panel, None);
    }

    #[test]
    fn test_panel_form_round_trips_record() {
        let panels = panels_with(&["Tools"]);
        let record = panels.panel_info(0).unwrap();
        let mut expected = record.clone();
        expected.key = 0;
        assert_eq!(PanelForm::from_record(&record).validate(&panels, Some(0)), Ok(expected));
    }

    #[test]
    fn test_panel_form_name_collision() {
        let panels = panels_with(&["Apps", "Tools"]);
        let mut form = PanelForm::from_record(&panels.panel_info(0).unwrap());
        form.name = "Tools".into();
        assert_eq!(form.validate(&panels, Some(0)), Err(ValidationError::NameInUse("Tools".into())));
        assert_eq!(form.validate(&panels, None), Err(ValidationError::NameInUse("Tools".into())));
    }

    #[test]
    fn test_panel_form_ranges() {
        let panels = panels_with(&[]);
        let base = PanelForm::from_record(&PanelRecord { name: "P".into(), ..PanelRecord::default() });

        let form = PanelForm { width: "0".into(), ..base.clone() };
        assert!(matches!(form.validate(&panels, None), Err(ValidationError::OutOfRange { field: "Width", .. })));

        let form = PanelForm { slab_y: "10".into(), ..base.clone() };
        assert!(matches!(form.validate(&panels, None), Err(ValidationError::OutOfRange { field: "Slab height", .. })));

        let form = PanelForm { depth: "100".into(), ..base.clone() };
        assert!(matches!(form.validate(&panels, None), Err(ValidationError::OutOfRange { field: "Depth", .. })));

        let form = PanelForm { sort: "9999".into(), ..base };
        assert_eq!(form.validate(&panels, None).unwrap().sort, 9999);
    }
}
