// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Collaborator contracts for the panel engine
///
/// The engine never talks to a window system, a dialogue layer or a process
/// launcher directly. It is driven by `Event`s and acts through these traits.

use thiserror::Error;

use crate::lngc_core::{BootAction, IconHandle, Key, Rect, ScreenSize, WindowHandle};
use crate::lngdv_dialogue::{ButtonForm, PanelForm};

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Select,
    Menu,
}

/// Deferred callback payload; delivered back to the engine as `Event::Timer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerPayload {
    AutoOpen(Key),
    AutoClose(Key),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Click on a panel window; `icon` is None on the background
    Click {
        window: WindowHandle,
        icon: Option<IconHandle>,
        button: MouseButton,
    },
    PointerEnter(WindowHandle),
    PointerLeave(WindowHandle),
    MenuClosed,
    ModeChange(ScreenSize),
    Timer(TimerPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

// ============================================================================
// Traits
// ============================================================================

pub trait Toolkit {
    fn screen_size(&self) -> ScreenSize;
    fn create_window(&mut self, extent: Rect) -> WindowHandle;
    fn delete_window(&mut self, window: WindowHandle);
    fn resize_window(&mut self, window: WindowHandle, extent: Rect);
    fn create_icon(&mut self, window: WindowHandle, rect: Rect, validation: &str, label: &str) -> IconHandle;
    fn delete_icon(&mut self, window: WindowHandle, icon: IconHandle);
    fn schedule(&mut self, delay_ms: u32, payload: TimerPayload);
    fn report(&mut self, severity: Severity, message: &str);
}

/// Modal dialogue presenter. `None` means the user cancelled.
pub trait Dialogue {
    fn edit_button(&mut self, form: &ButtonForm, message: Option<&str>) -> Option<ButtonForm>;
    fn edit_panel(&mut self, form: &PanelForm, message: Option<&str>) -> Option<PanelForm>;
    fn confirm(&mut self, message: &str) -> bool;
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("nothing to run")]
    EmptyCommand,

    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

pub trait CommandRunner {
    fn run(&mut self, command: &str) -> Result<(), LaunchError>;
    fn boot(&mut self, command: &str, action: BootAction) -> Result<(), LaunchError>;
}
