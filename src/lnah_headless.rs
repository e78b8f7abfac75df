// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Headless Adapters
/// A toolkit that records windows and icons in memory and runs a virtual clock,
/// plus a dialogue that replays scripted replies.
///
/// The binary uses these to lay panels out without a window system; the engine
/// tests use them to observe every toolkit call.

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, error, warn};

use crate::lngc_core::{IconHandle, Rect, ScreenSize, WindowHandle};
use crate::lngdv_dialogue::{ButtonForm, PanelForm};
use crate::lngtk_toolkit::{Dialogue, Severity, TimerPayload, Toolkit};

// ============================================================================
// SECTION 1: Toolkit
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessIcon {
    pub rect: Rect,
    pub validation: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessWindow {
    pub extent: Rect,
    pub icons: BTreeMap<u32, HeadlessIcon>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PendingTimer {
    due: u64,
    seq: u64,
}

#[derive(Debug)]
pub struct HeadlessToolkit {
    screen: ScreenSize,
    windows: BTreeMap<u32, HeadlessWindow>,
    next_handle: u32,
    now: u64,
    seq: u64,
    timers: BTreeMap<PendingTimer, TimerPayload>,
    reports: Vec<(Severity, String)>,
}

impl HeadlessToolkit {
    pub fn new(screen: ScreenSize) -> Self {
        Self {
            screen,
            windows: BTreeMap::new(),
            next_handle: 1,
            now: 0,
            seq: 0,
            timers: BTreeMap::new(),
            reports: Vec::new(),
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Move the clock forward and hand back every payload that fell due, oldest first
    pub fn advance(&mut self, ms: u64) -> Vec<TimerPayload> {
        self.now += ms;
        let mut due = Vec::new();
        while let Some(entry) = self.timers.first_entry() {
            if entry.key().due > self.now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn window(&self, window: WindowHandle) -> Option<&HeadlessWindow> {
        self.windows.get(&window.0)
    }

    pub fn windows(&self) -> impl Iterator<Item = (WindowHandle, &HeadlessWindow)> {
        self.windows.iter().map(|(h, w)| (WindowHandle(*h), w))
    }

    pub fn icon(&self, window: WindowHandle, icon: IconHandle) -> Option<&HeadlessIcon> {
        self.windows.get(&window.0)?.icons.get(&icon.0)
    }

    pub fn reports(&self) -> &[(Severity, String)] {
        &self.reports
    }

    fn handle(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl Toolkit for HeadlessToolkit {
    fn screen_size(&self) -> ScreenSize {
        self.screen
    }

    fn create_window(&mut self, extent: Rect) -> WindowHandle {
        let handle = self.handle();
        self.windows.insert(handle, HeadlessWindow { extent, icons: BTreeMap::new() });
        debug!("HEADLESS: window {} created {:?}", handle, extent);
        WindowHandle(handle)
    }

    fn delete_window(&mut self, window: WindowHandle) {
        if self.windows.remove(&window.0).is_none() {
            warn!("HEADLESS: WARNING delete of unknown window {}", window.0);
        }
    }

    fn resize_window(&mut self, window: WindowHandle, extent: Rect) {
        match self.windows.get_mut(&window.0) {
            Some(w) => w.extent = extent,
            None => warn!("HEADLESS: WARNING resize of unknown window {}", window.0),
        }
    }

    fn create_icon(&mut self, window: WindowHandle, rect: Rect, validation: &str, label: &str) -> IconHandle {
        let handle = self.handle();
        match self.windows.get_mut(&window.0) {
            Some(w) => {
                w.icons.insert(
                    handle,
                    HeadlessIcon {
                        rect,
                        validation: validation.to_string(),
                        label: label.to_string(),
                    },
                );
            }
            None => warn!("HEADLESS: WARNING icon for unknown window {}", window.0),
        }
        IconHandle(handle)
    }

    fn delete_icon(&mut self, window: WindowHandle, icon: IconHandle) {
        if let Some(w) = self.windows.get_mut(&window.0) {
            w.icons.remove(&icon.0);
        }
    }

    fn schedule(&mut self, delay_ms: u32, payload: TimerPayload) {
        self.seq += 1;
        let key = PendingTimer { due: self.now + u64::from(delay_ms), seq: self.seq };
        self.timers.insert(key, payload);
    }

    fn report(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Warning => warn!("REPORT: {}", message),
            Severity::Error => error!("REPORT: {}", message),
        }
        self.reports.push((severity, message.to_string()));
    }
}

// ============================================================================
// SECTION 2: Scripted dialogue
// ============================================================================

/// One queued user response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Button(Option<ButtonForm>),
    Panel(Option<PanelForm>),
    Confirm(bool),
}

/// Replays queued replies in order; an empty queue (or a reply of the wrong
/// kind) behaves like the user cancelling
#[derive(Debug, Default)]
pub struct ScriptedDialogue {
    replies: VecDeque<Reply>,
    /// Inline message shown with each presentation, in order
    pub shown: Vec<Option<String>>,
}

impl ScriptedDialogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reply: Reply) {
        self.replies.push_back(reply);
    }
}

impl Dialogue for ScriptedDialogue {
    fn edit_button(&mut self, _form: &ButtonForm, message: Option<&str>) -> Option<ButtonForm> {
        self.shown.push(message.map(str::to_string));
        match self.replies.pop_front() {
            Some(Reply::Button(reply)) => reply,
            _ => None,
        }
    }

    fn edit_panel(&mut self, _form: &PanelForm, message: Option<&str>) -> Option<PanelForm> {
        self.shown.push(message.map(str::to_string));
        match self.replies.pop_front() {
            Some(Reply::Panel(reply)) => reply,
            _ => None,
        }
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.shown.push(Some(message.to_string()));
        matches!(self.replies.pop_front(), Some(Reply::Confirm(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_in_due_order() {
        let mut toolkit = HeadlessToolkit::new(ScreenSize::new(800, 600));
        toolkit.schedule(500, TimerPayload::AutoClose(1));
        toolkit.schedule(300, TimerPayload::AutoOpen(2));
        toolkit.schedule(300, TimerPayload::AutoOpen(3));

        assert!(toolkit.advance(299).is_empty());
        assert_eq!(
            toolkit.advance(1),
            vec![TimerPayload::AutoOpen(2), TimerPayload::AutoOpen(3)]
        );
        assert_eq!(toolkit.pending_timers(), 1);
        assert_eq!(toolkit.advance(1000), vec![TimerPayload::AutoClose(1)]);
        assert_eq!(toolkit.now(), 1300);
    }

    #[test]
    fn test_icons_live_in_their_window() {
        let mut toolkit = HeadlessToolkit::new(ScreenSize::new(800, 600));
        let window = toolkit.create_window(Rect::new(0, 0, 84, 600));
        let icon = toolkit.create_icon(window, Rect::new(8, 8, 76, 76), "Sapp", "App");
        assert_eq!(toolkit.icon(window, icon).map(|i| i.label.as_str()), Some("App"));

        toolkit.delete_icon(window, icon);
        assert!(toolkit.icon(window, icon).is_none());
        toolkit.delete_window(window);
        assert!(toolkit.window(window).is_none());
    }

    #[test]
    fn test_empty_script_cancels() {
        let mut dialogue = ScriptedDialogue::new();
        assert!(dialogue.edit_button(&ButtonForm::default(), None).is_none());
        assert!(!dialogue.confirm("Delete?"));
        assert_eq!(dialogue.shown, vec![None, Some("Delete?".to_string())]);
    }
}
