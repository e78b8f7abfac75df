// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Auto show/hide state for one panel
///
/// A panel is held open by any number of independent reasons. Deferred
/// callbacks re-check their guard when they fire instead of being cancelled, so
/// a stale timer simply does nothing.

use bitflags::bitflags;
use tracing::debug;

/// Delay before a released panel closes
pub const AUTO_CLOSE_DELAY_MS: u32 = 500;

bitflags! {
    /// Reasons a panel is being held open
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HoldReasons: u8 {
        const POINTER = 1 << 0;
        const MENU = 1 << 1;
        const DIALOGUE = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    AutoOpen,
    AutoClose,
}

/// What the owner must do after a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldAction {
    Nothing,
    Open,
    Close,
    Schedule { kind: TimerKind, delay_ms: u32 },
}

#[derive(Debug, Clone)]
pub struct AutoHide {
    open: bool,
    reasons: HoldReasons,
    auto_open_delay: u32,
    close_delay: u32,
    mouse_over: bool,
}

impl AutoHide {
    pub fn new(auto_open_delay: u32, mouse_over: bool) -> Self {
        Self {
            open: false,
            reasons: HoldReasons::empty(),
            auto_open_delay,
            close_delay: AUTO_CLOSE_DELAY_MS,
            mouse_over,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn pointer_enter(&mut self) -> HoldAction {
        self.reasons.insert(HoldReasons::POINTER);
        if self.open || !self.mouse_over {
            return HoldAction::Nothing;
        }
        if self.auto_open_delay == 0 {
            return self.set_open(true);
        }
        HoldAction::Schedule { kind: TimerKind::AutoOpen, delay_ms: self.auto_open_delay }
    }

    pub fn pointer_leave(&mut self) -> HoldAction {
        self.release(HoldReasons::POINTER)
    }

    /// A click on the closed strip opens the panel straight away
    pub fn click_open(&mut self) -> HoldAction {
        if self.open {
            HoldAction::Nothing
        } else {
            self.set_open(true)
        }
    }

    /// Menu and dialogue holders open the panel immediately
    pub fn hold(&mut self, reason: HoldReasons) -> HoldAction {
        self.reasons.insert(reason);
        if self.open {
            HoldAction::Nothing
        } else {
            self.set_open(true)
        }
    }

    pub fn release(&mut self, reason: HoldReasons) -> HoldAction {
        self.reasons.remove(reason);
        if self.open && self.reasons.is_empty() {
            HoldAction::Schedule { kind: TimerKind::AutoClose, delay_ms: self.close_delay }
        } else {
            HoldAction::Nothing
        }
    }

    /// Deferred callback; acts only if its triggering condition still holds
    pub fn timer(&mut self, kind: TimerKind) -> HoldAction {
        match kind {
            TimerKind::AutoOpen if !self.open && self.reasons == HoldReasons::POINTER => {
                self.set_open(true)
            }
            TimerKind::AutoClose if self.open && self.reasons.is_empty() => self.set_open(false),
            _ => {
                debug!("HOLD: stale {:?} timer ignored (reasons={:?})", kind, self.reasons);
                HoldAction::Nothing
            }
        }
    }

    fn set_open(&mut self, open: bool) -> HoldAction {
        self.open = open;
        if open {
            HoldAction::Open
        } else {
            HoldAction::Close
        }
    }
}
