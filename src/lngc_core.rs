// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Core value types shared by the databases, the filing layer and the panel engine.

use std::fmt;

/// Stable surrogate key for a database record (never reused within a session)
pub type Key = u32;

// ============================================================================
// Screen edges and boot actions
// ============================================================================

/// Screen edge a panel is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    /// Keyword used in the buttons file
    pub fn keyword(self) -> &'static str {
        match self {
            Edge::Left => "Left",
            Edge::Right => "Right",
            Edge::Top => "Top",
            Edge::Bottom => "Bottom",
        }
    }

    /// Parse a file keyword (case-insensitive)
    pub fn from_keyword(s: &str) -> Option<Self> {
        let s = s.trim();
        Edge::ALL.into_iter().find(|e| e.keyword().eq_ignore_ascii_case(s))
    }

    /// Left/Right panels run their longitude down the screen
    pub fn is_vertical(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Startup-time registration behaviour for a button's target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootAction {
    #[default]
    None,
    Boot,
    Sprites,
}

impl BootAction {
    pub fn keyword(self) -> &'static str {
        match self {
            BootAction::None => "No",
            BootAction::Boot => "Boot",
            BootAction::Sprites => "Sprites",
        }
    }

    /// Parse a file keyword; `Yes` is the legacy spelling of `Boot`
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no" | "none" => Some(BootAction::None),
            "boot" | "yes" => Some(BootAction::Boot),
            "sprites" => Some(BootAction::Sprites),
            _ => None,
        }
    }
}

// ============================================================================
// Grid and screen geometry
// ============================================================================

/// Cell coordinate on a panel grid: x = column from the edge, y = row along it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const ORIGIN: GridPoint = GridPoint { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Grid footprint of one button, in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlabSize {
    pub x: i32,
    pub y: i32,
}

impl SlabSize {
    pub const UNIT: SlabSize = SlabSize { x: 1, y: 1 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Default for SlabSize {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Axis-aligned rectangle in OS units, exclusive of (x1, y1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> i32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> i32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x0.saturating_add(dx),
            self.y0.saturating_add(dy),
            self.x1.saturating_add(dx),
            self.y1.saturating_add(dy),
        )
    }
}

/// Size of the desktop in OS units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

impl ScreenSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

// ============================================================================
// Toolkit handles (opaque to the core)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconHandle(pub u32);
