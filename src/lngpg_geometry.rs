// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Panel Geometry
/// Grid metrics, coordinate conversion and edge apportionment
///
/// Coordinate spaces (OS units):
/// - screen: origin top-left of the desktop, x right, y down
/// - window: origin top-left of the panel's open work area
/// - grid:   x = column counted inwards from the screen edge, y = row along the edge
///
/// Right and Bottom panels mirror the column axis so column 0 always hugs the edge.

use crate::lngc_core::{Edge, GridPoint, Key, Rect, ScreenSize, SlabSize};

// ============================================================================
// SECTION 1: Grid metrics
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    /// Cell edge length
    pub square: i32,
    /// Gap between cells and around the grid
    pub spacing: i32,
    /// Effective column count (may exceed the configured depth after reflow)
    pub columns: i32,
    /// Rows that fit along the panel's extent
    pub rows: i32,
}

impl GridGeometry {
    pub fn new(square: i32, spacing: i32) -> Self {
        Self {
            square: square.max(1),
            spacing: spacing.max(0),
            columns: 1,
            rows: 1,
        }
    }

    // All metrics saturate at i32::MAX rather than wrapping

    pub fn pitch(&self) -> i32 {
        self.square.saturating_add(self.spacing)
    }

    /// Rows that fit along a linear extent (never less than one)
    pub fn rows_for_extent(&self, extent: i32) -> i32 {
        (extent.saturating_sub(self.spacing) / self.pitch()).max(1)
    }

    /// Depth of an open panel with `columns` columns
    pub fn thickness(&self, columns: i32) -> i32 {
        self.spacing.saturating_add(columns.max(1).saturating_mul(self.pitch()))
    }

    /// OS-unit length of a run of `cells` cells including the gaps between them
    pub fn span(&self, cells: i32) -> i32 {
        let cells = cells.max(1);
        cells
            .saturating_mul(self.square)
            .saturating_add((cells - 1).saturating_mul(self.spacing))
    }

    /// Offset of a cell's leading side from the grid origin
    fn offset(&self, cell: i32) -> i32 {
        self.spacing.saturating_add(cell.saturating_mul(self.pitch()))
    }

    /// Cell under an offset, or None if the offset falls in a gap
    fn cell_at(&self, offset: i32) -> Option<i32> {
        if offset < self.spacing {
            return None;
        }
        let rel = offset - self.spacing;
        (rel % self.pitch() < self.square).then_some(rel / self.pitch())
    }
}

// ============================================================================
// SECTION 2: Per-panel placement
// ============================================================================

/// Everything needed to place one panel and its icons on the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    pub edge: Edge,
    pub min_longitude: i32,
    pub max_longitude: i32,
    pub grid: GridGeometry,
    pub slab: SlabSize,
    pub screen: ScreenSize,
    /// Current depth of the window (open thickness, or the strip when closed)
    pub thickness: i32,
}

impl PanelGeometry {
    pub fn extent(&self) -> i32 {
        (self.max_longitude - self.min_longitude).max(0)
    }

    pub fn open_thickness(&self) -> i32 {
        self.grid.thickness(self.grid.columns)
    }

    /// Slab size in OS units: (across the depth, along the edge)
    pub fn slab_os(&self) -> (i32, i32) {
        (self.grid.span(self.slab.x), self.grid.span(self.slab.y))
    }

    /// Visible window rectangle in screen coordinates
    pub fn window_extent(&self) -> Rect {
        let t = self.thickness;
        let (lo, hi) = (self.min_longitude, self.max_longitude);
        let (w, h) = (self.screen.width, self.screen.height);
        match self.edge {
            Edge::Left => Rect::new(0, lo, t, hi),
            Edge::Right => Rect::new(w.saturating_sub(t), lo, w, hi),
            Edge::Top => Rect::new(lo, 0, hi, t),
            Edge::Bottom => Rect::new(lo, h.saturating_sub(t), hi, h),
        }
    }

    /// Screen position of the open work area's top-left corner
    fn work_origin(&self) -> (i32, i32) {
        let t = self.open_thickness();
        match self.edge {
            Edge::Left => (0, self.min_longitude),
            Edge::Right => (self.screen.width.saturating_sub(t), self.min_longitude),
            Edge::Top => (self.min_longitude, 0),
            Edge::Bottom => (self.min_longitude, self.screen.height.saturating_sub(t)),
        }
    }

    /// Rectangle of a slab anchored at `p`, in window coordinates
    pub fn cell_rect(&self, p: GridPoint) -> Rect {
        let t = self.open_thickness();
        let (across_len, along_len) = self.slab_os();
        let across = self.grid.offset(p.x);
        let along = self.grid.offset(p.y);
        let across_end = across.saturating_add(across_len);
        let along_end = along.saturating_add(along_len);
        // Mirrored edges count columns back from the outer side
        let inner = t.saturating_sub(across_end);
        let outer = t.saturating_sub(across);
        match self.edge {
            Edge::Left => Rect::new(across, along, across_end, along_end),
            Edge::Right => Rect::new(inner, along, outer, along_end),
            Edge::Top => Rect::new(along, across, along_end, across_end),
            Edge::Bottom => Rect::new(along, inner, along_end, outer),
        }
    }

    pub fn window_to_screen(&self, r: Rect) -> Rect {
        let (ox, oy) = self.work_origin();
        r.offset(ox, oy)
    }

    pub fn screen_to_window(&self, x: i32, y: i32) -> (i32, i32) {
        let (ox, oy) = self.work_origin();
        (x.saturating_sub(ox), y.saturating_sub(oy))
    }

    /// Grid cell under a window point, if it lands on a cell inside the grid
    pub fn window_to_grid(&self, x: i32, y: i32) -> Option<GridPoint> {
        let t = self.open_thickness();
        let (across, along) = match self.edge {
            Edge::Left => (x, y),
            Edge::Right => ((t - 1).saturating_sub(x), y),
            Edge::Top => (y, x),
            Edge::Bottom => ((t - 1).saturating_sub(y), x),
        };
        let column = self.grid.cell_at(across)?;
        let row = self.grid.cell_at(along)?;
        (column < self.grid.columns && row < self.grid.rows).then_some(GridPoint::new(column, row))
    }

    pub fn screen_to_grid(&self, x: i32, y: i32) -> Option<GridPoint> {
        let (wx, wy) = self.screen_to_window(x, y);
        self.window_to_grid(wx, wy)
    }
}

// ============================================================================
// SECTION 3: Edge apportionment
// ============================================================================

/// One panel's claim on its edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeMember {
    pub key: Key,
    pub edge: Edge,
    pub width: i32,
    pub sort: i32,
    /// Current depth into the screen (pushes in on the neighbouring edges)
    pub thickness: i32,
}

/// Longitude range handed to one panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub key: Key,
    pub min_longitude: i32,
    pub max_longitude: i32,
}

/// Split every edge among its panels in proportion to their width weights
///
/// Members must be supplied in key order: the sort is stable, so equal `sort`
/// values keep that order.
pub fn apportion(members: &[EdgeMember], screen: ScreenSize) -> Vec<Span> {
    let inset = |edge: Edge| {
        members
            .iter()
            .filter(|m| m.edge == edge)
            .map(|m| m.thickness)
            .max()
            .unwrap_or(0)
    };

    let vertical = (inset(Edge::Top), screen.height.saturating_sub(inset(Edge::Bottom)));
    let horizontal = (inset(Edge::Left), screen.width.saturating_sub(inset(Edge::Right)));

    let mut spans = Vec::with_capacity(members.len());
    for edge in Edge::ALL {
        let (lo, hi) = if edge.is_vertical() { vertical } else { horizontal };
        let extent = i64::from(hi.saturating_sub(lo).max(0));

        let mut on_edge: Vec<&EdgeMember> = members.iter().filter(|m| m.edge == edge).collect();
        on_edge.sort_by_key(|m| m.sort);

        let total: i64 = on_edge.iter().map(|m| i64::from(m.width.max(1))).sum();
        let mut cumulative: i64 = 0;
        for member in on_edge {
            let start = lo + (cumulative * extent / total) as i32;
            cumulative += i64::from(member.width.max(1));
            let end = lo + (cumulative * extent / total) as i32;
            spans.push(Span {
                key: member.key,
                min_longitude: start,
                max_longitude: end,
            });
        }
    }
    spans
}
