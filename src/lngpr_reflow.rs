// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Button Reflow
/// Resolves slab collisions on one panel and fits buttons into its row capacity
///
/// Buttons are placed in the order given (key order). Each one starts at its
/// nominal cell and is nudged off every slab already placed: right of the
/// sibling when it overlaps from the sibling's column onwards, below it when it
/// overlaps from the left. A button that still clashes, or whose slab runs past
/// the last row, goes to the first free cell scanning column-major from (0,0).

use crate::lngc_core::{GridPoint, Key, SlabSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub key: Key,
    pub position: GridPoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reflow {
    pub placements: Vec<Placement>,
    /// Column count needed to show every placement (never below the configured depth)
    pub columns: i32,
}

fn overlaps(a: GridPoint, b: GridPoint, slab: SlabSize) -> bool {
    let dx = (i64::from(a.x) - i64::from(b.x)).abs();
    let dy = (i64::from(a.y) - i64::from(b.y)).abs();
    dx < i64::from(slab.x) && dy < i64::from(slab.y)
}

/// First clash-free cell, rows before columns
fn first_fit(placed: &[GridPoint], slab: SlabSize, rows: i32) -> GridPoint {
    let last_row = rows.saturating_sub(slab.y).max(0);
    let mut column = 0;
    loop {
        for row in 0..=last_row {
            let candidate = GridPoint::new(column, row);
            if !placed.iter().any(|q| overlaps(candidate, *q, slab)) {
                return candidate;
            }
        }
        column += 1;
    }
}

pub fn reflow_buttons(buttons: &[(Key, GridPoint)], slab: SlabSize, rows: i32, depth: i32) -> Reflow {
    let slab = SlabSize::new(slab.x.max(1), slab.y.max(1));
    let rows = rows.max(1);
    let mut placed: Vec<GridPoint> = Vec::with_capacity(buttons.len());
    let mut placements = Vec::with_capacity(buttons.len());
    let mut columns = depth.max(1);

    for &(key, nominal) in buttons {
        let mut p = GridPoint::new(nominal.x.max(0), nominal.y.max(0));

        for _ in 0..=placed.len() {
            let mut moved = false;
            for q in &placed {
                if overlaps(p, *q, slab) {
                    if p.x >= q.x {
                        p.x = q.x.saturating_add(slab.x);
                    } else {
                        p.y = q.y.saturating_add(slab.y);
                    }
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }

        let clashes = placed.iter().any(|q| overlaps(p, *q, slab));
        if clashes || p.y.saturating_add(slab.y) > rows {
            p = first_fit(&placed, slab, rows);
        }

        columns = columns.max(p.x.saturating_add(slab.x));
        placed.push(p);
        placements.push(Placement { key, position: p });
    }

    Reflow { placements, columns }
}
