//! Collapse and refill - gravity compaction and replacement spawning
//!
//! Each affected column goes through two phases:
//!
//! 1. **Collapse** runs immediately: pieces drop onto the lowest free tile of
//!    the empty run below them until a full sweep moves nothing.
//! 2. **Refill** is queued as one task per column. A task fills every vacant
//!    tile of its column with a fresh normal piece, top row first, each with an
//!    independent random color.
//!
//! Queued tasks only defer work, never state visibility: the session drains
//! the queue before anything reads the grid again. Tasks run in the order they
//! were scheduled, one column at a time.

use std::collections::VecDeque;

use log::debug;

use crate::events::EventSink;
use crate::grid::Grid;
use crate::piece::{PieceId, PieceVariant};
use crate::rng::SimpleRng;
use crate::types::{CoreEvent, DotColor, PieceKind, Position, WorldPoint};
use crate::utility::empty_count_below;

/// Compact column `x` toward row 0
///
/// Returns the number of piece moves performed. The occupied count of the
/// column is unchanged.
pub fn collapse_column(grid: &mut Grid, x: i32, sink: &mut dyn EventSink) -> usize {
    let height = grid.height() as i32;
    if x < 0 || x >= grid.width() as i32 {
        return 0;
    }

    let mut total = 0;
    loop {
        let mut moved = 0;
        for y in 0..height {
            let from = Position::new(x, y);
            if !grid.is_occupied(from) {
                continue;
            }
            let drop = empty_count_below(grid, from) as i32;
            if drop == 0 {
                continue;
            }
            let to = Position::new(x, y - drop);
            if let Some(id) = grid.move_piece(from, to) {
                let target = grid.anchor(to).unwrap_or_default();
                sink.emit(CoreEvent::PieceMoved {
                    id: id.0,
                    from,
                    to,
                    target,
                });
                moved += 1;
            }
        }
        total += moved;
        if moved == 0 {
            break;
        }
    }

    debug_assert!(is_compact(grid, x), "column {} not compact after collapse", x);
    total
}

/// True if no vacant tile in column `x` lies below an occupied one
pub fn is_compact(grid: &Grid, x: i32) -> bool {
    let mut seen_gap = false;
    for pos in grid.column(x) {
        if grid.is_vacant(pos) {
            seen_gap = true;
        } else if seen_gap {
            return false;
        }
    }
    true
}

/// Fill every vacant tile of column `x` with a random normal piece
///
/// Tiles are filled top row first. Each spawn starts `offset_rows` rows above
/// its resting tile. Returns the spawned ids in spawn order.
pub fn refill_column(
    grid: &mut Grid,
    x: i32,
    rng: &mut SimpleRng,
    palette: &[DotColor],
    offset_rows: u8,
    sink: &mut dyn EventSink,
) -> Vec<PieceId> {
    let vacant: Vec<Position> = grid
        .column(x)
        .filter(|&p| grid.is_vacant(p))
        .collect();
    let lift = offset_rows as f32 * grid.spacing();

    let mut spawned = Vec::with_capacity(vacant.len());
    for pos in vacant.into_iter().rev() {
        let Some(color) = rng.pick_color(palette) else {
            break;
        };
        let Some(id) = grid.place(pos, PieceVariant::Normal { color }) else {
            continue;
        };
        let to = grid.anchor(pos).unwrap_or_default();
        sink.emit(CoreEvent::PieceSpawned {
            id: id.0,
            kind: PieceKind::Normal,
            color: Some(color),
            position: pos,
            from: WorldPoint::new(to.x, to.y + lift),
            to,
        });
        spawned.push(id);
    }
    spawned
}

/// Pending per-column refill work
#[derive(Debug, Clone, Default)]
pub struct RefillQueue {
    pending: VecDeque<i32>,
}

impl RefillQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a refill for column `x`; a column already pending is not queued twice
    pub fn schedule(&mut self, x: i32) {
        if !self.pending.contains(&x) {
            self.pending.push_back(x);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Columns still waiting, in run order
    pub fn pending(&self) -> impl Iterator<Item = i32> + '_ {
        self.pending.iter().copied()
    }

    /// Run the oldest task; returns its column and spawn count
    pub fn run_next(
        &mut self,
        grid: &mut Grid,
        rng: &mut SimpleRng,
        palette: &[DotColor],
        offset_rows: u8,
        sink: &mut dyn EventSink,
    ) -> Option<(i32, usize)> {
        let x = self.pending.pop_front()?;
        let spawned = refill_column(grid, x, rng, palette, offset_rows, sink).len();
        debug!("refilled column {} with {} pieces", x, spawned);
        Some((x, spawned))
    }

    /// Run every pending task; returns the total spawn count
    pub fn run_all(
        &mut self,
        grid: &mut Grid,
        rng: &mut SimpleRng,
        palette: &[DotColor],
        offset_rows: u8,
        sink: &mut dyn EventSink,
    ) -> usize {
        let mut total = 0;
        while let Some((_, n)) = self.run_next(grid, rng, palette, offset_rows, sink) {
            total += n;
        }
        total
    }
}
