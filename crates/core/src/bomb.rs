//! Bomb effects - color sweeps and area blasts
//!
//! Both effects only empty tiles. Collapsing and refilling the affected
//! columns is left to the caller, as is detonating any line bomb caught in a
//! blast (the returned pieces tell it which ones were hit).

use log::debug;

use crate::events::EventSink;
use crate::grid::Grid;
use crate::piece::Piece;
use crate::types::{CoreEvent, DotColor, Position};
use crate::utility::ring_within;

/// Remove the piece at `pos`, announcing it to the sink
pub fn clear_at(grid: &mut Grid, pos: Position, sink: &mut dyn EventSink) -> Option<Piece> {
    let (id, piece) = grid.remove(pos)?;
    sink.emit(CoreEvent::PieceCleared {
        id: id.0,
        kind: piece.kind(),
        position: pos,
    });
    Some(piece)
}

/// Clear every piece whose current color equals `color`
///
/// Scans the whole grid. Color bombs only match while they hold an adopted
/// color; line bombs never match. Returns the cleared positions in scan order.
pub fn explode_color_bomb(
    grid: &mut Grid,
    color: DotColor,
    sink: &mut dyn EventSink,
) -> Vec<Position> {
    let targets: Vec<Position> = grid
        .positions()
        .filter(|&p| grid.color_at(p) == Some(color))
        .collect();
    for &pos in &targets {
        clear_at(grid, pos, sink);
    }
    debug!("color sweep {} cleared {} pieces", color.as_str(), targets.len());
    targets
}

/// Clear every piece within `radius` of `pos`, excluding `pos` itself
///
/// The origin is expected to be cleared by the caller beforehand. Returns the
/// cleared pieces.
pub fn destroy_around(
    grid: &mut Grid,
    pos: Position,
    radius: u8,
    sink: &mut dyn EventSink,
) -> Vec<Piece> {
    ring_within(grid, pos, radius)
        .into_iter()
        .filter_map(|p| clear_at(grid, p, sink))
        .collect()
}
