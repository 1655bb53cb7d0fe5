//! Shuffler - redistribute pieces over the occupied tiles
//!
//! No piece is created or destroyed and the set of occupied tiles stays the
//! same; only which piece sits where changes.

use log::info;

use crate::events::EventSink;
use crate::grid::Grid;
use crate::piece::PieceId;
use crate::rng::SimpleRng;
use crate::types::{CoreEvent, Position};

/// Permute all pieces over the currently occupied tiles
///
/// Returns the number of pieces that changed tile.
pub fn shuffle_grid(grid: &mut Grid, rng: &mut SimpleRng, sink: &mut dyn EventSink) -> usize {
    let slots: Vec<(Position, PieceId)> = grid
        .positions()
        .filter_map(|p| grid.occupant(p).map(|id| (p, id)))
        .collect();

    let mut ids: Vec<PieceId> = slots.iter().map(|&(_, id)| id).collect();
    rng.shuffle(&mut ids);

    let mut moved = 0;
    for (&(pos, _), &id) in slots.iter().zip(&ids) {
        let from = grid.piece(id).map(|p| p.position).unwrap_or(pos);
        grid.reassign(pos, id);
        if from != pos {
            moved += 1;
            sink.emit(CoreEvent::PieceMoved {
                id: id.0,
                from,
                to: pos,
                target: grid.anchor(pos).unwrap_or_default(),
            });
        }
    }

    debug_assert!(grid.check_invariants(), "shuffle broke tile/piece links");
    sink.emit(CoreEvent::GridShuffled);
    info!("shuffled {} pieces ({} moved)", ids.len(), moved);
    moved
}
