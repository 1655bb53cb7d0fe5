//! Connection validator - may a piece extend a chain?
//!
//! A candidate extends a chain when it shares the tail's color and sits one
//! orthogonal step away. Color bombs have no color of their own: a color bomb
//! candidate takes the tail's color before the comparison, and keeps it even
//! when the adjacency check then fails.

use crate::grid::Grid;
use crate::piece::PieceId;

/// Check whether `candidate` may follow `last` in a chain
///
/// Returns `false` if either piece is absent or not connectable.
pub fn is_valid_connection(
    grid: &mut Grid,
    last: Option<PieceId>,
    candidate: Option<PieceId>,
) -> bool {
    let (Some(last), Some(candidate)) = (last, candidate) else {
        return false;
    };
    let Some(tail) = grid.piece(last).copied() else {
        return false;
    };
    if !tail.is_connectable() {
        return false;
    }

    let Some(next) = grid.piece_mut(candidate) else {
        return false;
    };
    if !next.is_connectable() {
        return false;
    }
    if next.is_color_bomb() {
        next.adopt_color(tail.color());
    }

    match (tail.color(), next.color()) {
        (Some(a), Some(b)) if a == b => {}
        _ => return false,
    }

    tail.position.is_orthogonal_neighbor(next.position)
}
