//! Flood-fill matcher - connected same-color regions
//!
//! Discovery is a breadth-first walk over the 4-neighbourhood from a seed
//! piece. Color bombs are wildcards here: they join any region and the walk
//! continues through them, but their adopted color is left untouched.
//!
//! The discovered set is then linearized into a chain order. For regions
//! shaped like a simple path the result is the whole path, endpoint to
//! endpoint. Branching or cyclic regions are walked greedily from an endpoint
//! and the walk stops at the first dead end, so trailing branches are left out
//! of the ordered path. `connected_region` returns the full unordered set for
//! callers that need every member.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::grid::Grid;
use crate::piece::PieceId;
use crate::types::{DotColor, Position};
use crate::utility::neighbors_4;

/// Full region reachable from `seed`, in discovery order
///
/// Empty when the seed is absent or is a bomb (bombs are never origins).
pub fn connected_region(grid: &Grid, seed: Option<PieceId>) -> Vec<Position> {
    let Some(piece) = seed.and_then(|id| grid.piece(id)) else {
        return Vec::new();
    };
    if piece.is_explodable() || piece.is_color_bomb() {
        return Vec::new();
    }
    let Some(target) = piece.color() else {
        return Vec::new();
    };

    let mut region = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(piece.position);

    while let Some(pos) = queue.pop_front() {
        if !visited.insert(pos) {
            continue;
        }
        if !admits(grid, pos, target) {
            continue;
        }
        region.push(pos);
        for next in neighbors_4(grid, pos) {
            if !visited.contains(&next) {
                queue.push_back(next);
            }
        }
    }
    region
}

/// Connected region from `seed`, linearized into a playable chain order
///
/// The walk always starts on a normal piece: an endpoint if one is normal,
/// otherwise the seed. Color bombs have no color until a chain reaches them,
/// so they can only follow a normal head.
pub fn find_connected_region(grid: &Grid, seed: Option<PieceId>) -> Vec<Position> {
    let region = connected_region(grid, seed);
    linearize_from(&region, |p| {
        grid.piece_at(p).is_some_and(|piece| !piece.is_color_bomb())
    })
}

/// Order a region as a walk along orthogonal adjacencies
///
/// Starts from the first member with exactly one neighbour inside the region
/// (falling back to the first member), then repeatedly steps to the first
/// unvisited neighbour until none is left.
pub fn linearize(region: &[Position]) -> Vec<Position> {
    linearize_from(region, |_| true)
}

/// Like [`linearize`], but only members accepted by `can_start` may head the walk
fn linearize_from(region: &[Position], can_start: impl Fn(Position) -> bool) -> Vec<Position> {
    let Some(first) = region.iter().copied().find(|&p| can_start(p)) else {
        return Vec::new();
    };

    let neighbours: HashMap<Position, Vec<Position>> = region
        .iter()
        .map(|&pos| {
            let adjacent = region
                .iter()
                .copied()
                .filter(|&other| pos.is_orthogonal_neighbor(other))
                .collect();
            (pos, adjacent)
        })
        .collect();

    let start = region
        .iter()
        .copied()
        .find(|&p| can_start(p) && neighbours.get(&p).is_some_and(|n| n.len() == 1))
        .unwrap_or(first);

    let mut path = Vec::with_capacity(region.len());
    let mut visited = HashSet::with_capacity(region.len());
    let mut current = start;
    path.push(current);
    visited.insert(current);

    while let Some(next) = neighbours
        .get(&current)
        .and_then(|n| n.iter().copied().find(|p| !visited.contains(p)))
    {
        path.push(next);
        visited.insert(next);
        current = next;
    }
    path
}

fn admits(grid: &Grid, pos: Position, target: DotColor) -> bool {
    match grid.piece_at(pos) {
        Some(p) if p.is_color_bomb() => true,
        Some(p) => p.color() == Some(target),
        None => false,
    }
}
