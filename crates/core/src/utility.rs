//! Stateless geometric queries over a grid

use arrayvec::ArrayVec;

use crate::grid::Grid;
use crate::types::Position;

/// Orthogonal neighbourhood offsets: up, down, left, right
pub const DIRECTIONS_4: [(i32, i32); 4] = [(0, 1), (0, -1), (-1, 0), (1, 0)];

/// Full 8-neighbourhood offsets (orthogonal first, then diagonals)
pub const DIRECTIONS_8: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, 1),
    (0, -1),
    (-1, 1),
    (1, 1),
    (-1, -1),
    (1, -1),
];

/// Length of the contiguous empty run directly below `pos`
///
/// Counting stops at the first occupied tile or the bottom edge.
pub fn empty_count_below(grid: &Grid, pos: Position) -> usize {
    let mut count = 0;
    let mut y = pos.y - 1;
    while y >= 0 && grid.is_vacant(Position::new(pos.x, y)) {
        count += 1;
        y -= 1;
    }
    count
}

/// Number of empty tiles in column `x` (0 for out-of-range columns)
pub fn empty_count_in_column(grid: &Grid, x: i32) -> usize {
    grid.column(x).filter(|&p| grid.is_vacant(p)).count()
}

/// In-bounds orthogonal neighbours of `pos`
pub fn neighbors_4(grid: &Grid, pos: Position) -> ArrayVec<Position, 4> {
    DIRECTIONS_4
        .iter()
        .map(|&(dx, dy)| pos.offset(dx, dy))
        .filter(|&p| grid.in_bounds(p))
        .collect()
}

/// In-bounds 8-neighbourhood of `pos`
pub fn neighbors_8(grid: &Grid, pos: Position) -> ArrayVec<Position, 8> {
    DIRECTIONS_8
        .iter()
        .map(|&(dx, dy)| pos.offset(dx, dy))
        .filter(|&p| grid.in_bounds(p))
        .collect()
}

/// In-bounds positions within Chebyshev distance `radius` of `pos`, centre excluded
///
/// With `radius == 1` this is exactly the 8-neighbourhood.
pub fn ring_within(grid: &Grid, pos: Position, radius: u8) -> Vec<Position> {
    let r = radius as i32;
    let mut out = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    for dy in -r..=r {
        for dx in -r..=r {
            if dx == 0 && dy == 0 {
                continue;
            }
            let p = pos.offset(dx, dy);
            if grid.in_bounds(p) {
                out.push(p);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_count_below_stops_at_first_piece() {
        // Column 0, bottom to top: R . . G . B
        let grid = Grid::from_rows(&["B", ".", "G", ".", ".", "R"], 1.0).unwrap();
        assert_eq!(empty_count_below(&grid, Position::new(0, 3)), 2);
        assert_eq!(empty_count_below(&grid, Position::new(0, 5)), 1);
        assert_eq!(empty_count_below(&grid, Position::new(0, 0)), 0);
        assert_eq!(empty_count_in_column(&grid, 0), 3);
        assert_eq!(empty_count_in_column(&grid, 4), 0);
    }

    #[test]
    fn test_neighbourhoods_clip_at_edges() {
        let grid = Grid::new(3, 3, 1.0);
        assert_eq!(neighbors_4(&grid, Position::new(0, 0)).len(), 2);
        assert_eq!(neighbors_4(&grid, Position::new(1, 1)).len(), 4);
        assert_eq!(neighbors_8(&grid, Position::new(0, 0)).len(), 3);
        assert_eq!(neighbors_8(&grid, Position::new(1, 1)).len(), 8);
    }

    #[test]
    fn test_ring_radius_one_matches_eight_neighbourhood() {
        let grid = Grid::new(5, 5, 1.0);
        let centre = Position::new(2, 2);
        let mut ring = ring_within(&grid, centre, 1);
        let mut eight: Vec<Position> = neighbors_8(&grid, centre).into_iter().collect();
        ring.sort();
        eight.sort();
        assert_eq!(ring, eight);
        assert_eq!(ring_within(&grid, centre, 2).len(), 24);
        assert!(ring_within(&grid, centre, 0).is_empty());
    }
}
