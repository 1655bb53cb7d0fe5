//! Solver - randomized search for a playable chain
//!
//! A cheap probe first looks for any straight run of three matching pieces (or
//! any line bomb). Only if that succeeds does the solver sample random tiles,
//! flood-filling from each, until it finds a region whose ordered path has at
//! least the minimum chain length or the trial cap runs out.

use log::{debug, warn};

use crate::flood::find_connected_region;
use crate::grid::Grid;
use crate::piece::Piece;
use crate::rng::SimpleRng;
use crate::types::{DotColor, Position, MIN_CHAIN_LENGTH, SOLVER_MAX_ATTEMPTS};

/// Outcome of one search, with the number of trials it used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub path: Option<Vec<Position>>,
    pub attempts: u32,
    /// False when the probe rejected the grid without sampling
    pub probed: bool,
}

/// Bounded randomized solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solver {
    max_attempts: u32,
    min_length: usize,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(SOLVER_MAX_ATTEMPTS, MIN_CHAIN_LENGTH)
    }
}

impl Solver {
    pub fn new(max_attempts: u32, min_length: usize) -> Self {
        Self {
            max_attempts,
            min_length,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Search for a chain path of at least the minimum length
    pub fn try_find_line_solution(&self, grid: &Grid, rng: &mut SimpleRng) -> Option<Vec<Position>> {
        self.search(grid, rng).path
    }

    /// Full search, reporting how many trials were used
    pub fn search(&self, grid: &Grid, rng: &mut SimpleRng) -> SearchReport {
        if !has_straight_triple(grid) && !has_line_bomb(grid) {
            debug!("solver probe: no candidate run, skipping search");
            return SearchReport {
                path: None,
                attempts: 0,
                probed: false,
            };
        }

        let (w, h) = (grid.width() as u32, grid.height() as u32);
        let mut attempts = 0;
        while attempts < self.max_attempts {
            attempts += 1;
            let pos = Position::new(rng.next_range(w) as i32, rng.next_range(h) as i32);
            let path = find_connected_region(grid, grid.occupant(pos));
            if path.len() >= self.min_length {
                debug!(
                    "solver found a {}-long path from ({}, {}) after {} trials",
                    path.len(),
                    pos.x,
                    pos.y,
                    attempts
                );
                return SearchReport {
                    path: Some(path),
                    attempts,
                    probed: true,
                };
            }
        }

        warn!("solver exhausted {} trials without a path", attempts);
        SearchReport {
            path: None,
            attempts,
            probed: true,
        }
    }
}

/// True if some tile starts a matching run of three to its right or above it
pub fn has_straight_triple(grid: &Grid) -> bool {
    grid.positions().any(|p| {
        [(1, 0), (0, 1)].into_iter().any(|(dx, dy)| {
            let run = [p, p.offset(dx, dy), p.offset(2 * dx, 2 * dy)];
            run_matches(grid, &run)
        })
    })
}

/// True if any line bomb is on the grid
pub fn has_line_bomb(grid: &Grid) -> bool {
    grid.pieces().any(|(_, p)| p.is_explodable())
}

/// Every tile holds a connectable piece and the normal pieces share one color
fn run_matches(grid: &Grid, run: &[Position]) -> bool {
    let mut color: Option<DotColor> = None;
    for &pos in run {
        let Some(piece) = grid.piece_at(pos) else {
            return false;
        };
        if !piece.is_connectable() {
            return false;
        }
        if piece.is_color_bomb() {
            continue;
        }
        match (color, Piece::color(piece)) {
            (None, c) => color = c,
            (Some(a), Some(b)) if a == b => {}
            _ => return false,
        }
    }
    color.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_finds_horizontal_and_vertical_runs() {
        let row = Grid::from_rows(&["BGY", "RRR"], 1.0).unwrap();
        assert!(has_straight_triple(&row));

        let col = Grid::from_rows(&["GB", "GR", "GY"], 1.0).unwrap();
        assert!(has_straight_triple(&col));

        let none = Grid::from_rows(&["RGB", "GBR", "BRG"], 1.0).unwrap();
        assert!(!has_straight_triple(&none));
    }

    #[test]
    fn test_probe_treats_color_bomb_as_wildcard() {
        let grid = Grid::from_rows(&["RCR", "GBY"], 1.0).unwrap();
        assert!(has_straight_triple(&grid));

        let line = Grid::from_rows(&["RLR", "GBY"], 1.0).unwrap();
        assert!(!has_straight_triple(&line));
        assert!(has_line_bomb(&line));
    }

    #[test]
    fn test_search_skips_sampling_when_probe_fails() {
        let grid = Grid::from_rows(&["RGB", "GBR", "BRG"], 1.0).unwrap();
        let mut rng = SimpleRng::new(1);
        let report = Solver::default().search(&grid, &mut rng);
        assert_eq!(report.path, None);
        assert_eq!(report.attempts, 0);
        assert!(!report.probed);
    }

    #[test]
    fn test_search_finds_the_only_run() {
        let grid = Grid::from_rows(&["RGBR", "GBRG", "YYYB"], 1.0).unwrap();
        let mut rng = SimpleRng::new(77);
        let path = Solver::default().try_find_line_solution(&grid, &mut rng).unwrap();
        assert_eq!(path.len(), 3);
        assert!(path.iter().all(|&p| grid.color_at(p) == Some(DotColor::Yellow)));
        for pair in path.windows(2) {
            assert!(pair[0].is_orthogonal_neighbor(pair[1]));
        }
    }

    #[test]
    fn test_search_respects_cap_with_lone_line_bomb() {
        // A line bomb passes the probe but no region of three exists.
        let grid = Grid::from_rows(&["RGB", "GLR", "BRG"], 1.0).unwrap();
        let mut rng = SimpleRng::new(9);
        let report = Solver::new(250, 3).search(&grid, &mut rng);
        assert_eq!(report.path, None);
        assert_eq!(report.attempts, 250);
        assert!(report.probed);
    }
}
