//! Grid module - tile storage and piece placement
//!
//! The grid is a `width x height` array of tiles created once per session.
//! Uses a flat row-major array (`y * width + x`) for cache locality.
//! Row 0 is the bottom row; gravity pulls pieces toward it.
//!
//! Tiles only record which piece occupies them. Pieces live in the grid's
//! `PieceArena`, and every mutating method here keeps the two sides in sync:
//! an occupied tile references exactly one live piece whose stored position
//! equals the tile's coordinates.

use crate::piece::{Piece, PieceArena, PieceId, PieceVariant};
use crate::types::{DotColor, Position, WorldPoint};

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    occupant: Option<PieceId>,
    anchor: WorldPoint,
}

impl Tile {
    pub fn occupant(&self) -> Option<PieceId> {
        self.occupant
    }

    /// Resting world point for a piece on this tile
    pub fn anchor(&self) -> WorldPoint {
        self.anchor
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// The playing grid
#[derive(Debug, Clone)]
pub struct Grid {
    width: u8,
    height: u8,
    spacing: f32,
    origin: WorldPoint,
    tiles: Vec<Tile>,
    pieces: PieceArena,
}

impl Grid {
    /// Create an empty grid with anchors centred on the world origin
    pub fn new(width: u8, height: u8, spacing: f32) -> Self {
        let origin = WorldPoint::new(-(width as f32) / 2.0, -(height as f32) / 2.0);
        let size = width as usize * height as usize;
        let mut tiles = Vec::with_capacity(size);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile {
                    occupant: None,
                    anchor: WorldPoint::new(
                        origin.x + x as f32 * spacing,
                        origin.y + y as f32 * spacing,
                    ),
                });
            }
        }

        Self {
            width,
            height,
            spacing,
            origin,
            tiles,
            pieces: PieceArena::with_capacity(size),
        }
    }

    /// Build a grid from a text layout, top row first
    ///
    /// `R G B Y P` are normal pieces, `L` a line bomb, `C` a color bomb and
    /// `.` an empty tile. Whitespace is ignored. Returns `None` for ragged
    /// rows or unknown characters.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotlink_core::Grid;
    /// use dotlink_core::types::{DotColor, Position};
    ///
    /// let grid = Grid::from_rows(&["R.", "GB"], 1.0).unwrap();
    /// assert_eq!(grid.color_at(Position::new(0, 1)), Some(DotColor::Red));
    /// assert!(grid.piece_at(Position::new(1, 1)).is_none());
    /// assert_eq!(grid.color_at(Position::new(1, 0)), Some(DotColor::Blue));
    /// ```
    pub fn from_rows(rows: &[&str], spacing: f32) -> Option<Self> {
        let parsed: Vec<Vec<char>> = rows
            .iter()
            .map(|r| r.chars().filter(|c| !c.is_whitespace()).collect())
            .collect();
        let height = parsed.len();
        let width = parsed.first().map(Vec::len)?;
        if width == 0 || width > u8::MAX as usize || height > u8::MAX as usize {
            return None;
        }
        if parsed.iter().any(|r| r.len() != width) {
            return None;
        }

        let mut grid = Self::new(width as u8, height as u8, spacing);
        for (row_idx, row) in parsed.iter().enumerate() {
            let y = (height - 1 - row_idx) as i32;
            for (x, ch) in row.iter().enumerate() {
                let variant = match ch.to_ascii_uppercase() {
                    '.' => continue,
                    'L' => PieceVariant::LineBomb,
                    'C' => PieceVariant::ColorBomb { adopted: None },
                    c => PieceVariant::Normal {
                        color: color_from_char(c)?,
                    },
                };
                grid.place(Position::new(x as i32, y), variant);
            }
        }
        Some(grid)
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(&self, pos: Position) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width as i32 && pos.y >= 0 && pos.y < self.height as i32
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    pub fn anchor(&self, pos: Position) -> Option<WorldPoint> {
        self.tile(pos).map(Tile::anchor)
    }

    pub fn occupant(&self, pos: Position) -> Option<PieceId> {
        self.tile(pos).and_then(Tile::occupant)
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id)
    }

    pub fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.pieces.get_mut(id)
    }

    pub fn piece_at(&self, pos: Position) -> Option<&Piece> {
        self.occupant(pos).and_then(|id| self.pieces.get(id))
    }

    /// Color of the piece at `pos`, if it has one
    pub fn color_at(&self, pos: Position) -> Option<DotColor> {
        self.piece_at(pos).and_then(Piece::color)
    }

    /// In bounds and holding a piece
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.occupant(pos).is_some()
    }

    /// In bounds and holding nothing
    pub fn is_vacant(&self, pos: Position) -> bool {
        self.tile(pos).is_some_and(Tile::is_empty)
    }

    /// Place a new piece at `pos`
    ///
    /// A piece already on the tile is dropped first. Returns `None` when
    /// `pos` is out of bounds.
    pub fn place(&mut self, pos: Position, variant: PieceVariant) -> Option<PieceId> {
        let idx = self.index(pos)?;
        if let Some(old) = self.tiles[idx].occupant.take() {
            self.pieces.remove(old);
        }
        let id = self.pieces.insert(Piece {
            variant,
            position: pos,
        });
        self.tiles[idx].occupant = Some(id);
        Some(id)
    }

    /// Empty the tile at `pos` and destroy its piece
    pub fn remove(&mut self, pos: Position) -> Option<(PieceId, Piece)> {
        let idx = self.index(pos)?;
        let id = self.tiles[idx].occupant.take()?;
        let piece = self.pieces.remove(id)?;
        Some((id, piece))
    }

    /// Move the piece at `from` onto the empty tile `to`
    ///
    /// Returns the moved id, or `None` if `from` is empty, `to` is occupied,
    /// or either is out of bounds.
    pub fn move_piece(&mut self, from: Position, to: Position) -> Option<PieceId> {
        let from_idx = self.index(from)?;
        let to_idx = self.index(to)?;
        if self.tiles[to_idx].occupant.is_some() {
            return None;
        }
        let id = self.tiles[from_idx].occupant.take()?;
        self.tiles[to_idx].occupant = Some(id);
        if let Some(piece) = self.pieces.get_mut(id) {
            piece.position = to;
        }
        Some(id)
    }

    /// Point the tile at `pos` to an existing piece and update its position
    ///
    /// Only used while redistributing pieces, where the caller guarantees
    /// every id ends up on exactly one tile.
    pub(crate) fn reassign(&mut self, pos: Position, id: PieceId) {
        if let Some(idx) = self.index(pos) {
            self.tiles[idx].occupant = Some(id);
            if let Some(piece) = self.pieces.get_mut(id) {
                piece.position = pos;
            }
        }
    }

    /// All positions, column by column, bottom to top
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..w).flat_map(move |x| (0..h).map(move |y| Position::new(x, y)))
    }

    /// Positions of a single column, bottom to top
    pub fn column(&self, x: i32) -> impl Iterator<Item = Position> {
        let h = if x >= 0 && x < self.width as i32 {
            self.height as i32
        } else {
            0
        };
        (0..h).map(move |y| Position::new(x, y))
    }

    /// Number of live pieces
    pub fn occupied_count(&self) -> usize {
        self.pieces.len()
    }

    /// Iterate live pieces with their ids
    pub fn pieces(&self) -> impl Iterator<Item = (PieceId, &Piece)> {
        self.pieces.iter()
    }

    /// Tile under a world point (hit test for input layers)
    pub fn cell_at(&self, point: WorldPoint) -> Option<Position> {
        if self.spacing <= 0.0 || !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }
        let fx = ((point.x - self.origin.x) / self.spacing + 0.5).floor();
        let fy = ((point.y - self.origin.y) / self.spacing + 0.5).floor();
        let pos = Position::new(fx as i32, fy as i32);
        self.in_bounds(pos).then_some(pos)
    }

    /// True if every tile/piece back-reference is consistent
    ///
    /// Checked with `debug_assert!` after each mutating core operation.
    pub fn check_invariants(&self) -> bool {
        let mut referenced = 0usize;
        let mut seen = vec![false; self.tiles.len()];
        for pos in self.positions() {
            let Some(id) = self.occupant(pos) else {
                continue;
            };
            let Some(piece) = self.pieces.get(id) else {
                return false;
            };
            if piece.position != pos {
                return false;
            }
            if let Some(flag) = seen.get_mut(id.index()) {
                if *flag {
                    return false;
                }
                *flag = true;
            }
            referenced += 1;
        }
        referenced == self.pieces.len()
    }
}

fn color_from_char(c: char) -> Option<DotColor> {
    match c {
        'R' => Some(DotColor::Red),
        'G' => Some(DotColor::Green),
        'B' => Some(DotColor::Blue),
        'Y' => Some(DotColor::Yellow),
        'P' => Some(DotColor::Purple),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_index_calculation() {
        let grid = Grid::new(7, 5, 1.0);
        assert_eq!(grid.index(Position::new(0, 0)), Some(0));
        assert_eq!(grid.index(Position::new(6, 0)), Some(6));
        assert_eq!(grid.index(Position::new(0, 1)), Some(7));
        assert_eq!(grid.index(Position::new(6, 4)), Some(34));
        assert_eq!(grid.index(Position::new(-1, 0)), None);
        assert_eq!(grid.index(Position::new(7, 0)), None);
        assert_eq!(grid.index(Position::new(0, 5)), None);
    }

    #[test]
    fn test_anchors_are_centred() {
        let grid = Grid::new(4, 4, 1.0);
        assert_eq!(grid.anchor(Position::new(0, 0)), Some(WorldPoint::new(-2.0, -2.0)));
        assert_eq!(grid.anchor(Position::new(3, 2)), Some(WorldPoint::new(1.0, 0.0)));
    }

    #[test]
    fn test_cell_at_hits_nearest_tile() {
        let grid = Grid::new(4, 4, 1.0);
        assert_eq!(grid.cell_at(WorldPoint::new(-2.0, -2.0)), Some(Position::new(0, 0)));
        assert_eq!(grid.cell_at(WorldPoint::new(1.3, 0.2)), Some(Position::new(3, 2)));
        assert_eq!(grid.cell_at(WorldPoint::new(-2.6, 0.0)), None);
        assert_eq!(grid.cell_at(WorldPoint::new(5.0, 0.0)), None);
    }

    #[test]
    fn test_place_move_remove_keep_invariants() {
        let mut grid = Grid::new(3, 3, 1.0);
        let a = Position::new(1, 2);
        let b = Position::new(1, 0);

        let id = grid
            .place(a, PieceVariant::Normal { color: DotColor::Red })
            .unwrap();
        assert!(grid.check_invariants());

        assert_eq!(grid.move_piece(a, b), Some(id));
        assert!(grid.is_vacant(a));
        assert_eq!(grid.piece(id).map(|p| p.position), Some(b));
        assert!(grid.check_invariants());

        // Target occupied: nothing moves.
        grid.place(a, PieceVariant::LineBomb);
        assert_eq!(grid.move_piece(a, b), None);
        assert!(grid.is_occupied(a));

        let (removed, piece) = grid.remove(b).unwrap();
        assert_eq!(removed, id);
        assert_eq!(piece.color(), Some(DotColor::Red));
        assert_eq!(grid.occupied_count(), 1);
        assert!(grid.check_invariants());
    }

    #[test]
    fn test_place_over_existing_piece_replaces_it() {
        let mut grid = Grid::new(2, 2, 1.0);
        let p = Position::new(0, 0);
        grid.place(p, PieceVariant::Normal { color: DotColor::Red });
        grid.place(p, PieceVariant::LineBomb);
        assert_eq!(grid.occupied_count(), 1);
        assert!(grid.piece_at(p).unwrap().is_explodable());
        assert!(grid.check_invariants());
    }

    #[test]
    fn test_from_rows_layout() {
        let grid = Grid::from_rows(&["RL.", "CGB"], 1.0).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.color_at(Position::new(0, 1)), Some(DotColor::Red));
        assert!(grid.piece_at(Position::new(1, 1)).unwrap().is_explodable());
        assert!(grid.is_vacant(Position::new(2, 1)));
        assert!(grid.piece_at(Position::new(0, 0)).unwrap().is_color_bomb());
        assert_eq!(grid.occupied_count(), 5);

        assert!(Grid::from_rows(&["RG", "R"], 1.0).is_none());
        assert!(Grid::from_rows(&["RX"], 1.0).is_none());
    }

    #[test]
    fn test_positions_scan_column_major() {
        let grid = Grid::new(2, 2, 1.0);
        let order: Vec<Position> = grid.positions().collect();
        assert_eq!(
            order,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 0),
                Position::new(1, 1)
            ]
        );
        assert_eq!(grid.column(5).count(), 0);
    }
}
