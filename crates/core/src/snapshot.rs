use crate::grid::Grid;
use crate::types::{DotColor, PieceKind, Position};

/// What occupies one tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSnapshot {
    pub kind: PieceKind,
    pub color: Option<DotColor>,
}

/// Read-only copy of the grid contents
///
/// Cells are stored row-major with row 0 (the bottom row) first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridSnapshot {
    pub width: u8,
    pub height: u8,
    pub cells: Vec<Option<CellSnapshot>>,
}

impl GridSnapshot {
    pub fn capture(grid: &Grid) -> Self {
        let (w, h) = (grid.width(), grid.height());
        let mut cells = Vec::with_capacity(w as usize * h as usize);
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                cells.push(grid.piece_at(Position::new(x, y)).map(|p| CellSnapshot {
                    kind: p.kind(),
                    color: p.color(),
                }));
            }
        }
        Self {
            width: w,
            height: h,
            cells,
        }
    }

    pub fn cell(&self, pos: Position) -> Option<CellSnapshot> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width as i32 || pos.y >= self.height as i32 {
            return None;
        }
        self.cells
            .get(pos.y as usize * self.width as usize + pos.x as usize)
            .copied()
            .flatten()
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Text rows, top row first, in the `Grid::from_rows` alphabet
    pub fn to_rows(&self) -> Vec<String> {
        (0..self.height as i32)
            .rev()
            .map(|y| {
                (0..self.width as i32)
                    .map(|x| cell_char(self.cell(Position::new(x, y))))
                    .collect()
            })
            .collect()
    }
}

fn cell_char(cell: Option<CellSnapshot>) -> char {
    let Some(cell) = cell else {
        return '.';
    };
    match (cell.kind, cell.color) {
        (PieceKind::LineBomb, _) => 'L',
        (PieceKind::ColorBomb, _) => 'C',
        (PieceKind::Normal, Some(DotColor::Red)) => 'R',
        (PieceKind::Normal, Some(DotColor::Green)) => 'G',
        (PieceKind::Normal, Some(DotColor::Blue)) => 'B',
        (PieceKind::Normal, Some(DotColor::Yellow)) => 'Y',
        (PieceKind::Normal, Some(DotColor::Purple)) => 'P',
        (PieceKind::Normal, None) => '?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_matches_layout() {
        let rows = ["RL.", "CGB"];
        let grid = Grid::from_rows(&rows, 1.0).unwrap();
        let snap = GridSnapshot::capture(&grid);

        assert_eq!(snap.occupied(), 5);
        assert_eq!(snap.to_rows(), vec!["RL.".to_string(), "CGB".to_string()]);
        assert_eq!(
            snap.cell(Position::new(2, 0)),
            Some(CellSnapshot {
                kind: PieceKind::Normal,
                color: Some(DotColor::Blue)
            })
        );
        assert_eq!(snap.cell(Position::new(2, 1)), None);
        assert_eq!(snap.cell(Position::new(3, 0)), None);
    }
}
