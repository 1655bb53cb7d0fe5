//! Piece module - piece variants and the arena that owns them
//!
//! Tiles never hold pieces directly. Every live piece sits in a `PieceArena`
//! slot and tiles record its dense `PieceId`, so moving a piece between tiles
//! is an id copy and a cleared piece cannot be reached through a stale tile.

use crate::types::{DotColor, PieceKind, Position};

/// Dense identifier of a live piece
///
/// Ids are slot indices and are reused after the piece is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub u32);

impl PieceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-variant payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceVariant {
    Normal { color: DotColor },
    LineBomb,
    /// `adopted` is only set while a chain holds the bomb
    ColorBomb { adopted: Option<DotColor> },
}

/// A piece on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub variant: PieceVariant,
    /// Always equals the coordinates of the tile that references this piece
    pub position: Position,
}

impl Piece {
    pub fn normal(color: DotColor, position: Position) -> Self {
        Self {
            variant: PieceVariant::Normal { color },
            position,
        }
    }

    pub fn line_bomb(position: Position) -> Self {
        Self {
            variant: PieceVariant::LineBomb,
            position,
        }
    }

    pub fn color_bomb(position: Position) -> Self {
        Self {
            variant: PieceVariant::ColorBomb { adopted: None },
            position,
        }
    }

    pub fn kind(&self) -> PieceKind {
        match self.variant {
            PieceVariant::Normal { .. } => PieceKind::Normal,
            PieceVariant::LineBomb => PieceKind::LineBomb,
            PieceVariant::ColorBomb { .. } => PieceKind::ColorBomb,
        }
    }

    /// Current color: intrinsic for normal pieces, adopted for color bombs
    pub fn color(&self) -> Option<DotColor> {
        match self.variant {
            PieceVariant::Normal { color } => Some(color),
            PieceVariant::LineBomb => None,
            PieceVariant::ColorBomb { adopted } => adopted,
        }
    }

    /// Can take part in a chain (normal pieces and color bombs)
    pub fn is_connectable(&self) -> bool {
        !matches!(self.variant, PieceVariant::LineBomb)
    }

    /// Detonates when tapped or caught in a blast
    pub fn is_explodable(&self) -> bool {
        matches!(self.variant, PieceVariant::LineBomb)
    }

    pub fn is_color_bomb(&self) -> bool {
        matches!(self.variant, PieceVariant::ColorBomb { .. })
    }

    /// Bind a color bomb to `color`; no-op for other variants
    pub fn adopt_color(&mut self, color: Option<DotColor>) {
        if let PieceVariant::ColorBomb { adopted } = &mut self.variant {
            *adopted = color;
        }
    }

    /// Drop a color bomb's adopted color
    pub fn reset_color(&mut self) {
        self.adopt_color(None);
    }
}

/// Slot storage for live pieces
#[derive(Debug, Clone, Default)]
pub struct PieceArena {
    slots: Vec<Option<Piece>>,
    free: Vec<u32>,
    live: usize,
}

impl PieceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Store a piece and return its id, reusing a freed slot when possible
    pub fn insert(&mut self, piece: Piece) -> PieceId {
        self.live += 1;
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = Some(piece);
            return PieceId(slot);
        }
        self.slots.push(Some(piece));
        PieceId((self.slots.len() - 1) as u32)
    }

    /// Remove a piece, freeing its slot
    pub fn remove(&mut self, id: PieceId) -> Option<Piece> {
        let piece = self.slots.get_mut(id.index())?.take()?;
        self.free.push(id.0);
        self.live -= 1;
        Some(piece)
    }

    pub fn get(&self, id: PieceId) -> Option<&Piece> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Number of live pieces
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate live pieces with their ids
    pub fn iter(&self) -> impl Iterator<Item = (PieceId, &Piece)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|p| (PieceId(i as u32), p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_capabilities() {
        let p = Position::new(0, 0);
        let normal = Piece::normal(DotColor::Red, p);
        let line = Piece::line_bomb(p);
        let color = Piece::color_bomb(p);

        assert!(normal.is_connectable() && !normal.is_explodable());
        assert!(!line.is_connectable() && line.is_explodable());
        assert!(color.is_connectable() && !color.is_explodable());

        assert_eq!(normal.color(), Some(DotColor::Red));
        assert_eq!(line.color(), None);
        assert_eq!(color.color(), None);
    }

    #[test]
    fn test_color_bomb_adopts_and_resets() {
        let mut bomb = Piece::color_bomb(Position::new(1, 1));
        bomb.adopt_color(Some(DotColor::Blue));
        assert_eq!(bomb.color(), Some(DotColor::Blue));
        bomb.reset_color();
        assert_eq!(bomb.color(), None);

        // Normal pieces keep their intrinsic color.
        let mut normal = Piece::normal(DotColor::Green, Position::new(0, 0));
        normal.adopt_color(Some(DotColor::Blue));
        assert_eq!(normal.color(), Some(DotColor::Green));
    }

    #[test]
    fn test_arena_reuses_slots() {
        let mut arena = PieceArena::new();
        let a = arena.insert(Piece::normal(DotColor::Red, Position::new(0, 0)));
        let b = arena.insert(Piece::normal(DotColor::Blue, Position::new(1, 0)));
        assert_eq!(arena.len(), 2);

        assert!(arena.remove(a).is_some());
        assert!(arena.remove(a).is_none());
        assert!(arena.get(a).is_none());
        assert_eq!(arena.len(), 1);

        let c = arena.insert(Piece::line_bomb(Position::new(2, 0)));
        assert_eq!(c, a);
        assert_eq!(arena.iter().count(), 2);
        assert_eq!(arena.get(b).and_then(Piece::color), Some(DotColor::Blue));
    }
}
