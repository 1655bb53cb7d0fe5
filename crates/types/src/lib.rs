//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core simulation, adapter protocol, renderers).
//!
//! # Grid Coordinates
//!
//! - **x**: column, `0..width`, left to right
//! - **y**: row, `0..height`, bottom to top (gravity pulls toward row 0)
//!
//! # Tuning Defaults
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_WIDTH` | 7 | Grid columns |
//! | `DEFAULT_HEIGHT` | 7 | Grid rows |
//! | `MIN_CHAIN_LENGTH` | 3 | Shortest resolvable chain |
//! | `LINE_BOMB_CHAIN_LENGTH` | 6 | Chain length that spawns a line bomb |
//! | `COLOR_BOMB_CHAIN_LENGTH` | 9 | Chain length that spawns a color bomb |
//! | `LINE_BOMB_RADIUS` | 1 | Blast radius of a line bomb |
//! | `SPAWN_OFFSET_ROWS` | 5 | Rows above the grid where refills appear |
//! | `SOLVER_MAX_ATTEMPTS` | 10000 | Randomized solver trial cap |
//!
//! # Examples
//!
//! ```
//! use dotlink_types::{DotColor, Position, DragState};
//!
//! let color = DotColor::from_str("red").unwrap();
//! assert_eq!(color, DotColor::Red);
//!
//! let a = Position::new(2, 3);
//! assert!(a.is_orthogonal_neighbor(Position::new(2, 4)));
//! assert!(!a.is_orthogonal_neighbor(Position::new(3, 4)));
//!
//! assert_eq!(DragState::from_str("dragEnd"), Some(DragState::Ended));
//! ```

/// Default grid width in tiles
pub const DEFAULT_WIDTH: u8 = 7;

/// Default grid height in tiles
pub const DEFAULT_HEIGHT: u8 = 7;

/// Default distance between neighbouring tile anchors in world units
pub const DEFAULT_SPACING: f32 = 1.0;

/// Chains shorter than this are discarded on release
pub const MIN_CHAIN_LENGTH: usize = 3;

/// A chain of exactly this length spawns a line bomb
pub const LINE_BOMB_CHAIN_LENGTH: usize = 6;

/// A chain of exactly this length spawns a color bomb
pub const COLOR_BOMB_CHAIN_LENGTH: usize = 9;

/// Chebyshev radius cleared by a line bomb (1 = the 8-neighbourhood)
pub const LINE_BOMB_RADIUS: u8 = 1;

/// Refilled pieces start this many rows above their resting tile
pub const SPAWN_OFFSET_ROWS: u8 = 5;

/// Trial cap for the randomized solver
pub const SOLVER_MAX_ATTEMPTS: u32 = 10_000;


/// A tile coordinate on the grid
///
/// Signed so that neighbour offsets can step outside the grid; bounds are
/// checked by the grid, not by the position itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Position shifted by `(dx, dy)`
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// True if `other` is exactly one horizontal or vertical step away
    ///
    /// Diagonal steps and the position itself are rejected.
    pub fn is_orthogonal_neighbor(self, other: Position) -> bool {
        let dx = (other.x - self.x).abs();
        let dy = (other.y - self.y).abs();
        (dx == 1 && dy == 0) || (dx == 0 && dy == 1)
    }
}

/// A point in the renderer's world space
///
/// The core never interprets these; they are passed through to the animation
/// layer alongside logical positions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
}

impl WorldPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The fixed color palette pieces draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DotColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
}

impl DotColor {
    /// Every palette entry, in declaration order
    pub const ALL: [DotColor; 5] = [
        DotColor::Red,
        DotColor::Green,
        DotColor::Blue,
        DotColor::Yellow,
        DotColor::Purple,
    ];

    /// Parse color from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use dotlink_types::DotColor;
    ///
    /// assert_eq!(DotColor::from_str("blue"), Some(DotColor::Blue));
    /// assert_eq!(DotColor::from_str("Purple"), Some(DotColor::Purple));
    /// assert_eq!(DotColor::from_str("teal"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "red" => Some(DotColor::Red),
            "green" => Some(DotColor::Green),
            "blue" => Some(DotColor::Blue),
            "yellow" => Some(DotColor::Yellow),
            "purple" => Some(DotColor::Purple),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DotColor::Red => "red",
            DotColor::Green => "green",
            DotColor::Blue => "blue",
            DotColor::Yellow => "yellow",
            DotColor::Purple => "purple",
        }
    }
}

/// Piece variants without their per-variant payload
///
/// - **Normal**: colored, connects by color equality
/// - **LineBomb**: colorless, clears its neighbourhood when detonated
/// - **ColorBomb**: adopts the color of the chain that admits it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Normal,
    LineBomb,
    ColorBomb,
}

impl PieceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::Normal => "normal",
            PieceKind::LineBomb => "lineBomb",
            PieceKind::ColorBomb => "colorBomb",
        }
    }
}

/// Advisory simulation phase used by input-gating collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    Idle,
    Resolving,
    Refilling,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Resolving => "resolving",
            GameState::Refilling => "refilling",
        }
    }
}

/// Phase of a player gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragState {
    Started,
    Updated,
    Ended,
}

impl DragState {
    /// Parse from the adapter's camelCase command names
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dragstart" | "started" => Some(DragState::Started),
            "dragupdate" | "updated" => Some(DragState::Updated),
            "dragend" | "ended" => Some(DragState::Ended),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DragState::Started => "dragStart",
            DragState::Updated => "dragUpdate",
            DragState::Ended => "dragEnd",
        }
    }
}

/// One sample of a player gesture, already hit-tested to a tile
///
/// `position` is `None` when the pointer is not over any tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragEvent {
    pub state: DragState,
    pub position: Option<Position>,
}

/// Special piece spawned at the tail of a long chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialSpawn {
    LineBomb,
    ColorBomb,
}

/// A released chain of length >= `MIN_CHAIN_LENGTH`, ready for resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainResolved {
    /// Chain positions in connection order
    pub positions: Vec<Position>,
    /// Adopted color of the color bomb in the chain, if any
    pub bomb_color: Option<DotColor>,
    pub contains_color_bomb: bool,
    /// Special piece to place at the last position after clearing
    pub spawn: Option<SpecialSpawn>,
}

/// A line bomb detonation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BombExploded {
    pub position: Position,
    pub radius: u8,
}

/// Commands the orchestrator accepts from its environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Drag(DragEvent),
    /// Tap on a tile; detonates a line bomb if one is there
    Tap(Position),
    Shuffle,
    Hint,
}

/// Events the core emits for renderers, animators and input gating
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    GameStateChanged {
        state: GameState,
    },
    ChainResolved(ChainResolved),
    BombExploded(BombExploded),
    /// A new piece was placed; `from` is where the animation should start
    PieceSpawned {
        id: u32,
        kind: PieceKind,
        color: Option<DotColor>,
        position: Position,
        from: WorldPoint,
        to: WorldPoint,
    },
    PieceMoved {
        id: u32,
        from: Position,
        to: Position,
        target: WorldPoint,
    },
    PieceCleared {
        id: u32,
        kind: PieceKind,
        position: Position,
    },
    GridShuffled,
    HintFound {
        path: Vec<Position>,
    },
    HintUnavailable,
    LineStarted {
        color: DotColor,
        anchor: WorldPoint,
    },
    LineExtended {
        anchor: WorldPoint,
    },
    LineEnded,
}

impl CoreEvent {
    /// Stable camelCase event name used by the adapter protocol
    pub fn name(&self) -> &'static str {
        match self {
            CoreEvent::GameStateChanged { .. } => "gameStateChanged",
            CoreEvent::ChainResolved(_) => "chainResolved",
            CoreEvent::BombExploded(_) => "bombExploded",
            CoreEvent::PieceSpawned { .. } => "pieceSpawned",
            CoreEvent::PieceMoved { .. } => "pieceMoved",
            CoreEvent::PieceCleared { .. } => "pieceCleared",
            CoreEvent::GridShuffled => "gridShuffled",
            CoreEvent::HintFound { .. } => "hintFound",
            CoreEvent::HintUnavailable => "hintUnavailable",
            CoreEvent::LineStarted { .. } => "lineStarted",
            CoreEvent::LineExtended { .. } => "lineExtended",
            CoreEvent::LineEnded => "lineEnded",
        }
    }
}
