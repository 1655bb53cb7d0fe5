//! Core simulation - pure, deterministic, and testable
//!
//! This crate contains the puzzle rules and grid state. It has **no
//! dependencies** on rendering, input or networking:
//!
//! - **Deterministic**: the same seed and commands replay the same game
//! - **Testable**: every rule is reachable from a hand-built grid layout
//! - **Headless**: results are plain data pushed into an [`EventSink`]
//!
//! # Module Structure
//!
//! - [`grid`]: tile array, piece arena and placement
//! - [`utility`]: empty-run counts and neighbourhoods
//! - [`validator`]: may a piece extend a chain
//! - [`flood`]: connected same-color regions and their chain order
//! - [`refill`]: column collapse and queued refills
//! - [`bomb`]: color sweeps and area blasts
//! - [`shuffle`]: redistribute pieces over occupied tiles
//! - [`solver`]: bounded randomized search for a playable chain
//! - [`drag`]: one gesture into one chain
//! - [`session`]: orchestrates all of the above over one grid
//!
//! # Example
//!
//! ```
//! use dotlink_core::{Config, Session};
//! use dotlink_core::types::{Command, CoreEvent, DragEvent, DragState, Position};
//!
//! let grid = dotlink_core::Grid::from_rows(&["GBG", "BGB", "RRR"], 1.0).unwrap();
//! let mut session = Session::with_grid(Config::default(), grid, 1).unwrap();
//! let mut events: Vec<CoreEvent> = Vec::new();
//!
//! for (state, x) in [
//!     (DragState::Started, 0),
//!     (DragState::Updated, 1),
//!     (DragState::Updated, 2),
//!     (DragState::Ended, 2),
//! ] {
//!     let position = Some(Position::new(x, 0));
//!     session.apply(Command::Drag(DragEvent { state, position }), &mut events);
//! }
//! session.settle(&mut events);
//!
//! assert!(events.iter().any(|e| matches!(e, CoreEvent::ChainResolved(_))));
//! assert_eq!(session.grid().occupied_count(), 9);
//! ```

pub mod bomb;
pub mod config;
pub mod drag;
pub mod events;
pub mod flood;
pub mod grid;
pub mod piece;
pub mod refill;
pub mod rng;
pub mod session;
pub mod shuffle;
pub mod snapshot;
pub mod solver;
pub mod utility;
pub mod validator;

pub use dotlink_types as types;

// Re-export commonly used types for convenience
pub use bomb::{destroy_around, explode_color_bomb};
pub use config::{Config, ConfigError};
pub use drag::{DragController, DragOutcome, DragPhase};
pub use events::{EventSink, NullSink};
pub use flood::{connected_region, find_connected_region, linearize};
pub use grid::{Grid, Tile};
pub use piece::{Piece, PieceArena, PieceId, PieceVariant};
pub use refill::{collapse_column, refill_column, RefillQueue};
pub use rng::SimpleRng;
pub use session::{Session, Solvability};
pub use shuffle::shuffle_grid;
pub use snapshot::{CellSnapshot, GridSnapshot};
pub use solver::{SearchReport, Solver};
pub use validator::is_valid_connection;
