//! Session module - the orchestrator that owns one game
//!
//! The session holds the grid, the shared RNG and the drag controller, and is
//! the only place mutating operations are sequenced. Commands come in through
//! [`Session::apply`]; everything that happens as a result is pushed into the
//! caller's [`EventSink`].
//!
//! # Resolution order
//!
//! A released chain is resolved as:
//!
//! 1. clear every chain tile
//! 2. if the chain held a color bomb, clear every piece of its adopted color
//! 3. spawn a line bomb or color bomb at the last chain position on an exact
//!    length match
//! 4. collapse every column and queue a refill for each
//!
//! A line bomb detonation clears its own tile, then its neighbourhood, and any
//! line bomb caught in the blast detonates in turn. Only the columns touched
//! by a blast are collapsed and refilled.
//!
//! # Refill timing
//!
//! Refills are queued so a frontend can pace them with [`Session::step_refill`],
//! but every command drains the queue before it reads the grid. The validator,
//! drag controller and solver never see a column with a pending refill.

use std::collections::{BTreeSet, VecDeque};

use log::{debug, info};

use crate::bomb::{clear_at, destroy_around, explode_color_bomb};
use crate::config::{Config, ConfigError};
use crate::drag::{DragController, DragOutcome};
use crate::events::EventSink;
use crate::grid::Grid;
use crate::piece::{Piece, PieceVariant};
use crate::refill::{collapse_column, RefillQueue};
use crate::rng::SimpleRng;
use crate::shuffle::shuffle_grid;
use crate::snapshot::GridSnapshot;
use crate::solver::Solver;
use crate::types::{
    BombExploded, ChainResolved, Command, CoreEvent, DragEvent, GameState, Position,
    SpecialSpawn,
};

/// Whether a playable chain is known to exist on the current grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Solvability {
    /// Not searched since the grid last changed
    #[default]
    Unknown,
    Solvable,
    /// The last search ran out of trials; hints are ignored until the grid changes
    Exhausted,
}

impl Solvability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Solvability::Unknown => "unknown",
            Solvability::Solvable => "solvable",
            Solvability::Exhausted => "exhausted",
        }
    }
}

/// One running game
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    grid: Grid,
    rng: SimpleRng,
    drag: DragController,
    refills: RefillQueue,
    solver: Solver,
    state: GameState,
    solvability: Solvability,
}

impl Session {
    /// Start a session with every tile holding a random normal piece
    pub fn new(config: Config, seed: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut grid = Grid::new(config.width, config.height, config.spacing);
        let mut rng = SimpleRng::new(seed);
        let tiles: Vec<Position> = grid.positions().collect();
        for pos in tiles {
            if let Some(color) = rng.pick_color(&config.palette) {
                grid.place(pos, PieceVariant::Normal { color });
            }
        }
        info!(
            "session started: {}x{} grid, {} colors, seed {}",
            config.width,
            config.height,
            config.palette.len(),
            seed
        );
        Ok(Self::assemble(config, grid, rng))
    }

    /// Start a session over a prepared grid
    ///
    /// The grid's dimensions and spacing replace those in `config`.
    pub fn with_grid(mut config: Config, grid: Grid, seed: u32) -> Result<Self, ConfigError> {
        config.width = grid.width();
        config.height = grid.height();
        config.spacing = grid.spacing();
        config.validate()?;
        Ok(Self::assemble(config, grid, SimpleRng::new(seed)))
    }

    fn assemble(config: Config, grid: Grid, rng: SimpleRng) -> Self {
        debug_assert!(grid.check_invariants());
        Self {
            drag: DragController::new(&config),
            solver: Solver::new(config.solver_max_attempts, config.min_chain_length),
            refills: RefillQueue::new(),
            state: GameState::Idle,
            solvability: Solvability::Unknown,
            config,
            grid,
            rng,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn game_state(&self) -> GameState {
        self.state
    }

    pub fn solvability(&self) -> Solvability {
        self.solvability
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Positions of the chain being dragged
    pub fn drag_chain(&self) -> Vec<Position> {
        self.drag.chain()
    }

    /// Columns still waiting for their refill
    pub fn pending_refills(&self) -> usize {
        self.refills.len()
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot::capture(&self.grid)
    }

    /// Apply one external command
    pub fn apply(&mut self, command: Command, sink: &mut dyn EventSink) {
        match command {
            Command::Drag(event) => self.drag(event, sink),
            Command::Tap(pos) => self.tap(pos, sink),
            Command::Shuffle => self.shuffle(sink),
            Command::Hint => {
                self.request_hint(sink);
            }
        }
    }

    /// Feed one gesture sample to the drag controller
    pub fn drag(&mut self, event: DragEvent, sink: &mut dyn EventSink) {
        self.settle(sink);
        match self.drag.handle(&mut self.grid, event, sink) {
            DragOutcome::None => {}
            DragOutcome::Detonate(bomb) => self.detonate(bomb.position, sink),
            DragOutcome::Resolve(chain) => self.resolve_chain(chain, sink),
        }
    }

    /// Tap a tile; a line bomb there detonates
    ///
    /// Ignored while a chain is being dragged.
    pub fn tap(&mut self, pos: Position, sink: &mut dyn EventSink) {
        self.settle(sink);
        if self.drag.is_dragging() {
            return;
        }
        self.detonate(pos, sink);
    }

    /// Clear a chain and everything it triggers, then queue the refills
    pub fn resolve_chain(&mut self, chain: ChainResolved, sink: &mut dyn EventSink) {
        self.settle(sink);
        let Some(&last) = chain.positions.last() else {
            return;
        };

        self.set_state(GameState::Resolving, sink);
        sink.emit(CoreEvent::ChainResolved(chain.clone()));

        let mut cleared = 0;
        for &pos in &chain.positions {
            if clear_at(&mut self.grid, pos, sink).is_some() {
                cleared += 1;
            }
        }
        if chain.contains_color_bomb {
            if let Some(color) = chain.bomb_color {
                cleared += explode_color_bomb(&mut self.grid, color, sink).len();
            }
        }
        if let Some(spawn) = chain.spawn {
            self.spawn_special(last, spawn, sink);
        }

        info!(
            "resolved {}-long chain, {} pieces cleared, spawn {:?}",
            chain.positions.len(),
            cleared,
            chain.spawn
        );
        let columns: Vec<i32> = (0..self.grid.width() as i32).collect();
        self.collapse_and_queue(columns, sink);
    }

    /// Detonate the line bomb at `origin` along with any bomb its blast reaches
    pub fn detonate(&mut self, origin: Position, sink: &mut dyn EventSink) {
        self.settle(sink);
        if !self.grid.piece_at(origin).is_some_and(Piece::is_explodable) {
            return;
        }

        self.set_state(GameState::Resolving, sink);
        let radius = self.config.line_bomb_radius;
        let width = self.grid.width() as i32;
        let mut pending = VecDeque::from([origin]);
        let mut columns = BTreeSet::new();
        let mut blasts = 0;

        while let Some(pos) = pending.pop_front() {
            blasts += 1;
            sink.emit(CoreEvent::BombExploded(BombExploded {
                position: pos,
                radius,
            }));
            clear_at(&mut self.grid, pos, sink);
            for piece in destroy_around(&mut self.grid, pos, radius, sink) {
                if piece.is_explodable() {
                    pending.push_back(piece.position);
                }
            }
            let r = radius as i32;
            columns.extend((pos.x - r..=pos.x + r).filter(|&x| x >= 0 && x < width));
        }

        info!(
            "bomb at ({}, {}) detonated, {} blasts in total",
            origin.x, origin.y, blasts
        );
        self.collapse_and_queue(columns, sink);
    }

    /// Redistribute every piece over the occupied tiles
    pub fn shuffle(&mut self, sink: &mut dyn EventSink) {
        self.settle(sink);
        if self.drag.is_dragging() {
            self.drag.cancel(&mut self.grid, sink);
        }
        shuffle_grid(&mut self.grid, &mut self.rng, sink);
        self.solvability = Solvability::Unknown;
    }

    /// Search for a playable chain
    ///
    /// While the last search is marked exhausted this does nothing and emits
    /// nothing.
    pub fn request_hint(&mut self, sink: &mut dyn EventSink) -> Option<Vec<Position>> {
        self.settle(sink);
        if self.solvability == Solvability::Exhausted {
            debug!("hint ignored: grid already searched without result");
            return None;
        }

        let report = self.solver.search(&self.grid, &mut self.rng);
        match report.path {
            Some(path) => {
                self.solvability = Solvability::Solvable;
                sink.emit(CoreEvent::HintFound { path: path.clone() });
                Some(path)
            }
            None => {
                self.solvability = Solvability::Exhausted;
                sink.emit(CoreEvent::HintUnavailable);
                None
            }
        }
    }

    /// Run the oldest queued refill
    ///
    /// Returns `false` when nothing was pending. The state returns to idle once
    /// the last refill has run.
    pub fn step_refill(&mut self, sink: &mut dyn EventSink) -> bool {
        let step = self.refills.run_next(
            &mut self.grid,
            &mut self.rng,
            &self.config.palette,
            self.config.spawn_offset_rows,
            sink,
        );
        if step.is_none() {
            return false;
        }
        if self.refills.is_empty() {
            debug_assert!(self.grid.check_invariants());
            self.set_state(GameState::Idle, sink);
        }
        true
    }

    /// Run every queued refill
    pub fn settle(&mut self, sink: &mut dyn EventSink) {
        while self.step_refill(sink) {}
    }

    fn spawn_special(&mut self, pos: Position, spawn: SpecialSpawn, sink: &mut dyn EventSink) {
        let variant = match spawn {
            SpecialSpawn::LineBomb => PieceVariant::LineBomb,
            SpecialSpawn::ColorBomb => PieceVariant::ColorBomb { adopted: None },
        };
        let Some(id) = self.grid.place(pos, variant) else {
            return;
        };
        let anchor = self.grid.anchor(pos).unwrap_or_default();
        let kind = self.grid.piece(id).map(Piece::kind);
        if let Some(kind) = kind {
            sink.emit(CoreEvent::PieceSpawned {
                id: id.0,
                kind,
                color: None,
                position: pos,
                from: anchor,
                to: anchor,
            });
        }
    }

    fn collapse_and_queue(
        &mut self,
        columns: impl IntoIterator<Item = i32>,
        sink: &mut dyn EventSink,
    ) {
        for x in columns {
            collapse_column(&mut self.grid, x, sink);
            self.refills.schedule(x);
        }
        debug_assert!(self.grid.check_invariants());
        self.solvability = Solvability::Unknown;
        self.set_state(GameState::Refilling, sink);
    }

    fn set_state(&mut self, state: GameState, sink: &mut dyn EventSink) {
        if self.state == state {
            return;
        }
        debug!("game state {} -> {}", self.state.as_str(), state.as_str());
        self.state = state;
        sink.emit(CoreEvent::GameStateChanged { state });
    }
}
