//! Drag controller - turns one player gesture into a chain
//!
//! The controller is either idle or dragging. A gesture start on a normal
//! piece makes it the chain head; each update appends the piece under the
//! pointer when the connection validator accepts it against the tail. On
//! release a chain of at least the minimum length is handed back for
//! resolution. Clearing pieces is the caller's job.
//!
//! A gesture start on a line bomb does not start a chain; it is reported back
//! as a detonation request instead.

use log::debug;

use crate::config::Config;
use crate::events::EventSink;
use crate::grid::Grid;
use crate::piece::PieceId;
use crate::types::{
    BombExploded, ChainResolved, CoreEvent, DragEvent, DragState, Position, SpecialSpawn,
};
use crate::validator::is_valid_connection;

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging,
}

/// What a gesture sample asks the caller to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    None,
    Detonate(BombExploded),
    Resolve(ChainResolved),
}

/// Chain builder for a single gesture at a time
#[derive(Debug, Clone)]
pub struct DragController {
    phase: DragPhase,
    chain: Vec<(PieceId, Position)>,
    min_length: usize,
    line_bomb_length: usize,
    color_bomb_length: usize,
    bomb_radius: u8,
}

impl DragController {
    pub fn new(config: &Config) -> Self {
        Self {
            phase: DragPhase::Idle,
            chain: Vec::new(),
            min_length: config.min_chain_length,
            line_bomb_length: config.line_bomb_chain_length,
            color_bomb_length: config.color_bomb_chain_length,
            bomb_radius: config.line_bomb_radius,
        }
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    /// Chain positions so far, in connection order
    pub fn chain(&self) -> Vec<Position> {
        self.chain.iter().map(|&(_, pos)| pos).collect()
    }

    /// Feed one gesture sample
    pub fn handle(
        &mut self,
        grid: &mut Grid,
        event: DragEvent,
        sink: &mut dyn EventSink,
    ) -> DragOutcome {
        match event.state {
            DragState::Started => self.start(grid, event.position, sink),
            DragState::Updated => {
                self.update(grid, event.position, sink);
                DragOutcome::None
            }
            DragState::Ended => self.end(grid, sink),
        }
    }

    fn start(
        &mut self,
        grid: &mut Grid,
        position: Option<Position>,
        sink: &mut dyn EventSink,
    ) -> DragOutcome {
        if self.is_dragging() {
            // A start without a matching end drops the old chain.
            self.cancel(grid, sink);
        }
        let Some(pos) = position else {
            return DragOutcome::None;
        };
        let Some(id) = grid.occupant(pos) else {
            return DragOutcome::None;
        };
        let Some(piece) = grid.piece(id) else {
            return DragOutcome::None;
        };

        if piece.is_explodable() {
            return DragOutcome::Detonate(BombExploded {
                position: pos,
                radius: self.bomb_radius,
            });
        }
        let Some(color) = piece.color() else {
            return DragOutcome::None;
        };
        if piece.is_color_bomb() {
            return DragOutcome::None;
        }

        self.phase = DragPhase::Dragging;
        self.chain.push((id, pos));
        sink.emit(CoreEvent::LineStarted {
            color,
            anchor: grid.anchor(pos).unwrap_or_default(),
        });
        debug!("drag started at ({}, {}) with {}", pos.x, pos.y, color.as_str());
        DragOutcome::None
    }

    fn update(&mut self, grid: &mut Grid, position: Option<Position>, sink: &mut dyn EventSink) {
        if !self.is_dragging() {
            return;
        }
        let Some(pos) = position else {
            return;
        };
        let Some(candidate) = grid.occupant(pos) else {
            return;
        };
        if self.chain.iter().any(|&(id, _)| id == candidate) {
            return;
        }
        let tail = self.chain.last().map(|&(id, _)| id);
        if !is_valid_connection(grid, tail, Some(candidate)) {
            return;
        }

        self.chain.push((candidate, pos));
        sink.emit(CoreEvent::LineExtended {
            anchor: grid.anchor(pos).unwrap_or_default(),
        });
        debug!("chain extended to ({}, {}), length {}", pos.x, pos.y, self.chain.len());
    }

    fn end(&mut self, grid: &mut Grid, sink: &mut dyn EventSink) -> DragOutcome {
        if !self.is_dragging() {
            return DragOutcome::None;
        }

        let mut outcome = DragOutcome::None;
        let length = self.chain.len();
        if length >= self.min_length {
            let bomb_color = self
                .chain
                .iter()
                .filter_map(|&(id, _)| grid.piece(id))
                .find(|p| p.is_color_bomb())
                .map(|p| p.color());
            let spawn = if length == self.color_bomb_length {
                Some(SpecialSpawn::ColorBomb)
            } else if length == self.line_bomb_length {
                Some(SpecialSpawn::LineBomb)
            } else {
                None
            };
            outcome = DragOutcome::Resolve(ChainResolved {
                positions: self.chain(),
                bomb_color: bomb_color.flatten(),
                contains_color_bomb: bomb_color.is_some(),
                spawn,
            });
        } else {
            debug!("chain of {} released below minimum {}", length, self.min_length);
        }

        self.cancel(grid, sink);
        outcome
    }

    /// Drop the current chain and return to idle
    ///
    /// Every color bomb on the grid loses its adopted color, including ones
    /// the validator colored but then rejected.
    pub fn cancel(&mut self, grid: &mut Grid, sink: &mut dyn EventSink) {
        let bombs: Vec<PieceId> = grid
            .pieces()
            .filter(|(_, p)| p.is_color_bomb())
            .map(|(id, _)| id)
            .collect();
        for id in bombs {
            if let Some(piece) = grid.piece_mut(id) {
                piece.reset_color();
            }
        }

        let was_dragging = self.is_dragging();
        self.chain.clear();
        self.phase = DragPhase::Idle;
        if was_dragging {
            sink.emit(CoreEvent::LineEnded);
        }
    }
}
