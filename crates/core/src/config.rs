//! Session configuration
//!
//! Defaults mirror the constants in `dotlink_types`; `from_env` overlays
//! `DOTLINK_*` variables on top of them.

use thiserror::Error;

use crate::types::{
    DotColor, COLOR_BOMB_CHAIN_LENGTH, DEFAULT_HEIGHT, DEFAULT_SPACING, DEFAULT_WIDTH,
    LINE_BOMB_CHAIN_LENGTH, LINE_BOMB_RADIUS, MIN_CHAIN_LENGTH, SOLVER_MAX_ATTEMPTS,
    SPAWN_OFFSET_ROWS,
};

/// Rejected configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u8, height: u8 },
    #[error("color palette is empty")]
    EmptyPalette,
    #[error("minimum chain length must be at least 2, got {0}")]
    ChainTooShort(usize),
    #[error("{name} bomb threshold {value} is below the minimum chain length {min}")]
    BombThreshold {
        name: &'static str,
        value: usize,
        min: usize,
    },
    #[error("solver attempt cap must be positive")]
    NoSolverAttempts,
}

/// Tunables for one session
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub width: u8,
    pub height: u8,
    /// World distance between tile anchors
    pub spacing: f32,
    pub palette: Vec<DotColor>,
    pub min_chain_length: usize,
    pub line_bomb_chain_length: usize,
    pub color_bomb_chain_length: usize,
    pub line_bomb_radius: u8,
    pub spawn_offset_rows: u8,
    pub solver_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            spacing: DEFAULT_SPACING,
            palette: DotColor::ALL.to_vec(),
            min_chain_length: MIN_CHAIN_LENGTH,
            line_bomb_chain_length: LINE_BOMB_CHAIN_LENGTH,
            color_bomb_chain_length: COLOR_BOMB_CHAIN_LENGTH,
            line_bomb_radius: LINE_BOMB_RADIUS,
            spawn_offset_rows: SPAWN_OFFSET_ROWS,
            solver_max_attempts: SOLVER_MAX_ATTEMPTS,
        }
    }
}

impl Config {
    /// Defaults overlaid with `DOTLINK_*` environment variables
    ///
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        use std::env;

        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            env::var(key).ok().and_then(|s| s.trim().parse().ok())
        }

        let mut config = Self::default();
        if let Some(w) = parsed("DOTLINK_WIDTH") {
            config.width = w;
        }
        if let Some(h) = parsed("DOTLINK_HEIGHT") {
            config.height = h;
        }
        if let Some(s) = parsed("DOTLINK_SPACING") {
            config.spacing = s;
        }
        if let Ok(list) = env::var("DOTLINK_COLORS") {
            let palette: Vec<DotColor> = list.split(',').filter_map(DotColor::from_str).collect();
            if !palette.is_empty() {
                config.palette = palette;
            }
        }
        if let Some(n) = parsed("DOTLINK_LINE_BOMB_LENGTH") {
            config.line_bomb_chain_length = n;
        }
        if let Some(n) = parsed("DOTLINK_COLOR_BOMB_LENGTH") {
            config.color_bomb_chain_length = n;
        }
        if let Some(n) = parsed("DOTLINK_SOLVER_ATTEMPTS") {
            config.solver_max_attempts = n;
        }
        config
    }

    /// Check the configuration can drive a session
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if self.min_chain_length < 2 {
            return Err(ConfigError::ChainTooShort(self.min_chain_length));
        }
        for (name, value) in [
            ("line", self.line_bomb_chain_length),
            ("color", self.color_bomb_chain_length),
        ] {
            if value < self.min_chain_length {
                return Err(ConfigError::BombThreshold {
                    name,
                    value,
                    min: self.min_chain_length,
                });
            }
        }
        if self.solver_max_attempts == 0 {
            return Err(ConfigError::NoSolverAttempts);
        }
        Ok(())
    }
}
