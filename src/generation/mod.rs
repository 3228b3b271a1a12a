//! # Generation Module
//!
//! Procedural dungeon generation.
//!
//! This module provides the generation configuration, the [`Generator`]
//! trait shared by generators, and the random-walk tunnel carver that
//! produces the dungeon [`Grid`](crate::Grid).

pub mod dungeon;

pub use dungeon::*;

use crate::config;
use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for dungeon generation.
///
/// Controls the grid size, the tunnel budget and the shape of individual
/// tunnels. Every field is optional when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Number of tunnels that must carve at least one step
    pub max_tunnels: u32,
    /// Longest tunnel, in steps
    pub max_length: u32,
    /// Shortest tunnel, in steps
    pub min_tunnel_length: u32,
    /// Radius of the square carved around each tunnel center
    pub path_width: usize,
    /// Probability that a repeat of the previous direction is kept
    pub straight_bias: f64,
}

impl GenerationConfig {
    /// Creates the default generation configuration with the given seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(42);
    /// assert_eq!(config.width, 50);
    /// assert!(config.min_tunnel_length <= config.max_length);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: config::DEFAULT_DUNGEON_WIDTH,
            height: config::DEFAULT_DUNGEON_HEIGHT,
            max_tunnels: config::DEFAULT_MAX_TUNNELS,
            max_length: config::DEFAULT_MAX_TUNNEL_LENGTH,
            min_tunnel_length: config::DEFAULT_MIN_TUNNEL_LENGTH,
            path_width: config::PATH_WIDTH,
            straight_bias: config::STRAIGHT_BIAS,
        }
    }

    /// Creates a configuration for testing with smaller dungeons.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            width: 30,
            height: 30,
            max_tunnels: 40,
            max_length: 8,
            ..Self::new(seed)
        }
    }

    /// Smallest edge distance of a tunnel center for this path width.
    pub fn edge_margin(&self) -> usize {
        utils::edge_margin(self.path_width)
    }

    /// Clamps malformed values into a usable range.
    ///
    /// Zero lengths are raised to one and a minimum above the maximum is
    /// lowered to it. A path width whose margins cannot fit the larger grid
    /// side is narrowed, then a grid too small for a single tunnel center is
    /// enlarged. Every adjustment is logged as a warning.
    pub fn normalized(mut self) -> Self {
        if self.max_length == 0 {
            warn!("max_length 0 raised to 1");
            self.max_length = 1;
        }
        if self.min_tunnel_length == 0 {
            warn!("min_tunnel_length 0 raised to 1");
            self.min_tunnel_length = 1;
        }
        if self.min_tunnel_length > self.max_length {
            warn!(
                "min_tunnel_length {} exceeds max_length {}, clamping",
                self.min_tunnel_length, self.max_length
            );
            self.min_tunnel_length = self.max_length;
        }

        let max_path_width = (self.width.max(self.height).saturating_sub(1) / 4).max(1);
        if self.path_width > max_path_width {
            warn!(
                "path_width {} too wide for a {}x{} grid, using {}",
                self.path_width, self.width, self.height, max_path_width
            );
            self.path_width = max_path_width;
        }

        let min_size = 2 * self.edge_margin() + 1;
        if self.width < min_size {
            warn!("width {} too small for path width {}, using {}", self.width, self.path_width, min_size);
            self.width = min_size;
        }
        if self.height < min_size {
            warn!("height {} too small for path width {}, using {}", self.height, self.path_width, min_size);
            self.height = min_size;
        }

        if !(0.0..=1.0).contains(&self.straight_bias) {
            let clamped = if self.straight_bias.is_nan() {
                config::STRAIGHT_BIAS
            } else {
                self.straight_bias.clamp(0.0, 1.0)
            };
            warn!("straight_bias {} clamped to {}", self.straight_bias, clamped);
            self.straight_bias = clamped;
        }
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> crate::DelveResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> crate::DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use crate::{DelveError, DelveResult, Grid, Position};

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Smallest distance between a tunnel center and the grid edge.
    ///
    /// Keeps the carved square at least one cell, and at least `path_width`
    /// cells, away from every edge.
    pub fn edge_margin(path_width: usize) -> usize {
        path_width.saturating_mul(2).max(path_width.saturating_add(1))
    }

    /// Width of the band along each edge that must stay wall.
    pub fn wall_band(path_width: usize) -> usize {
        path_width.max(1)
    }

    /// Whether `pos` may serve as a tunnel center.
    pub fn is_legal_center(pos: Position, width: usize, height: usize, margin: usize) -> bool {
        let legal = |c: i32, n: usize| {
            c >= margin as i32 && (c as i64) < n as i64 - margin as i64
        };
        legal(pos.x, width) && legal(pos.y, height)
    }

    /// Checks that every cell in the edge band is wall.
    pub fn validate_grid(grid: &Grid, path_width: usize) -> DelveResult<()> {
        let band = wall_band(path_width);
        for y in 0..grid.height {
            for x in 0..grid.width {
                let near_edge = x < band
                    || y < band
                    || x + band >= grid.width
                    || y + band >= grid.height;
                let pos = Position::new(x as i32, y as i32);
                if near_edge && grid.is_floor(pos) {
                    return Err(DelveError::GenerationFailed(format!(
                        "floor at ({}, {}) inside the {}-cell edge band",
                        x, y, band
                    )));
                }
            }
        }
        Ok(())
    }
}
