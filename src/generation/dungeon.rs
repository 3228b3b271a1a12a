//! # Dungeon Generation
//!
//! Random-walk tunnel carving.
//!
//! The carver starts from a random legal cell and repeatedly walks a tunnel
//! in a random cardinal direction, turning every visited center and the
//! square of radius `path_width` around it into floor. Tunnels never reverse
//! the previous tunnel and prefer to keep going straight. A tunnel stops
//! early when its next center would enter the edge margin.

use crate::generation::utils;
use crate::{DelveResult, Direction, GenerationConfig, Generator, Grid, Position, TileType};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Consecutive tunnels that carve nothing before generation gives up.
pub const MAX_STALLED_ATTEMPTS: u32 = 256;

/// A single tunnel walked by the carver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    /// Center the tunnel started from
    pub start: Position,
    /// Direction walked
    pub direction: Direction,
    /// Length rolled for this tunnel
    pub requested_length: u32,
    /// Steps actually carved before the edge stop
    pub carved_length: u32,
}

impl Tunnel {
    /// Whether the edge margin cut this tunnel short.
    pub fn is_truncated(&self) -> bool {
        self.carved_length < self.requested_length
    }

    /// Center the tunnel ended on.
    pub fn end(&self) -> Position {
        let delta = self.direction.to_delta();
        let steps = self.carved_length as i32;
        Position::new(self.start.x + delta.x * steps, self.start.y + delta.y * steps)
    }
}

/// Result of carving: the grid plus a record of how it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonLayout {
    /// The carved grid
    pub grid: Grid,
    /// Starting center of the walk
    pub start: Position,
    /// Every tunnel that carved at least one step, in order
    pub tunnels: Vec<Tunnel>,
}

/// Random-walk tunnel carver.
///
/// # Examples
///
/// ```
/// use delve::{generation::utils, GenerationConfig, Generator, TunnelGenerator};
///
/// let config = GenerationConfig::for_testing(7);
/// let mut rng = utils::create_rng(&config);
/// let layout = TunnelGenerator::new().generate(&config, &mut rng).unwrap();
/// assert!(layout.tunnels.len() <= config.max_tunnels as usize);
/// assert!(layout.grid.floor_count() > 0);
/// ```
#[derive(Debug, Clone)]
pub struct TunnelGenerator {
    /// Consecutive zero-step tunnels tolerated before stopping
    pub max_stalled_attempts: u32,
}

impl TunnelGenerator {
    pub fn new() -> Self {
        Self {
            max_stalled_attempts: MAX_STALLED_ATTEMPTS,
        }
    }

    /// Carves a grid. The config must already be normalized.
    pub(crate) fn carve(&self, config: &GenerationConfig, rng: &mut StdRng) -> DungeonLayout {
        let mut grid = Grid::new(config.width, config.height);
        let margin = config.edge_margin();

        let mut current = Position::new(
            rng.gen_range(margin..config.width - margin) as i32,
            rng.gen_range(margin..config.height - margin) as i32,
        );
        let start = current;
        carve_square(&mut grid, current, config.path_width);

        let mut tunnels = Vec::new();
        let mut last_direction = None;
        let mut remaining = config.max_tunnels;
        let mut stalled = 0;

        while remaining > 0 {
            let direction = choose_direction(last_direction, config.straight_bias, rng);
            let requested_length = rng.gen_range(config.min_tunnel_length..=config.max_length);

            let tunnel_start = current;
            let mut carved_length = 0;
            while carved_length < requested_length {
                let next = current.step(direction);
                if !utils::is_legal_center(next, config.width, config.height, margin) {
                    break;
                }
                current = next;
                carve_square(&mut grid, current, config.path_width);
                carved_length += 1;
            }

            if carved_length == 0 {
                stalled += 1;
                if stalled >= self.max_stalled_attempts {
                    warn!(
                        "Tunnel carving stalled after {} blocked attempts, {} tunnels left unused",
                        stalled, remaining
                    );
                    break;
                }
                continue;
            }

            stalled = 0;
            remaining -= 1;
            last_direction = Some(direction);
            tunnels.push(Tunnel {
                start: tunnel_start,
                direction,
                requested_length,
                carved_length,
            });
        }

        debug!("Carved {} tunnels from {:?}", tunnels.len(), start);
        DungeonLayout {
            grid,
            start,
            tunnels,
        }
    }
}

impl Default for TunnelGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator<DungeonLayout> for TunnelGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<DungeonLayout> {
        let config = config.clone().normalized();
        let layout = self.carve(&config, rng);
        self.validate(&layout, &config)?;
        info!(
            "Generated {}x{} dungeon: {} floor tiles, {} tunnels",
            config.width,
            config.height,
            layout.grid.floor_count(),
            layout.tunnels.len()
        );
        Ok(layout)
    }

    fn validate(&self, layout: &DungeonLayout, config: &GenerationConfig) -> DelveResult<()> {
        if layout.tunnels.len() > config.max_tunnels as usize {
            return Err(crate::DelveError::GenerationFailed(format!(
                "{} tunnels exceed the budget of {}",
                layout.tunnels.len(),
                config.max_tunnels
            )));
        }
        utils::validate_grid(&layout.grid, config.path_width)
    }

    fn generator_type(&self) -> &'static str {
        "TunnelGenerator"
    }
}

/// Picks a tunnel direction with the reversal and straightness rules.
///
/// The reverse of the previous direction is always re-rolled; a repeat of it
/// is kept with probability `straight_bias` and re-rolled otherwise.
fn choose_direction(last: Option<Direction>, straight_bias: f64, rng: &mut StdRng) -> Direction {
    let directions = Direction::cardinal();
    loop {
        let candidate = directions[rng.gen_range(0..directions.len())];
        match last {
            Some(last) if candidate == last.opposite() => continue,
            Some(last) if candidate == last && !rng.gen_bool(straight_bias) => continue,
            _ => return candidate,
        }
    }
}

/// Turns the square of radius `path_width` around `center` into floor.
fn carve_square(grid: &mut Grid, center: Position, path_width: usize) {
    let radius = path_width as i32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let pos = Position::new(center.x + dx, center.y + dy);
            if grid.in_bounds(pos) {
                // In bounds, so this cannot fail
                let _ = grid.set_tile(pos, TileType::Floor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn scenario_config(seed: u64) -> GenerationConfig {
        GenerationConfig {
            seed,
            width: 10,
            height: 10,
            max_tunnels: 1,
            max_length: 3,
            min_tunnel_length: 3,
            path_width: 0,
            straight_bias: 0.8,
        }
    }

    #[test]
    fn test_single_tunnel_scenario() {
        for seed in 0..50 {
            let config = scenario_config(seed);
            let mut rng = StdRng::seed_from_u64(seed);
            let layout = TunnelGenerator::new().generate(&config, &mut rng).unwrap();

            assert_eq!(layout.tunnels.len(), 1);
            let tunnel = layout.tunnels[0];
            assert_eq!(tunnel.start, layout.start);
            assert_eq!(tunnel.requested_length, 3);
            assert!((1..=3).contains(&tunnel.carved_length));

            // Start plus one cell per step, all on one line
            assert_eq!(layout.grid.floor_count(), 1 + tunnel.carved_length as usize);
            let mut cell = layout.start;
            assert!(layout.grid.is_floor(cell));
            for _ in 0..tunnel.carved_length {
                cell = cell.step(tunnel.direction);
                assert!(layout.grid.is_floor(cell));
            }
            assert_eq!(cell, tunnel.end());
        }
    }

    #[test]
    fn test_tunnels_respect_bounds_and_lengths() {
        let config = GenerationConfig::new(123);
        let mut rng = StdRng::seed_from_u64(123);
        let layout = TunnelGenerator::new().generate(&config, &mut rng).unwrap();

        assert_eq!(layout.tunnels.len(), config.max_tunnels as usize);
        for tunnel in &layout.tunnels {
            assert!(tunnel.carved_length >= 1);
            assert!(tunnel.carved_length <= config.max_length);
            if !tunnel.is_truncated() {
                assert!(tunnel.carved_length >= config.min_tunnel_length);
            }
        }
        assert!(utils::validate_grid(&layout.grid, config.path_width).is_ok());
    }

    #[test]
    fn test_no_tunnel_reverses_its_predecessor() {
        let config = GenerationConfig::new(77);
        let mut rng = StdRng::seed_from_u64(77);
        let layout = TunnelGenerator::new().generate(&config, &mut rng).unwrap();
        for pair in layout.tunnels.windows(2) {
            assert_ne!(pair[1].direction, pair[0].direction.opposite());
            assert_eq!(pair[1].start, pair[0].end());
        }
    }

    #[test]
    fn test_straight_bias_extremes() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let kept = choose_direction(Some(Direction::East), 1.0, &mut rng);
            assert_ne!(kept, Direction::West);

            let turned = choose_direction(Some(Direction::East), 0.0, &mut rng);
            assert!(matches!(turned, Direction::North | Direction::South));
        }
    }

    #[test]
    fn test_same_seed_same_dungeon() {
        let config = GenerationConfig::for_testing(31);
        let a = TunnelGenerator::new()
            .generate(&config, &mut utils::create_rng(&config))
            .unwrap();
        let b = TunnelGenerator::new()
            .generate(&config, &mut utils::create_rng(&config))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_minimal_grid_stalls_without_hanging() {
        // 3x3 with path width 0 has exactly one legal center
        let config = GenerationConfig {
            width: 3,
            height: 3,
            path_width: 0,
            ..GenerationConfig::new(2)
        };
        let mut rng = StdRng::seed_from_u64(2);
        let layout = TunnelGenerator::new().generate(&config, &mut rng).unwrap();
        assert!(layout.tunnels.is_empty());
        assert_eq!(layout.grid.floor_count(), 1);
        assert!(layout.grid.is_floor(Position::new(1, 1)));
    }

    #[test]
    fn test_generate_accepts_unnormalized_config() {
        let config = GenerationConfig {
            width: 2,
            height: 0,
            max_length: 0,
            path_width: 1_000_000,
            ..GenerationConfig::new(4)
        };
        let mut rng = StdRng::seed_from_u64(4);
        let layout = TunnelGenerator::new().generate(&config, &mut rng).unwrap();
        assert_eq!((layout.grid.width, layout.grid.height), (5, 5));
        assert!(layout.grid.is_floor(Position::new(2, 2)));
    }

    #[test]
    fn test_validate_reports_budget_overrun() {
        let config = scenario_config(1);
        let mut rng = StdRng::seed_from_u64(1);
        let generator = TunnelGenerator::new();
        let mut layout = generator.carve(&config, &mut rng);
        layout.tunnels.push(layout.tunnels[0]);
        assert!(generator.validate(&layout, &config).is_err());
        assert_eq!(generator.generator_type(), "TunnelGenerator");
    }
}
