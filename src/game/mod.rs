//! # Game Module
//!
//! Grid representation, entities, and the per-tick behavior loop.
//!
//! This module contains the runtime half of Delve:
//! - Grid occupancy and grid <-> world coordinate mapping
//! - The entity record shared by the player and the monsters
//! - The behavior state machine run once per entity per tick
//! - The simulation that owns the roster and the presentation event stream

pub mod behavior;
pub mod entities;
pub mod events;
pub mod state;
pub mod world;

pub use behavior::*;
pub use entities::*;
pub use events::*;
pub use state::*;
pub use world::*;

use crate::config;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell coordinate on the dungeon grid.
///
/// `x` grows eastwards and `y` grows southwards, so row 0 is the northern edge.
///
/// # Examples
///
/// ```
/// use delve::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let adjacent = pos.cardinal_adjacent_positions();
/// assert_eq!(adjacent.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring cell in the given direction.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }

    /// Returns only the 4 cardinal adjacent positions (no diagonals).
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        Direction::cardinal()
            .into_iter()
            .map(|direction| self.step(direction))
            .collect()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

/// Cardinal directions for tunnels and wandering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Direction, Position};
    ///
    /// let delta = Direction::North.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Returns the 4 cardinal directions.
    pub fn cardinal() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::West,
            Direction::East,
        ]
    }
}

/// Stable identifier of an entity: its index in the simulation roster.
///
/// Ids are never reused. A dead monster keeps its id through respawn, so a
/// target stored as an id can never dangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Roster index of this id.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tuning of the behavior loop.
///
/// Controls movement, combat, stuck recovery, respawn and the roster size.
/// Times are in seconds and converted to ticks through `tick_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks per simulated second
    pub tick_rate: u32,
    /// Distance covered per tick
    pub move_speed: f32,
    /// Look-ahead past the tentative position used for wall checks
    pub collision_buffer: f32,
    /// Rotation, in radians, of the fallback chase directions
    pub avoidance_angle: f32,
    /// Maximum distance at which an attack lands
    pub attack_range: f32,
    /// Damage per attack
    pub attack_damage: u32,
    /// Seconds between two attacks of the same entity
    pub attack_cooldown: f64,
    /// Distance at which an opposing entity is noticed
    pub aggro_radius: f32,
    /// Seconds between two stuck checks
    pub stuck_check_interval: f64,
    /// Accumulated stuck seconds that trigger a teleport
    pub stuck_threshold: f64,
    /// Chebyshev radius, in cells, searched when teleporting out of a jam
    pub stuck_search_radius: i32,
    /// Seconds a dead monster waits before it is revived
    pub respawn_delay: f64,
    /// Player starting health
    pub player_max_health: u32,
    /// Monster starting health
    pub monster_max_health: u32,
    /// Monsters placed at game start
    pub monster_count: usize,
}

impl SimulationConfig {
    /// Creates the default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::SimulationConfig;
    ///
    /// let config = SimulationConfig::new();
    /// assert!(config.attack_range < config.aggro_radius);
    /// assert_eq!(config.tick_rate, 60);
    /// ```
    pub fn new() -> Self {
        Self {
            tick_rate: config::TICK_RATE,
            move_speed: config::MOVE_SPEED,
            collision_buffer: config::COLLISION_BUFFER,
            avoidance_angle: config::AVOIDANCE_ANGLE,
            attack_range: config::ATTACK_RANGE,
            attack_damage: config::ATTACK_DAMAGE,
            attack_cooldown: config::ATTACK_COOLDOWN,
            aggro_radius: config::AGGRO_RADIUS,
            stuck_check_interval: config::STUCK_CHECK_INTERVAL,
            stuck_threshold: config::STUCK_THRESHOLD,
            stuck_search_radius: config::STUCK_SEARCH_RADIUS,
            respawn_delay: config::RESPAWN_DELAY,
            player_max_health: config::PLAYER_MAX_HEALTH,
            monster_max_health: config::MONSTER_MAX_HEALTH,
            monster_count: config::DEFAULT_MONSTER_COUNT,
        }
    }

    /// Creates a configuration for tests: a short respawn delay and two monsters.
    pub fn for_testing() -> Self {
        Self {
            respawn_delay: 1.0,
            monster_count: 2,
            ..Self::new()
        }
    }

    /// Clamps malformed values into a usable range.
    ///
    /// Never fails; every adjustment is logged as a warning.
    pub fn normalized(mut self) -> Self {
        if self.tick_rate == 0 {
            log::warn!("tick_rate 0 is invalid, using {}", config::TICK_RATE);
            self.tick_rate = config::TICK_RATE;
        }
        if !(self.move_speed.is_finite() && self.move_speed >= 0.0) {
            log::warn!("move_speed {} is invalid, using {}", self.move_speed, config::MOVE_SPEED);
            self.move_speed = config::MOVE_SPEED;
        }
        if self.stuck_check_interval <= 0.0 {
            log::warn!(
                "stuck_check_interval {} is invalid, using {}",
                self.stuck_check_interval,
                config::STUCK_CHECK_INTERVAL
            );
            self.stuck_check_interval = config::STUCK_CHECK_INTERVAL;
        }
        if self.stuck_search_radius < 0 {
            log::warn!("stuck_search_radius {} clamped to 0", self.stuck_search_radius);
            self.stuck_search_radius = 0;
        }
        if !(0.0..=config::MAX_RESPAWN_DELAY).contains(&self.respawn_delay) {
            let clamped = if self.respawn_delay.is_nan() {
                config::RESPAWN_DELAY
            } else {
                self.respawn_delay.clamp(0.0, config::MAX_RESPAWN_DELAY)
            };
            log::warn!("respawn_delay {} clamped to {}", self.respawn_delay, clamped);
            self.respawn_delay = clamped;
        }
        if self.player_max_health == 0 {
            log::warn!("player_max_health 0 raised to 1");
            self.player_max_health = 1;
        }
        if self.monster_max_health == 0 {
            log::warn!("monster_max_health 0 raised to 1");
            self.monster_max_health = 1;
        }
        self.attack_range = self.attack_range.max(0.0);
        self.aggro_radius = self.aggro_radius.max(0.0);
        self.collision_buffer = self.collision_buffer.max(0.0);
        self.attack_cooldown = self.attack_cooldown.max(0.0);
        self
    }

    /// Number of ticks covering `seconds`, rounded up.
    pub fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        (seconds * self.tick_rate as f64).ceil().max(0.0) as u64
    }

    /// Distance an unobstructed entity covers between two stuck checks.
    pub fn expected_travel_per_check(&self) -> f32 {
        self.move_speed * (self.stuck_check_interval * self.tick_rate as f64) as f32
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_creation() {
        let pos = Position::new(5, 10);
        assert_eq!(pos.x, 5);
        assert_eq!(pos.y, 10);
    }

    #[test]
    fn test_position_cardinal_adjacent() {
        let pos = Position::new(5, 5);
        let adjacent = pos.cardinal_adjacent_positions();
        assert_eq!(adjacent.len(), 4);
        assert!(adjacent.contains(&Position::new(5, 4))); // North
        assert!(adjacent.contains(&Position::new(4, 5))); // West
        assert!(!adjacent.contains(&Position::new(4, 4))); // No diagonal
    }

    #[test]
    fn test_direction_opposites_cancel() {
        let start = Position::new(4, 4);
        for direction in Direction::cardinal() {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_eq!(start.step(direction).step(direction.opposite()), start);
        }
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId(3).to_string(), "#3");
        assert_eq!(EntityId(3).index(), 3);
    }

    #[test]
    fn test_config_tick_conversion() {
        let config = SimulationConfig::new();
        assert_eq!(config.seconds_to_ticks(10.0), 600);
        assert_eq!(config.seconds_to_ticks(0.01), 1);
        // 0.1 units per tick, 30 ticks per check
        assert!((config.expected_travel_per_check() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_config_normalization() {
        let config = SimulationConfig {
            tick_rate: 0,
            stuck_check_interval: -1.0,
            monster_max_health: 0,
            respawn_delay: -3.0,
            ..SimulationConfig::new()
        }
        .normalized();
        assert_eq!(config.tick_rate, crate::config::TICK_RATE);
        assert_eq!(config.stuck_check_interval, crate::config::STUCK_CHECK_INTERVAL);
        assert_eq!(config.monster_max_health, 1);
        assert_eq!(config.respawn_delay, 0.0);
    }

    #[test]
    fn test_huge_respawn_delay_is_capped() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"respawn_delay": 1e300}"#).unwrap();
        let config = config.normalized();
        assert_eq!(config.respawn_delay, crate::config::MAX_RESPAWN_DELAY);
        assert_eq!(config.seconds_to_ticks(config.respawn_delay), 3600 * 60);
    }
}
