//! # Delve
//!
//! The simulation core of a small action role-playing demo: a random-walk
//! dungeon carver and a real-time NPC behavior loop.
//!
//! ## Architecture Overview
//!
//! Delve keeps the rendering side of the game at arm's length. The core
//! produces a grid and a roster of entities and only talks to the outside
//! world through events and snapshots:
//!
//! - **Generation System**: carves a [`Grid`] with a biased random walk
//! - **Grid**: wall/floor occupancy plus grid <-> world coordinate mapping
//! - **Entities**: one record type for the player and the monsters, tagged by [`Team`]
//! - **Behavior**: per-tick target acquisition, chase with wall avoidance,
//!   stuck recovery, attacks, death and respawn
//! - **Simulation**: owns the roster, advances it once per tick and emits
//!   [`GameEvent`]s for a [`Presenter`]
//!
//! ## Determinism
//!
//! Every random decision draws from an injected `StdRng`, so a seed fully
//! determines both the dungeon and the fight that plays out in it.

pub mod game;
pub mod generation;
pub mod rendering;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use rendering::*;
pub use utils::*;

// Explicit re-exports for commonly used types
pub use game::{
    // From behavior
    TickContext,
    // From entities
    BehaviorState,
    DeathPolicy,
    Entity,
    EntitySnapshot,
    Team,
    // From events
    GameEvent,
    Presenter,
    // From state
    GameCompletionState,
    GameStatistics,
    Simulation,
    // From world
    Grid,
    TileType,
    // From this module
    Direction,
    EntityId,
    Position,
    SimulationConfig,
};

pub use generation::{DungeonLayout, GenerationConfig, Generator, Tunnel, TunnelGenerator};

pub use rendering::AsciiRenderer;

/// Core error type for the Delve simulation core.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Spawn sampling ran out of attempts without hitting a floor cell
    #[error("No valid spawn found after {attempts} attempts")]
    NoValidSpawn { attempts: usize },

    /// Stuck recovery found no floor cell within its search radius
    #[error("Entity {0} is fully walled in")]
    EntityFullyWalled(EntityId),

    /// A grid position lies outside the grid
    #[error("Position ({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(Position),

    /// No entity with this id is in the roster
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// Generated content broke one of its invariants
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tuning constants.
///
/// Distances are in world units unless the name says otherwise; one grid
/// cell spans [`TILE_SIZE`] world units.
pub mod config {
    /// Edge length of one grid cell in world units
    pub const TILE_SIZE: f32 = 2.0;

    /// Radius of the square carved around each tunnel center (0 = 1 tile, 1 = 3 tiles)
    pub const PATH_WIDTH: usize = 1;

    /// Fixed height entities hover at
    pub const ENTITY_ELEVATION: f32 = TILE_SIZE * 0.5;

    /// Body width of an entity
    pub const ENTITY_WIDTH: f32 = TILE_SIZE * 0.5;

    /// Look-ahead past the tentative position used for wall checks
    pub const COLLISION_BUFFER: f32 = ENTITY_WIDTH / 2.0 + 0.01;

    /// Distance covered per tick
    pub const MOVE_SPEED: f32 = 0.05 * TILE_SIZE;

    /// Rotation tried left and right when the direct path is blocked (30 degrees)
    pub const AVOIDANCE_ANGLE: f32 = std::f32::consts::FRAC_PI_6;

    /// Maximum distance at which an attack lands
    pub const ATTACK_RANGE: f32 = TILE_SIZE * 1.5;

    /// Damage per attack
    pub const ATTACK_DAMAGE: u32 = 10;

    /// Seconds between two attacks of the same entity
    pub const ATTACK_COOLDOWN: f64 = 1.0;

    /// Distance at which an opposing entity is noticed
    pub const AGGRO_RADIUS: f32 = TILE_SIZE * 25.0;

    /// Seconds between two stuck checks
    pub const STUCK_CHECK_INTERVAL: f64 = 0.5;

    /// Accumulated stuck seconds that trigger a teleport
    pub const STUCK_THRESHOLD: f64 = 1.5;

    /// Chebyshev radius, in cells, searched for a floor cell when stuck
    pub const STUCK_SEARCH_RADIUS: i32 = 5;

    /// Seconds a dead monster waits before it is revived
    pub const RESPAWN_DELAY: f64 = 10.0;

    /// Longest accepted respawn delay, in seconds
    pub const MAX_RESPAWN_DELAY: f64 = 3600.0;

    /// Player starting health
    pub const PLAYER_MAX_HEALTH: u32 = 1000;

    /// Monster starting health
    pub const MONSTER_MAX_HEALTH: u32 = 100;

    /// Number of monsters placed at game start
    pub const DEFAULT_MONSTER_COUNT: usize = 5;

    /// Simulation ticks per second
    pub const TICK_RATE: u32 = 60;

    /// Default dungeon width in tiles
    pub const DEFAULT_DUNGEON_WIDTH: usize = 50;

    /// Default dungeon height in tiles
    pub const DEFAULT_DUNGEON_HEIGHT: usize = 50;

    /// Default tunnel budget
    pub const DEFAULT_MAX_TUNNELS: u32 = 75;

    /// Default longest tunnel
    pub const DEFAULT_MAX_TUNNEL_LENGTH: u32 = 10;

    /// Default shortest tunnel
    pub const DEFAULT_MIN_TUNNEL_LENGTH: u32 = 2;

    /// Probability that a repeat of the previous tunnel direction is kept
    pub const STRAIGHT_BIAS: f64 = 0.8;
}
