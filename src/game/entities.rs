//! # Entities
//!
//! The single actor record used for both the player and the monsters.
//!
//! Player and monsters only differ in their starting health and in what
//! happens when they die, so they share one struct tagged with a [`Team`]
//! instead of separate types.

use crate::utils::{planar_direction, planar_distance_squared};
use crate::{EntityId, SimulationConfig};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Allegiance of an entity. Entities only ever target the opposing team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Player,
    Monster,
}

impl Team {
    /// Whether an entity of this team may target one of `other`.
    pub fn opposes(self, other: Team) -> bool {
        self != other
    }

    /// Starting and maximum health for this team.
    pub fn max_health(self, config: &SimulationConfig) -> u32 {
        match self {
            Team::Player => config.player_max_health,
            Team::Monster => config.monster_max_health,
        }
    }

    /// What happens when an entity of this team dies.
    pub fn death_policy(self, config: &SimulationConfig) -> DeathPolicy {
        match self {
            Team::Player => DeathPolicy::Terminal,
            Team::Monster => DeathPolicy::RespawnAfter {
                ticks: config.seconds_to_ticks(config.respawn_delay),
            },
        }
    }
}

/// Death handling of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathPolicy {
    /// Removed from the simulation for good
    Terminal,
    /// Revived at a fresh spawn point after a delay
    RespawnAfter { ticks: u64 },
}

/// Current high-level state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorState {
    /// No target; random steps between neighbouring cells
    Wandering,
    /// Moving towards an out-of-range target
    Chasing,
    /// Target within reach
    Attacking,
    /// Teleported out of a jam this tick
    Recovering,
    /// Health reached zero
    Dead,
}

/// A player or monster taking part in the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable roster id
    pub id: EntityId,
    /// Allegiance, also selects stats and death policy
    pub team: Team,
    /// World position; y stays at entity elevation
    pub position: Vec3,
    /// Unit vector on the x/z plane the entity looks along
    pub facing: Vec3,
    /// Current health, `0..=max_health`
    pub health: u32,
    /// Health restored on (re)spawn
    pub max_health: u32,
    /// Entity currently pursued, resolved against the roster every tick
    pub target: Option<EntityId>,
    /// Current behavior state
    pub state: BehaviorState,
    /// Simulation time of the last landed attack
    pub last_attack_time: Option<f64>,
    /// Simulation time of the last stuck check
    pub last_stuck_check_time: f64,
    /// Seconds accumulated without meaningful progress
    pub stuck_timer: f64,
    /// Position recorded at the last stuck check
    pub last_position: Vec3,
    /// Tick at which a dead monster comes back
    pub revive_at_tick: Option<u64>,
}

impl Entity {
    /// Creates a live entity at full health.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Entity, EntityId, SimulationConfig, Team};
    /// use glam::Vec3;
    ///
    /// let config = SimulationConfig::new();
    /// let player = Entity::new(EntityId(0), Team::Player, Vec3::ZERO, &config);
    /// assert!(player.is_alive());
    /// assert_eq!(player.health, config.player_max_health);
    /// ```
    pub fn new(id: EntityId, team: Team, position: Vec3, config: &SimulationConfig) -> Self {
        let max_health = team.max_health(config);
        Self {
            id,
            team,
            position,
            facing: Vec3::new(0.0, 0.0, 1.0),
            health: max_health,
            max_health,
            target: None,
            state: BehaviorState::Wandering,
            last_attack_time: None,
            last_stuck_check_time: 0.0,
            stuck_timer: 0.0,
            last_position: position,
            revive_at_tick: None,
        }
    }

    /// Whether the entity still takes part in the simulation.
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Whether `self` may target `other`.
    pub fn can_target(&self, other: &Entity) -> bool {
        other.id != self.id && other.is_alive() && self.team.opposes(other.team)
    }

    /// Health as a fraction of maximum health, for health bars.
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }

    /// Planar squared distance to another entity.
    pub fn distance_squared_to(&self, other: &Entity) -> f32 {
        planar_distance_squared(self.position, other.position)
    }

    /// Turns to look at a point; a coincident point keeps the current facing.
    pub fn face_towards(&mut self, point: Vec3) {
        let direction = planar_direction(self.position, point);
        if direction != Vec3::ZERO {
            self.facing = direction;
        }
    }

    /// Lowers health, floor-clamped at zero. Returns the damage actually taken.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.health);
        self.health -= taken;
        taken
    }

    /// Switches to the dead state and schedules a revival when the team respawns.
    ///
    /// Returns the tick of the scheduled revival, if any.
    pub fn die(&mut self, tick: u64, config: &SimulationConfig) -> Option<u64> {
        self.health = 0;
        self.target = None;
        self.state = BehaviorState::Dead;
        self.stuck_timer = 0.0;
        self.revive_at_tick = match self.team.death_policy(config) {
            DeathPolicy::Terminal => None,
            DeathPolicy::RespawnAfter { ticks } => Some(tick.saturating_add(ticks)),
        };
        self.revive_at_tick
    }

    /// Whether a scheduled revival is due at `tick`.
    pub fn revival_due(&self, tick: u64) -> bool {
        !self.is_alive() && self.revive_at_tick.is_some_and(|at| tick >= at)
    }

    /// Brings a dead entity back at `position` with full health and cleared timers.
    pub fn revive(&mut self, position: Vec3, now: f64) {
        self.position = position;
        self.last_position = position;
        self.health = self.max_health;
        self.target = None;
        self.state = BehaviorState::Wandering;
        self.last_attack_time = None;
        self.last_stuck_check_time = now;
        self.stuck_timer = 0.0;
        self.revive_at_tick = None;
    }

    /// Presentation snapshot of this entity.
    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            team: self.team,
            position: self.position,
            facing: self.facing,
            health: self.health,
            max_health: self.max_health,
            is_alive: self.is_alive(),
            state: self.state,
            target: self.target,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.team {
            Team::Player => write!(f, "Player{}", self.id),
            Team::Monster => write!(f, "Monster{}", self.id),
        }
    }
}

/// Per-tick view of an entity handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub team: Team,
    pub position: Vec3,
    pub facing: Vec3,
    pub health: u32,
    pub max_health: u32,
    pub is_alive: bool,
    pub state: BehaviorState,
    pub target: Option<EntityId>,
}
