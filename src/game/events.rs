//! # Game Events
//!
//! Everything the simulation wants the outside world to know about, and the
//! collaborator trait that consumes it.

use crate::{EntityId, Team};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An entity entered the simulation
    Spawned {
        entity_id: EntityId,
        team: Team,
        position: Vec3,
    },
    /// Spawn sampling failed and the entity was put at the fallback position
    SpawnFallback { entity_id: EntityId, position: Vec3 },
    /// An entity picked a new target
    TargetAcquired { entity_id: EntityId, target: EntityId },
    /// An entity's target went away
    TargetLost { entity_id: EntityId },
    /// An attack landed
    Attacked {
        attacker: EntityId,
        target: EntityId,
        damage: u32,
    },
    /// An entity lost health
    Damaged {
        entity_id: EntityId,
        position: Vec3,
        amount: u32,
        health: u32,
        health_fraction: f32,
    },
    /// An entity's health reached zero
    Died {
        entity_id: EntityId,
        team: Team,
        killer: Option<EntityId>,
    },
    /// A dead monster will come back at `at_tick`
    RespawnScheduled { entity_id: EntityId, at_tick: u64 },
    /// A dead monster came back
    Respawned { entity_id: EntityId, position: Vec3 },
    /// Stuck recovery moved an entity
    Teleported {
        entity_id: EntityId,
        from: Vec3,
        to: Vec3,
    },
    /// Stuck recovery found nowhere to go
    FullyWalled { entity_id: EntityId },
}

/// Presentation collaborator fed by the simulation.
///
/// All calls are fire-and-forget. Renderers place and remove visuals,
/// health bars follow `health_changed`, floating damage numbers follow
/// `damage_number`.
pub trait Presenter {
    /// Creates or moves the visual of an entity.
    fn place(&mut self, entity_id: EntityId, team: Team, position: Vec3);

    /// Removes the visual of an entity.
    fn remove(&mut self, entity_id: EntityId);

    /// Health bar update.
    fn health_changed(&mut self, _entity_id: EntityId, _fraction: f32) {}

    /// Floating damage number at a world position.
    fn damage_number(&mut self, _position: Vec3, _amount: u32) {}
}
