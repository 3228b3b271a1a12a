//! # Behavior
//!
//! The decision procedure every live entity runs once per tick:
//!
//! 1. stuck check, possibly teleporting to the nearest floor cell
//! 2. target acquisition among live opponents inside the aggro radius
//! 3. attack when in range, otherwise chase with wall avoidance;
//!    wander when there is nothing to chase
//!
//! Entities are processed in roster order and every mutation is visible to
//! the entities processed after it in the same tick. Combat side effects
//! (damage, death, clearing targets that point at the dead) happen
//! synchronously inside the attacker's update.

use crate::utils::{planar_direction, planar_distance, rotate_about_y};
use crate::{
    BehaviorState, DelveError, DelveResult, Direction, Entity, EntityId, GameEvent, Grid,
    SimulationConfig,
};
use glam::Vec3;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;

/// Grid moves considered by a wandering entity; `None` means stay put.
const WANDER_MOVES: [Option<Direction>; 5] = [
    None,
    Some(Direction::North),
    Some(Direction::South),
    Some(Direction::West),
    Some(Direction::East),
];

/// Shared state of one simulation tick.
pub struct TickContext<'a> {
    /// Read-only dungeon grid
    pub grid: &'a Grid,
    /// Behavior tuning
    pub config: &'a SimulationConfig,
    /// Source of wander decisions
    pub rng: &'a mut StdRng,
    /// Event sink for presentation
    pub events: &'a mut Vec<GameEvent>,
    /// Current tick number
    pub tick: u64,
    /// Current simulation time in seconds
    pub now: f64,
}

/// Runs one tick of behavior for the entity at `index`.
///
/// Dead entities are skipped.
pub fn update_entity(roster: &mut [Entity], index: usize, ctx: &mut TickContext<'_>) {
    if !roster[index].is_alive() {
        return;
    }

    if check_stuck(roster, index, ctx) {
        return;
    }

    acquire_target(roster, index, ctx);

    match resolve_target(roster, index) {
        Some(target_idx) => {
            let range = ctx.config.attack_range;
            if roster[index].distance_squared_to(&roster[target_idx]) <= range * range {
                attack(roster, index, target_idx, ctx);
            } else {
                chase(roster, index, target_idx, ctx);
            }
        }
        None => wander(&mut roster[index], ctx),
    }
}

/// Finds the roster index holding `id`.
pub fn find_index(roster: &[Entity], id: EntityId) -> Option<usize> {
    match roster.get(id.index()) {
        Some(entity) if entity.id == id => Some(id.index()),
        _ => roster.iter().position(|entity| entity.id == id),
    }
}

/// Resolves the current target of `index` to a live roster index.
fn resolve_target(roster: &[Entity], index: usize) -> Option<usize> {
    let target = roster[index].target?;
    find_index(roster, target).filter(|&idx| roster[idx].is_alive())
}

/// Stuck detection and recovery. Returns true when the entity teleported
/// and must skip the rest of its tick.
fn check_stuck(roster: &mut [Entity], index: usize, ctx: &mut TickContext<'_>) -> bool {
    let config = ctx.config;
    let target_in_reach = resolve_target(roster, index).map(|target_idx| {
        roster[index].distance_squared_to(&roster[target_idx])
            <= config.attack_range * config.attack_range
    });

    let entity = &mut roster[index];
    if entity.target.is_none() {
        entity.stuck_timer = 0.0;
        return false;
    }
    if ctx.now - entity.last_stuck_check_time <= config.stuck_check_interval {
        return false;
    }

    if target_in_reach == Some(true) {
        // Standing still next to the target is expected
        entity.stuck_timer = 0.0;
    } else {
        let moved = planar_distance(entity.position, entity.last_position);
        if moved < config.expected_travel_per_check() * 0.5 {
            entity.stuck_timer += config.stuck_check_interval;
        } else {
            entity.stuck_timer = 0.0;
        }
    }
    entity.last_position = entity.position;
    entity.last_stuck_check_time = ctx.now;

    if entity.stuck_timer <= config.stuck_threshold {
        return false;
    }

    let from = entity.position;
    match teleport_to_nearest_floor(entity, ctx.grid, config.stuck_search_radius) {
        Ok(to) => {
            warn!("{} is stuck, teleported from {:?} to {:?}", entity, from, to);
            ctx.events.push(GameEvent::Teleported {
                entity_id: entity.id,
                from,
                to,
            });
        }
        Err(e) => {
            warn!("{} is stuck and cannot be moved: {}", entity, e);
            ctx.events.push(GameEvent::FullyWalled {
                entity_id: entity.id,
            });
        }
    }
    entity.stuck_timer = 0.0;
    entity.state = BehaviorState::Recovering;
    true
}

/// Moves an entity onto the center of the nearest floor cell.
///
/// Searches rings of growing Chebyshev radius around the entity's cell.
/// Leaves the entity in place and returns [`DelveError::EntityFullyWalled`]
/// when no floor cell lies within `radius`.
pub fn teleport_to_nearest_floor(
    entity: &mut Entity,
    grid: &Grid,
    radius: i32,
) -> DelveResult<Vec3> {
    let cell = grid.world_to_grid(entity.position);
    let floor = grid
        .nearest_floor(cell, radius)
        .ok_or(DelveError::EntityFullyWalled(entity.id))?;
    let mut destination = grid.grid_to_world(floor);
    destination.y = entity.position.y;
    entity.position = destination;
    entity.last_position = destination;
    Ok(destination)
}

/// Picks the nearest live opponent within the aggro radius when the entity
/// has no live target.
///
/// Distances compare squared; the first entity in roster order wins ties.
fn acquire_target(roster: &mut [Entity], index: usize, ctx: &mut TickContext<'_>) {
    if resolve_target(roster, index).is_some() {
        return;
    }

    let previous = roster[index].target;
    let seeker = &roster[index];
    let mut closest = None;
    let mut min_distance_sq = ctx.config.aggro_radius * ctx.config.aggro_radius;
    for other in roster.iter() {
        if !seeker.can_target(other) {
            continue;
        }
        let distance_sq = seeker.distance_squared_to(other);
        if distance_sq < min_distance_sq {
            min_distance_sq = distance_sq;
            closest = Some(other.id);
        }
    }

    let entity = &mut roster[index];
    entity.target = closest;
    match closest {
        Some(target) if previous != closest => {
            info!("{} found new target {}", entity, target);
            ctx.events.push(GameEvent::TargetAcquired {
                entity_id: entity.id,
                target,
            });
        }
        None if previous.is_some() => {
            info!("{} lost target", entity);
            ctx.events.push(GameEvent::TargetLost {
                entity_id: entity.id,
            });
        }
        _ => {}
    }
}

fn attack(roster: &mut [Entity], index: usize, target_idx: usize, ctx: &mut TickContext<'_>) {
    let target_position = roster[target_idx].position;
    let target_id = roster[target_idx].id;

    let attacker = &mut roster[index];
    attacker.state = BehaviorState::Attacking;
    attacker.face_towards(target_position);

    let ready = attacker
        .last_attack_time
        .map_or(true, |last| ctx.now - last > ctx.config.attack_cooldown);
    if !ready {
        return;
    }
    attacker.last_attack_time = Some(ctx.now);
    let attacker_id = attacker.id;
    let damage = ctx.config.attack_damage;

    debug!("{} attacks {} for {}", attacker, target_id, damage);
    ctx.events.push(GameEvent::Attacked {
        attacker: attacker_id,
        target: target_id,
        damage,
    });
    deal_damage(roster, target_idx, damage, Some(attacker_id), ctx);
}

/// Applies damage to the entity at `target_idx` and runs the death
/// transition when its health reaches zero.
///
/// On death every entity targeting the victim has its target cleared before
/// this returns. Returns the damage actually taken; dead entities take none.
pub fn deal_damage(
    roster: &mut [Entity],
    target_idx: usize,
    amount: u32,
    source: Option<EntityId>,
    ctx: &mut TickContext<'_>,
) -> u32 {
    let victim = &mut roster[target_idx];
    if !victim.is_alive() {
        return 0;
    }

    let taken = victim.apply_damage(amount);
    debug!("{} took {} damage, health: {}", victim, taken, victim.health);
    ctx.events.push(GameEvent::Damaged {
        entity_id: victim.id,
        position: victim.position,
        amount: taken,
        health: victim.health,
        health_fraction: victim.health_fraction(),
    });

    if !victim.is_alive() {
        kill(roster, target_idx, source, ctx);
    }
    taken
}

fn kill(roster: &mut [Entity], index: usize, killer: Option<EntityId>, ctx: &mut TickContext<'_>) {
    let victim = &mut roster[index];
    let dead_id = victim.id;
    let team = victim.team;
    let revive_at = victim.die(ctx.tick, ctx.config);
    info!("{} died", victim);
    ctx.events.push(GameEvent::Died {
        entity_id: dead_id,
        team,
        killer,
    });
    if let Some(at_tick) = revive_at {
        info!("{} will respawn at tick {}", victim, at_tick);
        ctx.events.push(GameEvent::RespawnScheduled {
            entity_id: dead_id,
            at_tick,
        });
    }

    for other in roster.iter_mut() {
        if other.target == Some(dead_id) {
            other.target = None;
            info!("{} target died, clearing target", other);
            ctx.events.push(GameEvent::TargetLost {
                entity_id: other.id,
            });
        }
    }
}

/// Tentative position after one step along `direction`, if the leading edge
/// of that step is on floor.
pub fn try_step(
    position: Vec3,
    direction: Vec3,
    grid: &Grid,
    config: &SimulationConfig,
) -> Option<Vec3> {
    let tentative = position + direction * config.move_speed;
    let leading_edge = tentative + direction * config.collision_buffer;
    grid.is_floor_at(leading_edge).then_some(tentative)
}

fn chase(roster: &mut [Entity], index: usize, target_idx: usize, ctx: &mut TickContext<'_>) {
    let target_position = roster[target_idx].position;
    let config = ctx.config;
    let grid = ctx.grid;

    let entity = &mut roster[index];
    entity.state = BehaviorState::Chasing;
    let direction = planar_direction(entity.position, target_position);

    if let Some(next) = try_step(entity.position, direction, grid, config) {
        entity.position = next;
        entity.face_towards(target_position);
        return;
    }

    // Right first, then left
    for angle in [config.avoidance_angle, -config.avoidance_angle] {
        let turned = rotate_about_y(direction, angle);
        if let Some(next) = try_step(entity.position, turned, grid, config) {
            entity.position = next;
            if turned != Vec3::ZERO {
                entity.facing = turned;
            }
            return;
        }
    }

    debug!("{} is blocked while chasing", entity);
    entity.face_towards(target_position);
}

fn wander(entity: &mut Entity, ctx: &mut TickContext<'_>) {
    entity.state = BehaviorState::Wandering;
    let choice = WANDER_MOVES[ctx.rng.gen_range(0..WANDER_MOVES.len())];
    let Some(direction) = choice else {
        return;
    };

    let destination = ctx.grid.world_to_grid(entity.position).step(direction);
    if !ctx.grid.is_floor(destination) {
        return;
    }
    let mut center = ctx.grid.grid_to_world(destination);
    center.y = entity.position.y;
    let heading = planar_direction(entity.position, center);
    entity.face_towards(center);
    entity.position += heading * ctx.config.move_speed;
}
