//! Scenario tests for the behavior loop driven through the public simulation API.

use delve::{
    BehaviorState, DelveResult, EntityId, GameEvent, GenerationConfig, Grid, Position,
    Simulation, SimulationConfig, Team,
};

fn arena() -> Grid {
    Grid::from_rows(&[
        "############",
        "#..........#",
        "#..........#",
        "#..........#",
        "#..........#",
        "#..........#",
        "############",
    ])
}

#[test]
fn test_long_run_invariants() -> DelveResult<()> {
    for seed in [1, 7, 42] {
        let mut simulation = Simulation::new(
            &GenerationConfig::for_testing(seed),
            SimulationConfig {
                monster_count: 8,
                ..SimulationConfig::for_testing()
            },
        )?;

        let mut previous = simulation.entities().to_vec();
        for _ in 0..3000 {
            simulation.step();

            for (entity, before) in simulation.entities().iter().zip(&previous) {
                assert!(entity.health <= entity.max_health);
                if !entity.is_alive() {
                    assert_eq!(entity.state, BehaviorState::Dead);
                    assert!(entity.target.is_none());
                    // Corpses do not move
                    if !before.is_alive() && before.revive_at_tick == entity.revive_at_tick {
                        assert_eq!(entity.position, before.position);
                    }
                }

                // Nobody keeps a dead target past the tick that killed it
                if let Some(target) = entity.target {
                    let target = simulation.entity(target).expect("target in roster");
                    assert!(target.is_alive(), "{} targets dead {}", entity, target);
                }
            }
            previous = simulation.entities().to_vec();

            if simulation.is_finished() {
                assert!(!simulation.is_player_alive());
                break;
            }
        }
    }
    Ok(())
}

#[test]
fn test_kill_clears_all_attackers_in_same_tick() {
    let grid = arena();
    let mut simulation = Simulation::with_grid(grid.clone(), SimulationConfig::new(), 5);
    let player = simulation.add_entity(Team::Player, grid.grid_to_world(Position::new(5, 3)));
    let first = simulation.add_entity(Team::Monster, grid.grid_to_world(Position::new(6, 3)));
    let second = simulation.add_entity(Team::Monster, grid.grid_to_world(Position::new(4, 3)));

    simulation.step();
    assert_eq!(simulation.entity(first).unwrap().target, Some(player));
    assert_eq!(simulation.entity(second).unwrap().target, Some(player));

    // Leave the player one hit from death
    simulation.entity_mut(player).unwrap().health = 1;
    simulation.drain_events();
    for _ in 0..120 {
        simulation.step();
        if !simulation.is_player_alive() {
            break;
        }
    }

    assert!(!simulation.is_player_alive());
    assert!(simulation.entity(first).unwrap().target.is_none());
    assert!(simulation.entity(second).unwrap().target.is_none());
    let lost: Vec<EntityId> = simulation
        .events()
        .iter()
        .filter_map(|event| match event {
            GameEvent::TargetLost { entity_id } => Some(*entity_id),
            _ => None,
        })
        .collect();
    assert!(lost.contains(&first));
    assert!(lost.contains(&second));
}

#[test]
fn test_respawn_window() {
    let config = SimulationConfig::new();
    let delay = config.seconds_to_ticks(config.respawn_delay);
    let mut simulation = Simulation::with_grid(arena(), config, 11);
    let monster = simulation.spawn_entity(Team::Monster);

    for _ in 0..30 {
        simulation.step();
    }
    let death_tick = simulation.tick();
    simulation.apply_damage(monster, 999, None).unwrap();

    while simulation.tick() < death_tick + delay {
        assert_eq!(simulation.live_entities().count(), 0);
        assert!(simulation.snapshots().is_empty());
        simulation.step();
    }

    assert_eq!(simulation.tick(), death_tick + delay);
    let revived = simulation.entity(monster).unwrap();
    assert!(revived.is_alive());
    assert_eq!(revived.health, revived.max_health);
    assert!(revived.target.is_none());
    assert_eq!(revived.stuck_timer, 0.0);
    assert!(simulation
        .events()
        .iter()
        .any(|event| matches!(event, GameEvent::Respawned { entity_id, .. } if *entity_id == monster)));
}

#[test]
fn test_lone_entity_wanders_forever() {
    let mut simulation = Simulation::with_grid(arena(), SimulationConfig::new(), 21);
    let player = simulation.spawn_entity(Team::Player);
    for _ in 0..1200 {
        simulation.step();
        let entity = simulation.entity(player).unwrap();
        assert!(entity.target.is_none());
        assert_eq!(entity.state, BehaviorState::Wandering);
        assert!(simulation.grid().is_floor_at(entity.position));
    }
}

#[test]
fn test_walled_chase_recovers_by_teleport() {
    // Target sits beyond a wall the chaser cannot slide around
    let grid = Grid::from_rows(&[
        "##########",
        "#........#",
        "##########",
        "##########",
        "#........#",
        "##########",
    ]);
    let mut simulation = Simulation::with_grid(grid.clone(), SimulationConfig::new(), 2);
    let chaser = simulation.add_entity(Team::Monster, grid.grid_to_world(Position::new(4, 4)));
    simulation.add_entity(Team::Player, grid.grid_to_world(Position::new(4, 1)));

    // Out of attack range across the wall
    let range = simulation.config().attack_range;
    let gap = grid.grid_to_world(Position::new(4, 4)).z - grid.grid_to_world(Position::new(4, 1)).z;
    assert!(gap > range);

    let mut teleported = false;
    for _ in 0..300 {
        simulation.step();
        if simulation
            .events()
            .iter()
            .any(|event| matches!(event, GameEvent::Teleported { entity_id, .. } if *entity_id == chaser))
        {
            teleported = true;
            break;
        }
    }
    assert!(teleported);
    let entity = simulation.entity(chaser).unwrap();
    assert_eq!(entity.stuck_timer, 0.0);
    assert!(simulation.grid().is_floor_at(entity.position));
    assert!(simulation.statistics.teleports >= 1);
}
