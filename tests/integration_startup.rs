//! Integration test to ensure a simulation can start up without errors.

use delve::{
    config, DelveResult, GameCompletionState, GenerationConfig, Grid, Position, Simulation,
    SimulationConfig, Team,
};

#[test]
fn test_basic_startup() -> DelveResult<()> {
    let simulation = Simulation::new(&GenerationConfig::new(12345), SimulationConfig::new())?;

    assert_eq!(simulation.tick(), 0);
    assert_eq!(simulation.completion_state, GameCompletionState::Playing);
    assert!(simulation.is_player_alive());

    let player = simulation.player().expect("player spawned");
    assert_eq!(player.team, Team::Player);
    assert_eq!(player.health, config::PLAYER_MAX_HEALTH);
    assert!(simulation.grid().is_floor_at(player.position));

    let monsters = simulation
        .entities()
        .iter()
        .filter(|entity| entity.team == Team::Monster)
        .count();
    assert_eq!(monsters, config::DEFAULT_MONSTER_COUNT);
    Ok(())
}

#[test]
fn test_simulation_on_hand_made_grid() {
    let grid = Grid::from_rows(&[
        "##########",
        "#........#",
        "#........#",
        "#........#",
        "##########",
    ]);
    let mut simulation = Simulation::with_grid(grid, SimulationConfig::for_testing(), 3);
    let player = simulation.spawn_entity(Team::Player);
    simulation.spawn_entity(Team::Monster);

    assert_eq!(simulation.player_id(), Some(player));
    for _ in 0..120 {
        simulation.step();
    }
    assert_eq!(simulation.tick(), 120);
    assert!((simulation.time() - 2.0).abs() < 1e-9);
    for entity in simulation.live_entities() {
        assert!(simulation.grid().is_floor_at(entity.position));
    }
}

#[test]
fn test_config_file_shape() -> DelveResult<()> {
    let json = r#"{
        "seed": 5,
        "width": 24,
        "height": 20,
        "max_tunnels": 30
    }"#;
    let generation: GenerationConfig = serde_json::from_str(json)?;
    let simulation: SimulationConfig = serde_json::from_str(r#"{"monster_count": 1}"#)?;
    let sim = Simulation::new(&generation, simulation)?;

    assert_eq!(sim.grid().width, 24);
    assert_eq!(sim.grid().height, 20);
    assert_eq!(sim.entities().len(), 2);
    assert!(!sim.grid().is_floor(Position::new(0, 0)));
    Ok(())
}
