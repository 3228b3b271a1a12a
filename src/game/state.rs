//! # Simulation State
//!
//! The [`Simulation`] owns the dungeon grid and the entity roster and
//! advances them one fixed tick at a time.
//!
//! A tick runs in three phases:
//! 1. dead monsters whose respawn delay has elapsed are revived at fresh
//!    spawn points
//! 2. every live entity runs its behavior in roster order
//! 3. the tick's events are folded into [`GameStatistics`] and the
//!    completion state is refreshed
//!
//! Presentation is decoupled through [`GameEvent`]s, which accumulate until
//! they are drained or forwarded to a [`Presenter`].

use crate::config::ENTITY_ELEVATION;
use crate::game::behavior::{self, TickContext};
use crate::generation::{utils, GenerationConfig, Generator, TunnelGenerator};
use crate::{
    DelveError, DelveResult, Entity, EntityId, EntitySnapshot, GameEvent, Grid, Presenter,
    SimulationConfig, Team,
};
use glam::Vec3;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Running tallies of what happened during a simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Attacks that landed
    pub attacks: u32,
    /// Total damage actually taken by all entities
    pub damage_dealt: u64,
    /// Monsters that died
    pub monsters_slain: u32,
    /// Number of times the player died
    pub player_deaths: u32,
    /// Monsters brought back after their respawn delay
    pub respawns: u32,
    /// Stuck recoveries that moved an entity
    pub teleports: u32,
}

impl GameStatistics {
    /// Creates new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on a game event.
    pub fn update_from_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Attacked { .. } => {
                self.attacks += 1;
            }
            GameEvent::Damaged { amount, .. } => {
                self.damage_dealt += *amount as u64;
            }
            GameEvent::Died { team, .. } => match team {
                Team::Player => self.player_deaths += 1,
                Team::Monster => self.monsters_slain += 1,
            },
            GameEvent::Respawned { .. } => {
                self.respawns += 1;
            }
            GameEvent::Teleported { .. } => {
                self.teleports += 1;
            }
            _ => {}
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    /// The player is still alive
    Playing,
    /// The player died; this is terminal
    PlayerDied,
}

/// Serializable end-of-run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub ticks: u64,
    pub seconds: f64,
    pub completion_state: GameCompletionState,
    pub player_health: Option<u32>,
    pub live_monsters: usize,
    pub floor_tiles: usize,
    pub statistics: GameStatistics,
}

/// The running simulation: grid, roster, clock and event stream.
#[derive(Debug, Clone)]
pub struct Simulation {
    grid: Grid,
    roster: Vec<Entity>,
    player_id: Option<EntityId>,
    tick: u64,
    config: SimulationConfig,
    rng: StdRng,
    events: Vec<GameEvent>,
    /// Tallies folded from the event stream
    pub statistics: GameStatistics,
    /// Whether the run is still going
    pub completion_state: GameCompletionState,
}

impl Simulation {
    /// Generates a dungeon and spawns the player plus `monster_count` monsters.
    ///
    /// The generation seed drives every later random decision as well, so
    /// two simulations built from equal configs play out identically.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{GenerationConfig, Simulation, SimulationConfig};
    ///
    /// let mut sim = Simulation::new(&GenerationConfig::for_testing(3), SimulationConfig::new())
    ///     .unwrap();
    /// assert_eq!(sim.entities().len(), 1 + SimulationConfig::new().monster_count);
    /// sim.step();
    /// assert_eq!(sim.tick(), 1);
    /// ```
    pub fn new(generation: &GenerationConfig, config: SimulationConfig) -> DelveResult<Self> {
        let generation = generation.clone().normalized();
        let mut rng = utils::create_rng(&generation);
        let layout = TunnelGenerator::new().generate(&generation, &mut rng)?;

        let mut simulation = Self::from_parts(layout.grid, config, rng);
        simulation.spawn_entity(Team::Player);
        for _ in 0..simulation.config.monster_count {
            simulation.spawn_entity(Team::Monster);
        }
        Ok(simulation)
    }

    /// Wraps an existing grid with an empty roster.
    pub fn with_grid(grid: Grid, config: SimulationConfig, seed: u64) -> Self {
        Self::from_parts(grid, config, StdRng::seed_from_u64(seed))
    }

    fn from_parts(grid: Grid, config: SimulationConfig, rng: StdRng) -> Self {
        Self {
            grid,
            roster: Vec::new(),
            player_id: None,
            tick: 0,
            config: config.normalized(),
            rng,
            events: Vec::new(),
            statistics: GameStatistics::new(),
            completion_state: GameCompletionState::Playing,
        }
    }

    /// Adds an entity at an explicit world position and returns its id.
    ///
    /// The first player added becomes the simulation's player.
    pub fn add_entity(&mut self, team: Team, position: Vec3) -> EntityId {
        let id = EntityId(self.roster.len() as u32);
        let entity = Entity::new(id, team, position, &self.config);
        info!("Spawned {} at {:?}", entity, position);
        self.roster.push(entity);
        if team == Team::Player && self.player_id.is_none() {
            self.player_id = Some(id);
        }
        self.events.push(GameEvent::Spawned {
            entity_id: id,
            team,
            position,
        });
        id
    }

    /// Adds an entity at a random floor cell.
    ///
    /// Falls back to the world origin when spawn sampling fails.
    pub fn spawn_entity(&mut self, team: Team) -> EntityId {
        let id = EntityId(self.roster.len() as u32);
        let position = self.spawn_position(id);
        self.add_entity(team, position)
    }

    fn spawn_position(&mut self, id: EntityId) -> Vec3 {
        match self.grid.find_valid_spawn(&mut self.rng) {
            Ok(position) => position,
            Err(e) => {
                let fallback = Vec3::new(0.0, ENTITY_ELEVATION, 0.0);
                warn!("{}; placing entity {} at {:?}", e, id, fallback);
                self.events.push(GameEvent::SpawnFallback {
                    entity_id: id,
                    position: fallback,
                });
                fallback
            }
        }
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) {
        self.tick += 1;
        let first_event = self.events.len();
        let now = self.time();

        self.process_revivals(now);

        let mut ctx = TickContext {
            grid: &self.grid,
            config: &self.config,
            rng: &mut self.rng,
            events: &mut self.events,
            tick: self.tick,
            now,
        };
        for index in 0..self.roster.len() {
            behavior::update_entity(&mut self.roster, index, &mut ctx);
        }

        self.record_events(first_event);
    }

    /// Runs up to `ticks` ticks, stopping early when the player dies.
    ///
    /// Returns the number of ticks actually run. Events are not drained
    /// here; long headless runs should call [`drain_events`](Self::drain_events)
    /// or [`present`](Self::present) between batches to bound the buffer.
    pub fn run(&mut self, ticks: u64) -> u64 {
        let mut ran = 0;
        while ran < ticks && !self.is_finished() {
            self.step();
            ran += 1;
        }
        ran
    }

    fn process_revivals(&mut self, now: f64) {
        for index in 0..self.roster.len() {
            if !self.roster[index].revival_due(self.tick) {
                continue;
            }
            let id = self.roster[index].id;
            let position = self.spawn_position(id);
            let entity = &mut self.roster[index];
            entity.revive(position, now);
            info!("{} respawned at {:?}", entity, position);
            self.events.push(GameEvent::Respawned {
                entity_id: id,
                position,
            });
        }
    }

    /// Deals damage to an entity outside of the behavior loop.
    ///
    /// Runs the same death handling as an attack. Returns the damage taken.
    pub fn apply_damage(
        &mut self,
        target: EntityId,
        amount: u32,
        source: Option<EntityId>,
    ) -> DelveResult<u32> {
        let index =
            behavior::find_index(&self.roster, target).ok_or(DelveError::UnknownEntity(target))?;
        let first_event = self.events.len();
        let now = self.time();
        let mut ctx = TickContext {
            grid: &self.grid,
            config: &self.config,
            rng: &mut self.rng,
            events: &mut self.events,
            tick: self.tick,
            now,
        };
        let taken = behavior::deal_damage(&mut self.roster, index, amount, source, &mut ctx);
        self.record_events(first_event);
        Ok(taken)
    }

    fn record_events(&mut self, first_event: usize) {
        for event in &self.events[first_event..] {
            self.statistics.update_from_event(event);
        }
        if self.completion_state == GameCompletionState::Playing
            && self.player_id.is_some()
            && !self.is_player_alive()
        {
            info!("Player died at tick {}", self.tick);
            self.completion_state = GameCompletionState::PlayerDied;
        }
    }

    /// Forwards pending events to a presenter and re-places every live entity.
    ///
    /// Pending events are consumed.
    pub fn present<P: Presenter>(&mut self, presenter: &mut P) {
        for event in self.events.drain(..) {
            match event {
                GameEvent::Died { entity_id, .. } => presenter.remove(entity_id),
                GameEvent::Damaged {
                    entity_id,
                    position,
                    amount,
                    health_fraction,
                    ..
                } => {
                    presenter.health_changed(entity_id, health_fraction);
                    presenter.damage_number(position, amount);
                }
                GameEvent::Respawned { entity_id, .. } => presenter.health_changed(entity_id, 1.0),
                _ => {}
            }
        }
        for entity in self.roster.iter().filter(|entity| entity.is_alive()) {
            presenter.place(entity.id, entity.team, entity.position);
        }
    }

    /// Current tick number; 0 before the first step.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.tick as f64 / self.config.tick_rate as f64
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The whole roster, dead entities included.
    pub fn entities(&self) -> &[Entity] {
        &self.roster
    }

    /// Entities currently taking part in the simulation.
    pub fn live_entities(&self) -> impl Iterator<Item = &Entity> {
        self.roster.iter().filter(|entity| entity.is_alive())
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        let index = behavior::find_index(&self.roster, id)?;
        self.roster.get(index)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let index = behavior::find_index(&self.roster, id)?;
        self.roster.get_mut(index)
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player_id
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_id.and_then(|id| self.entity(id))
    }

    pub fn is_player_alive(&self) -> bool {
        self.player().is_some_and(Entity::is_alive)
    }

    /// Whether the run has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.completion_state != GameCompletionState::Playing
    }

    /// Snapshots of all live entities in roster order.
    pub fn snapshots(&self) -> Vec<EntitySnapshot> {
        self.live_entities().map(Entity::snapshot).collect()
    }

    /// Events emitted since the last drain.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            ticks: self.tick,
            seconds: self.time(),
            completion_state: self.completion_state,
            player_health: self.player().map(|player| player.health),
            live_monsters: self
                .live_entities()
                .filter(|entity| entity.team == Team::Monster)
                .count(),
            floor_tiles: self.grid.floor_count(),
            statistics: self.statistics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BehaviorState, Position};

    fn open_grid() -> Grid {
        Grid::from_rows(&[
            "##########",
            "#........#",
            "#........#",
            "#........#",
            "#........#",
            "##########",
        ])
    }

    #[derive(Default)]
    struct RecordingPresenter {
        placed: Vec<EntityId>,
        removed: Vec<EntityId>,
        damage: Vec<u32>,
    }

    impl Presenter for RecordingPresenter {
        fn place(&mut self, entity_id: EntityId, _team: Team, _position: Vec3) {
            self.placed.push(entity_id);
        }

        fn remove(&mut self, entity_id: EntityId) {
            self.removed.push(entity_id);
        }

        fn damage_number(&mut self, _position: Vec3, amount: u32) {
            self.damage.push(amount);
        }
    }

    #[test]
    fn test_new_spawns_roster_on_floor() {
        let sim = Simulation::new(&GenerationConfig::for_testing(11), SimulationConfig::new())
            .unwrap();
        assert_eq!(sim.entities().len(), 6);
        assert_eq!(sim.player_id(), Some(EntityId(0)));
        for entity in sim.entities() {
            assert!(sim.grid().is_floor_at(entity.position));
            assert_eq!(entity.position.y, ENTITY_ELEVATION);
        }
        assert_eq!(
            sim.entities().iter().filter(|e| e.team == Team::Monster).count(),
            5
        );
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = Simulation::new(&GenerationConfig::for_testing(5), SimulationConfig::new())
            .unwrap();
        let mut b = Simulation::new(&GenerationConfig::for_testing(5), SimulationConfig::new())
            .unwrap();
        a.run(300);
        b.run(300);
        assert_eq!(a.grid(), b.grid());
        assert_eq!(a.snapshots(), b.snapshots());
        assert_eq!(a.statistics, b.statistics);
    }

    #[test]
    fn test_spawn_fallback_on_walled_grid() {
        let mut sim = Simulation::with_grid(Grid::new(6, 6), SimulationConfig::new(), 1);
        let id = sim.spawn_entity(Team::Monster);
        let entity = sim.entity(id).unwrap();
        assert_eq!(entity.position, Vec3::new(0.0, ENTITY_ELEVATION, 0.0));
        assert!(sim
            .events()
            .iter()
            .any(|event| matches!(event, GameEvent::SpawnFallback { .. })));
    }

    #[test]
    fn test_monster_respawns_after_delay() {
        let config = SimulationConfig::for_testing();
        let delay = config.seconds_to_ticks(config.respawn_delay);
        let mut sim = Simulation::with_grid(open_grid(), config, 8);
        let monster = sim.spawn_entity(Team::Monster);

        sim.step();
        let death_tick = sim.tick();
        assert_eq!(sim.apply_damage(monster, 1000, None).unwrap(), 100);
        assert_eq!(sim.entity(monster).unwrap().state, BehaviorState::Dead);

        while sim.tick() < death_tick + delay - 1 {
            sim.step();
            assert_eq!(sim.live_entities().count(), 0);
        }
        sim.step();
        let revived = sim.entity(monster).unwrap();
        assert!(revived.is_alive());
        assert_eq!(revived.health, revived.max_health);
        assert!(sim.grid().is_floor_at(revived.position));
        assert_eq!(sim.statistics.respawns, 1);
        assert_eq!(sim.statistics.monsters_slain, 1);
    }

    #[test]
    fn test_player_death_is_terminal() {
        let mut sim = Simulation::with_grid(open_grid(), SimulationConfig::for_testing(), 2);
        let player = sim.spawn_entity(Team::Player);
        sim.apply_damage(player, 5000, None).unwrap();

        assert_eq!(sim.completion_state, GameCompletionState::PlayerDied);
        assert!(sim.is_finished());
        assert_eq!(sim.statistics.player_deaths, 1);

        for _ in 0..600 {
            sim.step();
        }
        assert!(!sim.is_player_alive());
        assert_eq!(sim.run(10), 0);
    }

    #[test]
    fn test_unknown_entity_is_an_error() {
        let mut sim = Simulation::with_grid(open_grid(), SimulationConfig::new(), 2);
        let result = sim.apply_damage(EntityId(9), 1, None);
        assert!(matches!(result, Err(DelveError::UnknownEntity(EntityId(9)))));
    }

    #[test]
    fn test_fight_updates_statistics() {
        let mut sim = Simulation::with_grid(open_grid(), SimulationConfig::new(), 4);
        let grid = sim.grid().clone();
        sim.add_entity(Team::Player, grid.grid_to_world(Position::new(2, 2)));
        sim.add_entity(Team::Monster, grid.grid_to_world(Position::new(7, 3)));

        // One kill needs ten hits a second apart
        sim.run(60 * 12);

        assert!(sim.statistics.attacks >= 10);
        assert!(sim.statistics.monsters_slain >= 1);
        assert_eq!(
            sim.statistics.damage_dealt,
            sim.events()
                .iter()
                .map(|event| match event {
                    GameEvent::Damaged { amount, .. } => *amount as u64,
                    _ => 0,
                })
                .sum::<u64>()
        );
        assert!(sim.is_player_alive());
    }

    #[test]
    fn test_present_forwards_and_drains() {
        let mut sim = Simulation::with_grid(open_grid(), SimulationConfig::new(), 4);
        let grid = sim.grid().clone();
        let player = sim.add_entity(Team::Player, grid.grid_to_world(Position::new(2, 2)));
        let monster = sim.add_entity(Team::Monster, grid.grid_to_world(Position::new(3, 2)));
        sim.apply_damage(monster, 1000, Some(player)).unwrap();

        let mut presenter = RecordingPresenter::default();
        sim.present(&mut presenter);
        assert_eq!(presenter.removed, vec![monster]);
        assert_eq!(presenter.damage, vec![100]);
        assert_eq!(presenter.placed, vec![player]);
        assert!(sim.events().is_empty());
    }

    #[test]
    fn test_run_keeps_events_until_drained() {
        let mut sim = Simulation::with_grid(open_grid(), SimulationConfig::new(), 4);
        let grid = sim.grid().clone();
        sim.add_entity(Team::Player, grid.grid_to_world(Position::new(2, 2)));
        sim.add_entity(Team::Monster, grid.grid_to_world(Position::new(7, 3)));

        sim.run(120);
        let held = sim.events().len();
        assert!(held > 2);
        assert_eq!(sim.drain_events().len(), held);
        assert!(sim.events().is_empty());

        // Statistics survive the drain
        let attacks = sim.statistics.attacks;
        sim.run(120);
        assert!(sim.statistics.attacks >= attacks);
        assert!(!sim.events().is_empty());
    }

    #[test]
    fn test_summary_reports_roster() {
        let mut sim = Simulation::new(&GenerationConfig::for_testing(9), SimulationConfig::for_testing())
            .unwrap();
        sim.run(30);
        let summary = sim.summary();
        assert_eq!(summary.ticks, 30);
        assert_eq!(summary.completion_state, GameCompletionState::Playing);
        assert!(summary.player_health.is_some());
        assert!(summary.floor_tiles > 0);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"completion_state\":\"Playing\""));
    }
}
