//! # Rendering Module
//!
//! Text presentation of the simulation, used by the headless CLI.
//!
//! [`AsciiRenderer`] is a [`Presenter`]: it keeps a marker for every placed
//! entity, the last reported health fractions and a bounded log of damage
//! numbers, and draws them over the grid as characters.

use crate::{EntityId, EntitySnapshot, Grid, Presenter, Team};
use glam::Vec3;
use std::collections::BTreeMap;

/// Glyph of the player marker.
pub const PLAYER_GLYPH: char = '@';
/// Glyph of a monster marker.
pub const MONSTER_GLYPH: char = 'M';

/// Text presenter drawing entities over the dungeon grid.
#[derive(Debug, Clone)]
pub struct AsciiRenderer {
    markers: BTreeMap<EntityId, (Team, Vec3)>,
    health: BTreeMap<EntityId, f32>,
    /// Recent damage numbers, oldest first
    pub messages: Vec<String>,
    /// Maximum number of messages to keep
    pub max_messages: usize,
}

impl AsciiRenderer {
    /// Creates an empty renderer.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{AsciiRenderer, Grid};
    ///
    /// let renderer = AsciiRenderer::new();
    /// let grid = Grid::from_rows(&["###", "#.#", "###"]);
    /// assert_eq!(renderer.render(&grid), "###\n#.#\n###\n");
    /// ```
    pub fn new() -> Self {
        Self {
            markers: BTreeMap::new(),
            health: BTreeMap::new(),
            messages: Vec::new(),
            max_messages: 20,
        }
    }

    /// Replaces all markers with the given snapshots.
    pub fn sync(&mut self, snapshots: &[EntitySnapshot]) {
        self.markers.clear();
        for snapshot in snapshots.iter().filter(|s| s.is_alive) {
            self.markers
                .insert(snapshot.id, (snapshot.team, snapshot.position));
            self.health.insert(
                snapshot.id,
                snapshot.health as f32 / snapshot.max_health.max(1) as f32,
            );
        }
    }

    /// Number of entities currently placed.
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Last health fraction reported for an entity.
    pub fn health_of(&self, entity_id: EntityId) -> Option<f32> {
        self.health.get(&entity_id).copied()
    }

    /// Adds a message, dropping the oldest past `max_messages`.
    pub fn add_message(&mut self, message: String) {
        self.messages.push(message);
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(..excess);
        }
    }

    /// Draws the grid with entity markers, one line per row.
    ///
    /// Players are drawn over monsters sharing a cell.
    pub fn render(&self, grid: &Grid) -> String {
        let mut rows: Vec<Vec<char>> = grid
            .to_string()
            .lines()
            .map(|line| line.chars().collect())
            .collect();

        let mut markers: Vec<_> = self.markers.values().collect();
        markers.sort_by_key(|(team, _)| *team == Team::Player);
        for (team, position) in markers {
            let cell = grid.world_to_grid(*position);
            let glyph = match team {
                Team::Player => PLAYER_GLYPH,
                Team::Monster => MONSTER_GLYPH,
            };
            if let Some(c) = rows
                .get_mut(cell.y as usize)
                .and_then(|row| row.get_mut(cell.x as usize))
            {
                *c = glyph;
            }
        }

        let mut out = String::with_capacity(grid.width * grid.height + grid.height);
        for row in rows {
            out.extend(row);
            out.push('\n');
        }
        out
    }

    /// One line per placed entity with its health percentage.
    pub fn status_lines(&self) -> Vec<String> {
        self.markers
            .iter()
            .map(|(id, (team, _))| {
                let fraction = self.health.get(id).copied().unwrap_or(1.0);
                format!("{:?}{} {:>3.0}%", team, id, fraction * 100.0)
            })
            .collect()
    }
}

impl Default for AsciiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for AsciiRenderer {
    fn place(&mut self, entity_id: EntityId, team: Team, position: Vec3) {
        self.markers.insert(entity_id, (team, position));
    }

    fn remove(&mut self, entity_id: EntityId) {
        self.markers.remove(&entity_id);
    }

    fn health_changed(&mut self, entity_id: EntityId, fraction: f32) {
        self.health.insert(entity_id, fraction);
    }

    fn damage_number(&mut self, position: Vec3, amount: u32) {
        self.add_message(format!("-{} at ({:.1}, {:.1})", amount, position.x, position.z));
    }
}
