//! # World Grid
//!
//! Wall/floor occupancy of the dungeon and the mapping between grid cells
//! and continuous world coordinates.
//!
//! World space is centered on the grid: cell `(x, y)` covers the square
//! `[(x - w/2) * TILE_SIZE, (x - w/2 + 1) * TILE_SIZE)` on the world x axis and
//! the same on the world z axis for `y`. Entities live on the x/z plane at a
//! fixed elevation.

use crate::config::{ENTITY_ELEVATION, TILE_SIZE};
use crate::{DelveError, DelveResult, Position};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Occupancy of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Wall,
    Floor,
}

impl TileType {
    /// Whether entities may stand on this tile.
    pub fn is_passable(self) -> bool {
        matches!(self, TileType::Floor)
    }

    /// Character used by text renderings of the grid.
    pub fn glyph(self) -> char {
        match self {
            TileType::Wall => '#',
            TileType::Floor => '.',
        }
    }
}

/// The dungeon occupancy grid.
///
/// Built once by the generator; the simulation only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Width in cells
    pub width: usize,
    /// Height in cells
    pub height: usize,
    tiles: Vec<Vec<TileType>>,
}

impl Grid {
    /// Creates a grid where every cell is a wall.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Grid, Position};
    ///
    /// let grid = Grid::new(10, 8);
    /// assert_eq!(grid.floor_count(), 0);
    /// assert!(!grid.is_floor(Position::new(3, 3)));
    /// ```
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![vec![TileType::Wall; width]; height],
        }
    }

    /// Builds a grid from text rows, `.` for floor and anything else for wall.
    ///
    /// Short rows are padded with walls up to the longest row.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Grid, Position};
    ///
    /// let grid = Grid::from_rows(&["###", "#.#", "###"]);
    /// assert!(grid.is_floor(Position::new(1, 1)));
    /// assert_eq!(grid.floor_count(), 1);
    /// ```
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let mut grid = Self::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '.' {
                    grid.tiles[y][x] = TileType::Floor;
                }
            }
        }
        grid
    }

    /// Checks whether a position lies inside the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Gets the tile at a position, or None outside the grid.
    pub fn get_tile(&self, pos: Position) -> Option<TileType> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.tiles[pos.y as usize][pos.x as usize])
    }

    /// Sets the tile at a position.
    pub fn set_tile(&mut self, pos: Position, tile: TileType) -> DelveResult<()> {
        if !self.in_bounds(pos) {
            return Err(DelveError::OutOfBounds(pos));
        }
        self.tiles[pos.y as usize][pos.x as usize] = tile;
        Ok(())
    }

    /// Whether the cell is inside the grid and is floor.
    pub fn is_floor(&self, pos: Position) -> bool {
        self.get_tile(pos).map(TileType::is_passable).unwrap_or(false)
    }

    /// Number of floor cells.
    pub fn floor_count(&self) -> usize {
        self.tiles
            .iter()
            .flat_map(|row| row.iter())
            .filter(|tile| tile.is_passable())
            .count()
    }

    /// All floor cells in row-major order.
    pub fn floor_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                if tile.is_passable() {
                    positions.push(Position::new(x as i32, y as i32));
                }
            }
        }
        positions
    }

    /// Current occupancy as rows of `true` for floor, for presentation layers.
    pub fn occupancy(&self) -> Vec<Vec<bool>> {
        self.tiles
            .iter()
            .map(|row| row.iter().map(|tile| tile.is_passable()).collect())
            .collect()
    }

    /// Maps a world position to the grid cell containing it.
    ///
    /// Positions outside the grid are clamped onto the nearest border cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Grid, Position};
    /// use glam::Vec3;
    ///
    /// let grid = Grid::new(10, 10);
    /// assert_eq!(grid.world_to_grid(Vec3::new(0.5, 1.0, 0.5)), Position::new(5, 5));
    /// assert_eq!(grid.world_to_grid(Vec3::new(-500.0, 1.0, 500.0)), Position::new(0, 9));
    /// ```
    pub fn world_to_grid(&self, pos: Vec3) -> Position {
        let grid_x = (pos.x / TILE_SIZE + self.width as f32 / 2.0).floor();
        let grid_y = (pos.z / TILE_SIZE + self.height as f32 / 2.0).floor();
        let max_x = self.width.saturating_sub(1) as f32;
        let max_y = self.height.saturating_sub(1) as f32;
        Position::new(
            grid_x.clamp(0.0, max_x) as i32,
            grid_y.clamp(0.0, max_y) as i32,
        )
    }

    /// Maps a grid cell to the world position of its center, at entity elevation.
    pub fn grid_to_world(&self, cell: Position) -> Vec3 {
        let world_x = (cell.x as f32 - self.width as f32 / 2.0 + 0.5) * TILE_SIZE;
        let world_z = (cell.y as f32 - self.height as f32 / 2.0 + 0.5) * TILE_SIZE;
        Vec3::new(world_x, ENTITY_ELEVATION, world_z)
    }

    /// Whether the cell under a world position is floor.
    pub fn is_floor_at(&self, pos: Vec3) -> bool {
        self.is_floor(self.world_to_grid(pos))
    }

    /// Samples random cells and returns the world center of the first floor cell.
    ///
    /// Makes `width * height` attempts before giving up with
    /// [`DelveError::NoValidSpawn`].
    pub fn find_valid_spawn(&self, rng: &mut StdRng) -> DelveResult<Vec3> {
        let attempts = self.width * self.height;
        if attempts == 0 {
            return Err(DelveError::NoValidSpawn { attempts });
        }
        for _ in 0..attempts {
            let cell = Position::new(
                rng.gen_range(0..self.width) as i32,
                rng.gen_range(0..self.height) as i32,
            );
            if self.is_floor(cell) {
                return Ok(self.grid_to_world(cell));
            }
        }
        Err(DelveError::NoValidSpawn { attempts })
    }

    /// Finds the floor cell closest to `origin` within a Chebyshev radius.
    ///
    /// Rings are scanned outward from radius 0; the first ring holding any
    /// floor cell wins. Inside a ring the smallest squared offset wins, and
    /// scan order breaks remaining ties.
    pub fn nearest_floor(&self, origin: Position, max_radius: i32) -> Option<Position> {
        for radius in 0..=max_radius.max(0) {
            let mut best: Option<(i32, Position)> = None;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    // Interior cells belong to smaller rings
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let cell = Position::new(origin.x + dx, origin.y + dy);
                    if !self.is_floor(cell) {
                        continue;
                    }
                    let dist_sq = dx * dx + dy * dy;
                    if best.map_or(true, |(best_sq, _)| dist_sq < best_sq) {
                        best = Some((dist_sq, cell));
                    }
                }
            }
            if let Some((_, cell)) = best {
                return Some(cell);
            }
        }
        None
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.tiles {
            let line: String = row.iter().map(|tile| tile.glyph()).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
