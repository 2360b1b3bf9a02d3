//! # Generation Module
//!
//! Procedural map generation.
//!
//! Every map generator implements `MapGenerator` and returns a
//! `GenerationResult`: a full tile grid, the rooms it placed (if any), the
//! walkable positions and an optional biome layer. Generators are looked up
//! by name through the `GeneratorRegistry`. The garrison floor graph builder
//! lives here as well, since it shares the room-type vocabulary with the
//! tactical generators.

pub mod bsp;
pub mod cave;
pub mod garrison_dag;
pub mod helpers;
pub mod hybrid;
pub mod noise;
pub mod overworld;
pub mod perlin_biome;
pub mod registry;
pub mod rooms_corridors;
pub mod wavelet;

pub use bsp::*;
pub use cave::*;
pub use garrison_dag::*;
pub use hybrid::*;
pub use self::noise::*;
pub use overworld::*;
pub use perlin_biome::*;
pub use registry::*;
pub use rooms_corridors::*;
pub use wavelet::*;

use crate::game::Position;
use crate::map::{Biome, Tile, TileImageSet};
use crate::{config, GarrisonError, GarrisonResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Configuration for building a map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Map width in tiles
    pub width: i32,
    /// Map height in tiles
    pub height: i32,
    /// Registry name of the generator to use
    pub generator: String,
}

impl GenerationConfig {
    /// Creates a full-size configuration using the default generator.
    ///
    /// # Examples
    ///
    /// ```
    /// use garrison::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert_eq!(config.generator, "rooms_corridors");
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: config::DEFAULT_MAP_WIDTH,
            height: config::DEFAULT_MAP_HEIGHT,
            generator: DEFAULT_GENERATOR.to_string(),
        }
    }

    /// Creates a configuration for testing with smaller maps.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            width: 60,
            height: 40,
            generator: DEFAULT_GENERATOR.to_string(),
        }
    }

    /// Returns a copy using a different generator.
    pub fn with_generator(mut self, name: impl Into<String>) -> Self {
        self.generator = name.into();
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Axis-aligned rectangle used for rooms and points of interest.
///
/// `x2`/`y2` are exclusive of the carved interior: a room carves
/// `x1+1..x2` by `y1+1..y2`, leaving the `x1`/`y1` edge as wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Room {
    /// Creates a room from its top-left corner and size.
    ///
    /// # Examples
    ///
    /// ```
    /// use garrison::{Room, Position};
    ///
    /// let room = Room::new(5, 5, 10, 8);
    /// assert_eq!(room.x2, 15);
    /// assert_eq!(room.center(), Position::new(10, 9));
    /// ```
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y + height,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Gets the center position of the room.
    pub fn center(&self) -> Position {
        Position::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// Inclusive intersection test; rooms that share an edge intersect.
    pub fn intersects(&self, other: &Room) -> bool {
        self.x1 <= other.x2 && self.x2 >= other.x1 && self.y1 <= other.y2 && self.y2 >= other.y1
    }

    /// Checks if a position lies within the room bounds.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x1 && pos.x <= self.x2 && pos.y >= self.y1 && pos.y <= self.y2
    }

    /// Gets all floor positions carved for this room.
    pub fn floor_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for y in (self.y1 + 1)..self.y2 {
            for x in (self.x1 + 1)..self.x2 {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }
}

/// Region a generator guarantees to be walkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnArea {
    pub center: Position,
    pub radius: i32,
    /// Circle (Euclidean) when true, square (Chebyshev) otherwise
    pub circular: bool,
}

impl SpawnArea {
    pub fn square(center: Position, radius: i32) -> Self {
        Self {
            center,
            radius,
            circular: false,
        }
    }

    pub fn circle(center: Position, radius: i32) -> Self {
        Self {
            center,
            radius,
            circular: true,
        }
    }

    /// In-bounds, non-border positions covered by the area.
    pub fn positions(&self, width: i32, height: i32) -> Vec<Position> {
        let mut positions = Vec::new();
        for dy in -self.radius..=self.radius {
            for dx in -self.radius..=self.radius {
                if self.circular && dx * dx + dy * dy > self.radius * self.radius {
                    continue;
                }
                let pos = Position::new(self.center.x + dx, self.center.y + dy);
                if pos.x > 0 && pos.x < width - 1 && pos.y > 0 && pos.y < height - 1 {
                    positions.push(pos);
                }
            }
        }
        positions
    }
}

/// The contract every generator returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub width: i32,
    pub height: i32,
    /// Row-major tiles, `width * height` entries
    pub tiles: Vec<Tile>,
    pub rooms: Vec<Room>,
    /// Walkable positions; always a subset of the non-blocked tiles
    pub valid_positions: Vec<Position>,
    /// Per-tile biome, row-major, for biome-aware generators
    pub biome_map: Option<Vec<Biome>>,
    /// Area guaranteed to be walkable for the player spawn
    pub spawn: SpawnArea,
}

impl GenerationResult {
    /// Flat index for an in-bounds coordinate.
    pub fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        if self.in_bounds(x, y) {
            self.tiles.get(self.index(x, y))
        } else {
            None
        }
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).map(|t| t.is_walkable()).unwrap_or(false)
    }

    /// Rebuilds `valid_positions` from the tile grid.
    pub fn rebuild_valid_positions(&mut self) {
        self.valid_positions = self
            .tiles
            .iter()
            .filter(|t| t.is_walkable())
            .map(|t| t.position)
            .collect();
    }
}

/// Capability shared by all map generators.
pub trait MapGenerator: Send + Sync {
    /// Registry key for this generator.
    fn name(&self) -> &'static str;

    /// Short human-readable summary.
    fn description(&self) -> &'static str;

    /// Builds a map. Generation never fails; degenerate layouts are repaired.
    fn generate(
        &self,
        width: i32,
        height: i32,
        images: &TileImageSet,
        rng: &mut StdRng,
    ) -> GenerationResult;

    /// Validates that the generated content meets requirements.
    fn validate(&self, result: &GenerationResult) -> GarrisonResult<()> {
        utils::validate_result(result)
    }
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use rand::SeedableRng;
    use std::collections::{HashSet, VecDeque};

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Number of walkable tiles reachable from `start` with 4-way moves.
    pub fn reachable_from(result: &GenerationResult, start: Position) -> HashSet<Position> {
        let mut visited = HashSet::new();
        if !result.is_walkable(start.x, start.y) {
            return visited;
        }

        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(pos) = queue.pop_front() {
            for next in pos.cardinal_adjacent_positions() {
                if !visited.contains(&next) && result.is_walkable(next.x, next.y) {
                    visited.insert(next);
                    queue.push_back(next);
                }
            }
        }

        visited
    }

    /// Validates the structural guarantees of a generation result.
    pub fn validate_result(result: &GenerationResult) -> GarrisonResult<()> {
        let expected = (result.width * result.height) as usize;
        if result.tiles.len() != expected {
            return Err(GarrisonError::GenerationFailed(format!(
                "expected {} tiles, found {}",
                expected,
                result.tiles.len()
            )));
        }

        for pos in &result.valid_positions {
            if !result.is_walkable(pos.x, pos.y) {
                return Err(GarrisonError::GenerationFailed(format!(
                    "valid position ({}, {}) is blocked",
                    pos.x, pos.y
                )));
            }
        }

        let walkable: Vec<Position> = result
            .tiles
            .iter()
            .filter(|t| t.is_walkable())
            .map(|t| t.position)
            .collect();

        let Some(first) = walkable.first() else {
            return Err(GarrisonError::GenerationFailed(
                "map has no walkable tiles".to_string(),
            ));
        };

        let reached = reachable_from(result, *first);
        if reached.len() != walkable.len() {
            return Err(GarrisonError::GenerationFailed(format!(
                "{} of {} walkable tiles are disconnected",
                walkable.len() - reached.len(),
                walkable.len()
            )));
        }

        for pos in result.spawn.positions(result.width, result.height) {
            if !result.is_walkable(pos.x, pos.y) {
                return Err(GarrisonError::GenerationFailed(format!(
                    "spawn tile ({}, {}) is blocked",
                    pos.x, pos.y
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.width, config::DEFAULT_MAP_WIDTH);
        let small = GenerationConfig::for_testing(1).with_generator("bsp");
        assert_eq!(small.generator, "bsp");
        assert!(small.width < config.width);
    }

    #[test]
    fn test_room_geometry() {
        let room = Room::new(5, 5, 10, 8);
        assert_eq!(room.width(), 10);
        assert_eq!(room.height(), 8);
        assert_eq!(room.center(), Position::new(10, 9));
        assert!(room.contains(Position::new(15, 13)));
        assert!(!room.contains(Position::new(16, 13)));
    }

    #[test]
    fn test_room_intersection_is_inclusive() {
        let a = Room::new(0, 0, 5, 5);
        let touching = Room::new(5, 0, 5, 5);
        let apart = Room::new(6, 0, 5, 5);
        assert!(a.intersects(&touching));
        assert!(touching.intersects(&a));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn test_room_floor_positions() {
        let room = Room::new(2, 2, 4, 4);
        let floors = room.floor_positions();
        // Interior spans x1+1..x2 and y1+1..y2
        assert_eq!(floors.len(), 9);
        assert!(floors.contains(&Position::new(3, 3)));
        assert!(floors.contains(&Position::new(5, 5)));
        assert!(!floors.contains(&Position::new(2, 2)));
    }

    #[test]
    fn test_spawn_area_shapes() {
        let square = SpawnArea::square(Position::new(10, 10), 2);
        assert_eq!(square.positions(40, 40).len(), 25);

        let circle = SpawnArea::circle(Position::new(10, 10), 2);
        assert_eq!(circle.positions(40, 40).len(), 13);

        // Border rows and columns are never part of the area
        let edge = SpawnArea::square(Position::new(1, 1), 3);
        assert!(edge.positions(40, 40).iter().all(|p| p.x > 0 && p.y > 0));
    }
}
