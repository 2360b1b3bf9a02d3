//! # Rooms and Corridors
//!
//! Classic roguelike layout: random non-overlapping rectangles, each joined
//! to the previously placed room by an L-shaped corridor.

use super::helpers::{
    carve_horizontal_tunnel, carve_room, carve_vertical_tunnel, clear_spawn_tiles, empty_result,
};
use super::{GenerationResult, MapGenerator, Room, SpawnArea};
use crate::game::Position;
use crate::map::TileImageSet;
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tuning for room placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomsCorridorsConfig {
    /// Placement attempts; rejected rooms still consume an attempt
    pub max_rooms: usize,
    pub min_room_size: i32,
    pub max_room_size: i32,
}

impl Default for RoomsCorridorsConfig {
    fn default() -> Self {
        Self {
            max_rooms: 30,
            min_room_size: 6,
            max_room_size: 10,
        }
    }
}

/// Rooms-and-corridors generator.
///
/// # Examples
///
/// ```
/// use garrison::{MapGenerator, RoomsCorridorsGenerator, TileImageSet};
/// use rand::SeedableRng;
///
/// let generator = RoomsCorridorsGenerator::new();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let result = generator.generate(80, 50, &TileImageSet::basic(), &mut rng);
/// assert!(!result.rooms.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoomsCorridorsGenerator {
    config: RoomsCorridorsConfig,
}

impl RoomsCorridorsGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RoomsCorridorsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RoomsCorridorsConfig {
        &self.config
    }

    /// Random room whose top-left corner lies in `1..=map-size-1`.
    fn random_room(&self, width: i32, height: i32, rng: &mut StdRng) -> Option<Room> {
        let min = self.config.min_room_size.max(1);
        let max = self.config.max_room_size.max(min);
        let w = rng.gen_range(min..=max);
        let h = rng.gen_range(min..=max);
        let x_range = width - w - 1;
        let y_range = height - h - 1;
        if x_range < 1 || y_range < 1 {
            return None;
        }
        let x = rng.gen_range(1..=x_range);
        let y = rng.gen_range(1..=y_range);
        Some(Room::new(x, y, w, h))
    }

    fn connect(
        result: &mut GenerationResult,
        a: &Room,
        b: &Room,
        images: &TileImageSet,
        rng: &mut StdRng,
    ) {
        let Position { x: x1, y: y1 } = a.center();
        let Position { x: x2, y: y2 } = b.center();
        if rng.gen_range(1..=2) == 2 {
            carve_horizontal_tunnel(result, x1, x2, y1, images, rng);
            carve_vertical_tunnel(result, y1, y2, x2, images, rng);
        } else {
            carve_vertical_tunnel(result, y1, y2, x1, images, rng);
            carve_horizontal_tunnel(result, x1, x2, y2, images, rng);
        }
    }
}

impl MapGenerator for RoomsCorridorsGenerator {
    fn name(&self) -> &'static str {
        "rooms_corridors"
    }

    fn description(&self) -> &'static str {
        "Classic roguelike: rectangular rooms connected by L-shaped corridors"
    }

    fn generate(
        &self,
        width: i32,
        height: i32,
        images: &TileImageSet,
        rng: &mut StdRng,
    ) -> GenerationResult {
        let mut result = empty_result(width, height, images, rng);

        for _ in 0..self.config.max_rooms {
            let Some(room) = self.random_room(width, height, rng) else {
                continue;
            };
            if result.rooms.iter().any(|other| room.intersects(other)) {
                continue;
            }

            carve_room(&mut result, &room, images, rng);
            if let Some(prev) = result.rooms.last().copied() {
                Self::connect(&mut result, &prev, &room, images, rng);
            }
            result.rooms.push(room);
        }

        let spawn = match result.rooms.first() {
            Some(room) => SpawnArea::square(room.center(), 1),
            None => SpawnArea::square(Position::new(width / 2, height / 2), 2),
        };
        clear_spawn_tiles(&mut result, spawn, images, rng);
        result.rebuild_valid_positions();

        debug!(
            "rooms_corridors: {} rooms, {} walkable tiles",
            result.rooms.len(),
            result.valid_positions.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils;
    use rand::SeedableRng;

    #[test]
    fn test_default_config() {
        let generator = RoomsCorridorsGenerator::new();
        assert_eq!(generator.config().max_rooms, 30);
        assert_eq!(generator.config().min_room_size, 6);
        assert_eq!(generator.config().max_room_size, 10);
    }

    #[test]
    fn test_rooms_never_intersect() {
        let generator = RoomsCorridorsGenerator::new();
        let mut rng = StdRng::seed_from_u64(99);
        let result = generator.generate(100, 80, &TileImageSet::basic(), &mut rng);

        for (i, a) in result.rooms.iter().enumerate() {
            for b in result.rooms.iter().skip(i + 1) {
                assert!(!a.intersects(b));
            }
            assert!(a.x1 >= 1 && a.y1 >= 1);
            assert!(a.x2 < 100 && a.y2 < 80);
        }
    }

    #[test]
    fn test_generated_map_validates() {
        let generator = RoomsCorridorsGenerator::new();
        let mut rng = StdRng::seed_from_u64(7);
        let result = generator.generate(60, 40, &TileImageSet::basic(), &mut rng);
        assert!(utils::validate_result(&result).is_ok());
        assert_eq!(result.spawn.center, result.rooms[0].center());
    }

    #[test]
    fn test_tiny_map_still_has_spawn() {
        let generator = RoomsCorridorsGenerator::new();
        let mut rng = StdRng::seed_from_u64(1);
        let result = generator.generate(6, 6, &TileImageSet::basic(), &mut rng);
        assert!(result.rooms.is_empty());
        assert!(result.is_walkable(3, 3));
        assert!(utils::validate_result(&result).is_ok());
    }
}
