//! # Game Map
//!
//! Owns a generated tile grid together with its rooms, biome layer and the
//! player's field of view.

use super::fov::FieldOfView;
use super::{Biome, ColorMatrix, Tile, TileImageSet, TileType};
use crate::game::{EntityId, Position};
use crate::generation::{GenerationResult, GeneratorRegistry, Room, SpawnArea};
use crate::{GarrisonError, GarrisonResult};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::Rng;

/// A playable map built from a generator's output.
#[derive(Debug, Clone)]
pub struct GameMap {
    pub width: i32,
    pub height: i32,
    /// Row-major tiles, `width * height` entries
    pub tiles: Vec<Tile>,
    pub rooms: Vec<Room>,
    pub valid_positions: Vec<Position>,
    pub biome_map: Option<Vec<Biome>>,
    /// Area the generator guarantees to be walkable
    pub spawn: SpawnArea,
    /// Name of the generator that produced the map
    pub generator: String,
    /// Location of the down stairs, if one was placed
    pub stairs: Option<Position>,
    fov: FieldOfView,
}

impl GameMap {
    /// Generates a map with the named generator, falling back to the default
    /// generator for unknown names, then places the stairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use garrison::{GameMap, TileImageSet};
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(3);
    /// let map = GameMap::new("bsp", 60, 40, &TileImageSet::default(), &mut rng);
    /// assert_eq!(map.generator, "bsp");
    /// assert!(map.stairs.is_some());
    /// ```
    pub fn new(generator: &str, width: i32, height: i32, images: &TileImageSet, rng: &mut StdRng) -> Self {
        Self::with_registry(&GeneratorRegistry::new(), generator, width, height, images, rng)
    }

    /// Same as `new`, using a caller-supplied registry.
    pub fn with_registry(
        registry: &GeneratorRegistry,
        generator: &str,
        width: i32,
        height: i32,
        images: &TileImageSet,
        rng: &mut StdRng,
    ) -> Self {
        let generator = registry.get_or_default(generator);
        let result = generator.generate(width, height, images, rng);
        info!(
            "Generated {}x{} map with '{}' ({} rooms, {} walkable tiles)",
            width,
            height,
            generator.name(),
            result.rooms.len(),
            result.valid_positions.len()
        );
        let mut map = Self::from_result(generator.name(), result);
        map.place_stairs(images, rng);
        map
    }

    /// Wraps a generation result without placing stairs.
    pub fn from_result(generator: &str, result: GenerationResult) -> Self {
        Self {
            width: result.width,
            height: result.height,
            fov: FieldOfView::new(result.width, result.height),
            tiles: result.tiles,
            rooms: result.rooms,
            valid_positions: result.valid_positions,
            biome_map: result.biome_map,
            spawn: result.spawn,
            generator: generator.to_string(),
            stairs: None,
        }
    }

    /// Flat tile index for a coordinate. Does not check bounds.
    pub fn index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Tile at a position.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside the map; check with `in_bounds` first.
    pub fn tile(&self, pos: Position) -> &Tile {
        &self.tiles[self.index(pos)]
    }

    /// Mutable tile at a position.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is outside the map.
    pub fn tile_mut(&mut self, pos: Position) -> &mut Tile {
        let index = self.index(pos);
        &mut self.tiles[index]
    }

    /// Tile at a position, or `None` outside the map.
    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        if self.in_bounds(pos.x, pos.y) {
            self.tiles.get(self.index(pos))
        } else {
            None
        }
    }

    pub fn is_walkable(&self, pos: Position) -> bool {
        self.get_tile(pos).map(|t| t.is_walkable()).unwrap_or(false)
    }

    /// Walls block sight. Everything outside the map does too.
    pub fn is_opaque(&self, x: i32, y: i32) -> bool {
        self.get_tile(Position::new(x, y))
            .map(|t| t.tile_type == TileType::Wall)
            .unwrap_or(true)
    }

    /// Biome of a tile; maps without a biome layer are grassland.
    pub fn biome_at(&self, pos: Position) -> Biome {
        if !self.in_bounds(pos.x, pos.y) {
            return Biome::Grassland;
        }
        self.biome_map
            .as_ref()
            .and_then(|biomes| biomes.get(self.index(pos)).copied())
            .unwrap_or(Biome::Grassland)
    }

    /// Where the player starts: the first room's center, else the map center
    /// if walkable, else the first valid position.
    pub fn starting_position(&self) -> Position {
        if let Some(room) = self.rooms.first() {
            return room.center();
        }
        let center = Position::new(self.width / 2, self.height / 2);
        if self.is_walkable(center) {
            return center;
        }
        self.valid_positions.first().copied().unwrap_or(center)
    }

    /// Turns one tile into the down stairs: the center of a random room
    /// other than the first, else a random valid position.
    pub fn place_stairs(&mut self, images: &TileImageSet, rng: &mut StdRng) -> Option<Position> {
        let pos = if self.rooms.len() > 1 {
            let index = rng.gen_range(1..self.rooms.len());
            self.rooms[index].center()
        } else if !self.valid_positions.is_empty() {
            self.valid_positions[rng.gen_range(0..self.valid_positions.len())]
        } else {
            return None;
        };

        if !self.in_bounds(pos.x, pos.y) {
            return None;
        }
        let tile = self.tile_mut(pos);
        tile.tile_type = TileType::Stairs;
        tile.blocked = false;
        tile.image = images.stairs_down.clone();
        self.stairs = Some(pos);
        debug!("Placed stairs at ({}, {})", pos.x, pos.y);
        Some(pos)
    }

    /// Records an entity as standing on a tile.
    pub fn add_entity_to_tile(&mut self, entity: EntityId, pos: Position) -> GarrisonResult<()> {
        if !self.in_bounds(pos.x, pos.y) {
            return Err(GarrisonError::InvalidAction(format!(
                "position ({}, {}) is outside the map",
                pos.x, pos.y
            )));
        }
        self.tile_mut(pos).contents.entity_ids.push(entity);
        Ok(())
    }

    /// Removes the entity at `index` from a tile's contents and returns it.
    /// The entity itself stays alive in the entity store.
    pub fn remove_item_from_tile(&mut self, index: usize, pos: Position) -> GarrisonResult<EntityId> {
        if !self.in_bounds(pos.x, pos.y) {
            return Err(GarrisonError::InvalidAction(format!(
                "position ({}, {}) is outside the map",
                pos.x, pos.y
            )));
        }
        let ids = &mut self.tile_mut(pos).contents.entity_ids;
        if ids.is_empty() {
            return Err(GarrisonError::InvalidAction("tile has no entities".to_string()));
        }
        if index >= ids.len() {
            return Err(GarrisonError::InvalidAction("index out of range".to_string()));
        }
        Ok(ids.remove(index))
    }

    /// Tints the tiles at the given flat indices; out-of-range indices are ignored.
    pub fn apply_color_matrix(&mut self, indices: &[usize], matrix: ColorMatrix) {
        for &index in indices {
            if let Some(tile) = self.tiles.get_mut(index) {
                tile.set_color_matrix(matrix);
            }
        }
    }

    /// Recomputes the field of view from `origin` and marks visible tiles revealed.
    pub fn update_fov(&mut self, origin: Position, radius: i32) {
        let mut fov = std::mem::replace(&mut self.fov, FieldOfView::new(0, 0));
        fov.compute(origin, radius, |x, y| self.is_opaque(x, y));
        for pos in fov.visible_positions() {
            let index = self.index(pos);
            self.tiles[index].is_revealed = true;
        }
        self.fov = fov;
    }

    pub fn is_visible(&self, pos: Position) -> bool {
        self.fov.is_visible(pos.x, pos.y)
    }

    pub fn fov(&self) -> &FieldOfView {
        &self.fov
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::new_entity_id;
    use rand::SeedableRng;

    fn test_map() -> GameMap {
        let mut rng = StdRng::seed_from_u64(5);
        GameMap::new("rooms_corridors", 60, 40, &TileImageSet::default(), &mut rng)
    }

    #[test]
    fn test_unknown_generator_uses_default() {
        let mut rng = StdRng::seed_from_u64(5);
        let map = GameMap::new("does_not_exist", 40, 30, &TileImageSet::default(), &mut rng);
        assert_eq!(map.generator, "rooms_corridors");
        assert_eq!(map.tiles.len(), 40 * 30);
    }

    #[test]
    fn test_stairs_placed_in_later_room() {
        let map = test_map();
        let stairs = map.stairs.unwrap();
        assert_eq!(map.tile(stairs).tile_type, TileType::Stairs);
        assert!(map.is_walkable(stairs));
        if map.rooms.len() > 1 {
            assert!(map.rooms[1..].iter().any(|r| r.center() == stairs));
        }
    }

    #[test]
    fn test_starting_position_is_walkable() {
        let map = test_map();
        assert!(map.is_walkable(map.starting_position()));
        assert_eq!(map.starting_position(), map.rooms[0].center());
    }

    #[test]
    fn test_tile_contents_track_ids() {
        let mut map = test_map();
        let pos = map.starting_position();
        let a = new_entity_id();
        let b = new_entity_id();
        map.add_entity_to_tile(a, pos).unwrap();
        map.add_entity_to_tile(b, pos).unwrap();

        assert!(map.remove_item_from_tile(5, pos).is_err());
        assert_eq!(map.remove_item_from_tile(0, pos).unwrap(), a);
        assert_eq!(map.tile(pos).contents.entity_ids, vec![b]);
        map.remove_item_from_tile(0, pos).unwrap();
        let err = map.remove_item_from_tile(0, pos).unwrap_err();
        assert_eq!(err.to_string(), "tile has no entities");
    }

    #[test]
    fn test_bounds_and_opacity() {
        let map = test_map();
        assert!(map.in_bounds(0, 0));
        assert!(!map.in_bounds(60, 0));
        assert!(!map.in_bounds(0, -1));
        assert!(map.is_opaque(-1, 5));
        assert!(map.is_opaque(0, 0));
        assert!(!map.is_opaque(map.starting_position().x, map.starting_position().y));
    }

    #[test]
    fn test_biome_defaults_to_grassland() {
        let map = test_map();
        assert!(map.biome_map.is_none());
        assert_eq!(map.biome_at(Position::new(3, 3)), Biome::Grassland);
    }

    #[test]
    fn test_color_matrix_ignores_bad_indices() {
        let mut map = test_map();
        let len = map.tiles.len();
        map.apply_color_matrix(&[0, len, len + 10], ColorMatrix::new(1.0, 0.0, 0.0, 1.0));
        assert!(!map.tiles[0].color_matrix.is_empty());
        assert!(map.tiles[1].color_matrix.is_empty());
    }

    #[test]
    fn test_fov_reveals_tiles() {
        let mut map = test_map();
        let origin = map.starting_position();
        map.update_fov(origin, 6);
        assert!(map.is_visible(origin));
        assert!(map.tile(origin).is_revealed);
        assert!(!map.is_visible(Position::new(origin.x + 30, origin.y + 30)));
    }
}
