//! # Map Module
//!
//! Tile grid representation shared by the generators, the renderer and the
//! pathfinder.
//!
//! - `Tile`: one grid cell with its art, blocking flag and entity list
//! - `GameMap`: the generated grid plus rooms, biomes and field of view
//! - `astar`: shortest paths on the grid
//! - `TileRenderer`: fog-of-war aware drawing against a `RenderTarget`

pub mod fov;
pub mod game_map;
pub mod astar;
pub mod renderer;

pub use fov::*;
pub use game_map::*;
pub use self::astar::*;
pub use renderer::*;

use crate::game::{EntityId, Position};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pixel edge length of one tile at scale 1.
pub const TILE_SIZE: i32 = 32;

/// Kind of terrain a tile represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Wall,
    Floor,
    Stairs,
}

/// Terrain biome used for art selection and obstacle density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Biome {
    Grassland,
    Forest,
    Desert,
    Mountain,
    Swamp,
}

impl Biome {
    /// All biomes in declaration order.
    pub const ALL: [Biome; 5] = [
        Biome::Grassland,
        Biome::Forest,
        Biome::Desert,
        Biome::Mountain,
        Biome::Swamp,
    ];

    /// Stable lowercase name, used as the art-set key.
    pub fn name(self) -> &'static str {
        match self {
            Biome::Grassland => "grassland",
            Biome::Forest => "forest",
            Biome::Desert => "desert",
            Biome::Mountain => "mountain",
            Biome::Swamp => "swamp",
        }
    }
}

/// Handle to a tile sprite. The renderer resolves it against its texture atlas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileImage(pub String);

impl TileImage {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

/// Per-channel color scale applied on top of a tile's sprite.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorMatrix {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
    /// Whether the scale should be applied at all
    pub apply: bool,
}

impl ColorMatrix {
    /// Creates an active color scale.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r,
            g,
            b,
            a,
            apply: true,
        }
    }

    /// An empty matrix leaves the sprite untouched.
    pub fn is_empty(&self) -> bool {
        !self.apply
    }
}

/// Entities standing on or lying on a tile, tracked by ID only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileContents {
    pub entity_ids: Vec<EntityId>,
}

/// One cell of the map grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Pixel position of the top-left corner
    pub pixel_x: i32,
    pub pixel_y: i32,
    /// Grid coordinate
    pub position: Position,
    /// Whether movement through the tile is blocked
    pub blocked: bool,
    /// Sprite drawn for this tile
    pub image: TileImage,
    pub tile_type: TileType,
    /// Set once the tile has been inside the field of view
    pub is_revealed: bool,
    pub contents: TileContents,
    pub color_matrix: ColorMatrix,
}

impl Tile {
    /// Creates a blocking wall tile at a grid coordinate.
    pub fn wall(position: Position, image: TileImage) -> Self {
        Self {
            pixel_x: position.x * TILE_SIZE,
            pixel_y: position.y * TILE_SIZE,
            position,
            blocked: true,
            image,
            tile_type: TileType::Wall,
            is_revealed: false,
            contents: TileContents::default(),
            color_matrix: ColorMatrix::default(),
        }
    }

    /// Turns this tile into walkable floor.
    pub fn make_floor(&mut self, image: TileImage) {
        self.blocked = false;
        self.tile_type = TileType::Floor;
        self.image = image;
    }

    /// Turns this tile into a wall.
    pub fn make_wall(&mut self, image: TileImage) {
        self.blocked = true;
        self.tile_type = TileType::Wall;
        self.image = image;
    }

    pub fn is_walkable(&self) -> bool {
        !self.blocked
    }

    pub fn set_color_matrix(&mut self, matrix: ColorMatrix) {
        self.color_matrix = matrix;
    }
}

/// Wall and floor art for one biome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiomeTileSet {
    pub wall_images: Vec<TileImage>,
    pub floor_images: Vec<TileImage>,
}

/// All tile art available to the generators.
///
/// Biome lookups fall back to the default wall/floor lists when a biome has
/// no art of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileImageSet {
    pub wall_images: Vec<TileImage>,
    pub floor_images: Vec<TileImage>,
    pub stairs_down: TileImage,
    pub biome_images: HashMap<Biome, BiomeTileSet>,
}

impl TileImageSet {
    /// Art set with only default wall and floor sprites.
    pub fn basic() -> Self {
        Self {
            wall_images: (0..3).map(|i| TileImage::new(format!("wall_{}", i))).collect(),
            floor_images: (0..3).map(|i| TileImage::new(format!("floor_{}", i))).collect(),
            stairs_down: TileImage::new("stairs_down"),
            biome_images: HashMap::new(),
        }
    }

    /// Art set with default sprites plus one wall/floor pair per biome.
    pub fn with_biomes() -> Self {
        let mut set = Self::basic();
        for biome in Biome::ALL {
            set.biome_images.insert(
                biome,
                BiomeTileSet {
                    wall_images: vec![TileImage::new(format!("{}_wall", biome.name()))],
                    floor_images: vec![TileImage::new(format!("{}_floor", biome.name()))],
                },
            );
        }
        set
    }

    /// Random default wall sprite.
    pub fn random_wall(&self, rng: &mut StdRng) -> TileImage {
        pick_image(&self.wall_images, rng)
    }

    /// Random default floor sprite.
    pub fn random_floor(&self, rng: &mut StdRng) -> TileImage {
        pick_image(&self.floor_images, rng)
    }

    /// Random wall sprite for a biome, falling back to the default walls.
    pub fn biome_wall(&self, biome: Biome, rng: &mut StdRng) -> TileImage {
        match self.biome_images.get(&biome) {
            Some(set) if !set.wall_images.is_empty() => pick_image(&set.wall_images, rng),
            _ => self.random_wall(rng),
        }
    }

    /// Random floor sprite for a biome, falling back to the default floors.
    pub fn biome_floor(&self, biome: Biome, rng: &mut StdRng) -> TileImage {
        match self.biome_images.get(&biome) {
            Some(set) if !set.floor_images.is_empty() => pick_image(&set.floor_images, rng),
            _ => self.random_floor(rng),
        }
    }
}

impl Default for TileImageSet {
    fn default() -> Self {
        Self::with_biomes()
    }
}

fn pick_image(images: &[TileImage], rng: &mut StdRng) -> TileImage {
    if images.is_empty() {
        return TileImage::new("missing");
    }
    images[rng.gen_range(0..images.len())].clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_wall_tile_defaults() {
        let tile = Tile::wall(Position::new(2, 3), TileImage::new("w"));
        assert!(tile.blocked);
        assert_eq!(tile.tile_type, TileType::Wall);
        assert_eq!(tile.pixel_x, 2 * TILE_SIZE);
        assert_eq!(tile.pixel_y, 3 * TILE_SIZE);
        assert!(!tile.is_revealed);
        assert!(tile.contents.entity_ids.is_empty());
    }

    #[test]
    fn test_floor_and_wall_conversion() {
        let mut tile = Tile::wall(Position::new(0, 0), TileImage::new("w"));
        tile.make_floor(TileImage::new("f"));
        assert!(tile.is_walkable());
        assert_eq!(tile.tile_type, TileType::Floor);
        tile.make_wall(TileImage::new("w2"));
        assert!(!tile.is_walkable());
        assert_eq!(tile.image.key(), "w2");
    }

    #[test]
    fn test_biome_art_falls_back_to_default() {
        let mut rng = StdRng::seed_from_u64(1);
        let basic = TileImageSet::basic();
        let wall = basic.biome_wall(Biome::Mountain, &mut rng);
        assert!(basic.wall_images.contains(&wall));

        let full = TileImageSet::with_biomes();
        assert_eq!(full.biome_floor(Biome::Swamp, &mut rng).key(), "swamp_floor");
    }

    #[test]
    fn test_color_matrix_emptiness() {
        assert!(ColorMatrix::default().is_empty());
        assert!(!ColorMatrix::new(1.0, 0.5, 0.5, 1.0).is_empty());
    }
}
