//! # Generation Helpers
//!
//! Carving primitives for the room-based generators and a boolean
//! `TerrainMap` used by the noise and cellular-automata generators.

use super::{GenerationResult, Room, SpawnArea};
use crate::game::Position;
use crate::map::{Biome, Tile, TileImageSet};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::VecDeque;

/// Row-major index for a coordinate.
pub fn position_to_index(x: i32, y: i32, width: i32) -> usize {
    (y * width + x) as usize
}

/// A full grid of wall tiles with random wall art.
pub fn create_empty_tiles(
    width: i32,
    height: i32,
    images: &TileImageSet,
    rng: &mut StdRng,
) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity((width.max(0) * height.max(0)) as usize);
    for y in 0..height {
        for x in 0..width {
            tiles.push(Tile::wall(Position::new(x, y), images.random_wall(rng)));
        }
    }
    tiles
}

/// An all-wall result with no rooms, ready for carving.
pub fn empty_result(
    width: i32,
    height: i32,
    images: &TileImageSet,
    rng: &mut StdRng,
) -> GenerationResult {
    GenerationResult {
        width,
        height,
        tiles: create_empty_tiles(width, height, images, rng),
        rooms: Vec::new(),
        valid_positions: Vec::new(),
        biome_map: None,
        spawn: SpawnArea::square(Position::new(width / 2, height / 2), 0),
    }
}

fn carve_floor(result: &mut GenerationResult, x: i32, y: i32, images: &TileImageSet, rng: &mut StdRng) {
    if !result.in_bounds(x, y) {
        return;
    }
    let index = result.index(x, y);
    result.tiles[index].make_floor(images.random_floor(rng));
    result.valid_positions.push(Position::new(x, y));
}

/// Carves the room interior, `x1+1..x2` by `y1+1..y2`.
pub fn carve_room(result: &mut GenerationResult, room: &Room, images: &TileImageSet, rng: &mut StdRng) {
    for y in (room.y1 + 1)..room.y2 {
        for x in (room.x1 + 1)..room.x2 {
            carve_floor(result, x, y, images, rng);
        }
    }
}

/// Carves an inclusive horizontal corridor at row `y`.
pub fn carve_horizontal_tunnel(
    result: &mut GenerationResult,
    x1: i32,
    x2: i32,
    y: i32,
    images: &TileImageSet,
    rng: &mut StdRng,
) {
    for x in x1.min(x2)..=x1.max(x2) {
        carve_floor(result, x, y, images, rng);
    }
}

/// Carves an inclusive vertical corridor at column `x`.
pub fn carve_vertical_tunnel(
    result: &mut GenerationResult,
    y1: i32,
    y2: i32,
    x: i32,
    images: &TileImageSet,
    rng: &mut StdRng,
) {
    for y in y1.min(y2)..=y1.max(y2) {
        carve_floor(result, x, y, images, rng);
    }
}

/// Forces the spawn area to walkable floor on a tile grid.
pub fn clear_spawn_tiles(
    result: &mut GenerationResult,
    spawn: SpawnArea,
    images: &TileImageSet,
    rng: &mut StdRng,
) {
    for pos in spawn.positions(result.width, result.height) {
        let index = result.index(pos.x, pos.y);
        if result.tiles[index].blocked {
            result.tiles[index].make_floor(images.random_floor(rng));
        }
    }
    result.spawn = spawn;
}

/// Elevation and moisture cut-offs for biome classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomeThresholds {
    /// Below this elevation: swamp
    pub water: f64,
    /// Dry tiles above this elevation become mountain
    pub highland: f64,
    /// Above this elevation: mountain
    pub mountain: f64,
    /// Below this moisture: desert (or highland mountain)
    pub dry: f64,
    /// Above this moisture: forest
    pub wet: f64,
}

impl BiomeThresholds {
    /// Classifies a tile.
    ///
    /// Order: swamp (lowest elevation), mountain (highest), forest (wet),
    /// desert or highland mountain (dry), grassland otherwise.
    pub fn classify(&self, elevation: f64, moisture: f64) -> Biome {
        if elevation < self.water {
            return Biome::Swamp;
        }
        if elevation > self.mountain {
            return Biome::Mountain;
        }
        if moisture > self.wet {
            return Biome::Forest;
        }
        if moisture < self.dry {
            if elevation > self.highland {
                return Biome::Mountain;
            }
            return Biome::Desert;
        }
        Biome::Grassland
    }
}

/// How disconnected regions get joined to the main region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelStyle {
    /// L-shaped corridor, horizontal leg first
    Straight,
    /// Biased random walk of the given width
    Organic { width: i32 },
}

/// Walkability grid; `true` is floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainMap {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl TerrainMap {
    pub fn new(width: i32, height: i32, walkable: bool) -> Self {
        Self {
            width,
            height,
            cells: vec![walkable; (width.max(0) * height.max(0)) as usize],
        }
    }

    /// Builds a map by evaluating `f(x, y)` for every cell.
    pub fn from_fn(width: i32, height: i32, mut f: impl FnMut(i32, i32) -> bool) -> Self {
        let mut map = Self::new(width, height, false);
        for y in 0..height {
            for x in 0..width {
                let idx = position_to_index(x, y, width);
                map.cells[idx] = f(x, y);
            }
        }
        map
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Out-of-bounds cells read as walls.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.cells[position_to_index(x, y, self.width)]
    }

    pub fn set(&mut self, x: i32, y: i32, walkable: bool) {
        if self.in_bounds(x, y) {
            let idx = position_to_index(x, y, self.width);
            self.cells[idx] = walkable;
        }
    }

    pub fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    fn coords(&self, idx: usize) -> (i32, i32) {
        (idx as i32 % self.width, idx as i32 / self.width)
    }

    /// Wall count among the 8 neighbors; out of bounds counts as wall.
    pub fn count_wall_neighbors(&self, x: i32, y: i32) -> u32 {
        let mut count = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if !self.is_walkable(x + dx, y + dy) {
                    count += 1;
                }
            }
        }
        count
    }

    /// One cellular-automata pass. `rule(current, wall_neighbors)` returns
    /// the new walkability of a cell; every cell reads the previous state.
    pub fn step(&self, rule: impl Fn(bool, u32) -> bool) -> TerrainMap {
        let mut next = self.clone();
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = position_to_index(x, y, self.width);
                next.cells[idx] = rule(self.cells[idx], self.count_wall_neighbors(x, y));
            }
        }
        next
    }

    /// Turns the outer ring into walls.
    pub fn seal_borders(&mut self) {
        for x in 0..self.width {
            self.set(x, 0, false);
            self.set(x, self.height - 1, false);
        }
        for y in 0..self.height {
            self.set(0, y, false);
            self.set(self.width - 1, y, false);
        }
    }

    /// Forces every cell of the spawn area to floor.
    pub fn clear_spawn(&mut self, spawn: &SpawnArea) {
        for pos in spawn.positions(self.width, self.height) {
            self.set(pos.x, pos.y, true);
        }
    }

    /// Sum of walkable cells in the square of `radius` around a point.
    pub fn openness(&self, cx: i32, cy: i32, radius: i32) -> usize {
        let mut score = 0;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if self.is_walkable(cx + dx, cy + dy) {
                    score += 1;
                }
            }
        }
        score
    }

    /// 4-way flood fill from a walkable cell, marking `visited`.
    fn flood_fill(&self, visited: &mut [bool], start: usize) -> Vec<usize> {
        let mut region = Vec::new();
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back(start);

        while let Some(idx) = queue.pop_front() {
            region.push(idx);
            let (x, y) = self.coords(idx);
            for (dx, dy) in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
                let (nx, ny) = (x + dx, y + dy);
                if !self.in_bounds(nx, ny) {
                    continue;
                }
                let nidx = position_to_index(nx, ny, self.width);
                if !visited[nidx] && self.cells[nidx] {
                    visited[nidx] = true;
                    queue.push_back(nidx);
                }
            }
        }

        region
    }

    /// All 4-connected walkable regions, in scan order.
    pub fn regions(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.cells.len()];
        let mut regions = Vec::new();
        for idx in 0..self.cells.len() {
            if self.cells[idx] && !visited[idx] {
                regions.push(self.flood_fill(&mut visited, idx));
            }
        }
        regions
    }

    /// L-shaped corridor between two cells, horizontal leg first.
    pub fn carve_corridor_between(&mut self, from: usize, to: usize) {
        let (fx, fy) = self.coords(from);
        let (tx, ty) = self.coords(to);
        for x in fx.min(tx)..=fx.max(tx) {
            self.set(x, fy, true);
        }
        for y in fy.min(ty)..=fy.max(ty) {
            self.set(tx, y, true);
        }
    }

    fn carve_brush(&mut self, x: i32, y: i32, width: i32) {
        let half = width / 2;
        for dy in -half..=half {
            for dx in -half..=half {
                let (nx, ny) = (x + dx, y + dy);
                if nx > 0 && nx < self.width - 1 && ny > 0 && ny < self.height - 1 {
                    self.set(nx, ny, true);
                }
            }
        }
    }

    /// Winding tunnel that always makes net progress toward the target.
    ///
    /// Every step moves one cell along the dominant axis, with a random
    /// chance of an extra perpendicular step. Each axis move is carved
    /// separately so the tunnel stays 4-connected at any width. Falls back
    /// to a straight corridor if the walk exceeds `width * height` steps.
    pub fn carve_organic_tunnel(&mut self, from: usize, to: usize, width: i32, rng: &mut StdRng) {
        let (mut x, mut y) = self.coords(from);
        let (tx, ty) = self.coords(to);
        let max_iterations = (self.width * self.height).max(1);
        let mut iterations = 0;

        self.carve_brush(x, y, width);
        self.set(x, y, true);

        while (x != tx || y != ty) && iterations < max_iterations {
            iterations += 1;
            let dx = tx - x;
            let dy = ty - y;
            let step_x = dx.signum();
            let step_y = dy.signum();

            if dx.abs() > dy.abs() {
                x += step_x;
                self.carve_brush(x, y, width);
                self.set(x, y, true);
                let wobble = if step_y != 0 && rng.gen_bool(0.3) {
                    step_y
                } else if step_y == 0 && rng.gen_bool(0.2) {
                    rng.gen_range(-1..=1)
                } else {
                    0
                };
                if wobble != 0 {
                    y = (y + wobble).clamp(1, (self.height - 2).max(1));
                    self.carve_brush(x, y, width);
                    self.set(x, y, true);
                }
            } else {
                y += step_y;
                self.carve_brush(x, y, width);
                self.set(x, y, true);
                let wobble = if step_x != 0 && rng.gen_bool(0.3) {
                    step_x
                } else if step_x == 0 && rng.gen_bool(0.2) {
                    rng.gen_range(-1..=1)
                } else {
                    0
                };
                if wobble != 0 {
                    x = (x + wobble).clamp(1, (self.width - 2).max(1));
                    self.carve_brush(x, y, width);
                    self.set(x, y, true);
                }
            }
        }

        if x != tx || y != ty {
            self.carve_corridor_between(from, to);
        }
    }

    /// Joins every walkable region to the largest one.
    ///
    /// With no walkable cells at all, the middle half of the map is opened
    /// instead.
    pub fn ensure_connectivity(&mut self, style: TunnelStyle, rng: &mut StdRng) {
        let regions = self.regions();
        let Some((largest_idx, _)) = regions
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.len().cmp(&b.1.len()).then(b.0.cmp(&a.0)))
        else {
            for y in (self.height / 4)..(self.height * 3 / 4) {
                for x in (self.width / 4)..(self.width * 3 / 4) {
                    self.set(x, y, true);
                }
            }
            return;
        };

        let largest = regions[largest_idx].clone();
        for (i, region) in regions.iter().enumerate() {
            if i == largest_idx || region.is_empty() {
                continue;
            }
            match style {
                TunnelStyle::Straight => self.carve_corridor_between(largest[0], region[0]),
                TunnelStyle::Organic { width } => {
                    let from = largest[rng.gen_range(0..largest.len())];
                    let to = region[rng.gen_range(0..region.len())];
                    self.carve_organic_tunnel(from, to, width, rng);
                }
            }
        }
    }

    /// Converts the grid into tiles with per-tile biome art.
    ///
    /// Returns the tiles and the biome layer.
    pub fn to_tiles(
        &self,
        images: &TileImageSet,
        rng: &mut StdRng,
        biome_at: impl Fn(i32, i32) -> Biome,
    ) -> (Vec<Tile>, Vec<Biome>) {
        let mut tiles = Vec::with_capacity(self.cells.len());
        let mut biomes = Vec::with_capacity(self.cells.len());
        for y in 0..self.height {
            for x in 0..self.width {
                let biome = biome_at(x, y);
                let pos = Position::new(x, y);
                let mut tile = Tile::wall(pos, images.biome_wall(biome, rng));
                if self.is_walkable(x, y) {
                    tile.make_floor(images.biome_floor(biome, rng));
                }
                tiles.push(tile);
                biomes.push(biome);
            }
        }
        (tiles, biomes)
    }

    /// Final result for terrain-based generators.
    pub fn into_result(
        self,
        images: &TileImageSet,
        rng: &mut StdRng,
        spawn: SpawnArea,
        biome_at: impl Fn(i32, i32) -> Biome,
    ) -> GenerationResult {
        let (tiles, biomes) = self.to_tiles(images, rng, biome_at);
        let mut result = GenerationResult {
            width: self.width,
            height: self.height,
            tiles,
            rooms: Vec::new(),
            valid_positions: Vec::new(),
            biome_map: Some(biomes),
            spawn,
        };
        result.rebuild_valid_positions();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_neighbor_count_treats_outside_as_wall() {
        let map = TerrainMap::new(5, 5, true);
        assert_eq!(map.count_wall_neighbors(2, 2), 0);
        assert_eq!(map.count_wall_neighbors(0, 0), 5);
    }

    #[test]
    fn test_regions_are_four_connected() {
        // Two floor cells touching only diagonally form two regions
        let map = TerrainMap::from_fn(4, 4, |x, y| (x, y) == (1, 1) || (x, y) == (2, 2));
        assert_eq!(map.regions().len(), 2);
    }

    #[test]
    fn test_straight_connectivity_joins_regions() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut map = TerrainMap::from_fn(20, 10, |x, y| {
            (2..5).contains(&x) && (2..5).contains(&y) || (14..18).contains(&x) && (5..8).contains(&y)
        });
        assert_eq!(map.regions().len(), 2);
        map.ensure_connectivity(TunnelStyle::Straight, &mut rng);
        assert_eq!(map.regions().len(), 1);
    }

    #[test]
    fn test_organic_connectivity_joins_regions() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut map = TerrainMap::from_fn(40, 30, |x, y| {
            (x == 3 && y == 3) || (x == 35 && y == 25) || (x == 20 && y == 4)
        });
        map.ensure_connectivity(TunnelStyle::Organic { width: 1 }, &mut rng);
        assert_eq!(map.regions().len(), 1);
    }

    #[test]
    fn test_empty_terrain_opens_center() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut map = TerrainMap::new(8, 8, false);
        map.ensure_connectivity(TunnelStyle::Straight, &mut rng);
        assert_eq!(map.walkable_count(), 16);
        assert!(map.is_walkable(4, 4));
    }

    #[test]
    fn test_seal_and_spawn_clear() {
        let mut map = TerrainMap::new(12, 12, true);
        map.seal_borders();
        assert!(!map.is_walkable(0, 5));
        assert!(!map.is_walkable(11, 11));

        let mut walls = TerrainMap::new(12, 12, false);
        walls.clear_spawn(&SpawnArea::circle(Position::new(6, 6), 2));
        assert_eq!(walls.walkable_count(), 13);
    }

    #[test]
    fn test_biome_classification_order() {
        let thresholds = BiomeThresholds {
            water: 0.25,
            highland: 0.65,
            mountain: 0.80,
            dry: 0.35,
            wet: 0.60,
        };
        assert_eq!(thresholds.classify(0.1, 0.9), Biome::Swamp);
        assert_eq!(thresholds.classify(0.9, 0.1), Biome::Mountain);
        assert_eq!(thresholds.classify(0.5, 0.7), Biome::Forest);
        assert_eq!(thresholds.classify(0.7, 0.2), Biome::Mountain);
        assert_eq!(thresholds.classify(0.5, 0.2), Biome::Desert);
        assert_eq!(thresholds.classify(0.5, 0.5), Biome::Grassland);
    }

    #[test]
    fn test_room_carving_tracks_valid_positions() {
        let mut rng = StdRng::seed_from_u64(5);
        let images = TileImageSet::basic();
        let mut result = empty_result(20, 20, &images, &mut rng);
        carve_room(&mut result, &Room::new(2, 2, 5, 5), &images, &mut rng);
        assert_eq!(result.valid_positions.len(), 16);
        assert!(result.is_walkable(3, 3));
        assert!(!result.is_walkable(2, 2));

        carve_horizontal_tunnel(&mut result, 10, 6, 4, &images, &mut rng);
        assert!((6..=10).all(|x| result.is_walkable(x, 4)));
    }
}
