//! # BSP Generator
//!
//! Binary space partitioning: the map is split recursively, each leaf gets
//! one room, and sibling subtrees are joined by an L-shaped corridor between
//! a random room on each side.

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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BspConfig {
    /// Areas smaller than this on either axis are not split further
    pub min_split_size: i32,
    pub max_split_depth: u32,
    pub min_room_size: i32,
    pub max_room_size: i32,
}

impl Default for BspConfig {
    fn default() -> Self {
        Self {
            min_split_size: 15,
            max_split_depth: 4,
            min_room_size: 6,
            max_room_size: 10,
        }
    }
}

#[derive(Debug)]
struct BspNode {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    children: Option<(Box<BspNode>, Box<BspNode>)>,
    room: Option<Room>,
}

impl BspNode {
    fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            children: None,
            room: None,
        }
    }
}

/// Structured architectural layouts with large rooms.
#[derive(Debug, Clone, Default)]
pub struct BspGenerator {
    config: BspConfig,
}

impl BspGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BspConfig) -> Self {
        Self { config }
    }

    fn split(&self, node: &mut BspNode, depth: u32, rng: &mut StdRng) {
        let min = self.config.min_split_size;
        if depth >= self.config.max_split_depth || node.w < min || node.h < min {
            return;
        }

        // Long, thin areas split across their long axis
        let mut horizontal = if node.w > node.h && node.w as f64 / node.h as f64 >= 1.25 {
            false
        } else if node.h > node.w && node.h as f64 / node.w as f64 >= 1.25 {
            true
        } else {
            rng.gen_range(1..=2) == 1
        };

        let can_split_h = node.h >= min * 2;
        let can_split_v = node.w >= min * 2;
        if horizontal && !can_split_h {
            horizontal = false;
        } else if !horizontal && !can_split_v {
            horizontal = true;
        }
        if (horizontal && !can_split_h) || (!horizontal && !can_split_v) {
            return;
        }

        let (mut left, mut right) = if horizontal {
            let split = rng.gen_range(min..=node.h - min);
            (
                BspNode::new(node.x, node.y, node.w, split),
                BspNode::new(node.x, node.y + split, node.w, node.h - split),
            )
        } else {
            let split = rng.gen_range(min..=node.w - min);
            (
                BspNode::new(node.x, node.y, split, node.h),
                BspNode::new(node.x + split, node.y, node.w - split, node.h),
            )
        };

        self.split(&mut left, depth + 1, rng);
        self.split(&mut right, depth + 1, rng);
        node.children = Some((Box::new(left), Box::new(right)));
    }

    fn room_extent(&self, available: i32, rng: &mut StdRng) -> i32 {
        let hi = self.config.max_room_size.min(available - 2);
        let lo = self.config.min_room_size.min(hi);
        rng.gen_range(lo..=hi)
    }

    fn create_rooms(
        &self,
        node: &mut BspNode,
        result: &mut GenerationResult,
        images: &TileImageSet,
        rng: &mut StdRng,
    ) {
        if let Some((left, right)) = node.children.as_mut() {
            self.create_rooms(left, result, images, rng);
            self.create_rooms(right, result, images, rng);
            return;
        }

        if node.w < 5 || node.h < 5 {
            return;
        }
        let room_w = self.room_extent(node.w, rng);
        let room_h = self.room_extent(node.h, rng);
        let room_x = node.x + rng.gen_range(1..=node.w - room_w - 1);
        let room_y = node.y + rng.gen_range(1..=node.h - room_h - 1);

        let room = Room::new(room_x, room_y, room_w, room_h);
        carve_room(result, &room, images, rng);
        result.rooms.push(room);
        node.room = Some(room);
    }

    fn random_leaf_room(node: &BspNode, rng: &mut StdRng) -> Option<Room> {
        if let Some(room) = node.room {
            return Some(room);
        }
        let (left, right) = node.children.as_ref()?;
        if rng.gen_range(1..=2) == 1 {
            Self::random_leaf_room(left, rng).or_else(|| Self::random_leaf_room(right, rng))
        } else {
            Self::random_leaf_room(right, rng).or_else(|| Self::random_leaf_room(left, rng))
        }
    }

    fn connect(node: &BspNode, result: &mut GenerationResult, images: &TileImageSet, rng: &mut StdRng) {
        let Some((left, right)) = node.children.as_ref() else {
            return;
        };
        Self::connect(left, result, images, rng);
        Self::connect(right, result, images, rng);

        let a = Self::random_leaf_room(left, rng);
        let b = Self::random_leaf_room(right, rng);
        if let (Some(a), Some(b)) = (a, b) {
            let Position { x: x1, y: y1 } = a.center();
            let Position { x: x2, y: y2 } = b.center();
            carve_horizontal_tunnel(result, x1, x2, y1, images, rng);
            carve_vertical_tunnel(result, y1, y2, x2, images, rng);
        }
    }
}

impl MapGenerator for BspGenerator {
    fn name(&self) -> &'static str {
        "bsp"
    }

    fn description(&self) -> &'static str {
        "Binary Space Partitioning: structured architectural layouts with large rooms"
    }

    fn generate(
        &self,
        width: i32,
        height: i32,
        images: &TileImageSet,
        rng: &mut StdRng,
    ) -> GenerationResult {
        let mut result = empty_result(width, height, images, rng);

        let mut root = BspNode::new(1, 1, width - 2, height - 2);
        self.split(&mut root, 0, rng);
        self.create_rooms(&mut root, &mut result, images, rng);
        Self::connect(&root, &mut result, images, rng);

        let spawn = match result.rooms.first() {
            Some(room) => SpawnArea::square(room.center(), 1),
            None => SpawnArea::square(Position::new(width / 2, height / 2), 2),
        };
        clear_spawn_tiles(&mut result, spawn, images, rng);
        result.rebuild_valid_positions();

        debug!("bsp: {} leaf rooms", result.rooms.len());
        result
    }
}
