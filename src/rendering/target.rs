//! # Macroquad Target
//!
//! Draws tile sprites as tinted squares. Sprite keys are mapped to a base
//! color by their biome and kind, so no texture files are needed.

use crate::map::{DrawOptions, RenderTarget, TileImage, TILE_SIZE};
use macroquad::prelude::{draw_rectangle, vec2, Color, Vec2, DARKGRAY, LIGHTGRAY, MAGENTA, ORANGE};
use std::collections::HashMap;

/// Base color for a sprite key such as `wall_1`, `forest_floor` or
/// `stairs_down`. Numbered variants are shaded slightly apart.
pub fn tile_color(key: &str) -> Color {
    if key == "stairs_down" {
        return ORANGE;
    }
    let (biome, kind) = match key.split_once('_') {
        Some((a, _)) if a == "wall" || a == "floor" => ("", a),
        Some((a, b)) => (a, b),
        None => ("", key),
    };
    let is_wall = kind.starts_with("wall");
    let base = match (biome, is_wall) {
        ("grassland", false) => Color::new(0.35, 0.6, 0.3, 1.0),
        ("grassland", true) => Color::new(0.2, 0.35, 0.15, 1.0),
        ("forest", false) => Color::new(0.2, 0.45, 0.2, 1.0),
        ("forest", true) => Color::new(0.05, 0.25, 0.05, 1.0),
        ("desert", false) => Color::new(0.85, 0.75, 0.45, 1.0),
        ("desert", true) => Color::new(0.6, 0.45, 0.25, 1.0),
        ("mountain", false) => Color::new(0.55, 0.55, 0.55, 1.0),
        ("mountain", true) => Color::new(0.3, 0.3, 0.32, 1.0),
        ("swamp", false) => Color::new(0.3, 0.4, 0.3, 1.0),
        ("swamp", true) => Color::new(0.15, 0.2, 0.1, 1.0),
        (_, true) => LIGHTGRAY,
        (_, false) if kind.starts_with("floor") => DARKGRAY,
        _ => MAGENTA,
    };
    let variant = key
        .rsplit('_')
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0);
    let shade = 1.0 - 0.06 * (variant % 4) as f32;
    Color::new(base.r * shade, base.g * shade, base.b * shade, base.a)
}

/// `RenderTarget` backed by macroquad's immediate-mode drawing.
#[derive(Debug, Default)]
pub struct MacroquadTarget {
    /// Screen offset added to every draw
    pub offset: Vec2,
    colors: HashMap<String, Color>,
}

impl MacroquadTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(x: f32, y: f32) -> Self {
        Self {
            offset: vec2(x, y),
            colors: HashMap::new(),
        }
    }

    fn color_for(&mut self, image: &TileImage) -> Color {
        *self
            .colors
            .entry(image.key().to_string())
            .or_insert_with(|| tile_color(image.key()))
    }
}

impl RenderTarget for MacroquadTarget {
    fn draw_tile(&mut self, image: &TileImage, opts: &DrawOptions) {
        let base = self.color_for(image);
        let [r, g, b, a] = opts.tint;
        let color = Color::new(base.r * r, base.g * g, base.b * b, base.a * a);
        let size = TILE_SIZE as f32 * opts.scale;
        draw_rectangle(self.offset.x + opts.x, self.offset.y + opts.y, size, size, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walls_and_floors_differ() {
        assert_ne!(tile_color("wall_0"), tile_color("floor_0"));
        assert_ne!(tile_color("forest_wall"), tile_color("desert_wall"));
        assert_eq!(tile_color("stairs_down"), ORANGE);
    }

    #[test]
    fn test_variants_are_shaded() {
        let a = tile_color("floor_0");
        let b = tile_color("floor_1");
        assert!(b.r < a.r);
    }

    #[test]
    fn test_unknown_key_is_magenta() {
        assert_eq!(tile_color("missing"), MAGENTA);
    }
}
