//! # Tile Renderer
//!
//! Draws a `GameMap` against any `RenderTarget`, either the whole map or a
//! square viewport centered on a position. Tiles outside the field of view
//! that were never revealed are skipped; revealed tiles outside it are
//! drawn darkened. Fog and a tile's color matrix combine by multiplying
//! the draw's RGBA tint channel by channel.

use super::{GameMap, TileImage, TILE_SIZE};
use crate::config;
use crate::game::Position;

/// Color scale applied to revealed tiles that are out of sight.
pub const FOG_TINT: [f32; 4] = [0.35, 0.35, 0.35, 1.0];

/// Per-draw transform and tint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawOptions {
    /// Screen position of the tile's top-left corner
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    /// RGBA multiplier; starts at white and every effect scales it
    pub tint: [f32; 4],
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            tint: [1.0; 4],
        }
    }
}

impl DrawOptions {
    fn scale_tint(&mut self, by: [f32; 4]) {
        for (channel, factor) in self.tint.iter_mut().zip(by) {
            *channel *= factor;
        }
    }
}

/// Surface that tile sprites are drawn onto.
pub trait RenderTarget {
    fn draw_tile(&mut self, image: &TileImage, opts: &DrawOptions);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Draw every tile as if it were in view
    pub reveal_all: bool,
    /// Viewport center; `None` draws the full map
    pub center_on: Option<Position>,
    /// Viewport edge length in tiles
    pub viewport_size: i32,
    /// Sprite scale used in viewport mode
    pub scale: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            reveal_all: false,
            center_on: None,
            viewport_size: config::DEFAULT_VIEWPORT_SIZE,
            scale: 1.0,
        }
    }
}

/// Tile range that was considered, plus screen edges for laying out UI
/// next to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderedBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    /// Rightmost pixel drawn in viewport mode
    pub right_edge_x: i32,
    /// Topmost pixel drawn in viewport mode
    pub top_edge_y: i32,
}

/// Stateless apart from a reused `DrawOptions`, so rendering a frame does
/// not allocate per tile.
#[derive(Debug, Default)]
pub struct TileRenderer {
    draw_opts: DrawOptions,
}

impl TileRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the map and returns what was covered. Marks tiles in view as revealed.
    pub fn render(&mut self, map: &mut GameMap, opts: &RenderOptions, target: &mut dyn RenderTarget) -> RenderedBounds {
        let mut bounds = Self::calculate_bounds(map, opts);
        let mut top_edge: Option<i32> = None;

        for x in bounds.min_x..=bounds.max_x {
            for y in bounds.min_y..=bounds.max_y {
                if !map.in_bounds(x, y) {
                    continue;
                }
                if let Some(top) = self.render_tile(map, Position::new(x, y), opts, &mut bounds, target) {
                    top_edge = Some(top_edge.map_or(top, |t| t.min(top)));
                }
            }
        }

        bounds.top_edge_y = top_edge.unwrap_or(0);
        bounds
    }

    /// Returns the screen top edge of the tile when it was drawn.
    fn render_tile(
        &mut self,
        map: &mut GameMap,
        pos: Position,
        opts: &RenderOptions,
        bounds: &mut RenderedBounds,
        target: &mut dyn RenderTarget,
    ) -> Option<i32> {
        let visible = opts.reveal_all || map.is_visible(pos);
        let tile = map.tile_mut(pos);
        if visible {
            tile.is_revealed = true;
        } else if !tile.is_revealed {
            return None;
        }

        self.draw_opts = DrawOptions::default();
        if !visible {
            self.draw_opts.scale_tint(FOG_TINT);
        }

        match opts.center_on {
            Some(center) => {
                let tile_px = TILE_SIZE as f32 * opts.scale;
                let half = (opts.viewport_size / 2) as f32;
                self.draw_opts.scale = opts.scale;
                self.draw_opts.x = ((pos.x - center.x) as f32 + half) * tile_px;
                self.draw_opts.y = ((pos.y - center.y) as f32 + half) * tile_px;
                bounds.right_edge_x = bounds.right_edge_x.max((self.draw_opts.x + tile_px) as i32);
            }
            None => {
                self.draw_opts.x = tile.pixel_x as f32;
                self.draw_opts.y = tile.pixel_y as f32;
            }
        }

        if !tile.color_matrix.is_empty() {
            let m = tile.color_matrix;
            self.draw_opts.scale_tint([m.r, m.g, m.b, m.a]);
        }

        target.draw_tile(&tile.image, &self.draw_opts);
        opts.center_on.map(|_| self.draw_opts.y as i32)
    }

    fn calculate_bounds(map: &GameMap, opts: &RenderOptions) -> RenderedBounds {
        match opts.center_on {
            Some(center) => {
                let half = opts.viewport_size / 2;
                RenderedBounds {
                    min_x: center.x - half,
                    max_x: center.x + half,
                    min_y: center.y - half,
                    max_y: center.y + half,
                    ..RenderedBounds::default()
                }
            }
            None => RenderedBounds {
                min_x: 0,
                max_x: map.width - 1,
                min_y: 0,
                max_y: map.height - 1,
                ..RenderedBounds::default()
            },
        }
    }
}

/// Target that records draw calls instead of presenting them.
#[derive(Debug, Default, Clone)]
pub struct RecordingTarget {
    pub draws: Vec<(TileImage, DrawOptions)>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderTarget for RecordingTarget {
    fn draw_tile(&mut self, image: &TileImage, opts: &DrawOptions) {
        self.draws.push((image.clone(), *opts));
    }
}
