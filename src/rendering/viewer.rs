//! # Map Viewer
//!
//! Interactive window state for browsing generated maps: a viewport that
//! follows a movable focus point, a side panel with map facts and a short
//! message log.

use super::MacroquadTarget;
use crate::config;
use crate::game::Position;
use crate::generation::GeneratorRegistry;
use crate::map::{build_path, GameMap, RenderOptions, RenderedBounds, TileImageSet, TileRenderer};
use log::info;
use macroquad::prelude::{
    clear_background, draw_rectangle, draw_text, is_key_pressed, screen_height, screen_width, Color, KeyCode, BLACK,
    GREEN, WHITE,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// What the viewer should do after a frame's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    Continue,
    Quit,
}

pub struct MapViewer {
    pub map: GameMap,
    pub focus: Position,
    pub reveal_all: bool,
    pub seed: u64,
    pub width: i32,
    pub height: i32,
    pub fov_radius: i32,
    /// Message history, newest last
    pub messages: Vec<String>,
    pub max_messages: usize,
    registry: GeneratorRegistry,
    images: TileImageSet,
    renderer: TileRenderer,
    generator_index: usize,
    last_bounds: RenderedBounds,
}

impl MapViewer {
    /// Generates the first map. Unknown generator names fall back to the
    /// registry default.
    pub fn new(generator: &str, width: i32, height: i32, seed: u64) -> Self {
        let registry = GeneratorRegistry::new();
        let resolved = registry.get_or_default(generator).name();
        let generator_index = registry.names().iter().position(|n| *n == resolved).unwrap_or(0);
        let images = TileImageSet::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let map = GameMap::with_registry(&registry, resolved, width, height, &images, &mut rng);

        let mut viewer = Self {
            focus: map.starting_position(),
            map,
            reveal_all: true,
            seed,
            width,
            height,
            fov_radius: config::DEFAULT_FOV_RADIUS,
            messages: Vec::new(),
            max_messages: 100,
            registry,
            images,
            renderer: TileRenderer::new(),
            generator_index,
            last_bounds: RenderedBounds::default(),
        };
        viewer.refresh_fov();
        viewer.add_message(format!("Generated '{}' with seed {}", resolved, seed));
        viewer
    }

    pub fn generator_name(&self) -> &str {
        &self.map.generator
    }

    /// Switches to the next registered generator and regenerates.
    pub fn cycle_generator(&mut self) {
        let names = self.registry.names();
        if names.is_empty() {
            return;
        }
        self.generator_index = (self.generator_index + 1) % names.len();
        self.regenerate();
    }

    /// Rebuilds the map with the current generator and seed.
    pub fn regenerate(&mut self) {
        let names = self.registry.names();
        let Some(name) = names.get(self.generator_index).copied() else {
            return;
        };
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.map = GameMap::with_registry(&self.registry, name, self.width, self.height, &self.images, &mut rng);
        self.focus = self.map.starting_position();
        self.refresh_fov();
        self.add_message(format!("Generated '{}' with seed {}", name, self.seed));
    }

    /// Moves the focus, clamped to the map.
    pub fn move_focus(&mut self, dx: i32, dy: i32) {
        let x = (self.focus.x + dx).clamp(0, self.map.width - 1);
        let y = (self.focus.y + dy).clamp(0, self.map.height - 1);
        self.focus = Position::new(x, y);
        self.refresh_fov();
    }

    pub fn toggle_reveal(&mut self) {
        self.reveal_all = !self.reveal_all;
        let mode = if self.reveal_all { "full map" } else { "field of view" };
        self.add_message(format!("Showing {}", mode));
    }

    fn refresh_fov(&mut self) {
        self.map.update_fov(self.focus, self.fov_radius);
    }

    pub fn add_message(&mut self, message: String) {
        info!("{}", message);
        self.messages.push(message);
        if self.messages.len() > self.max_messages {
            self.messages.remove(0);
        }
    }

    /// Reads this frame's keyboard state.
    pub fn handle_input(&mut self) -> ViewerCommand {
        if is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q) {
            return ViewerCommand::Quit;
        }
        let moves = [
            (KeyCode::Left, -1, 0),
            (KeyCode::Right, 1, 0),
            (KeyCode::Up, 0, -1),
            (KeyCode::Down, 0, 1),
        ];
        for (key, dx, dy) in moves {
            if is_key_pressed(key) {
                self.move_focus(dx, dy);
            }
        }
        if is_key_pressed(KeyCode::Tab) {
            self.cycle_generator();
        }
        if is_key_pressed(KeyCode::R) {
            self.seed = self.seed.wrapping_add(1);
            self.regenerate();
        }
        if is_key_pressed(KeyCode::F) {
            self.toggle_reveal();
        }
        if is_key_pressed(KeyCode::P) {
            self.report_stairs_path();
        }
        ViewerCommand::Continue
    }

    fn report_stairs_path(&mut self) {
        let message = match self.map.stairs {
            Some(stairs) => {
                let path = build_path(&self.map, self.focus, stairs);
                if path.is_empty() {
                    format!("No path from {} to the stairs at {}", self.focus, stairs)
                } else {
                    format!("Stairs at {} are {} steps away", stairs, path.len())
                }
            }
            None => "This map has no stairs".to_string(),
        };
        self.add_message(message);
    }

    /// Draws the viewport, the side panel and the message log.
    pub fn draw(&mut self) {
        clear_background(BLACK);

        let opts = RenderOptions {
            reveal_all: self.reveal_all,
            center_on: Some(self.focus),
            viewport_size: config::DEFAULT_VIEWPORT_SIZE,
            scale: 0.75,
        };
        let mut target = MacroquadTarget::new();
        self.last_bounds = self.renderer.render(&mut self.map, &opts, &mut target);
        self.draw_panel();
        self.draw_messages();
    }

    fn draw_panel(&self) {
        let panel_x = self.last_bounds.right_edge_x as f32 + 10.0;
        let line_height = 20.0;
        let mut line_y = 20.0;

        draw_text("GARRISON MAP VIEWER", panel_x, line_y, 24.0, WHITE);
        line_y += line_height * 2.0;

        let stairs = self
            .map
            .stairs
            .map_or_else(|| "none".to_string(), |p| p.to_string());
        let lines = [
            format!("Generator: {}", self.generator_name()),
            format!("Seed: {}", self.seed),
            format!("Size: {}x{}", self.map.width, self.map.height),
            format!("Rooms: {}", self.map.rooms.len()),
            format!("Walkable: {}", self.map.valid_positions.len()),
            format!("Focus: {} ({})", self.focus, self.map.biome_at(self.focus).name()),
            format!("Stairs: {}", stairs),
        ];
        for line in &lines {
            draw_text(line, panel_x, line_y, 18.0, WHITE);
            line_y += line_height;
        }

        line_y += line_height;
        draw_text("Controls:", panel_x, line_y, 18.0, GREEN);
        line_y += line_height;
        for control in [
            "Arrows: Move focus",
            "TAB: Next generator",
            "R: New seed",
            "F: Toggle fog",
            "P: Path to stairs",
            "ESC: Quit",
        ] {
            draw_text(control, panel_x, line_y, 16.0, WHITE);
            line_y += line_height;
        }
    }

    fn draw_messages(&self) {
        let area_y = screen_height() - 80.0;
        draw_rectangle(0.0, area_y - 10.0, screen_width(), 90.0, Color::new(0.0, 0.0, 0.0, 0.8));
        let start = self.messages.len().saturating_sub(3);
        for (i, message) in self.messages[start..].iter().enumerate() {
            draw_text(message, 10.0, area_y + i as f32 * 18.0, 16.0, WHITE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_generator_resolves_to_default() {
        let viewer = MapViewer::new("nope", 50, 40, 1);
        assert_eq!(viewer.generator_name(), "rooms_corridors");
    }

    #[test]
    fn test_cycle_visits_every_generator() {
        let mut viewer = MapViewer::new("rooms_corridors", 50, 40, 2);
        let mut seen = vec![viewer.generator_name().to_string()];
        for _ in 1..GeneratorRegistry::new().len() {
            viewer.cycle_generator();
            seen.push(viewer.generator_name().to_string());
        }
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), GeneratorRegistry::new().len());
    }

    #[test]
    fn test_focus_is_clamped() {
        let mut viewer = MapViewer::new("cave", 40, 30, 3);
        viewer.move_focus(-1000, -1000);
        assert_eq!(viewer.focus, Position::new(0, 0));
        viewer.move_focus(5000, 5000);
        assert_eq!(viewer.focus, Position::new(39, 29));
    }

    #[test]
    fn test_message_history_is_bounded() {
        let mut viewer = MapViewer::new("bsp", 40, 30, 4);
        viewer.max_messages = 2;
        for i in 0..5 {
            viewer.add_message(format!("m{}", i));
        }
        assert_eq!(viewer.messages, vec!["m3".to_string(), "m4".to_string()]);
    }
}
