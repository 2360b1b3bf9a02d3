//! Field of view by ray casting.
//!
//! Rays are cast from the origin to every cell on the perimeter of the
//! bounding square and walked with Bresenham's line algorithm. A ray stops at
//! the first opaque cell, which is itself visible so walls get drawn.
//! Cells are only visible inside the Euclidean radius.

use crate::game::Position;

#[derive(Debug, Clone, Default)]
pub struct FieldOfView {
    width: i32,
    height: i32,
    visible: Vec<bool>,
}

impl FieldOfView {
    pub fn new(width: i32, height: i32) -> Self {
        let len = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            visible: vec![false; len],
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    fn mark(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.visible[i] = true;
        }
    }

    pub fn clear(&mut self) {
        self.visible.iter_mut().for_each(|v| *v = false);
    }

    /// Recomputes visibility. `is_opaque` is queried for every cell a ray crosses.
    pub fn compute(&mut self, origin: Position, radius: i32, is_opaque: impl Fn(i32, i32) -> bool) {
        self.clear();
        if self.index(origin.x, origin.y).is_none() {
            return;
        }
        self.mark(origin.x, origin.y);
        let radius = radius.max(0);
        let r2 = radius * radius;

        for target in perimeter(origin, radius) {
            for (x, y) in bresenham(origin.x, origin.y, target.x, target.y).into_iter().skip(1) {
                let (dx, dy) = (x - origin.x, y - origin.y);
                if dx * dx + dy * dy > r2 || self.index(x, y).is_none() {
                    break;
                }
                self.mark(x, y);
                if is_opaque(x, y) {
                    break;
                }
            }
        }
    }

    pub fn is_visible(&self, x: i32, y: i32) -> bool {
        self.index(x, y).map(|i| self.visible[i]).unwrap_or(false)
    }

    /// Visible cells in row-major order.
    pub fn visible_positions(&self) -> Vec<Position> {
        self.visible
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(|(i, _)| Position::new(i as i32 % self.width, i as i32 / self.width))
            .collect()
    }
}

fn perimeter(origin: Position, radius: i32) -> Vec<Position> {
    if radius == 0 {
        return Vec::new();
    }
    let mut cells = Vec::with_capacity((radius * 8) as usize);
    for d in -radius..=radius {
        cells.push(Position::new(origin.x + d, origin.y - radius));
        cells.push(Position::new(origin.x + d, origin.y + radius));
    }
    for d in (-radius + 1)..radius {
        cells.push(Position::new(origin.x - radius, origin.y + d));
        cells.push(Position::new(origin.x + radius, origin.y + d));
    }
    cells
}

fn bresenham(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    let mut points = Vec::new();

    loop {
        points.push((x, y));
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}
