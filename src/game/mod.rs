//! # Game Module
//!
//! Shared building blocks used by every other subsystem:
//! - Grid positions and directions
//! - Entity identifiers
//! - The typed component store that holds squads, units and raid state

pub mod world;

pub use world::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a 2D coordinate on the tile grid.
///
/// # Examples
///
/// ```
/// use garrison::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let adjacent = pos.cardinal_adjacent_positions();
/// assert_eq!(adjacent.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use garrison::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Calculates the Chebyshev (king move) distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use garrison::Position;
    ///
    /// assert_eq!(Position::new(0, 0).chebyshev_distance(Position::new(3, 4)), 4);
    /// ```
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        (self.x - other.x).abs().max((self.y - other.y).abs()) as u32
    }

    /// Calculates the Euclidean distance to another position.
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns only the 4 cardinal adjacent positions (no diagonals).
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        vec![
            Position::new(self.x, self.y - 1), // N
            Position::new(self.x - 1, self.y), // W
            Position::new(self.x + 1, self.y), // E
            Position::new(self.x, self.y + 1), // S
        ]
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Directions for movement and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Cardinal directions in path expansion order: up, down, left, right.
    pub const ALL: [Direction; 4] = [Direction::North, Direction::South, Direction::West, Direction::East];

    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use garrison::{Direction, Position};
    ///
    /// assert_eq!(Direction::North.to_delta(), Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }
}

/// Unique identifier for entities in the component store.
pub type EntityId = Uuid;

/// Generates a new unique entity ID.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_creation() {
        let pos = Position::new(10, 20);
        assert_eq!(pos.x, 10);
        assert_eq!(pos.y, 20);
        assert_eq!(Position::origin(), Position::new(0, 0));
    }

    #[test]
    fn test_position_distances() {
        let a = Position::new(0, 0);
        let b = Position::new(3, 4);
        assert_eq!(a.manhattan_distance(b), 7);
        assert_eq!(a.chebyshev_distance(b), 4);
        assert!((a.euclidean_distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_position_arithmetic() {
        let a = Position::new(5, 3);
        let b = Position::new(2, 1);
        assert_eq!(a + b, Position::new(7, 4));
        assert_eq!(a - b, Position::new(3, 2));
    }

    #[test]
    fn test_cardinal_neighbors() {
        let neighbors = Position::new(5, 5).cardinal_adjacent_positions();
        assert_eq!(neighbors.len(), 4);
        assert!(neighbors.contains(&Position::new(5, 4)));
        assert!(neighbors.contains(&Position::new(6, 5)));
        assert!(!neighbors.contains(&Position::new(6, 6)));
    }

    #[test]
    fn test_direction_deltas() {
        let start = Position::new(4, 4);
        assert_eq!(start + Direction::South.to_delta(), Position::new(4, 5));
        assert_eq!(start + Direction::West.to_delta(), Position::new(3, 4));
        let around: Vec<Position> = Direction::ALL.iter().map(|d| start + d.to_delta()).collect();
        assert_eq!(
            around,
            vec![Position::new(4, 3), Position::new(4, 5), Position::new(3, 4), Position::new(5, 4)]
        );
    }

    #[test]
    fn test_entity_ids_are_unique() {
        assert_ne!(new_entity_id(), new_entity_id());
    }
}
