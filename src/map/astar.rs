//! # A* Pathfinding
//!
//! Shortest paths on the tile grid with 4-way movement and a Chebyshev
//! heuristic, built on `pathfinding::prelude::astar`.

use super::{GameMap, TileType};
use crate::game::{Direction, Position};
use pathfinding::prelude::astar as astar_search;

/// Neighbors in `Direction::ALL` order.
fn neighbors(map: &GameMap, pos: Position, ignore_walls: bool) -> Vec<(Position, u32)> {
    Direction::ALL
        .iter()
        .map(|dir| pos + dir.to_delta())
        .filter(|next| map.in_bounds(next.x, next.y))
        .filter(|next| ignore_walls || map.tile(*next).tile_type != TileType::Wall)
        .map(|next| (next, 1))
        .collect()
}

/// Finds a path from `start` to `end`, both included.
///
/// Returns `None` when no route exists or either end is outside the map.
/// With `ignore_walls` every in-bounds tile is passable.
///
/// # Examples
///
/// ```
/// use garrison::{astar, GameMap, TileImageSet};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(8);
/// let map = GameMap::new("rooms_corridors", 60, 40, &TileImageSet::default(), &mut rng);
/// let start = map.starting_position();
/// let path = astar(&map, start, start, false).unwrap();
/// assert_eq!(path, vec![start]);
/// ```
pub fn astar(map: &GameMap, start: Position, end: Position, ignore_walls: bool) -> Option<Vec<Position>> {
    if !map.in_bounds(start.x, start.y) || !map.in_bounds(end.x, end.y) {
        return None;
    }
    astar_search(
        &start,
        |pos| neighbors(map, *pos, ignore_walls),
        |pos| pos.chebyshev_distance(end),
        |pos| *pos == end,
    )
    .map(|(path, _cost)| path)
}

/// Steps from `start` to `end` for walking movement, excluding `start`.
/// Empty when there is no route.
pub fn build_path(map: &GameMap, start: Position, end: Position) -> Vec<Position> {
    astar(map, start, end, false)
        .map(|path| path.into_iter().skip(1).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{helpers, GenerationResult, Room};
    use crate::map::TileImageSet;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Two rooms side by side; `connected` carves a corridor between them.
    fn two_room_map(connected: bool) -> GameMap {
        let images = TileImageSet::basic();
        let mut rng = StdRng::seed_from_u64(1);
        let mut result: GenerationResult = helpers::empty_result(30, 12, &images, &mut rng);
        let left = Room::new(1, 1, 8, 8);
        let right = Room::new(18, 1, 8, 8);
        helpers::carve_room(&mut result, &left, &images, &mut rng);
        helpers::carve_room(&mut result, &right, &images, &mut rng);
        if connected {
            helpers::carve_horizontal_tunnel(&mut result, 5, 22, 5, &images, &mut rng);
        }
        result.rooms = vec![left, right];
        result.rebuild_valid_positions();
        GameMap::from_result("test", result)
    }

    #[test]
    fn test_straight_line_path_length() {
        let map = two_room_map(true);
        let path = astar(&map, Position::new(3, 5), Position::new(22, 5), false).unwrap();
        assert_eq!(path.first(), Some(&Position::new(3, 5)));
        assert_eq!(path.last(), Some(&Position::new(22, 5)));
        assert_eq!(path.len(), 20);
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn test_no_route_is_none() {
        let map = two_room_map(false);
        assert!(astar(&map, Position::new(3, 5), Position::new(22, 5), false).is_none());
        assert!(build_path(&map, Position::new(3, 5), Position::new(22, 5)).is_empty());
    }

    #[test]
    fn test_ignore_walls_crosses_rock() {
        let map = two_room_map(false);
        let path = astar(&map, Position::new(3, 5), Position::new(22, 5), true).unwrap();
        assert_eq!(path.len(), 20);
    }

    #[test]
    fn test_build_path_drops_start() {
        let map = two_room_map(true);
        let path = build_path(&map, Position::new(3, 5), Position::new(6, 5));
        assert_eq!(path, vec![Position::new(4, 5), Position::new(5, 5), Position::new(6, 5)]);
    }

    #[test]
    fn test_out_of_bounds_endpoints() {
        let map = two_room_map(true);
        assert!(astar(&map, Position::new(-1, 5), Position::new(3, 5), true).is_none());
    }
}
