//! # Garrison Floor Graphs
//!
//! Abstract room graph for one raid floor. Every floor has a critical path
//! from a guard-post entry to the stairs, plus branch rooms hanging off the
//! critical path. A branch may merge back into the next critical room, so
//! the graph is a DAG rather than a tree.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Kind of room on a garrison floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    GuardPost,
    Barracks,
    Armory,
    CommandPost,
    PatrolRoute,
    MageTower,
    RestRoom,
    Stairs,
}

impl RoomType {
    pub const ALL: [RoomType; 8] = [
        RoomType::GuardPost,
        RoomType::Barracks,
        RoomType::Armory,
        RoomType::CommandPost,
        RoomType::PatrolRoute,
        RoomType::MageTower,
        RoomType::RestRoom,
        RoomType::Stairs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::GuardPost => "guard_post",
            RoomType::Barracks => "barracks",
            RoomType::Armory => "armory",
            RoomType::CommandPost => "command_post",
            RoomType::PatrolRoute => "patrol_route",
            RoomType::MageTower => "mage_tower",
            RoomType::RestRoom => "rest_room",
            RoomType::Stairs => "stairs",
        }
    }

    pub fn parse(name: &str) -> Option<RoomType> {
        RoomType::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Rooms that hold a garrison and lead to combat.
    pub fn is_combat(self) -> bool {
        !matches!(self, RoomType::RestRoom | RoomType::Stairs)
    }

    /// Rooms that may appear on side branches.
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            RoomType::RestRoom
                | RoomType::Armory
                | RoomType::CommandPost
                | RoomType::MageTower
                | RoomType::PatrolRoute
        )
    }

    /// `(min_w, max_w, min_h, max_h)` footprint used when the floor is laid out.
    pub fn size_range(self) -> (i32, i32, i32, i32) {
        match self {
            RoomType::Barracks => (10, 14, 8, 11),
            RoomType::GuardPost => (8, 11, 7, 9),
            RoomType::Armory => (10, 13, 8, 11),
            RoomType::CommandPost => (10, 13, 8, 11),
            RoomType::PatrolRoute => (12, 16, 7, 9),
            RoomType::MageTower => (9, 11, 10, 12),
            RoomType::RestRoom => (7, 9, 6, 8),
            RoomType::Stairs => (6, 8, 6, 8),
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One room of the abstract floor graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorNode {
    pub id: usize,
    pub room_type: RoomType,
    pub children: Vec<usize>,
    pub parents: Vec<usize>,
    pub on_critical_path: bool,
    pub min_width: i32,
    pub max_width: i32,
    pub min_height: i32,
    pub max_height: i32,
}

impl FloorNode {
    pub fn new(id: usize, room_type: RoomType, on_critical_path: bool) -> Self {
        let (min_width, max_width, min_height, max_height) = room_type.size_range();
        Self {
            id,
            room_type,
            children: Vec::new(),
            parents: Vec::new(),
            on_critical_path,
            min_width,
            max_width,
            min_height,
            max_height,
        }
    }
}

/// Floor graph; node IDs equal their index in `nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorDag {
    pub nodes: Vec<FloorNode>,
    pub entry_node_id: usize,
    pub stairs_node_id: usize,
}

impl FloorDag {
    /// Graph with no nodes; add them with `add_node` and `link`.
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            entry_node_id: 0,
            stairs_node_id: 0,
        }
    }

    /// Appends a node and returns its ID.
    pub fn add_node(&mut self, room_type: RoomType, on_critical_path: bool) -> usize {
        let id = self.nodes.len();
        self.nodes.push(FloorNode::new(id, room_type, on_critical_path));
        id
    }

    /// Adds a parent -> child edge.
    pub fn link(&mut self, parent: usize, child: usize) {
        if parent >= self.nodes.len() || child >= self.nodes.len() {
            return;
        }
        self.nodes[parent].children.push(child);
        self.nodes[child].parents.push(parent);
    }

    pub fn node(&self, id: usize) -> Option<&FloorNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes with parents before children (Kahn's algorithm, ID order for ties).
    pub fn topological_order(&self) -> Vec<usize> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        for node in &self.nodes {
            for &child in &node.children {
                in_degree[child] += 1;
            }
        }

        let mut queue: VecDeque<usize> = (0..self.nodes.len()).filter(|&id| in_degree[id] == 0).collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &child in &self.nodes[id].children {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }
        order
    }

    /// Longest-path depth of every node from a root.
    pub fn depth(&self) -> HashMap<usize, usize> {
        let mut depth: HashMap<usize, usize> = HashMap::new();
        for id in self.topological_order() {
            let d = self.nodes[id]
                .parents
                .iter()
                .filter_map(|p| depth.get(p))
                .max()
                .map(|d| d + 1)
                .unwrap_or(0);
            depth.insert(id, d);
        }
        depth
    }

    /// The next non-stairs critical node below `node_id`, looking at most two
    /// levels down so branches never skip more than one room.
    fn downstream_critical(&self, node_id: usize) -> Option<usize> {
        let is_target = |id: usize| {
            let node = &self.nodes[id];
            node.on_critical_path && id != self.stairs_node_id && id != node_id
        };
        let children = &self.nodes[node_id].children;
        if let Some(&child) = children.iter().find(|&&c| is_target(c)) {
            return Some(child);
        }
        children
            .iter()
            .flat_map(|&c| self.nodes[c].children.iter().copied())
            .find(|&gc| is_target(gc))
    }
}

/// Generation limits for one floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorScaling {
    pub min_critical_path: usize,
    pub max_critical_path: usize,
    pub min_total_rooms: usize,
    pub max_total_rooms: usize,
    pub allowed_types: Vec<RoomType>,
}

/// Scaling for a floor number; floors past 5 reuse floor 5, and anything
/// below 1 uses floor 1.
pub fn floor_scaling(floor: usize) -> FloorScaling {
    use RoomType::*;
    let early = vec![GuardPost, Barracks, PatrolRoute, RestRoom, Armory];
    let late = vec![GuardPost, Barracks, PatrolRoute, RestRoom, Armory, CommandPost, MageTower];
    let (min_cp, max_cp, min_total, max_total, allowed) = match floor.clamp(1, 5) {
        1 => (3, 4, 6, 8, early),
        2 => (3, 4, 7, 9, early),
        3 => (4, 5, 8, 10, late),
        4 => (3, 4, 7, 9, late),
        _ => (3, 4, 6, 8, late),
    };
    FloorScaling {
        min_critical_path: min_cp,
        max_critical_path: max_cp,
        min_total_rooms: min_total,
        max_total_rooms: max_total,
        allowed_types: allowed,
    }
}

fn pick<T: Copy>(items: &[T], rng: &mut StdRng) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[rng.gen_range(0..items.len())])
    }
}

/// Picks a branch room type, keeping at most one rest room per floor.
fn pick_branch_type(branch_types: &[RoomType], has_rest: &mut bool, rng: &mut StdRng) -> Option<RoomType> {
    let mut room_type = pick(branch_types, rng)?;
    if room_type == RoomType::RestRoom && *has_rest {
        let non_rest: Vec<RoomType> = branch_types
            .iter()
            .copied()
            .filter(|t| *t != RoomType::RestRoom)
            .collect();
        room_type = pick(&non_rest, rng)?;
    }
    if room_type == RoomType::RestRoom {
        *has_rest = true;
    }
    Some(room_type)
}

/// Builds the room graph for one floor.
///
/// # Examples
///
/// ```
/// use garrison::{build_garrison_dag, RoomType};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let dag = build_garrison_dag(1, &mut rng);
/// assert_eq!(dag.nodes[dag.entry_node_id].room_type, RoomType::GuardPost);
/// assert_eq!(dag.nodes[dag.stairs_node_id].room_type, RoomType::Stairs);
/// ```
pub fn build_garrison_dag(floor: usize, rng: &mut StdRng) -> FloorDag {
    let scaling = floor_scaling(floor);
    let mut dag = FloorDag::empty();

    let critical_len = rng.gen_range(scaling.min_critical_path..=scaling.max_critical_path.max(scaling.min_critical_path));

    let mut combat_types: Vec<RoomType> = scaling
        .allowed_types
        .iter()
        .copied()
        .filter(|t| t.is_combat())
        .collect();
    if combat_types.is_empty() {
        combat_types.push(RoomType::GuardPost);
    }

    let entry = dag.add_node(RoomType::GuardPost, true);
    dag.entry_node_id = entry;
    let mut prev = entry;
    for _ in 1..critical_len {
        let room_type = pick(&combat_types, rng).unwrap_or(RoomType::GuardPost);
        let id = dag.add_node(room_type, true);
        dag.link(prev, id);
        prev = id;
    }
    let stairs = dag.add_node(RoomType::Stairs, true);
    dag.link(prev, stairs);
    dag.stairs_node_id = stairs;

    let mut total = dag.len();
    let target = rng
        .gen_range(scaling.min_total_rooms..=scaling.max_total_rooms.max(scaling.min_total_rooms))
        .max(total);
    let branch_types: Vec<RoomType> = scaling
        .allowed_types
        .iter()
        .copied()
        .filter(|t| t.is_branch())
        .collect();
    let critical_nodes: Vec<usize> = dag
        .nodes
        .iter()
        .filter(|n| n.on_critical_path && n.id != stairs)
        .map(|n| n.id)
        .collect();

    let mut has_rest = false;
    while total < target && !critical_nodes.is_empty() {
        let Some(parent) = pick(&critical_nodes, rng) else {
            break;
        };
        let Some(room_type) = pick_branch_type(&branch_types, &mut has_rest, rng) else {
            break;
        };

        let branch = dag.add_node(room_type, false);
        dag.link(parent, branch);
        if let Some(merge) = dag.downstream_critical(parent) {
            if rng.gen_range(1..=2) == 1 {
                dag.link(branch, merge);
            }
        }
        total += 1;

        if total < target && rng.gen_range(1..=10) <= 4 {
            if let Some(chain_type) = pick_branch_type(&branch_types, &mut has_rest, rng) {
                let chain = dag.add_node(chain_type, false);
                dag.link(branch, chain);
                total += 1;
            }
        }
    }

    dag
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_room_type_names_round_trip() {
        for room_type in RoomType::ALL {
            assert_eq!(RoomType::parse(room_type.as_str()), Some(room_type));
        }
        assert_eq!(RoomType::parse("dungeon"), None);
        let json = serde_json::to_string(&RoomType::CommandPost).unwrap();
        assert_eq!(json, "\"command_post\"");
    }

    #[test]
    fn test_critical_path_shape() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let dag = build_garrison_dag(1, &mut rng);
            let critical: Vec<&FloorNode> = dag.nodes.iter().filter(|n| n.on_critical_path).collect();
            // 3-4 critical rooms plus the stairs
            assert!((4..=5).contains(&critical.len()));
            assert!(dag.nodes[dag.entry_node_id].parents.is_empty());
            assert!(dag.nodes[dag.stairs_node_id].children.is_empty());
            assert!(dag.len() >= 6 || dag.len() == critical.len());
            assert!(dag.len() <= 9);
        }
    }

    #[test]
    fn test_at_most_one_rest_room() {
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let dag = build_garrison_dag(3, &mut rng);
            let rests = dag.nodes.iter().filter(|n| n.room_type == RoomType::RestRoom).count();
            assert!(rests <= 1);
        }
    }

    #[test]
    fn test_entry_is_only_root_and_order_is_topological() {
        let mut rng = StdRng::seed_from_u64(77);
        let dag = build_garrison_dag(2, &mut rng);
        let roots: Vec<usize> = dag.nodes.iter().filter(|n| n.parents.is_empty()).map(|n| n.id).collect();
        assert_eq!(roots, vec![dag.entry_node_id]);

        let order = dag.topological_order();
        assert_eq!(order.len(), dag.len());
        let position: HashMap<usize, usize> = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        for node in &dag.nodes {
            for child in &node.children {
                assert!(position[&node.id] < position[child]);
            }
        }
    }

    #[test]
    fn test_depth_is_longest_path() {
        let mut dag = FloorDag::empty();
        let a = dag.add_node(RoomType::GuardPost, true);
        let b = dag.add_node(RoomType::Barracks, true);
        let c = dag.add_node(RoomType::Armory, false);
        let d = dag.add_node(RoomType::Stairs, true);
        dag.link(a, b);
        dag.link(b, d);
        dag.link(a, c);
        dag.link(c, b);
        let depth = dag.depth();
        assert_eq!(depth[&a], 0);
        assert_eq!(depth[&c], 1);
        assert_eq!(depth[&b], 2);
        assert_eq!(depth[&d], 3);
    }

    #[test]
    fn test_scaling_clamps_floor_numbers() {
        assert_eq!(floor_scaling(0), floor_scaling(1));
        assert_eq!(floor_scaling(12), floor_scaling(5));
        assert!(floor_scaling(3).allowed_types.contains(&RoomType::MageTower));
        assert!(!floor_scaling(1).allowed_types.contains(&RoomType::CommandPost));
    }
}
