//! Garrison squad archetypes.
//!
//! Each archetype is a fixed unit layout on the 3x3 squad grid. Unit names
//! key into the monster catalog.

use crate::generation::RoomType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchetypeUnit {
    pub monster: &'static str,
    pub grid_row: i32,
    pub grid_col: i32,
    pub grid_width: i32,
    pub grid_height: i32,
    pub is_leader: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquadArchetype {
    pub name: &'static str,
    pub display_name: &'static str,
    pub units: &'static [ArchetypeUnit],
    pub preferred_rooms: &'static [RoomType],
}

impl SquadArchetype {
    pub fn prefers(&self, room: RoomType) -> bool {
        self.preferred_rooms.contains(&room)
    }
}

const fn unit(monster: &'static str, grid_row: i32, grid_col: i32) -> ArchetypeUnit {
    ArchetypeUnit {
        monster,
        grid_row,
        grid_col,
        grid_width: 1,
        grid_height: 1,
        is_leader: false,
    }
}

const fn leader(monster: &'static str, grid_row: i32, grid_col: i32) -> ArchetypeUnit {
    ArchetypeUnit {
        is_leader: true,
        ..unit(monster, grid_row, grid_col)
    }
}

const fn sized(mut u: ArchetypeUnit, grid_width: i32, grid_height: i32) -> ArchetypeUnit {
    u.grid_width = grid_width;
    u.grid_height = grid_height;
    u
}

pub const GARRISON_ARCHETYPES: &[SquadArchetype] = &[
    SquadArchetype {
        name: "chokepoint_guard",
        display_name: "Chokepoint Guard",
        units: &[
            leader("Knight", 0, 0),
            unit("Knight", 0, 1),
            unit("Crossbowman", 1, 0),
            unit("Crossbowman", 1, 1),
            unit("Priest", 2, 0),
        ],
        preferred_rooms: &[RoomType::GuardPost],
    },
    SquadArchetype {
        name: "shield_wall",
        display_name: "Shield Wall",
        units: &[
            sized(leader("Ogre", 0, 0), 2, 2),
            unit("Archer", 1, 0),
            unit("Archer", 1, 1),
            unit("Cleric", 2, 0),
        ],
        preferred_rooms: &[RoomType::Barracks, RoomType::Armory],
    },
    SquadArchetype {
        name: "ranged_battery",
        display_name: "Ranged Battery",
        units: &[
            leader("Spearman", 0, 0),
            unit("Marksman", 1, 0),
            unit("Marksman", 1, 1),
            unit("Archer", 1, 2),
            unit("Mage", 2, 0),
        ],
        preferred_rooms: &[RoomType::MageTower],
    },
    SquadArchetype {
        name: "fast_response",
        display_name: "Fast Response",
        units: &[
            leader("Swordsman", 0, 0),
            unit("Swordsman", 0, 1),
            unit("Goblin Raider", 1, 0),
            unit("Goblin Raider", 1, 1),
            unit("Scout", 2, 0),
        ],
        preferred_rooms: &[RoomType::PatrolRoute],
    },
    SquadArchetype {
        name: "mage_tower",
        display_name: "Mage Tower",
        units: &[
            leader("Battle Mage", 0, 0),
            unit("Wizard", 1, 0),
            unit("Wizard", 1, 1),
            unit("Warlock", 2, 0),
            unit("Sorcerer", 2, 1),
        ],
        preferred_rooms: &[RoomType::MageTower],
    },
    SquadArchetype {
        name: "ambush_pack",
        display_name: "Ambush Pack",
        units: &[
            leader("Assassin", 0, 0),
            unit("Assassin", 0, 1),
            unit("Rogue", 1, 0),
            unit("Rogue", 1, 1),
            unit("Ranger", 2, 0),
        ],
        preferred_rooms: &[RoomType::PatrolRoute],
    },
    SquadArchetype {
        name: "command_post",
        display_name: "Command Post Guard",
        units: &[
            leader("Knight", 0, 0),
            unit("Paladin", 0, 1),
            unit("Crossbowman", 1, 0),
            unit("Cleric", 2, 0),
            unit("Priest", 2, 1),
        ],
        preferred_rooms: &[RoomType::CommandPost],
    },
    SquadArchetype {
        name: "orc_vanguard",
        display_name: "Orc Vanguard",
        units: &[
            sized(leader("Orc Warrior", 0, 0), 2, 1),
            sized(unit("Ogre", 0, 1), 2, 2),
            unit("Warrior", 1, 0),
            unit("Warrior", 1, 1),
        ],
        preferred_rooms: &[RoomType::Barracks],
    },
];

pub fn archetype(name: &str) -> Option<&'static SquadArchetype> {
    GARRISON_ARCHETYPES.iter().find(|a| a.name == name)
}

/// Archetypes that list `room` among their preferred rooms.
pub fn archetypes_preferring(room: RoomType) -> Vec<&'static SquadArchetype> {
    GARRISON_ARCHETYPES.iter().filter(|a| a.prefers(room)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squads::MonsterCatalog;

    #[test]
    fn test_every_archetype_has_one_leader() {
        for a in GARRISON_ARCHETYPES {
            assert_eq!(a.units.iter().filter(|u| u.is_leader).count(), 1, "{}", a.name);
        }
    }

    #[test]
    fn test_archetype_units_exist_in_catalog() {
        let catalog = MonsterCatalog::default();
        for a in GARRISON_ARCHETYPES {
            for u in a.units {
                assert!(catalog.get(u.monster).is_some(), "{} uses unknown {}", a.name, u.monster);
            }
        }
    }

    #[test]
    fn test_lookup_and_preferences() {
        assert_eq!(archetype("shield_wall").unwrap().display_name, "Shield Wall");
        assert!(archetype("dragon_nest").is_none());
        let patrol: Vec<&str> = archetypes_preferring(RoomType::PatrolRoute).iter().map(|a| a.name).collect();
        assert_eq!(patrol, vec!["fast_response", "ambush_pack"]);
        assert!(archetypes_preferring(RoomType::Stairs).is_empty());
    }
}
