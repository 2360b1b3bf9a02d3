//! Raid configuration loaded from `raidconfig.json`.
//!
//! Every section is optional in the file. Accessors fall back to the
//! built-in defaults for values left at zero.

use super::archetype;
use crate::game::Position;
use crate::{GarrisonError, GarrisonResult};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

const EMBEDDED_RAID_CONFIG: &str = include_str!("../../assets/raidconfig.json");

pub const DEFAULT_CRITICAL_PATH_ARCHETYPES: &[&str] = &["chokepoint_guard", "shield_wall", "orc_vanguard"];
pub const DEFAULT_BRANCH_ARCHETYPES: &[&str] = &["ranged_battery", "fast_response", "ambush_pack"];
pub const DEFAULT_ELITE_ARCHETYPES: &[&str] = &["mage_tower", "command_post"];
pub const DEFAULT_RESERVE_ARCHETYPES: &[&str] = &["fast_response", "ambush_pack"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RaidSettings {
    pub max_player_squads: usize,
    pub max_deployed_per_encounter: usize,
    pub default_floor_count: usize,
    pub reserves_per_floor: usize,
    pub extra_reserves_after_floor: usize,
    pub combat_position_x: i32,
    pub combat_position_y: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecoverySettings {
    #[serde(rename = "deployedHPPercent")]
    pub deployed_hp_percent: u32,
    #[serde(rename = "reserveHPPercent")]
    pub reserve_hp_percent: u32,
    pub between_floor_morale_bonus: i32,
    pub victory_morale_bonus: i32,
    pub rest_room_morale_bonus: i32,
    #[serde(rename = "restRoomHPPercent")]
    pub rest_room_hp_percent: u32,
    #[serde(rename = "betweenFloorHPPercent")]
    pub between_floor_hp_percent: u32,
    pub unit_death_morale_penalty: i32,
    pub defeat_morale_penalty: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertLevelConfig {
    pub level: u32,
    pub name: String,
    pub encounter_threshold: u32,
    pub armor_bonus: i32,
    pub strength_bonus: i32,
    pub weapon_bonus: i32,
    pub activates_reserves: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub levels: Vec<AlertLevelConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoraleThresholdConfig {
    pub min_morale: i32,
    pub max_morale: i32,
    pub dex_penalty: i32,
    pub str_penalty: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoraleSettings {
    pub thresholds: Vec<MoraleThresholdConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RewardSettings {
    pub command_post_mana_restore: u32,
    pub base_gold: u32,
    pub base_experience: u32,
    pub floor_scale_percent: u32,
}

impl Default for RewardSettings {
    fn default() -> Self {
        Self {
            command_post_mana_restore: 10,
            base_gold: 100,
            base_experience: 100,
            floor_scale_percent: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArchetypeAssignmentSettings {
    pub critical_path_archetypes: Vec<String>,
    pub branch_archetypes: Vec<String>,
    pub elite_archetypes: Vec<String>,
    pub elite_floor_threshold: usize,
    pub reserve_archetypes: Vec<String>,
}

/// Complete raid configuration. Shared as `Arc<RaidConfig>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidConfig {
    #[serde(default)]
    pub raid: RaidSettings,
    #[serde(default)]
    pub recovery: RecoverySettings,
    #[serde(default)]
    pub alert: AlertSettings,
    #[serde(default)]
    pub morale: MoraleSettings,
    #[serde(default)]
    pub rewards: RewardSettings,
    #[serde(default)]
    pub archetype_assignment: ArchetypeAssignmentSettings,
}

fn pool<'a>(configured: &'a [String], fallback: &'static [&'static str]) -> Vec<&'a str> {
    if configured.is_empty() {
        fallback.to_vec()
    } else {
        configured.iter().map(String::as_str).collect()
    }
}

fn or_default<T: PartialEq + Default>(value: T, fallback: T) -> T {
    if value == T::default() {
        fallback
    } else {
        value
    }
}

impl RaidConfig {
    /// Parses and validates a configuration document.
    pub fn from_json_str(json: &str) -> GarrisonResult<Self> {
        let config: RaidConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> GarrisonResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        info!("Loaded raid config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> GarrisonResult<()> {
        let invalid = |msg: String| Err(GarrisonError::InvalidConfig(msg));

        for pair in self.alert.levels.windows(2) {
            if pair[1].level <= pair[0].level {
                return invalid(format!(
                    "alert level {} must be greater than {}",
                    pair[1].level, pair[0].level
                ));
            }
            if pair[1].encounter_threshold <= pair[0].encounter_threshold {
                return invalid(format!(
                    "alert level {}: encounter threshold {} must exceed {}",
                    pair[1].level, pair[1].encounter_threshold, pair[0].encounter_threshold
                ));
            }
        }

        for t in &self.morale.thresholds {
            if t.min_morale > t.max_morale {
                return invalid(format!(
                    "morale threshold {}..{} has min above max",
                    t.min_morale, t.max_morale
                ));
            }
        }

        let r = &self.recovery;
        for (name, value) in [
            ("deployedHPPercent", r.deployed_hp_percent),
            ("reserveHPPercent", r.reserve_hp_percent),
            ("restRoomHPPercent", r.rest_room_hp_percent),
            ("betweenFloorHPPercent", r.between_floor_hp_percent),
            ("floorScalePercent", self.rewards.floor_scale_percent),
        ] {
            if value > 100 {
                return invalid(format!("{} must be within 0..=100, got {}", name, value));
            }
        }

        let a = &self.archetype_assignment;
        for name in a
            .critical_path_archetypes
            .iter()
            .chain(&a.branch_archetypes)
            .chain(&a.elite_archetypes)
            .chain(&a.reserve_archetypes)
        {
            if archetype(name).is_none() {
                return invalid(format!("unknown archetype: {}", name));
            }
        }
        Ok(())
    }

    pub fn max_player_squads(&self) -> usize {
        or_default(self.raid.max_player_squads, 4)
    }

    pub fn max_deployed_per_encounter(&self) -> usize {
        or_default(self.raid.max_deployed_per_encounter, 3)
    }

    pub fn default_floor_count(&self) -> usize {
        or_default(self.raid.default_floor_count, 3)
    }

    /// Fixed spot where raid combat takes place.
    pub fn combat_position(&self) -> Position {
        if self.raid.combat_position_x > 0 || self.raid.combat_position_y > 0 {
            Position::new(self.raid.combat_position_x, self.raid.combat_position_y)
        } else {
            Position::new(50, 40)
        }
    }

    /// Reserve squads spawned on `floor`; one extra from the configured floor on.
    pub fn reserve_count_for_floor(&self, floor: usize) -> usize {
        let base = or_default(self.raid.reserves_per_floor, 1);
        let threshold = or_default(self.raid.extra_reserves_after_floor, 3);
        if floor >= threshold {
            base + 1
        } else {
            base
        }
    }

    pub fn critical_path_archetypes(&self) -> Vec<&str> {
        pool(&self.archetype_assignment.critical_path_archetypes, DEFAULT_CRITICAL_PATH_ARCHETYPES)
    }

    pub fn branch_archetypes(&self) -> Vec<&str> {
        pool(&self.archetype_assignment.branch_archetypes, DEFAULT_BRANCH_ARCHETYPES)
    }

    pub fn elite_archetypes(&self) -> Vec<&str> {
        pool(&self.archetype_assignment.elite_archetypes, DEFAULT_ELITE_ARCHETYPES)
    }

    pub fn elite_floor_threshold(&self) -> usize {
        or_default(self.archetype_assignment.elite_floor_threshold, 3)
    }

    pub fn reserve_archetypes(&self) -> Vec<&str> {
        pool(&self.archetype_assignment.reserve_archetypes, DEFAULT_RESERVE_ARCHETYPES)
    }

    pub fn alert_level(&self, level: u32) -> Option<&AlertLevelConfig> {
        self.alert.levels.iter().find(|l| l.level == level)
    }

    /// Morale tier containing `morale`, if any.
    pub fn morale_threshold(&self, morale: i32) -> Option<&MoraleThresholdConfig> {
        self.morale
            .thresholds
            .iter()
            .find(|t| morale >= t.min_morale && morale <= t.max_morale)
    }
}

impl Default for RaidConfig {
    /// The configuration shipped in `assets/raidconfig.json`.
    fn default() -> Self {
        Self::from_json_str(EMBEDDED_RAID_CONFIG).unwrap_or_else(|err| {
            error!("embedded raid config is invalid: {}", err);
            Self::fallback()
        })
    }
}

impl RaidConfig {
    /// Empty sections only; every accessor returns its built-in default.
    pub fn fallback() -> Self {
        Self {
            raid: RaidSettings::default(),
            recovery: RecoverySettings::default(),
            alert: AlertSettings::default(),
            morale: MoraleSettings::default(),
            rewards: RewardSettings::default(),
            archetype_assignment: ArchetypeAssignmentSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = RaidConfig::from_json_str(EMBEDDED_RAID_CONFIG).unwrap();
        assert_eq!(config.max_player_squads(), 4);
        assert_eq!(config.rewards.base_gold, 100);
        assert_eq!(config.rewards.floor_scale_percent, 20);
        assert!(!config.alert.levels.is_empty());
        assert!(config.morale_threshold(100).is_some());
    }

    #[test]
    fn test_empty_document_uses_fallbacks() {
        let config = RaidConfig::from_json_str("{}").unwrap();
        assert_eq!(config.max_player_squads(), 4);
        assert_eq!(config.max_deployed_per_encounter(), 3);
        assert_eq!(config.default_floor_count(), 3);
        assert_eq!(config.combat_position(), Position::new(50, 40));
        assert_eq!(config.reserve_count_for_floor(1), 1);
        assert_eq!(config.reserve_count_for_floor(3), 2);
        assert_eq!(config.critical_path_archetypes(), DEFAULT_CRITICAL_PATH_ARCHETYPES.to_vec());
        assert_eq!(config.reserve_archetypes(), vec!["fast_response", "ambush_pack"]);
        assert_eq!(config.elite_floor_threshold(), 3);
        assert!(config.alert_level(1).is_none());
        assert!(config.morale_threshold(50).is_none());
    }

    #[test]
    fn test_rejects_unordered_alert_levels() {
        let json = r#"{"alert":{"levels":[
            {"level":0,"encounterThreshold":0},
            {"level":1,"encounterThreshold":3},
            {"level":2,"encounterThreshold":2}
        ]}}"#;
        let err = RaidConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, GarrisonError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_unknown_archetype_and_bad_percent() {
        let json = r#"{"archetypeAssignment":{"branchArchetypes":["dragon_nest"]}}"#;
        assert!(RaidConfig::from_json_str(json)
            .unwrap_err()
            .to_string()
            .contains("unknown archetype: dragon_nest"));

        let json = r#"{"recovery":{"reserveHPPercent":120}}"#;
        assert!(RaidConfig::from_json_str(json).is_err());

        let json = r#"{"morale":{"thresholds":[{"minMorale":60,"maxMorale":20}]}}"#;
        assert!(RaidConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"raid":{{"maxPlayerSquads":6,"combatPositionX":10,"combatPositionY":12}}}}"#).unwrap();
        let config = RaidConfig::load(file.path()).unwrap();
        assert_eq!(config.max_player_squads(), 6);
        assert_eq!(config.combat_position(), Position::new(10, 12));

        assert!(matches!(
            RaidConfig::load("/definitely/not/here.json"),
            Err(GarrisonError::Io(_))
        ));
    }
}
