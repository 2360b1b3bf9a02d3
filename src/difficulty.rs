//! # Difficulty
//!
//! Four master knobs per preset (combat intensity, overworld pressure, AI
//! competence, encounter size offset) are derived into the multipliers the
//! rest of the game reads. The active preset can be switched at any time
//! without a lock.

use crate::{GarrisonError, GarrisonResult};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

const EMBEDDED_DIFFICULTY_CONFIG: &str = include_str!("../assets/difficultyconfig.json");

pub const DIFFICULTY_EASY: &str = "Easy";
pub const DIFFICULTY_MEDIUM: &str = "Medium";
pub const DIFFICULTY_HARD: &str = "Hard";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EncounterDifficulty {
    pub power_multiplier_scale: f64,
    pub squad_count_offset: i32,
    pub min_units_per_squad_offset: i32,
    pub max_units_per_squad_offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverworldDifficulty {
    pub threat_growth_scale: f64,
    pub containment_slowdown_scale: f64,
    pub max_threat_intensity_offset: i32,
    pub spawn_chance_scale: f64,
    pub fortification_strength_gain_scale: f64,
    pub raid_intensity_scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AiDifficulty {
    pub flanking_range_bonus_offset: i32,
    pub isolation_threshold_offset: i32,
    pub retreat_safe_threshold_offset: i32,
    pub shared_ranged_weight_scale: f64,
    pub shared_positional_weight_scale: f64,
}

/// One entry of `difficultyconfig.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyKnobs {
    pub name: String,
    pub combat_intensity: f64,
    pub overworld_pressure: f64,
    pub ai_competence: f64,
    #[serde(default)]
    pub encounter_size_offset: i32,
}

impl DifficultyKnobs {
    pub fn medium() -> Self {
        Self {
            name: DIFFICULTY_MEDIUM.to_string(),
            combat_intensity: 1.0,
            overworld_pressure: 1.0,
            ai_competence: 1.0,
            encounter_size_offset: 0,
        }
    }
}

/// A preset with its derived multipliers.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyPreset {
    pub knobs: DifficultyKnobs,
    pub encounter: EncounterDifficulty,
    pub overworld: OverworldDifficulty,
    pub ai: AiDifficulty,
}

fn round_offset(value: f64) -> i32 {
    value.round() as i32
}

impl DifficultyPreset {
    pub fn derive(knobs: DifficultyKnobs) -> Self {
        let combat = knobs.combat_intensity;
        let pressure = knobs.overworld_pressure;
        let ai = knobs.ai_competence;
        let size = knobs.encounter_size_offset;

        let encounter = EncounterDifficulty {
            power_multiplier_scale: combat,
            squad_count_offset: size,
            min_units_per_squad_offset: size,
            max_units_per_squad_offset: size,
        };
        let overworld = OverworldDifficulty {
            threat_growth_scale: pressure,
            containment_slowdown_scale: 1.0 + (pressure - 1.0) * 0.75,
            max_threat_intensity_offset: round_offset((pressure - 1.0) * 5.0),
            spawn_chance_scale: pressure,
            fortification_strength_gain_scale: pressure,
            raid_intensity_scale: pressure,
        };
        let ai = AiDifficulty {
            flanking_range_bonus_offset: round_offset((ai - 1.0) * 5.0),
            isolation_threshold_offset: -round_offset((ai - 1.0) * 3.0),
            retreat_safe_threshold_offset: round_offset((ai - 1.0) * 7.0),
            shared_ranged_weight_scale: ai,
            shared_positional_weight_scale: ai,
        };
        Self {
            knobs,
            encounter,
            overworld,
            ai,
        }
    }

    pub fn name(&self) -> &str {
        &self.knobs.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyConfig {
    pub difficulties: Vec<DifficultyKnobs>,
    pub default_difficulty: String,
}

impl DifficultyConfig {
    pub fn from_json_str(json: &str) -> GarrisonResult<Self> {
        let config: DifficultyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> GarrisonResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> GarrisonResult<()> {
        let invalid = |msg: String| Err(GarrisonError::InvalidConfig(msg));
        if self.difficulties.is_empty() {
            return invalid("difficulty config must have at least one preset".to_string());
        }

        let mut seen = HashSet::new();
        for preset in &self.difficulties {
            let name = preset.name.as_str();
            if name.is_empty() {
                return invalid("difficulty preset missing name".to_string());
            }
            if !seen.insert(name) {
                return invalid(format!("duplicate difficulty preset name: {}", name));
            }
            for (knob, value) in [
                ("combatIntensity", preset.combat_intensity),
                ("overworldPressure", preset.overworld_pressure),
                ("aiCompetence", preset.ai_competence),
            ] {
                if value <= 0.0 {
                    return invalid(format!("difficulty {}: {} must be positive", name, knob));
                }
            }
        }
        for required in [DIFFICULTY_EASY, DIFFICULTY_MEDIUM, DIFFICULTY_HARD] {
            if !seen.contains(required) {
                return invalid(format!("missing required difficulty preset: {}", required));
            }
        }
        if self.default_difficulty.is_empty() {
            return invalid("defaultDifficulty must be set".to_string());
        }
        if !seen.contains(self.default_difficulty.as_str()) {
            return invalid(format!(
                "defaultDifficulty references unknown preset: {}",
                self.default_difficulty
            ));
        }
        Ok(())
    }
}

/// Holds every preset and the index of the active one.
#[derive(Debug)]
pub struct DifficultyManager {
    presets: Vec<DifficultyPreset>,
    current: AtomicUsize,
}

impl DifficultyManager {
    /// Derives every preset and activates the configured default.
    pub fn from_config(config: DifficultyConfig) -> GarrisonResult<Self> {
        config.validate()?;
        let presets: Vec<DifficultyPreset> = config.difficulties.into_iter().map(DifficultyPreset::derive).collect();
        let current = presets
            .iter()
            .position(|p| p.name() == config.default_difficulty)
            .ok_or_else(|| {
                GarrisonError::InvalidConfig(format!("default difficulty not found: {}", config.default_difficulty))
            })?;
        info!(
            "Difficulty config loaded: {} presets, default: {}",
            presets.len(),
            config.default_difficulty
        );
        Ok(Self {
            presets,
            current: AtomicUsize::new(current),
        })
    }

    /// The presets shipped in `assets/difficultyconfig.json`.
    pub fn embedded() -> Self {
        DifficultyConfig::from_json_str(EMBEDDED_DIFFICULTY_CONFIG)
            .and_then(Self::from_config)
            .unwrap_or_else(|err| {
                error!("embedded difficulty config is invalid: {}", err);
                Self::default()
            })
    }

    pub fn set_difficulty(&self, name: &str) -> GarrisonResult<()> {
        let index = self
            .presets
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| GarrisonError::InvalidAction(format!("unknown difficulty: {:?}", name)))?;
        self.current.store(index, Ordering::Release);
        info!("Difficulty set to {}", name);
        Ok(())
    }

    fn preset(&self) -> &DifficultyPreset {
        &self.presets[self.current.load(Ordering::Acquire)]
    }

    pub fn current_difficulty(&self) -> &str {
        self.preset().name()
    }

    pub fn encounter(&self) -> EncounterDifficulty {
        self.preset().encounter
    }

    pub fn overworld(&self) -> OverworldDifficulty {
        self.preset().overworld
    }

    pub fn ai(&self) -> AiDifficulty {
        self.preset().ai
    }

    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name())
    }
}

impl Default for DifficultyManager {
    /// Medium only.
    fn default() -> Self {
        Self {
            presets: vec![DifficultyPreset::derive(DifficultyKnobs::medium())],
            current: AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knobs(name: &str, combat: f64, pressure: f64, ai: f64, offset: i32) -> DifficultyKnobs {
        DifficultyKnobs {
            name: name.to_string(),
            combat_intensity: combat,
            overworld_pressure: pressure,
            ai_competence: ai,
            encounter_size_offset: offset,
        }
    }

    fn config() -> DifficultyConfig {
        DifficultyConfig {
            difficulties: vec![
                knobs("Easy", 0.7, 0.6, 0.7, -1),
                knobs("Medium", 1.0, 1.0, 1.0, 0),
                knobs("Hard", 1.4, 1.4, 1.3, 1),
            ],
            default_difficulty: "Medium".to_string(),
        }
    }

    #[test]
    fn test_medium_is_identity() {
        let preset = DifficultyPreset::derive(DifficultyKnobs::medium());
        assert_eq!(
            preset.encounter,
            EncounterDifficulty {
                power_multiplier_scale: 1.0,
                squad_count_offset: 0,
                min_units_per_squad_offset: 0,
                max_units_per_squad_offset: 0,
            }
        );
        assert_eq!(
            preset.overworld,
            OverworldDifficulty {
                threat_growth_scale: 1.0,
                containment_slowdown_scale: 1.0,
                max_threat_intensity_offset: 0,
                spawn_chance_scale: 1.0,
                fortification_strength_gain_scale: 1.0,
                raid_intensity_scale: 1.0,
            }
        );
        assert_eq!(
            preset.ai,
            AiDifficulty {
                flanking_range_bonus_offset: 0,
                isolation_threshold_offset: 0,
                retreat_safe_threshold_offset: 0,
                shared_ranged_weight_scale: 1.0,
                shared_positional_weight_scale: 1.0,
            }
        );
    }

    #[test]
    fn test_easy_and_hard_derivation() {
        let easy = DifficultyPreset::derive(knobs("Easy", 0.7, 0.6, 0.7, -1));
        assert!((easy.overworld.containment_slowdown_scale - 0.7).abs() < 1e-9);
        assert_eq!(easy.overworld.max_threat_intensity_offset, -2);
        assert_eq!(easy.ai.flanking_range_bonus_offset, -2);
        assert_eq!(easy.ai.isolation_threshold_offset, 1);
        assert_eq!(easy.ai.retreat_safe_threshold_offset, -2);
        assert_eq!(easy.encounter.squad_count_offset, -1);

        let hard = DifficultyPreset::derive(knobs("Hard", 1.4, 1.4, 1.3, 1));
        assert!((hard.overworld.containment_slowdown_scale - 1.3).abs() < 1e-9);
        assert_eq!(hard.overworld.max_threat_intensity_offset, 2);
        assert_eq!(hard.ai.flanking_range_bonus_offset, 2);
        assert_eq!(hard.ai.isolation_threshold_offset, -1);
        assert_eq!(hard.ai.retreat_safe_threshold_offset, 2);
        assert_eq!(hard.encounter.power_multiplier_scale, 1.4);
    }

    #[test]
    fn test_switching_presets() {
        let manager = DifficultyManager::from_config(config()).unwrap();
        assert_eq!(manager.current_difficulty(), "Medium");
        manager.set_difficulty("Hard").unwrap();
        assert_eq!(manager.current_difficulty(), "Hard");
        assert_eq!(manager.ai().flanking_range_bonus_offset, 2);

        let err = manager.set_difficulty("Nightmare").unwrap_err();
        assert_eq!(err.to_string(), "unknown difficulty: \"Nightmare\"");
        assert_eq!(manager.current_difficulty(), "Hard");
    }

    #[test]
    fn test_default_manager_is_medium_only() {
        let manager = DifficultyManager::default();
        assert_eq!(manager.preset_names().collect::<Vec<_>>(), vec!["Medium"]);
        assert!(manager.set_difficulty("Easy").is_err());
        assert_eq!(manager.encounter().power_multiplier_scale, 1.0);
    }

    #[test]
    fn test_validation_failures() {
        let mut missing = config();
        missing.difficulties.retain(|d| d.name != "Hard");
        assert!(missing.validate().unwrap_err().to_string().contains("Hard"));

        let mut dup = config();
        dup.difficulties.push(knobs("Easy", 1.0, 1.0, 1.0, 0));
        assert!(dup.validate().is_err());

        let mut zero = config();
        zero.difficulties[0].ai_competence = 0.0;
        assert!(zero.validate().is_err());

        let mut bad_default = config();
        bad_default.default_difficulty = "Extreme".to_string();
        assert!(bad_default.validate().is_err());

        let empty = DifficultyConfig {
            difficulties: Vec::new(),
            default_difficulty: "Medium".to_string(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_embedded_presets() {
        let manager = DifficultyManager::embedded();
        let names: Vec<&str> = manager.preset_names().collect();
        assert!(names.contains(&"Easy") && names.contains(&"Hard"));
        assert_eq!(manager.current_difficulty(), "Medium");
    }
}
