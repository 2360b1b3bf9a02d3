//! Loading the JSON data files from disk.

use garrison::{DifficultyConfig, DifficultyManager, GarrisonError, GarrisonResult, MonsterCatalog, RaidConfig};
use std::io::Write;

fn temp_json(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_shipped_assets_load() -> GarrisonResult<()> {
    let root = env!("CARGO_MANIFEST_DIR");
    let raid = RaidConfig::load(format!("{}/assets/raidconfig.json", root))?;
    assert_eq!(raid, RaidConfig::default());

    let difficulty = DifficultyConfig::load(format!("{}/assets/difficultyconfig.json", root))?;
    assert_eq!(difficulty.default_difficulty, "Medium");

    let catalog = MonsterCatalog::load(format!("{}/assets/monsterdata.json", root))?;
    assert!(catalog.get("Knight").is_some());
    Ok(())
}

#[test]
fn test_difficulty_file_drives_manager() -> GarrisonResult<()> {
    let file = temp_json(
        r#"{
            "difficulties": [
                {"name": "Easy", "combatIntensity": 0.7, "overworldPressure": 0.6, "aiCompetence": 0.7, "encounterSizeOffset": -1},
                {"name": "Medium", "combatIntensity": 1.0, "overworldPressure": 1.0, "aiCompetence": 1.0},
                {"name": "Hard", "combatIntensity": 1.4, "overworldPressure": 1.4, "aiCompetence": 1.3, "encounterSizeOffset": 1}
            ],
            "defaultDifficulty": "Hard"
        }"#,
    );
    let manager = DifficultyManager::from_config(DifficultyConfig::load(file.path())?)?;
    assert_eq!(manager.current_difficulty(), "Hard");
    assert_eq!(manager.overworld().max_threat_intensity_offset, 2);

    manager.set_difficulty("Medium")?;
    let encounter = manager.encounter();
    assert_eq!(encounter.power_multiplier_scale, 1.0);
    assert_eq!(encounter.squad_count_offset, 0);
    let ai = manager.ai();
    assert_eq!(ai.flanking_range_bonus_offset, 0);
    assert_eq!(ai.shared_ranged_weight_scale, 1.0);
    Ok(())
}

#[test]
fn test_difficulty_file_missing_hard_is_rejected() {
    let file = temp_json(
        r#"{
            "difficulties": [
                {"name": "Easy", "combatIntensity": 0.7, "overworldPressure": 0.6, "aiCompetence": 0.7},
                {"name": "Medium", "combatIntensity": 1.0, "overworldPressure": 1.0, "aiCompetence": 1.0}
            ],
            "defaultDifficulty": "Medium"
        }"#,
    );
    let err = DifficultyConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, GarrisonError::InvalidConfig(_)));
    assert!(err.to_string().contains("missing required difficulty preset: Hard"));
}

#[test]
fn test_malformed_raid_config_is_a_serde_error() {
    let file = temp_json(r#"{"raid": {"maxPlayerSquads": "four"}}"#);
    assert!(matches!(RaidConfig::load(file.path()), Err(GarrisonError::Serde(_))));
}

#[test]
fn test_monster_file_with_duplicates_is_rejected() {
    let file = temp_json(
        r#"{"monsters": [
            {"unitType": "Goblin", "role": "Dps", "gridWidth": 1, "gridHeight": 1,
             "attributes": {"maxHealth": 10, "strength": 2, "dexterity": 3, "armor": 0, "weapon": 1}},
            {"unitType": "Goblin", "role": "Dps", "gridWidth": 1, "gridHeight": 1,
             "attributes": {"maxHealth": 10, "strength": 2, "dexterity": 3, "armor": 0, "weapon": 1}}
        ]}"#,
    );
    let err = MonsterCatalog::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("duplicate unit type: Goblin"));
}
