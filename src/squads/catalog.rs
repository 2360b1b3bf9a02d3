//! Unit templates loaded from `monsterdata.json`.

use super::{Attributes, UnitRole, SQUAD_GRID_SIZE};
use crate::{GarrisonError, GarrisonResult};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const EMBEDDED_MONSTER_DATA: &str = include_str!("../../assets/monsterdata.json");

fn one() -> i32 {
    1
}

/// Blueprint for one unit. Grid placement fields are overridden per squad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitTemplate {
    pub unit_type: String,
    #[serde(default)]
    pub role: UnitRole,
    pub attributes: Attributes,
    #[serde(default)]
    pub grid_row: i32,
    #[serde(default)]
    pub grid_col: i32,
    #[serde(default = "one")]
    pub grid_width: i32,
    #[serde(default = "one")]
    pub grid_height: i32,
    #[serde(default)]
    pub is_leader: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct MonsterFile {
    monsters: Vec<UnitTemplate>,
}

/// All known unit templates, keyed by unit type.
#[derive(Debug, Clone, PartialEq)]
pub struct MonsterCatalog {
    templates: Vec<UnitTemplate>,
}

impl MonsterCatalog {
    pub fn empty() -> Self {
        Self { templates: Vec::new() }
    }

    /// Parses and validates monster data.
    pub fn from_json_str(json: &str) -> GarrisonResult<Self> {
        let file: MonsterFile = serde_json::from_str(json)?;
        let catalog = Self {
            templates: file.monsters,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Loads monster data from disk.
    pub fn load(path: impl AsRef<Path>) -> GarrisonResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json)?;
        info!("Loaded {} unit templates from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    fn validate(&self) -> GarrisonResult<()> {
        let mut seen = HashSet::new();
        for template in &self.templates {
            let name = &template.unit_type;
            if name.is_empty() {
                return Err(GarrisonError::InvalidConfig("unit type cannot be empty".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(GarrisonError::InvalidConfig(format!("duplicate unit type: {}", name)));
            }
            if template.attributes.max_health <= 0 {
                return Err(GarrisonError::InvalidConfig(format!(
                    "unit {}: maxHealth must be positive",
                    name
                )));
            }
            let size_ok = |v: i32| (1..=SQUAD_GRID_SIZE).contains(&v);
            if !size_ok(template.grid_width) || !size_ok(template.grid_height) {
                return Err(GarrisonError::InvalidConfig(format!(
                    "unit {}: grid size {}x{} must be within 1..={}",
                    name, template.grid_width, template.grid_height, SQUAD_GRID_SIZE
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, unit_type: &str) -> Option<&UnitTemplate> {
        self.templates.iter().find(|t| t.unit_type == unit_type)
    }

    pub fn unit_types(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.unit_type.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for MonsterCatalog {
    /// The catalog shipped in `assets/monsterdata.json`.
    fn default() -> Self {
        Self::from_json_str(EMBEDDED_MONSTER_DATA).unwrap_or_else(|err| {
            error!("embedded monster data is invalid: {}", err);
            Self::empty()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = MonsterCatalog::from_json_str(EMBEDDED_MONSTER_DATA).unwrap();
        assert!(catalog.len() >= 22);
        let ogre = catalog.get("Ogre").unwrap();
        assert_eq!(ogre.role, UnitRole::Tank);
        assert!(ogre.attributes.max_health > 0);
        assert!(catalog.get("Dragon").is_none());
    }

    #[test]
    fn test_grid_size_defaults_to_one() {
        let json = r#"{"monsters":[{"unitType":"Imp","attributes":{"maxHealth":5,"strength":1,"dexterity":1,"armor":0,"weapon":1}}]}"#;
        let catalog = MonsterCatalog::from_json_str(json).unwrap();
        let imp = catalog.get("Imp").unwrap();
        assert_eq!((imp.grid_width, imp.grid_height), (1, 1));
        assert_eq!(imp.attributes.level, 1);
        assert_eq!(imp.role, UnitRole::Dps);
    }

    #[test]
    fn test_duplicate_unit_type_rejected() {
        let json = r#"{"monsters":[
            {"unitType":"Imp","attributes":{"maxHealth":5,"strength":1,"dexterity":1,"armor":0,"weapon":1}},
            {"unitType":"Imp","attributes":{"maxHealth":5,"strength":1,"dexterity":1,"armor":0,"weapon":1}}
        ]}"#;
        let err = MonsterCatalog::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("duplicate unit type: Imp"));
    }

    #[test]
    fn test_zero_health_rejected() {
        let json = r#"{"monsters":[{"unitType":"Ghost","attributes":{"maxHealth":0,"strength":1,"dexterity":1,"armor":0,"weapon":1}}]}"#;
        assert!(matches!(
            MonsterCatalog::from_json_str(json),
            Err(GarrisonError::InvalidConfig(_))
        ));
    }
}
