//! # Generator Registry
//!
//! Name-keyed lookup of map generators, with a fallback to the default
//! generator for unknown names.

use super::{
    BspGenerator, CaveGenerator, HybridGenerator, MapGenerator, OverworldGenerator,
    PerlinBiomeGenerator, RoomsCorridorsGenerator, WaveletGenerator,
};
use log::warn;

/// Generator used when a name is unknown.
pub const DEFAULT_GENERATOR: &str = "rooms_corridors";

/// Owns one instance of every registered generator.
///
/// # Examples
///
/// ```
/// use garrison::GeneratorRegistry;
///
/// let registry = GeneratorRegistry::new();
/// assert!(registry.get("bsp").is_some());
/// assert_eq!(registry.get_or_default("no_such_map").name(), "rooms_corridors");
/// ```
pub struct GeneratorRegistry {
    generators: Vec<Box<dyn MapGenerator>>,
    default_index: usize,
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.names())
            .finish()
    }
}

impl GeneratorRegistry {
    /// Registry with all built-in generators.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(RoomsCorridorsGenerator::new()));
        registry.register(Box::new(BspGenerator::new()));
        registry.register(Box::new(CaveGenerator::new()));
        registry.register(Box::new(HybridGenerator::new()));
        registry.register(Box::new(WaveletGenerator::new()));
        registry.register(Box::new(OverworldGenerator::new()));
        registry.register(Box::new(PerlinBiomeGenerator::new()));
        registry
    }

    fn empty() -> Self {
        Self {
            generators: Vec::new(),
            default_index: 0,
        }
    }

    /// Adds a generator, replacing any existing one with the same name.
    pub fn register(&mut self, generator: Box<dyn MapGenerator>) {
        let name = generator.name();
        match self.generators.iter().position(|g| g.name() == name) {
            Some(index) => self.generators[index] = generator,
            None => self.generators.push(generator),
        }
        if name == DEFAULT_GENERATOR {
            if let Some(index) = self.generators.iter().position(|g| g.name() == name) {
                self.default_index = index;
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn MapGenerator> {
        self.generators
            .iter()
            .find(|g| g.name() == name)
            .map(|g| g.as_ref())
    }

    /// Looks up a generator, falling back to the default.
    pub fn get_or_default(&self, name: &str) -> &dyn MapGenerator {
        if let Some(generator) = self.get(name) {
            return generator;
        }
        warn!("unknown generator '{}', using '{}'", name, DEFAULT_GENERATOR);
        self.generators[self.default_index].as_ref()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_generators_registered() {
        let registry = GeneratorRegistry::new();
        assert_eq!(
            registry.names(),
            vec![
                "rooms_corridors",
                "bsp",
                "cave_tactical",
                "hybrid_tactical",
                "wavelet_procedural",
                "overworld",
                "perlin_biome",
            ]
        );
        for name in registry.names() {
            assert!(!registry.get(name).map(|g| g.description()).unwrap_or("").is_empty());
        }
    }

    #[test]
    fn test_unknown_name_falls_back() {
        let registry = GeneratorRegistry::new();
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.get_or_default("missing").name(), DEFAULT_GENERATOR);
        assert_eq!(registry.get_or_default("cave_tactical").name(), "cave_tactical");
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = GeneratorRegistry::new();
        registry.register(Box::new(BspGenerator::new()));
        assert_eq!(registry.len(), 7);
    }
}
