//! # Entity Store
//!
//! A small typed component store. Entities are plain IDs; each component
//! type lives in its own table keyed by entity ID. Queries return entities in
//! creation order so that everything built on top of the store stays
//! deterministic for a fixed seed.

use crate::game::{new_entity_id, EntityId};
use crate::{GarrisonError, GarrisonResult};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

/// Marker for types that can be attached to entities.
pub trait Component: Any + Send + Sync {}

impl<T: Any + Send + Sync> Component for T {}

type ComponentTable = HashMap<EntityId, Box<dyn Any + Send + Sync>>;

/// Owns every entity and component in a session.
///
/// # Examples
///
/// ```
/// use garrison::EntityManager;
///
/// #[derive(Debug, PartialEq)]
/// struct Health(u32);
///
/// let mut manager = EntityManager::new();
/// let id = manager.create_entity();
/// manager.add_component(id, Health(10)).unwrap();
/// assert_eq!(manager.get::<Health>(id), Some(&Health(10)));
/// assert_eq!(manager.query::<Health>(), vec![id]);
/// ```
#[derive(Default)]
pub struct EntityManager {
    /// All live entities, in creation order
    entities: Vec<EntityId>,
    /// Fast membership check for `entities`
    alive: HashSet<EntityId>,
    /// Component tables keyed by component type
    components: HashMap<TypeId, ComponentTable>,
}

impl std::fmt::Debug for EntityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityManager")
            .field("entities", &self.entities.len())
            .field("component_types", &self.components.len())
            .finish()
    }
}

impl EntityManager {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new entity with no components.
    pub fn create_entity(&mut self) -> EntityId {
        let id = new_entity_id();
        self.entities.push(id);
        self.alive.insert(id);
        id
    }

    /// Creates an entity with a single component attached.
    pub fn spawn<T: Component>(&mut self, component: T) -> EntityId {
        let id = self.create_entity();
        self.insert_unchecked(id, component);
        id
    }

    /// Checks if an entity exists.
    pub fn contains(&self, id: EntityId) -> bool {
        self.alive.contains(&id)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true when the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Attaches a component, replacing any previous component of the same type.
    pub fn add_component<T: Component>(&mut self, id: EntityId, component: T) -> GarrisonResult<()> {
        if !self.contains(id) {
            return Err(GarrisonError::NotFound(format!("entity {} not found", id)));
        }
        self.insert_unchecked(id, component);
        Ok(())
    }

    fn insert_unchecked<T: Component>(&mut self, id: EntityId, component: T) {
        self.components
            .entry(TypeId::of::<T>())
            .or_default()
            .insert(id, Box::new(component));
    }

    /// Gets a component of the given type.
    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.components
            .get(&TypeId::of::<T>())
            .and_then(|table| table.get(&id))
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Gets a component of the given type mutably.
    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.components
            .get_mut(&TypeId::of::<T>())
            .and_then(|table| table.get_mut(&id))
            .and_then(|boxed| boxed.downcast_mut::<T>())
    }

    /// Checks whether an entity carries a component type.
    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.get::<T>(id).is_some()
    }

    /// Detaches and returns a component.
    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Option<T> {
        self.components
            .get_mut(&TypeId::of::<T>())
            .and_then(|table| table.remove(&id))
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Destroys an entity and all of its components.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        if !self.alive.remove(&id) {
            return false;
        }
        self.entities.retain(|e| *e != id);
        for table in self.components.values_mut() {
            table.remove(&id);
        }
        true
    }

    /// All entities carrying a component type, in creation order.
    pub fn query<T: Component>(&self) -> Vec<EntityId> {
        match self.components.get(&TypeId::of::<T>()) {
            Some(table) => self
                .entities
                .iter()
                .copied()
                .filter(|id| table.contains_key(id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Iterates over `(id, component)` pairs in creation order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        let table = self.components.get(&TypeId::of::<T>());
        self.entities.iter().filter_map(move |id| {
            table
                .and_then(|t| t.get(id))
                .and_then(|boxed| boxed.downcast_ref::<T>())
                .map(|c| (*id, c))
        })
    }

    /// First entity whose component matches the predicate.
    pub fn find<T: Component>(&self, predicate: impl Fn(&T) -> bool) -> Option<EntityId> {
        self.iter::<T>().find(|(_, c)| predicate(c)).map(|(id, _)| id)
    }
}
