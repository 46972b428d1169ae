//! ArcadeWorld - hecs world addressed by process-unique ids

use crate::store::EntityStore;
use arcade_core::{ArcadeError, EntityId, Result};
use bimap::BiMap;
use hecs::Component;

/// The entity store used by the game and the editor
///
/// Wraps hecs::World with:
/// - Process-unique EntityId mapping (hecs handles are recycled)
/// - Typed component access by EntityId
pub struct ArcadeWorld {
    /// The underlying hecs world
    world: hecs::World,
    /// Bidirectional mapping: EntityId <-> hecs::Entity
    id_map: BiMap<EntityId, hecs::Entity>,
}

impl Default for ArcadeWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcadeWorld {
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
            id_map: BiMap::new(),
        }
    }

    fn handle(&self, id: EntityId) -> Result<hecs::Entity> {
        self.id_map
            .get_by_left(&id)
            .copied()
            .ok_or_else(|| ArcadeError::EntityNotFound(id.to_string()))
    }

    /// Spawn an entity with no components
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId::next();
        let hecs_entity = self.world.spawn(());
        self.id_map.insert(id, hecs_entity);
        id
    }

    /// Despawn an entity and all of its components
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        let hecs_entity = self.handle(id)?;

        self.world
            .despawn(hecs_entity)
            .map_err(|_| ArcadeError::EntityNotFound(id.to_string()))?;
        self.id_map.remove_by_left(&id);

        tracing::debug!(entity = %id, "despawned entity");
        Ok(())
    }

    /// Insert or replace a component
    pub fn insert<C: Component>(&mut self, id: EntityId, component: C) -> Result<()> {
        let hecs_entity = self.handle(id)?;
        self.world
            .insert_one(hecs_entity, component)
            .map_err(|_| ArcadeError::EntityNotFound(id.to_string()))
    }

    /// Remove a component, returning it if it was present
    pub fn remove<C: Component>(&mut self, id: EntityId) -> Option<C> {
        let hecs_entity = self.handle(id).ok()?;
        self.world.remove_one::<C>(hecs_entity).ok()
    }

    /// Borrow a component
    pub fn get<C: Component>(&self, id: EntityId) -> Option<hecs::Ref<'_, C>> {
        let hecs_entity = self.handle(id).ok()?;
        self.world.get::<&C>(hecs_entity).ok()
    }

    /// Mutably borrow a component
    pub fn get_mut<C: Component>(&self, id: EntityId) -> Option<hecs::RefMut<'_, C>> {
        let hecs_entity = self.handle(id).ok()?;
        self.world.get::<&mut C>(hecs_entity).ok()
    }

    /// Check if an entity has a component of type `C`
    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        self.handle(id)
            .ok()
            .and_then(|e| self.world.entity(e).ok())
            .map(|entity| entity.has::<C>())
            .unwrap_or(false)
    }

    /// Ids of every entity carrying a component of type `C`
    pub fn with<C: Component>(&self) -> Vec<EntityId> {
        let mut query = self.world.query::<&C>();
        let mut ids: Vec<EntityId> = query
            .iter()
            .filter_map(|(e, _)| self.id_map.get_by_right(&e).copied())
            .collect();
        ids.sort();
        ids
    }

    /// Check if an entity exists
    pub fn contains(&self, id: EntityId) -> bool {
        self.id_map.contains_left(&id)
    }

    /// Get number of entities
    pub fn entity_count(&self) -> usize {
        self.id_map.len()
    }

    /// Iterate over live entity ids
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.id_map.left_values().copied()
    }

    /// Clear the world
    pub fn clear(&mut self) {
        self.world.clear();
        self.id_map.clear();
    }
}

impl EntityStore for ArcadeWorld {
    type Entity = EntityId;

    fn create_entity(&mut self) -> EntityId {
        self.spawn()
    }

    fn attach<C: Component>(&mut self, entity: EntityId, component: C) -> Result<()> {
        self.insert(entity, component)
    }

    fn destroy_entity(&mut self, entity: EntityId) -> Result<()> {
        self.despawn(entity)
    }

    fn contains(&self, entity: EntityId) -> bool {
        ArcadeWorld::contains(self, entity)
    }
}
