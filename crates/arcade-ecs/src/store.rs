//! The entity store seam the factory writes through

use arcade_core::{ArcadeError, Result};
use hecs::Component;
use std::fmt;
use std::hash::Hash;

/// Minimal surface the entity factory needs from an entity store.
///
/// Attaching a component of a kind the entity already has replaces the
/// previous value, so an entity never carries two values of one kind.
pub trait EntityStore {
    /// Opaque handle owned by the store
    type Entity: Copy + Eq + Hash + fmt::Debug;

    /// Create an entity with no components
    fn create_entity(&mut self) -> Self::Entity;

    /// Attach (or replace) a component on an entity
    fn attach<C: Component>(&mut self, entity: Self::Entity, component: C) -> Result<()>;

    /// Remove an entity and every component attached to it
    fn destroy_entity(&mut self, entity: Self::Entity) -> Result<()>;

    /// Check if an entity is alive
    fn contains(&self, entity: Self::Entity) -> bool;
}

impl EntityStore for hecs::World {
    type Entity = hecs::Entity;

    fn create_entity(&mut self) -> hecs::Entity {
        self.spawn(())
    }

    fn attach<C: Component>(&mut self, entity: hecs::Entity, component: C) -> Result<()> {
        self.insert_one(entity, component)
            .map_err(|_| ArcadeError::EntityNotFound(format!("{:?}", entity)))
    }

    fn destroy_entity(&mut self, entity: hecs::Entity) -> Result<()> {
        self.despawn(entity)
            .map_err(|_| ArcadeError::EntityNotFound(format!("{:?}", entity)))
    }

    fn contains(&self, entity: hecs::Entity) -> bool {
        hecs::World::contains(self, entity)
    }
}
