//! Arcade ECS - Entity store and typed components
//!
//! This crate wraps hecs with process-unique entity identifiers and
//! defines the component records that entity definitions materialize into.

mod components;
mod input;
mod store;
mod world;

pub use components::{AnimatedSprite, Collision, Movement, Pickup, Player, Position, Sprite};
pub use input::{Action, Behavior, Input};
pub use store::EntityStore;
pub use world::ArcadeWorld;

/// Marker bound for anything that can be attached to an entity
pub use hecs::Component;
