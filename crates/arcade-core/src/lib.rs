//! Arcade Core - Foundational types for the Arcade entity factory
//!
//! This crate provides the core types that all other Arcade crates depend on:
//! - `EntityId` - Stable entity identifiers
//! - `GridVec`, `Tint`, `TextureId` - Grid and sprite value types
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{ArcadeError, Result};
pub use id::EntityId;
pub use types::{GridVec, TextureId, Tint};
