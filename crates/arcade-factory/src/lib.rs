//! Arcade Factory - Data-driven entity construction
//!
//! This crate turns named archetype definitions into populated entities:
//! a cached locator finds the definition file, a parser evaluates it into
//! component blocks, and a dispatch table materializes each block into a
//! typed component on a fresh entity.

mod config;
mod definition;
mod dispatch;
mod factory;
mod fields;
mod locator;
mod materialize;

pub use config::{FactoryConfig, ScriptLimits};
pub use definition::{
    toml_to_dynamic, ComponentBlock, Definition, DefinitionFormat, DefinitionParser, KIND_FIELD,
};
pub use dispatch::{ComponentTable, FromBlock, MaterializeContext, Registration, TextureTable};
pub use factory::{BlockIssue, BlockProblem, EntityFactory, Spawned};
pub use locator::{DefinitionFinder, DefinitionLocator, FsFinder};
pub use materialize::ANIMATION_SPRITE_ALIAS;
