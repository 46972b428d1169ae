//! CLI command implementations

pub mod list;
pub mod spawn;
pub mod validate;
