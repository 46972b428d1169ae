//! Archetype listing command

use anyhow::{Context, Result};
use arcade_ecs::ArcadeWorld;
use arcade_factory::{EntityFactory, FactoryConfig};

pub fn run(config: &FactoryConfig) -> Result<()> {
    let mut factory: EntityFactory<ArcadeWorld> = EntityFactory::new(config);
    let names = factory
        .locator()
        .finder()
        .archetypes()
        .context("Failed to scan definitions directory")?;

    if names.is_empty() {
        println!("No definitions found in {}", config.definitions_dir.display());
        return Ok(());
    }

    println!("Archetypes in {}:", config.definitions_dir.display());
    for name in names {
        let path = factory.resolve(&name)?;
        let relative = path.strip_prefix(&config.definitions_dir).unwrap_or(path.as_path());
        println!("  {:<20} {}", name, relative.display());
    }

    Ok(())
}
