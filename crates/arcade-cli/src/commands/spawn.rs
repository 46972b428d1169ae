//! Spawn command: build one archetype and show what it became

use anyhow::{Context, Result};
use arcade_core::EntityId;
use arcade_ecs::{
    AnimatedSprite, ArcadeWorld, Collision, Input, Movement, Pickup, Player, Position, Sprite,
};
use arcade_factory::{EntityFactory, FactoryConfig, Spawned};

pub fn run(config: &FactoryConfig, name: &str, format: &str) -> Result<()> {
    let mut factory: EntityFactory<ArcadeWorld> = EntityFactory::new(config);
    let mut world = ArcadeWorld::new();

    let spawned = factory
        .spawn(name, &mut world)
        .with_context(|| format!("Failed to spawn '{}'", name))?;

    if format == "json" {
        print_json(&world, &spawned)?;
    } else {
        print_text(&world, &spawned);
    }

    Ok(())
}

fn print_text(world: &ArcadeWorld, spawned: &Spawned<EntityId>) {
    let id = spawned.entity;
    println!("Spawned '{}' as entity {}", spawned.archetype, id);
    println!();

    if let Some(p) = world.get::<Position>(id) {
        println!("  Position        ({}, {})", p.position.x, p.position.y);
    }
    if let Some(m) = world.get::<Movement>(id) {
        println!(
            "  Movement        speed {} current ({}, {}) desired ({}, {})",
            m.speed,
            m.current_direction.x,
            m.current_direction.y,
            m.desired_direction.x,
            m.desired_direction.y
        );
    }
    if let Some(s) = world.get::<Sprite>(id) {
        println!("  Sprite          {} tint {:?}", s.sprite, s.tint.to_array());
    }
    if let Some(a) = world.get::<AnimatedSprite>(id) {
        let clips: Vec<&str> = a.clip_names().collect();
        println!(
            "  AnimatedSprite  [{}] active {} ({}) at {} fps",
            clips.join(", "),
            a.active_clip.as_deref().unwrap_or("-"),
            a.active_animation,
            a.fps
        );
    }
    if let Some(p) = world.get::<Player>(id) {
        println!("  Player          lives {} score {}", p.lives, p.score);
    }
    if let Some(input) = world.get::<Input>(id) {
        let mut bindings: Vec<String> = input
            .actions
            .iter()
            .map(|(action, behavior)| format!("{} -> {}", action, behavior.name()))
            .collect();
        bindings.sort();
        println!("  Input           {}", bindings.join(", "));
    }
    if let Some(p) = world.get::<Pickup>(id) {
        println!("  Pickup          score {}", p.score);
    }
    if world.has::<Collision>(id) {
        println!("  Collision");
    }

    if !spawned.issues.is_empty() {
        println!();
        println!("Skipped {} block(s):", spawned.issues.len());
        for issue in &spawned.issues {
            println!("  {}", issue);
        }
    }
}

fn print_json(world: &ArcadeWorld, spawned: &Spawned<EntityId>) -> Result<()> {
    let id = spawned.entity;
    let mut components = serde_json::Map::new();

    if let Some(p) = world.get::<Position>(id) {
        components.insert("Position".into(), serde_json::to_value(&*p)?);
    }
    if let Some(m) = world.get::<Movement>(id) {
        components.insert("Movement".into(), serde_json::to_value(&*m)?);
    }
    if let Some(s) = world.get::<Sprite>(id) {
        components.insert("Sprite".into(), serde_json::to_value(&*s)?);
    }
    if let Some(a) = world.get::<AnimatedSprite>(id) {
        components.insert("AnimatedSprite".into(), serde_json::to_value(&*a)?);
    }
    if let Some(p) = world.get::<Player>(id) {
        components.insert("Player".into(), serde_json::to_value(&*p)?);
    }
    if let Some(input) = world.get::<Input>(id) {
        let actions: serde_json::Map<String, serde_json::Value> = input
            .actions
            .iter()
            .map(|(action, behavior)| (action.to_string(), behavior.name().into()))
            .collect();
        components.insert("Input".into(), serde_json::json!({ "actions": actions }));
    }
    if let Some(p) = world.get::<Pickup>(id) {
        components.insert("Pickup".into(), serde_json::to_value(&*p)?);
    }
    if world.has::<Collision>(id) {
        components.insert("Collision".into(), serde_json::json!({}));
    }

    let issues: Vec<String> = spawned.issues.iter().map(|i| i.to_string()).collect();
    let output = serde_json::json!({
        "archetype": spawned.archetype,
        "entity": id.raw(),
        "attached": spawned.attached,
        "components": components,
        "issues": issues,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
