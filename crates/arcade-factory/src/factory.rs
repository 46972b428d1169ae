//! Spawn orchestration: resolve, parse, create, materialize

use crate::config::FactoryConfig;
use crate::definition::{Definition, DefinitionParser};
use crate::dispatch::{ComponentTable, MaterializeContext, TextureTable};
use crate::locator::{DefinitionFinder, DefinitionLocator, FsFinder};
use arcade_core::{ArcadeError, Result};
use arcade_ecs::EntityStore;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Why a block was skipped
#[derive(Debug)]
pub enum BlockProblem {
    /// No materializer is registered for the tag
    UnknownKind,
    /// A block of the same kind already attached
    DuplicateKind,
    /// The materializer rejected the block's fields
    Invalid(ArcadeError),
}

/// A block that did not produce a component
#[derive(Debug)]
pub struct BlockIssue {
    /// Position of the block in the definition
    pub index: usize,
    /// Kind tag as authored
    pub tag: String,
    pub problem: BlockProblem,
}

impl fmt::Display for BlockIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            BlockProblem::UnknownKind => {
                write!(f, "block {} ({}): unknown component kind", self.index, self.tag)
            }
            BlockProblem::DuplicateKind => write!(
                f,
                "block {} ({}): component kind already attached",
                self.index, self.tag
            ),
            BlockProblem::Invalid(err) => write!(f, "block {} ({}): {}", self.index, self.tag, err),
        }
    }
}

/// Outcome of a spawn: the entity plus a record of what attached
#[derive(Debug)]
pub struct Spawned<E> {
    pub entity: E,
    pub archetype: String,
    /// Canonical kinds attached, in block order
    pub attached: Vec<String>,
    /// Blocks that were skipped
    pub issues: Vec<BlockIssue>,
}

impl<E> Spawned<E> {
    /// True when every block produced a component
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has(&self, kind: &str) -> bool {
        self.attached.iter().any(|k| k == kind)
    }
}

/// Builds entities from named archetype definitions.
///
/// The factory owns the definition cache and the dispatch table; the entity
/// store is borrowed per spawn.
pub struct EntityFactory<S: EntityStore, F: DefinitionFinder = FsFinder> {
    locator: DefinitionLocator<F>,
    parser: DefinitionParser,
    components: ComponentTable<S>,
    textures: TextureTable,
}

impl<S: EntityStore> EntityFactory<S, FsFinder> {
    /// Factory reading definitions from `config.definitions_dir`
    pub fn new(config: &FactoryConfig) -> Self {
        Self::with_finder(FsFinder::from_config(config), config)
    }
}

impl<S: EntityStore, F: DefinitionFinder> EntityFactory<S, F> {
    pub fn with_finder(finder: F, config: &FactoryConfig) -> Self {
        Self {
            locator: DefinitionLocator::new(finder),
            parser: DefinitionParser::new(&config.limits),
            components: ComponentTable::with_builtins(),
            textures: TextureTable::from_config(&config.textures),
        }
    }

    /// Location of an archetype's definition (cached after the first call)
    pub fn resolve(&mut self, name: &str) -> Result<PathBuf> {
        self.locator.resolve(name)
    }

    /// Resolve and parse an archetype without creating anything
    pub fn parse(&mut self, name: &str) -> Result<Definition> {
        let path = self.locator.resolve(name)?;
        self.parser.parse_file(name, &path)
    }

    /// Spawn an archetype into `store`.
    ///
    /// Resolution and parse failures create no entity. After the entity is
    /// created, each block either attaches or is recorded in `issues`.
    pub fn spawn(&mut self, name: &str, store: &mut S) -> Result<Spawned<S::Entity>> {
        let definition = match self.parse(name) {
            Ok(definition) => definition,
            Err(err) => {
                tracing::warn!(archetype = name, error = %err, "spawn failed");
                return Err(err);
            }
        };
        Ok(self.spawn_definition(&definition, store))
    }

    /// Spawn an already-parsed definition
    pub fn spawn_definition(&self, definition: &Definition, store: &mut S) -> Spawned<S::Entity> {
        let entity = store.create_entity();
        let ctx = MaterializeContext::new(&self.textures, definition.script());

        let mut attached = Vec::new();
        let mut claimed: HashSet<String> = HashSet::new();
        let mut issues = Vec::new();

        for (index, block) in definition.blocks().iter().enumerate() {
            let tag = block.kind();
            let issue = |problem| BlockIssue {
                index,
                tag: tag.to_string(),
                problem,
            };

            let Some(registration) = self.components.lookup(tag) else {
                tracing::warn!(
                    archetype = definition.archetype(),
                    kind = tag,
                    "unknown component kind, skipping"
                );
                issues.push(issue(BlockProblem::UnknownKind));
                continue;
            };

            let kind = registration.kind();
            if claimed.contains(kind) {
                tracing::warn!(
                    archetype = definition.archetype(),
                    kind,
                    "duplicate component kind, skipping"
                );
                issues.push(issue(BlockProblem::DuplicateKind));
                continue;
            }

            match registration.materialize(block, &ctx, entity, store) {
                Ok(()) => {
                    tracing::debug!(archetype = definition.archetype(), kind, "attached component");
                    claimed.insert(kind.to_string());
                    attached.push(kind.to_string());
                }
                Err(err) => {
                    tracing::warn!(
                        archetype = definition.archetype(),
                        kind = tag,
                        error = %err,
                        "invalid component block, skipping"
                    );
                    issues.push(issue(BlockProblem::Invalid(err)));
                }
            }
        }

        tracing::info!(
            archetype = definition.archetype(),
            entity = ?entity,
            components = attached.len(),
            skipped = issues.len(),
            "spawned entity"
        );

        Spawned {
            entity,
            archetype: definition.archetype().to_string(),
            attached,
            issues,
        }
    }

    /// Forget the cached location of one archetype
    pub fn invalidate(&mut self, name: &str) -> bool {
        self.locator.invalidate(name)
    }

    pub fn locator(&self) -> &DefinitionLocator<F> {
        &self.locator
    }

    pub fn parser(&self) -> &DefinitionParser {
        &self.parser
    }

    pub fn components(&self) -> &ComponentTable<S> {
        &self.components
    }

    /// Dispatch table, for registering additional component kinds
    pub fn components_mut(&mut self) -> &mut ComponentTable<S> {
        &mut self.components
    }

    pub fn textures_mut(&mut self) -> &mut TextureTable {
        &mut self.textures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcade_core::{GridVec, TextureId, Tint};
    use arcade_ecs::{
        Action, AnimatedSprite, ArcadeWorld, Collision, Input, Movement, Pickup, Player, Position,
        Sprite,
    };
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::fs;

    /// Finder over an in-memory set of written files, counting lookups
    struct CountingFinder {
        files: HashMap<String, PathBuf>,
        lookups: Cell<usize>,
    }

    impl DefinitionFinder for CountingFinder {
        fn find(&self, name: &str) -> Result<Option<PathBuf>> {
            self.lookups.set(self.lookups.get() + 1);
            Ok(self.files.get(name).cloned())
        }
    }

    struct Fixture {
        dir: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("arcade_test_{}", uuid::Uuid::new_v4()));
            fs::create_dir_all(&dir).unwrap();
            Self { dir }
        }

        fn write(&self, file: &str, content: &str) -> &Self {
            fs::write(self.dir.join(file), content).unwrap();
            self
        }

        fn config(&self) -> FactoryConfig {
            let mut config = FactoryConfig::default().with_definitions_dir(&self.dir);
            config.textures.insert("pacman".to_string(), 3);
            config
        }

        fn factory(&self) -> EntityFactory<ArcadeWorld> {
            EntityFactory::new(&self.config())
        }

        fn counting_factory(&self) -> EntityFactory<ArcadeWorld, CountingFinder> {
            let files = fs::read_dir(&self.dir)
                .unwrap()
                .map(|e| e.unwrap().path())
                .map(|p| (p.file_stem().unwrap().to_string_lossy().into_owned(), p))
                .collect();
            let finder = CountingFinder {
                files,
                lookups: Cell::new(0),
            };
            EntityFactory::with_finder(finder, &self.config())
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    const PACMAN: &str = r#"
        fn on_pause() { "paused" }

        [
            #{ kind: "Position", position: [2, 3] },
            #{ kind: "Movement", speed: 2.5 },
            #{ kind: "Sprite", sprite: "pacman" },
            #{ kind: "Player" },
            #{ kind: "Input", actions: #{
                MoveLeft: |x| { x * 2 },
                Pause: Fn("on_pause"),
            } },
            #{ kind: "Collision" },
        ]
    "#;

    #[test]
    fn test_spawn_full_archetype() {
        let fx = Fixture::new();
        fx.write("Pacman.rhai", PACMAN);
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        let spawned = factory.spawn("Pacman", &mut world).unwrap();
        assert!(spawned.is_complete(), "{:?}", spawned.issues);
        assert_eq!(
            spawned.attached,
            vec!["Position", "Movement", "Sprite", "Player", "Input", "Collision"]
        );

        let id = spawned.entity;
        assert_eq!(world.get::<Position>(id).unwrap().position, GridVec::new(2, 3));

        let movement = *world.get::<Movement>(id).unwrap();
        assert_eq!(movement.speed, 2.5);
        assert_eq!(movement.current_direction, GridVec::ZERO);
        assert_eq!(movement.progress, 0.0);

        let sprite = *world.get::<Sprite>(id).unwrap();
        assert_eq!(sprite.sprite, TextureId(3));
        assert_eq!(sprite.tint, Tint::new(1.0, 1.0, 1.0));

        assert_eq!(*world.get::<Player>(id).unwrap(), Player { lives: 3, score: 0 });
        assert!(world.has::<Collision>(id));
    }

    #[test]
    fn test_input_behaviors_are_callable() {
        let fx = Fixture::new();
        fx.write("Pacman.rhai", PACMAN);
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        let id = factory.spawn("Pacman", &mut world).unwrap().entity;
        let input = world.get::<Input>(id).unwrap();
        let engine = factory.parser().engine();

        let doubled: i64 = input
            .behavior(Action::MoveLeft)
            .unwrap()
            .call(engine, (21_i64,))
            .unwrap();
        assert_eq!(doubled, 42);

        let paused: String = input.behavior(Action::Pause).unwrap().call(engine, ()).unwrap();
        assert_eq!(paused, "paused");
        assert!(!input.is_bound(Action::Confirm));
    }

    #[test]
    fn test_resolution_is_cached() {
        let fx = Fixture::new();
        fx.write("Pellet.rhai", r#"[ #{ kind: "Pickup", score: 10 } ]"#);
        let mut factory = fx.counting_factory();
        let mut world = ArcadeWorld::new();

        let first = factory.resolve("Pellet").unwrap();
        let second = factory.resolve("Pellet").unwrap();
        assert_eq!(first, second);
        assert_eq!(factory.locator().finder().lookups.get(), 1);

        factory.spawn("Pellet", &mut world).unwrap();
        factory.spawn("Pellet", &mut world).unwrap();
        assert_eq!(factory.locator().finder().lookups.get(), 1);
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn test_invalidate_forces_lookup() {
        let fx = Fixture::new();
        fx.write("Pellet.rhai", r#"[ #{ kind: "Pickup" } ]"#);
        let mut factory = fx.counting_factory();

        factory.resolve("Pellet").unwrap();
        assert!(factory.invalidate("Pellet"));
        factory.resolve("Pellet").unwrap();
        assert_eq!(factory.locator().finder().lookups.get(), 2);
    }

    #[test]
    fn test_unknown_archetype_creates_nothing() {
        let fx = Fixture::new();
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        assert!(matches!(
            factory.spawn("Inky", &mut world),
            Err(ArcadeError::ArchetypeNotFound(name)) if name == "Inky"
        ));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_parse_failure_creates_nothing() {
        let fx = Fixture::new();
        fx.write("Broken.rhai", "[ #{ kind: \"Position\", position: [1, ");
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        assert!(matches!(
            factory.spawn("Broken", &mut world),
            Err(ArcadeError::ParseError(_))
        ));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let fx = Fixture::new();
        fx.write(
            "Odd.rhai",
            r#"[ #{ kind: "Unsupported", x: 1 }, #{ kind: "Position", position: [4, 4] } ]"#,
        );
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        let spawned = factory.spawn("Odd", &mut world).unwrap();
        assert_eq!(spawned.attached, vec!["Position"]);
        assert_eq!(spawned.issues.len(), 1);
        assert_eq!(spawned.issues[0].index, 0);
        assert_eq!(spawned.issues[0].tag, "Unsupported");
        assert!(matches!(spawned.issues[0].problem, BlockProblem::UnknownKind));
        assert!(world.has::<Position>(spawned.entity));
    }

    #[test]
    fn test_invalid_block_fails_alone() {
        let fx = Fixture::new();
        fx.write(
            "Ghost.rhai",
            r#"[
                #{ kind: "Position", position: [13, 11] },
                #{ kind: "AnimatedSprite", animations: #{ left: 1, right: 2 }, active_animation: "up" },
                #{ kind: "Movement", speed: 1.5 },
            ]"#,
        );
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        let spawned = factory.spawn("Ghost", &mut world).unwrap();
        assert!(!spawned.is_complete());
        assert_eq!(spawned.attached, vec!["Position", "Movement"]);
        assert!(matches!(
            spawned.issues[0].problem,
            BlockProblem::Invalid(ArcadeError::UnknownClip { .. })
        ));
        assert!(!world.has::<AnimatedSprite>(spawned.entity));
        assert!(world.has::<Movement>(spawned.entity));
        assert!(spawned.issues[0].to_string().contains("AnimatedSprite"));
        if let BlockProblem::Invalid(err) = &spawned.issues[0].problem {
            assert!(err.is_field_error());
        }
    }

    #[test]
    fn test_duplicate_kind_first_wins() {
        let fx = Fixture::new();
        fx.write(
            "Twice.rhai",
            r#"[
                #{ kind: "Pickup", score: "lots" },
                #{ kind: "Pickup", score: 10 },
                #{ kind: "Pickup", score: 20 },
            ]"#,
        );
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        let spawned = factory.spawn("Twice", &mut world).unwrap();
        assert_eq!(world.get::<Pickup>(spawned.entity).unwrap().score, 10);
        assert_eq!(spawned.attached, vec!["Pickup"]);
        assert!(matches!(spawned.issues[0].problem, BlockProblem::Invalid(_)));
        assert!(matches!(spawned.issues[1].problem, BlockProblem::DuplicateKind));
        assert_eq!(spawned.issues[1].index, 2);
    }

    #[test]
    fn test_alias_counts_as_same_kind() {
        let fx = Fixture::new();
        fx.write(
            "Blinky.rhai",
            r#"[
                #{ kind: "AnimationSprite", animations: #{ left: 5 } },
                #{ kind: "AnimatedSprite", animations: #{ right: 6 } },
            ]"#,
        );
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        let spawned = factory.spawn("Blinky", &mut world).unwrap();
        assert_eq!(spawned.attached, vec!["AnimatedSprite"]);
        assert!(matches!(spawned.issues[0].problem, BlockProblem::DuplicateKind));

        let sprite = world.get::<AnimatedSprite>(spawned.entity).unwrap();
        assert_eq!(sprite.active_clip.as_deref(), Some("left"));
        assert_eq!(sprite.active_animation, TextureId(5));
    }

    #[test]
    fn test_toml_definition_spawns() {
        let fx = Fixture::new();
        fx.write(
            "Cherry.toml",
            r#"
[[component]]
kind = "Position"
position = [9, 17]

[[component]]
kind = "Pickup"
score = 100

[[component]]
kind = "Sprite"
tint = [1.0, 0.0, 0.0]

[[component]]
kind = "Collision"
"#,
        );
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        let spawned = factory.spawn("Cherry", &mut world).unwrap();
        assert!(spawned.is_complete());
        assert_eq!(world.get::<Pickup>(spawned.entity).unwrap().score, 100);
        assert_eq!(
            world.get::<Sprite>(spawned.entity).unwrap().tint,
            Tint::new(1.0, 0.0, 0.0)
        );
        assert!(spawned.has("Collision"));
    }

    #[test]
    fn test_custom_kind_registration() {
        #[derive(Debug)]
        struct Frightened(bool);

        let fx = Fixture::new();
        fx.write("Clyde.rhai", r#"[ #{ kind: "Frightened" } ]"#);
        let mut factory = fx.factory();
        factory
            .components_mut()
            .register("Frightened", |_block, _ctx, entity, store: &mut ArcadeWorld| {
                store.insert(entity, Frightened(true))
            });
        let mut world = ArcadeWorld::new();

        let spawned = factory.spawn("Clyde", &mut world).unwrap();
        assert!(spawned.is_complete());
        assert!(world.get::<Frightened>(spawned.entity).unwrap().0);
    }

    #[test]
    fn test_replaced_kind_reaches_alias_tag() {
        #[derive(Debug)]
        struct Retextured;

        let fx = Fixture::new();
        fx.write("Inky.rhai", r#"[ #{ kind: "AnimationSprite", animations: #{ left: 1 } } ]"#);
        let mut factory = fx.factory();
        factory.components_mut().register(
            "AnimatedSprite",
            |_block, _ctx, entity, store: &mut ArcadeWorld| store.insert(entity, Retextured),
        );
        let mut world = ArcadeWorld::new();

        let spawned = factory.spawn("Inky", &mut world).unwrap();
        assert_eq!(spawned.attached, vec!["AnimatedSprite"]);
        assert!(world.has::<Retextured>(spawned.entity));
        assert!(!world.has::<AnimatedSprite>(spawned.entity));
    }

    #[test]
    fn test_textures_added_after_construction() {
        let fx = Fixture::new();
        fx.write("Pellet.rhai", r#"[ #{ kind: "Sprite", sprite: "pellet" } ]"#);
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        let spawned = factory.spawn("Pellet", &mut world).unwrap();
        assert!(matches!(
            spawned.issues[0].problem,
            BlockProblem::Invalid(ArcadeError::UnknownTexture(_))
        ));

        factory.textures_mut().insert("pellet", TextureId(20));
        let spawned = factory.spawn("Pellet", &mut world).unwrap();
        assert!(spawned.is_complete());
        assert_eq!(world.get::<Sprite>(spawned.entity).unwrap().sprite, TextureId(20));
    }

    #[test]
    fn test_spawn_into_bare_hecs_world() {
        let fx = Fixture::new();
        fx.write("Pellet.rhai", r#"#{ Pickup: #{ score: 10 }, Collision: () }"#);
        let mut factory: EntityFactory<hecs::World> = EntityFactory::new(&fx.config());
        let mut world = hecs::World::new();

        let spawned = factory.spawn("Pellet", &mut world).unwrap();
        assert_eq!(spawned.attached, vec!["Collision", "Pickup"]);
        assert_eq!(world.get::<&Pickup>(spawned.entity).unwrap().score, 10);
    }

    #[test]
    fn test_parse_does_not_spawn() {
        let fx = Fixture::new();
        fx.write("Pacman.rhai", PACMAN);
        let mut factory = fx.factory();
        let mut world = ArcadeWorld::new();

        let definition = factory.parse("Pacman").unwrap();
        assert_eq!(definition.len(), 6);
        assert_eq!(world.entity_count(), 0);

        let spawned = factory.spawn_definition(&definition, &mut world);
        assert!(spawned.is_complete());
        assert_eq!(world.entity_count(), 1);
    }
}
