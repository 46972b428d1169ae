//! Component dispatch table: kind tag -> materializer

use crate::definition::ComponentBlock;
use crate::fields::invalid_type;
use arcade_core::{ArcadeError, Result, TextureId};
use arcade_ecs::{Behavior, Component, EntityStore};
use rhai::{Dynamic, FnPtr, AST};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Texture names usable in definitions
#[derive(Debug, Clone, Default)]
pub struct TextureTable {
    textures: HashMap<String, TextureId>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(textures: &BTreeMap<String, u32>) -> Self {
        Self {
            textures: textures
                .iter()
                .map(|(name, id)| (name.clone(), TextureId(*id)))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, id: TextureId) {
        self.textures.insert(name.into(), id);
    }

    pub fn get(&self, name: &str) -> Option<TextureId> {
        self.textures.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Everything a materializer may consult besides the block itself
pub struct MaterializeContext<'a> {
    textures: &'a TextureTable,
    script: Option<&'a Arc<AST>>,
}

impl<'a> MaterializeContext<'a> {
    pub fn new(textures: &'a TextureTable, script: Option<&'a Arc<AST>>) -> Self {
        Self { textures, script }
    }

    /// Texture reference: a texture id or a name from the texture table
    pub fn decode_texture(&self, field: &str, value: &Dynamic) -> Result<TextureId> {
        if let Ok(id) = value.as_int() {
            return u32::try_from(id)
                .map(TextureId)
                .map_err(|_| ArcadeError::ValueOutOfRange {
                    field: field.to_string(),
                    min: 0.0,
                    max: f64::from(u32::MAX),
                    value: id as f64,
                });
        }
        if let Ok(name) = value.clone().into_immutable_string() {
            return self
                .textures
                .get(name.as_str())
                .ok_or_else(|| ArcadeError::UnknownTexture(name.to_string()));
        }
        Err(invalid_type(field, "texture id or name", value))
    }

    /// Texture field of a block
    pub fn read_texture(&self, block: &ComponentBlock, name: &str) -> Result<Option<TextureId>> {
        match block.get(name) {
            None => Ok(None),
            Some(v) => self.decode_texture(&block.field_path(name), v).map(Some),
        }
    }

    /// Behavior reference: a function pointer or closure, or a function name
    pub fn decode_behavior(&self, field: &str, value: &Dynamic) -> Result<Behavior> {
        if let Some(callback) = value.clone().try_cast::<FnPtr>() {
            return Ok(Behavior::new(callback, self.script.cloned()));
        }
        if let Ok(name) = value.clone().into_immutable_string() {
            let callback = FnPtr::new(name).map_err(|e| ArcadeError::InvalidBehavior {
                field: field.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Behavior::new(callback, self.script.cloned()));
        }
        Err(invalid_type(field, "function", value))
    }
}

/// Decodes a component of one kind from a block
pub trait FromBlock: Component + Sized {
    /// Tag the component is registered under
    const KIND: &'static str;

    fn from_block(block: &ComponentBlock, ctx: &MaterializeContext<'_>) -> Result<Self>;
}

type MaterializeFn<S> = dyn Fn(&ComponentBlock, &MaterializeContext<'_>, <S as EntityStore>::Entity, &mut S) -> Result<()>
    + Send
    + Sync;

/// A registered materializer and the canonical kind it produces
pub struct Registration<S: EntityStore> {
    kind: String,
    materialize: Arc<MaterializeFn<S>>,
}

impl<S: EntityStore> Registration<S> {
    /// Canonical kind, shared by every alias of the entry
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn materialize(
        &self,
        block: &ComponentBlock,
        ctx: &MaterializeContext<'_>,
        entity: S::Entity,
        store: &mut S,
    ) -> Result<()> {
        (self.materialize)(block, ctx, entity, store)
    }
}

/// Maps component-kind tags to the routines that materialize them.
///
/// New kinds are added by registering one more entry; the spawn
/// algorithm never changes. Aliases name a canonical kind, so replacing
/// that kind's entry also redirects every alias.
pub struct ComponentTable<S: EntityStore> {
    entries: HashMap<String, Registration<S>>,
    aliases: HashMap<String, String>,
}

impl<S: EntityStore> Default for ComponentTable<S> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            aliases: HashMap::new(),
        }
    }
}

impl<S: EntityStore> ComponentTable<S> {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a materializer under `tag`, replacing any previous entry.
    /// A tag that was an alias becomes a kind of its own.
    pub fn register<F>(&mut self, tag: impl Into<String>, materialize: F)
    where
        F: Fn(&ComponentBlock, &MaterializeContext<'_>, S::Entity, &mut S) -> Result<()>
            + Send
            + Sync
            + 'static,
    {
        let tag = tag.into();
        if self.aliases.remove(&tag).is_some() || self.entries.contains_key(&tag) {
            tracing::debug!(kind = %tag, "replacing component materializer");
        }
        self.entries.insert(
            tag.clone(),
            Registration {
                kind: tag,
                materialize: Arc::new(materialize),
            },
        );
    }

    /// Register a decodable component under its `KIND` tag
    pub fn register_component<C: FromBlock>(&mut self) {
        self.register(C::KIND, |block, ctx, entity, store: &mut S| {
            let component = C::from_block(block, ctx)?;
            store.attach(entity, component)
        });
    }

    /// Make `alias` dispatch to whatever is registered as `kind`.
    /// Returns false if `kind` is unknown or `alias` is itself a registered kind.
    pub fn alias(&mut self, alias: impl Into<String>, kind: &str) -> bool {
        let alias = alias.into();
        let Some(canonical) = self.lookup(kind).map(|r| r.kind().to_string()) else {
            return false;
        };
        if self.entries.contains_key(&alias) {
            return false;
        }
        self.aliases.insert(alias, canonical);
        true
    }

    /// Registration for a kind tag or one of its aliases
    pub fn lookup(&self, tag: &str) -> Option<&Registration<S>> {
        match self.entries.get(tag) {
            Some(registration) => Some(registration),
            None => self
                .aliases
                .get(tag)
                .and_then(|kind| self.entries.get(kind)),
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.lookup(tag).is_some()
    }

    /// Canonical kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Every registered tag including aliases, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .entries
            .keys()
            .chain(self.aliases.keys())
            .map(|s| s.as_str())
            .collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.aliases.is_empty()
    }
}
