//! Entity definitions: parsing scripts and tables into component blocks
//!
//! Two source formats are accepted, chosen by file extension:
//!
//! - `.rhai` scripts whose final expression is either an array of block
//!   maps (`[#{ kind: "Position", position: [2, 3] }, ...]`) or a map of
//!   kind to fields (`#{ Position: #{ position: [2, 3] } }`, blocks ordered
//!   by kind name). Scripts may define functions for `Input` behaviors.
//! - `.toml` tables with one `[[component]]` entry per block, each carrying
//!   a `kind` key.

use crate::config::ScriptLimits;
use arcade_core::{ArcadeError, Result};
use rhai::{Array, Dynamic, Engine, Map, AST};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Field holding the kind tag in array-form blocks
pub const KIND_FIELD: &str = "kind";

/// One tagged bag of fields inside a definition
#[derive(Debug, Clone)]
pub struct ComponentBlock {
    kind: String,
    fields: Map,
}

impl ComponentBlock {
    pub fn new(kind: impl Into<String>, fields: Map) -> Self {
        Self {
            kind: kind.into(),
            fields,
        }
    }

    /// The component-kind tag as authored
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn fields(&self) -> &Map {
        &self.fields
    }
}

/// Source format of a definition file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Script,
    Table,
}

impl DefinitionFormat {
    /// `.toml` files are tables, everything else is a script
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => DefinitionFormat::Table,
            _ => DefinitionFormat::Script,
        }
    }
}

/// A parsed archetype definition
#[derive(Debug, Clone)]
pub struct Definition {
    archetype: String,
    blocks: Vec<ComponentBlock>,
    script: Option<Arc<AST>>,
    source: Option<PathBuf>,
}

impl Definition {
    pub fn new(archetype: impl Into<String>, blocks: Vec<ComponentBlock>) -> Self {
        Self {
            archetype: archetype.into(),
            blocks,
            script: None,
            source: None,
        }
    }

    pub fn archetype(&self) -> &str {
        &self.archetype
    }

    /// Component blocks in declared order. Map-form scripts have no
    /// declaration order; their blocks come sorted by kind name.
    pub fn blocks(&self) -> &[ComponentBlock] {
        &self.blocks
    }

    /// Compiled script the definition came from, if it was a script
    pub fn script(&self) -> Option<&Arc<AST>> {
        self.script.as_ref()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct TableDefinitionFile {
    #[serde(default)]
    component: Vec<toml::Table>,
}

/// Evaluates definition sources in a resource-limited script engine
pub struct DefinitionParser {
    engine: Engine,
}

impl DefinitionParser {
    pub fn new(limits: &ScriptLimits) -> Self {
        let mut engine = Engine::new();
        engine.set_max_operations(limits.max_operations);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);
        Self { engine }
    }

    /// The engine definitions are evaluated with; behaviors must be called
    /// through a compatible engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Read and parse a definition file, picking the format by extension
    pub fn parse_file(&self, archetype: &str, path: &Path) -> Result<Definition> {
        let content = fs::read_to_string(path).map_err(|e| {
            ArcadeError::ParseError(format!(
                "{}: failed to read {}: {}",
                archetype,
                path.display(),
                e
            ))
        })?;

        let mut definition = match DefinitionFormat::from_path(path) {
            DefinitionFormat::Script => self.parse_script(archetype, &content)?,
            DefinitionFormat::Table => self.parse_table(archetype, &content)?,
        };
        definition.source = Some(path.to_path_buf());
        Ok(definition)
    }

    /// Parse a script definition
    pub fn parse_script(&self, archetype: &str, source: &str) -> Result<Definition> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|e| ArcadeError::ParseError(format!("{}: {}", archetype, e)))?;
        let value: Dynamic = self
            .engine
            .eval_ast(&ast)
            .map_err(|e| ArcadeError::ParseError(format!("{}: {}", archetype, e)))?;

        let blocks = blocks_from_value(archetype, value)?;
        Ok(Definition {
            archetype: archetype.to_string(),
            blocks,
            script: Some(Arc::new(ast)),
            source: None,
        })
    }

    /// Parse a TOML table definition
    pub fn parse_table(&self, archetype: &str, source: &str) -> Result<Definition> {
        let file: TableDefinitionFile = toml::from_str(source)
            .map_err(|e| ArcadeError::ParseError(format!("{}: {}", archetype, e)))?;

        let items: Array = file
            .component
            .into_iter()
            .map(|table| toml_to_dynamic(toml::Value::Table(table)))
            .collect();

        Ok(Definition::new(archetype, blocks_from_array(archetype, items)?))
    }
}

fn blocks_from_value(archetype: &str, value: Dynamic) -> Result<Vec<ComponentBlock>> {
    if value.is_array() {
        let items = value
            .into_array()
            .map_err(|t| ArcadeError::ParseError(format!("{}: unexpected {}", archetype, t)))?;
        return blocks_from_array(archetype, items);
    }

    if let Some(map) = value.clone().try_cast::<Map>() {
        let mut blocks = Vec::with_capacity(map.len());
        for (kind, fields) in map {
            let fields = block_fields(archetype, kind.as_str(), fields)?;
            blocks.push(ComponentBlock::new(kind.as_str(), fields));
        }
        return Ok(blocks);
    }

    Err(ArcadeError::ParseError(format!(
        "{}: definition must evaluate to an array of component blocks or a map of kind to fields, got {}",
        archetype,
        value.type_name()
    )))
}

fn blocks_from_array(archetype: &str, items: Array) -> Result<Vec<ComponentBlock>> {
    let mut blocks = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let Some(mut fields) = item.clone().try_cast::<Map>() else {
            return Err(ArcadeError::ParseError(format!(
                "{}: block {} is a {}, expected a table",
                archetype,
                index,
                item.type_name()
            )));
        };

        let kind = fields
            .remove(KIND_FIELD)
            .and_then(|k| k.into_immutable_string().ok())
            .ok_or_else(|| {
                ArcadeError::ParseError(format!(
                    "{}: block {} has no string '{}' tag",
                    archetype, index, KIND_FIELD
                ))
            })?;

        blocks.push(ComponentBlock::new(kind.as_str(), fields));
    }

    Ok(blocks)
}

/// Fields of a map-form block; `()` stands for a marker with no fields
fn block_fields(archetype: &str, kind: &str, value: Dynamic) -> Result<Map> {
    if value.is_unit() {
        return Ok(Map::new());
    }
    value.clone().try_cast::<Map>().ok_or_else(|| {
        ArcadeError::ParseError(format!(
            "{}: fields of '{}' are a {}, expected a table",
            archetype,
            kind,
            value.type_name()
        ))
    })
}

/// Convert a toml::Value to rhai::Dynamic
pub fn toml_to_dynamic(val: toml::Value) -> Dynamic {
    match val {
        toml::Value::Boolean(b) => Dynamic::from(b),
        toml::Value::Integer(i) => Dynamic::from(i),
        toml::Value::Float(f) => Dynamic::from(f),
        toml::Value::String(s) => Dynamic::from(s),
        toml::Value::Array(arr) => {
            let items: Array = arr.into_iter().map(toml_to_dynamic).collect();
            Dynamic::from(items)
        }
        toml::Value::Table(table) => {
            let mut map = Map::new();
            for (k, v) in table {
                map.insert(k.into(), toml_to_dynamic(v));
            }
            Dynamic::from(map)
        }
        toml::Value::Datetime(dt) => Dynamic::from(dt.to_string()),
    }
}
