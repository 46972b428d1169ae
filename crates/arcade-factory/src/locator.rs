//! Archetype name to definition file resolution

use crate::config::FactoryConfig;
use arcade_core::{ArcadeError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Searches storage for the definition of an archetype
pub trait DefinitionFinder {
    /// Find the definition file for `name`, `Ok(None)` if there is none
    fn find(&self, name: &str) -> Result<Option<PathBuf>>;
}

/// Finds definitions in a directory tree, one `<Name>.<ext>` file per archetype
#[derive(Debug, Clone)]
pub struct FsFinder {
    root: PathBuf,
    extensions: Vec<String>,
}

impl FsFinder {
    pub fn new(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    pub fn from_config(config: &FactoryConfig) -> Self {
        Self::new(&config.definitions_dir, config.extensions.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Position of the file's extension in the preference list
    fn extension_rank(&self, path: &Path) -> Option<usize> {
        let ext = path.extension()?.to_str()?;
        self.extensions.iter().position(|e| e == ext)
    }

    /// Visit every definition file below the root with its depth
    fn scan(&self, dir: &Path, depth: usize, visit: &mut dyn FnMut(&Path, usize)) -> Result<()> {
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                self.scan(&path, depth + 1, visit)?;
            } else if self.extension_rank(&path).is_some() {
                visit(&path, depth);
            }
        }

        Ok(())
    }

    /// Names of every archetype defined below the root, sorted
    pub fn archetypes(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        self.scan(&self.root, 0, &mut |path, _| {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        })?;
        names.sort();
        names.dedup();
        Ok(names)
    }
}

impl DefinitionFinder for FsFinder {
    /// The shallowest match wins; ties go to the preferred extension, then
    /// to the lexically smallest path.
    fn find(&self, name: &str) -> Result<Option<PathBuf>> {
        let mut best: Option<(usize, usize, PathBuf)> = None;

        self.scan(&self.root, 0, &mut |path, depth| {
            if path.file_stem().and_then(|s| s.to_str()) != Some(name) {
                return;
            }
            let Some(rank) = self.extension_rank(path) else {
                return;
            };
            let candidate = (depth, rank, path.to_path_buf());
            if best.as_ref().map_or(true, |current| candidate < *current) {
                best = Some(candidate);
            }
        })?;

        Ok(best.map(|(_, _, path)| path))
    }
}

/// Archetype names that can never name a definition file
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains(['/', '\\'])
}

/// Resolves archetype names to definition files, caching every hit.
///
/// The cache is never invalidated implicitly; `invalidate` and `clear`
/// exist for editor hot-reload. Misses are not cached.
#[derive(Debug)]
pub struct DefinitionLocator<F = FsFinder> {
    finder: F,
    cache: HashMap<String, PathBuf>,
}

impl<F: DefinitionFinder> DefinitionLocator<F> {
    pub fn new(finder: F) -> Self {
        Self {
            finder,
            cache: HashMap::new(),
        }
    }

    /// Resolve an archetype name to its definition file
    pub fn resolve(&mut self, name: &str) -> Result<PathBuf> {
        if let Some(path) = self.cache.get(name) {
            tracing::debug!(archetype = name, "definition cache hit");
            return Ok(path.clone());
        }

        if !is_valid_name(name) {
            return Err(ArcadeError::ArchetypeNotFound(name.to_string()));
        }

        match self.finder.find(name)? {
            Some(path) => {
                tracing::debug!(archetype = name, path = %path.display(), "resolved definition");
                self.cache.insert(name.to_string(), path.clone());
                Ok(path)
            }
            None => Err(ArcadeError::ArchetypeNotFound(name.to_string())),
        }
    }

    /// Cached location, without probing
    pub fn cached(&self, name: &str) -> Option<&Path> {
        self.cache.get(name).map(|p| p.as_path())
    }

    /// Forget one cached location; returns true if it was cached
    pub fn invalidate(&mut self, name: &str) -> bool {
        self.cache.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn finder(&self) -> &F {
        &self.finder
    }
}
