//! Module graph
//!
//! Modules are stored in discovery order and indexed by [`ModuleId`]. The
//! graph is the single writer for module records during a build: a module
//! id is inserted at most once.

mod builder;
mod module_id;

pub use builder::ModuleGraphBuilder;
pub use module_id::{normalize, relative_to, to_unix, ModuleId};

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::trace;

/// One resolved `require` of a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// The specifier as written in the source
    pub specifier: String,
    pub resolved_id: ModuleId,
    #[serde(skip)]
    pub absolute_path: PathBuf,
}

/// A built module
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    pub absolute_path: PathBuf,
    /// Chunks this module belongs to, in the order they reached it
    chunk_names: Vec<String>,
    pub dependencies: Vec<Dependency>,
    /// Source after loaders and dependency rewriting
    #[serde(skip)]
    pub transformed_source: String,
}

impl Module {
    pub fn new(
        id: ModuleId,
        absolute_path: PathBuf,
        chunk_name: &str,
        dependencies: Vec<Dependency>,
        transformed_source: String,
    ) -> Self {
        Self {
            id,
            absolute_path,
            chunk_names: vec![chunk_name.to_string()],
            dependencies,
            transformed_source,
        }
    }

    pub fn chunk_names(&self) -> &[String] {
        &self.chunk_names
    }

    pub fn in_chunk(&self, name: &str) -> bool {
        self.chunk_names.iter().any(|n| n == name)
    }

    /// Returns `false` if the module already belonged to the chunk
    fn add_chunk_name(&mut self, name: &str) -> bool {
        if self.in_chunk(name) {
            return false;
        }
        self.chunk_names.push(name.to_string());
        true
    }
}

/// All modules of one build, unique by id
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    index: HashMap<ModuleId, usize>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ModuleId) -> Option<&Module> {
        self.index.get(id).map(|&i| &self.modules[i])
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.index.contains_key(id)
    }

    /// Modules in discovery order
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Append a newly discovered module
    ///
    /// Returns `false` and leaves the graph untouched if the id is taken.
    pub(crate) fn insert(&mut self, module: Module) -> bool {
        if self.index.contains_key(&module.id) {
            return false;
        }
        self.index.insert(module.id.clone(), self.modules.len());
        self.modules.push(module);
        true
    }

    /// Add `name` to the chunks of `id` and of every module it reaches
    ///
    /// Descent stops at modules already in the chunk: their subtree has the
    /// name already, or is still being built for that chunk.
    pub(crate) fn add_chunk_name(&mut self, id: &ModuleId, name: &str) {
        let mut pending = vec![id.clone()];
        while let Some(current) = pending.pop() {
            let Some(&i) = self.index.get(&current) else {
                continue;
            };
            let module = &mut self.modules[i];
            if !module.add_chunk_name(name) {
                continue;
            }
            trace!(target: "kiln::graph", module = %current, chunk = name, "joined chunk");
            pending.extend(module.dependencies.iter().rev().map(|d| d.resolved_id.clone()));
        }
    }
}
