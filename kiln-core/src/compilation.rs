//! Per-build results

use crate::chunk::Chunk;
use crate::graph::{Module, ModuleGraph, ModuleId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Everything one build produced
///
/// Created fresh for each build and not reused by later builds.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub(crate) graph: ModuleGraph,
    pub(crate) chunks: Vec<Chunk>,
    pub(crate) assets: BTreeMap<String, String>,
    pub(crate) file_dependencies: BTreeSet<PathBuf>,
}

impl Compilation {
    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Modules in discovery order
    pub fn modules(&self) -> &[Module] {
        self.graph.modules()
    }

    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.graph.get(id)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    /// Rendered bundles by filename
    pub fn assets(&self) -> &BTreeMap<String, String> {
        &self.assets
    }

    pub fn file_dependencies(&self) -> &BTreeSet<PathBuf> {
        &self.file_dependencies
    }

    pub fn stats(&self) -> Stats {
        Stats {
            chunks: self.chunks.clone(),
            modules: self.graph.modules().to_vec(),
            assets: self.assets.clone(),
        }
    }

    pub fn into_output(self) -> BuildOutput {
        BuildOutput {
            stats: Stats {
                chunks: self.chunks,
                modules: self.graph.modules().to_vec(),
                assets: self.assets,
            },
            file_dependencies: self.file_dependencies,
        }
    }
}

/// Chunks, modules and assets of a finished build
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub chunks: Vec<Chunk>,
    pub modules: Vec<Module>,
    pub assets: BTreeMap<String, String>,
}

impl Stats {
    /// Full stats as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Stats with asset sizes in place of asset sources
    pub fn summary(&self) -> serde_json::Value {
        let assets: BTreeMap<&str, usize> = self
            .assets
            .iter()
            .map(|(name, code)| (name.as_str(), code.len()))
            .collect();
        serde_json::json!({
            "chunks": self.chunks,
            "modules": self.modules,
            "assets": assets,
        })
    }
}

/// Result of a successful [`Compiler::run`](crate::Compiler::run)
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub stats: Stats,
    /// Every file read during the build: entries and resolved dependencies
    pub file_dependencies: BTreeSet<PathBuf>,
}
