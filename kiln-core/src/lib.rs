//! Kiln Core
//!
//! The bundling engine: resolves and transforms modules, builds a
//! deduplicated module graph from one or more entries, groups modules into
//! one chunk per entry and renders each chunk into a self-contained runtime
//! bundle.

pub mod ast;
pub mod chunk;
pub mod compilation;
pub mod compiler;
pub mod component;
pub mod emitter;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod hooks;
pub mod loader;
pub mod options;
pub mod plugin;
pub mod registry;
pub mod resolver;
pub mod runtime;

pub use ast::{ScriptParser, SwcParser, SyntaxError, SyntaxTree};
pub use chunk::{Chunk, ChunkAssembler};
pub use compilation::{BuildOutput, Compilation, Stats};
pub use compiler::{BuildState, Compiler};
pub use component::{Component, ComponentKind, ComponentMetadata};
pub use emitter::AssetEmitter;
pub use error::{BuildError, ConfigError, HookError, TransformError};
pub use extractor::{DependencyExtractor, ExtractContext};
pub use graph::{Dependency, Module, ModuleGraph, ModuleGraphBuilder, ModuleId};
pub use hooks::{HookName, HookRegistry};
pub use loader::{transform_fn, LoaderFactory, LoaderPipeline, Rule, Transform};
pub use options::CompilerOptions;
pub use plugin::{plugin_fn, Plugin, PluginFactory};
pub use registry::{LoaderRegistry, PluginRegistry};
pub use resolver::PathResolver;
pub use runtime::RuntimeCodeGenerator;

use kiln_config::BundlerConfig;
use kiln_vfs::VirtualFileSystem;
use std::path::PathBuf;
use std::sync::Arc;

/// Create a compiler for `config` with the built-in loaders and plugins
pub fn compiler_from_config(
    config: &BundlerConfig,
    root: impl Into<PathBuf>,
    vfs: Arc<dyn VirtualFileSystem>,
) -> Result<Compiler, ConfigError> {
    let options = CompilerOptions::from_config(
        config,
        root,
        &LoaderRegistry::with_builtins(),
        &PluginRegistry::with_builtins(),
    )?;
    Ok(Compiler::new(options, vfs))
}
