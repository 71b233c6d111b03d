//! Compiler: the long-lived build orchestrator
//!
//! A [`Compiler`] owns the options, the hook registry and the applied
//! plugins. Each [`Compiler::run`] walks the build state machine:
//!
//! ```text
//! Idle -> Running -> GraphBuilt -> ChunksAssembled -> AssetsRendered -> Written -> Done
//!                \____________________________________________________________/
//!                                          |
//!                                        Failed
//! ```
//!
//! Every asset is rendered before the first one is written, so a failing
//! build writes nothing.

use crate::ast::{ScriptParser, SwcParser};
use crate::chunk::ChunkAssembler;
use crate::compilation::{BuildOutput, Compilation};
use crate::emitter::AssetEmitter;
use crate::error::BuildError;
use crate::graph::{ModuleGraphBuilder, ModuleId};
use crate::hooks::{HookName, HookRegistry};
use crate::loader::LoaderPipeline;
use crate::options::CompilerOptions;
use crate::plugin::Plugin;
use crate::resolver::PathResolver;
use crate::runtime::RuntimeCodeGenerator;
use kiln_vfs::VirtualFileSystem;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where the last build got to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildState {
    Idle,
    Running,
    GraphBuilt,
    ChunksAssembled,
    AssetsRendered,
    Written,
    Done,
    Failed,
}

impl BuildState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildState::Idle => "idle",
            BuildState::Running => "running",
            BuildState::GraphBuilt => "graph-built",
            BuildState::ChunksAssembled => "chunks-assembled",
            BuildState::AssetsRendered => "assets-rendered",
            BuildState::Written => "written",
            BuildState::Done => "done",
            BuildState::Failed => "failed",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Compiler {
    options: CompilerOptions,
    resolver: PathResolver,
    loaders: LoaderPipeline,
    vfs: Arc<dyn VirtualFileSystem>,
    parser: Arc<dyn ScriptParser>,
    hooks: HookRegistry,
    plugins: Vec<Box<dyn Plugin>>,
    state: BuildState,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("Compiler")
            .field("options", &self.options)
            .field("hooks", &self.hooks)
            .field("plugins", &plugins)
            .field("state", &self.state)
            .finish()
    }
}

impl Compiler {
    /// Create a compiler and apply every configured plugin, in order
    pub fn new(mut options: CompilerOptions, vfs: Arc<dyn VirtualFileSystem>) -> Self {
        let plugins = std::mem::take(&mut options.plugins);
        let mut compiler = Self {
            resolver: PathResolver::new(options.extensions.clone()),
            loaders: LoaderPipeline::new(options.rules.clone()),
            options,
            vfs,
            parser: Arc::new(SwcParser::new()),
            hooks: HookRegistry::new(),
            plugins: Vec::new(),
            state: BuildState::Idle,
        };
        for plugin in &plugins {
            debug!(target: "kiln::hooks", plugin = plugin.name(), "applying plugin");
            plugin.apply(&mut compiler);
        }
        compiler.plugins = plugins;
        compiler
    }

    /// Use a different script front end
    pub fn with_parser(mut self, parser: Arc<dyn ScriptParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    /// Names of the applied plugins
    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// State reached by the last build
    pub fn state(&self) -> BuildState {
        self.state
    }

    fn transition(&mut self, next: BuildState) {
        debug!(target: "kiln::hooks", from = %self.state, to = %next, "build state");
        self.state = next;
    }

    /// Build, write every asset and fire the lifecycle hooks
    #[instrument(target = "kiln::hooks", skip(self), fields(entries = self.options.entries.len()))]
    pub fn run(&mut self) -> Result<BuildOutput, BuildError> {
        let result = self.run_build();
        if let Err(err) = &result {
            self.transition(BuildState::Failed);
            warn!(target: "kiln::hooks", kind = err.kind(), "build failed: {}", err);
        }
        result
    }

    fn run_build(&mut self) -> Result<BuildOutput, BuildError> {
        self.transition(BuildState::Running);
        self.hooks.call(HookName::Run)?;

        let compilation = self.build_compilation()?;

        AssetEmitter::new(self.vfs.as_ref(), &self.options.output_path).emit(compilation.assets())?;
        self.transition(BuildState::Written);

        self.hooks.call(HookName::Done)?;
        self.transition(BuildState::Done);
        info!(
            target: "kiln::hooks",
            modules = compilation.modules().len(),
            assets = compilation.assets().len(),
            "build complete"
        );
        Ok(compilation.into_output())
    }

    /// Build and render without writing assets or firing hooks
    ///
    /// Ends in `AssetsRendered` on success.
    pub fn compile(&mut self) -> Result<Compilation, BuildError> {
        self.transition(BuildState::Running);
        let result = self.build_compilation();
        if result.is_err() {
            self.transition(BuildState::Failed);
        }
        result
    }

    fn build_compilation(&mut self) -> Result<Compilation, BuildError> {
        let (entries, graph, file_dependencies) = {
            let mut builder = ModuleGraphBuilder::new(
                self.vfs.as_ref(),
                &self.options.root,
                &self.resolver,
                &self.loaders,
                self.parser.as_ref(),
            );
            let mut entries: Vec<(String, ModuleId)> = Vec::with_capacity(self.options.entries.len());
            for (name, specifier) in &self.options.entries {
                let id = builder.build_entry(name, specifier)?;
                entries.push((name.clone(), id));
            }
            let (graph, file_dependencies) = builder.finish();
            (entries, graph, file_dependencies)
        };
        self.transition(BuildState::GraphBuilt);

        let chunks = ChunkAssembler::assemble(&entries, &graph);
        self.transition(BuildState::ChunksAssembled);

        let mut assets = BTreeMap::new();
        let mut owners: HashMap<String, &str> = HashMap::new();
        for chunk in &chunks {
            let filename = self.options.filename_for(&chunk.name);
            if let Some(first) = owners.get(&filename) {
                return Err(BuildError::AssetConflict {
                    filename,
                    first: first.to_string(),
                    second: chunk.name.clone(),
                });
            }
            owners.insert(filename.clone(), &chunk.name);
            assets.insert(filename, RuntimeCodeGenerator::render(chunk, &graph));
        }
        drop(owners);
        self.transition(BuildState::AssetsRendered);

        Ok(Compilation {
            graph,
            chunks,
            assets,
            file_dependencies,
        })
    }
}
