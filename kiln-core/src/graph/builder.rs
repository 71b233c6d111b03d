//! Recursive module graph construction

use super::{Module, ModuleGraph, ModuleId};
use crate::ast::ScriptParser;
use crate::error::BuildError;
use crate::extractor::{DependencyExtractor, ExtractContext};
use crate::loader::LoaderPipeline;
use crate::resolver::PathResolver;
use kiln_vfs::VirtualFileSystem;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Builds the module graph of one compilation
///
/// Each module id is read, transformed, parsed and extracted at most once.
/// Reaching an existing module only adds the current chunk name to it.
pub struct ModuleGraphBuilder<'a> {
    vfs: &'a dyn VirtualFileSystem,
    root: &'a Path,
    resolver: &'a PathResolver,
    loaders: &'a LoaderPipeline,
    parser: &'a dyn ScriptParser,
    graph: ModuleGraph,
    file_dependencies: BTreeSet<PathBuf>,
}

impl<'a> ModuleGraphBuilder<'a> {
    pub fn new(
        vfs: &'a dyn VirtualFileSystem,
        root: &'a Path,
        resolver: &'a PathResolver,
        loaders: &'a LoaderPipeline,
        parser: &'a dyn ScriptParser,
    ) -> Self {
        Self {
            vfs,
            root,
            resolver,
            loaders,
            parser,
            graph: ModuleGraph::new(),
            file_dependencies: BTreeSet::new(),
        }
    }

    /// Resolve an entry specifier against the root and build it
    #[instrument(target = "kiln::graph", skip(self))]
    pub fn build_entry(&mut self, entry_name: &str, specifier: &str) -> Result<ModuleId, BuildError> {
        let path = self.resolver.resolve(self.vfs, self.root, specifier, None)?;
        let id = self.build(entry_name, &path)?;
        info!(target: "kiln::graph", entry = entry_name, module = %id, modules = self.graph.len(), "entry built");
        Ok(id)
    }

    /// Build the module at `path` and, recursively, its dependencies
    pub fn build(&mut self, entry_name: &str, path: &Path) -> Result<ModuleId, BuildError> {
        let id = ModuleId::from_path(self.root, path);
        if self.graph.contains(&id) {
            self.graph.add_chunk_name(&id, entry_name);
            return Ok(id);
        }

        debug!(target: "kiln::graph", module = %id, chunk = entry_name, "building");
        let raw = self
            .vfs
            .read_to_string(path)
            .map_err(|e| BuildError::io(path, e))?;
        self.file_dependencies.insert(path.to_path_buf());

        let source = self.loaders.apply(&id, path, raw)?;
        let mut tree = self
            .parser
            .parse(&source)
            .map_err(|source| BuildError::Parse {
                module: id.clone(),
                source,
            })?;

        let module_dir = path.parent().unwrap_or(self.root);
        let mut dependencies = Vec::new();
        let transformed = {
            let mut ctx = ExtractContext {
                module: &id,
                module_dir,
                dependencies: &mut dependencies,
                file_dependencies: &mut self.file_dependencies,
            };
            DependencyExtractor::new(self.vfs, self.resolver, self.root).extract(tree.as_mut(), &mut ctx)?
        };

        let pending: Vec<PathBuf> = dependencies.iter().map(|d| d.absolute_path.clone()).collect();
        self.graph.insert(Module::new(
            id.clone(),
            path.to_path_buf(),
            entry_name,
            dependencies,
            transformed,
        ));

        for dependency in pending {
            self.build(entry_name, &dependency)?;
        }
        Ok(id)
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// The built graph and every file read while building it
    pub fn finish(self) -> (ModuleGraph, BTreeSet<PathBuf>) {
        (self.graph, self.file_dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SwcParser;
    use kiln_vfs::MemoryFileSystem;

    struct Fixture {
        fs: MemoryFileSystem,
        resolver: PathResolver,
        loaders: LoaderPipeline,
        parser: SwcParser,
    }

    impl Fixture {
        fn new(files: Vec<(&str, &str)>) -> Self {
            Self {
                fs: MemoryFileSystem::with_text_files(files),
                resolver: PathResolver::default(),
                loaders: LoaderPipeline::default(),
                parser: SwcParser::new(),
            }
        }

        fn builder(&self) -> ModuleGraphBuilder<'_> {
            ModuleGraphBuilder::new(&self.fs, Path::new("/p"), &self.resolver, &self.loaders, &self.parser)
        }
    }

    fn ids(graph: &ModuleGraph) -> Vec<&str> {
        graph.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_discovery_order() {
        let fx = Fixture::new(vec![
            ("/p/main.js", "require('./a'); require('./c');"),
            ("/p/a.js", "require('./b');"),
            ("/p/b.js", ""),
            ("/p/c.js", ""),
        ]);
        let mut builder = fx.builder();
        builder.build_entry("main", "./main.js").unwrap();
        assert_eq!(ids(builder.graph()), vec!["./main.js", "./a.js", "./b.js", "./c.js"]);
    }

    #[test]
    fn test_shared_module_built_once() {
        let fx = Fixture::new(vec![
            ("/p/main.js", "require('./a');"),
            ("/p/a.js", "require('./b');"),
            ("/p/b.js", "module.exports = 1;"),
            ("/p/alt.js", "require('./b.js');"),
        ]);
        let mut builder = fx.builder();
        builder.build_entry("main", "./main.js").unwrap();
        builder.build_entry("alt", "./alt.js").unwrap();

        let (graph, files) = builder.finish();
        assert_eq!(graph.len(), 4);
        let b = graph.get(&ModuleId::new("./b.js")).unwrap();
        assert_eq!(b.chunk_names(), ["main", "alt"]);
        assert_eq!(
            graph.get(&ModuleId::new("./a.js")).unwrap().chunk_names(),
            ["main"]
        );
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_late_entry_reaches_existing_subtree() {
        let fx = Fixture::new(vec![
            ("/p/main.js", "require('./a');"),
            ("/p/a.js", "require('./b');"),
            ("/p/b.js", ""),
            ("/p/alt.js", "require('./a');"),
        ]);
        let mut builder = fx.builder();
        builder.build_entry("main", "./main.js").unwrap();
        builder.build_entry("alt", "./alt.js").unwrap();

        let graph = builder.graph();
        assert_eq!(graph.get(&ModuleId::new("./b.js")).unwrap().chunk_names(), ["main", "alt"]);
        assert_eq!(graph.get(&ModuleId::new("./main.js")).unwrap().chunk_names(), ["main"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let fx = Fixture::new(vec![
            ("/p/a.js", "exports.b = require('./b');"),
            ("/p/b.js", "exports.a = require('./a');"),
        ]);
        let mut builder = fx.builder();
        builder.build_entry("main", "./a.js").unwrap();
        assert_eq!(ids(builder.graph()), vec!["./a.js", "./b.js"]);
    }

    #[test]
    fn test_missing_entry() {
        let fx = Fixture::new(vec![]);
        let err = fx.builder().build_entry("main", "./main.js").unwrap_err();
        assert!(matches!(err, BuildError::Resolution { importer: None, .. }));
    }

    #[test]
    fn test_parse_error_names_module() {
        let fx = Fixture::new(vec![("/p/main.js", "require('./a'")]);
        let err = fx.builder().build_entry("main", "./main.js").unwrap_err();
        match err {
            BuildError::Parse { module, .. } => assert_eq!(module, ModuleId::new("./main.js")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_dependency_failure_aborts() {
        let fx = Fixture::new(vec![
            ("/p/main.js", "require('./a');"),
            ("/p/a.js", "require('./missing');"),
        ]);
        let err = fx.builder().build_entry("main", "./main.js").unwrap_err();
        match err {
            BuildError::Resolution { specifier, importer, .. } => {
                assert_eq!(specifier, "./missing");
                assert_eq!(importer, Some(ModuleId::new("./a.js")));
            }
            other => panic!("expected resolution error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_is_io_error() {
        let fs = MemoryFileSystem::with_files(vec![("/p/main.js", vec![0xff, 0xfe])]);
        let resolver = PathResolver::default();
        let loaders = LoaderPipeline::default();
        let parser = SwcParser::new();
        let mut builder = ModuleGraphBuilder::new(&fs, Path::new("/p"), &resolver, &loaders, &parser);
        let err = builder.build_entry("main", "./main.js").unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
    }
}
