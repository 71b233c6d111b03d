//! Dependency extraction and rewriting

use crate::ast::{CallArgument, DependencyCall, SyntaxTree};
use crate::error::BuildError;
use crate::graph::{Dependency, ModuleId};
use crate::resolver::PathResolver;
use kiln_vfs::VirtualFileSystem;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Where extraction results for one module are written
///
/// Passed down explicitly rather than kept on the extractor, so one
/// extractor can serve every module of a build.
pub struct ExtractContext<'c> {
    /// The module being extracted
    pub module: &'c ModuleId,
    /// Directory specifiers are resolved against
    pub module_dir: &'c Path,
    /// Dependency list of the module, appended in source order
    pub dependencies: &'c mut Vec<Dependency>,
    /// Every file the build has read or will read
    pub file_dependencies: &'c mut BTreeSet<PathBuf>,
}

/// Finds `require("...")` calls, resolves them and rewrites their argument
/// to the dependency's module id
pub struct DependencyExtractor<'a> {
    vfs: &'a dyn VirtualFileSystem,
    resolver: &'a PathResolver,
    root: &'a Path,
}

impl<'a> DependencyExtractor<'a> {
    pub fn new(vfs: &'a dyn VirtualFileSystem, resolver: &'a PathResolver, root: &'a Path) -> Self {
        Self { vfs, resolver, root }
    }

    /// Rewrite every dependency call of `tree` and render the result
    #[instrument(target = "kiln::parse", skip_all, fields(module = %ctx.module))]
    pub fn extract(
        &self,
        tree: &mut dyn SyntaxTree,
        ctx: &mut ExtractContext<'_>,
    ) -> Result<String, BuildError> {
        tree.visit_dependency_calls(&mut |call| self.rewrite(call, ctx))?;
        debug!(target: "kiln::parse", dependencies = ctx.dependencies.len(), "extracted");
        Ok(tree.render())
    }

    fn rewrite(&self, call: &mut DependencyCall, ctx: &mut ExtractContext<'_>) -> Result<(), BuildError> {
        let specifier = match call.argument() {
            CallArgument::Literal(specifier) => specifier.clone(),
            CallArgument::Dynamic(written) => {
                return Err(BuildError::UnsupportedDependency {
                    module: ctx.module.clone(),
                    position: call.position(),
                    argument: written.clone(),
                });
            }
        };

        let path = self
            .resolver
            .resolve(self.vfs, ctx.module_dir, &specifier, Some(ctx.module))?;
        let resolved_id = ModuleId::from_path(self.root, &path);
        call.rewrite(resolved_id.as_str());

        ctx.file_dependencies.insert(path.clone());
        ctx.dependencies.push(Dependency {
            specifier,
            resolved_id,
            absolute_path: path,
        });
        Ok(())
    }
}
