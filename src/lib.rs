//! Kiln - a small JavaScript module bundler
//!
//! Facade over the workspace crates:
//!
//! - [`config`]: the `kiln.json` vocabulary
//! - [`vfs`]: the file system abstraction builds run against
//! - [`core`]: the bundling engine
//!
//! # Usage
//! ```no_run
//! use std::path::Path;
//!
//! let output = kiln::bundle_project(Path::new("kiln.json")).unwrap();
//! for (filename, code) in &output.stats.assets {
//!     println!("{}  {} bytes", filename, code.len());
//! }
//! ```

pub use kiln_config as config;
pub use kiln_core as core;
pub use kiln_vfs as vfs;

pub use kiln_config::BundlerConfig;
pub use kiln_core::{
    compiler_from_config, BuildError, BuildOutput, BuildState, Compilation, Compiler, CompilerOptions,
    ConfigError, HookName, ModuleId, Plugin, Stats, Transform,
};
pub use kiln_vfs::{MemoryFileSystem, NativeFileSystem, VirtualFileSystem};

use kiln_core::graph::normalize;
use kiln_vfs::VfsError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Failure of [`bundle_project`]
#[derive(Error, Debug)]
pub enum KilnError {
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("cannot parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Build the project described by the configuration file at `config_path`
///
/// The file's directory is the build root. Uses the native file system and
/// the built-in loaders and plugins.
pub fn bundle_project(config_path: &Path) -> Result<BuildOutput, KilnError> {
    let vfs: Arc<dyn VirtualFileSystem> = Arc::new(NativeFileSystem::new());
    bundle_project_with(config_path, vfs)
}

/// [`bundle_project`] against any file system
pub fn bundle_project_with(config_path: &Path, vfs: Arc<dyn VirtualFileSystem>) -> Result<BuildOutput, KilnError> {
    let text = vfs.read_to_string(config_path).map_err(|source| KilnError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    let config = BundlerConfig::from_json_str(&text).map_err(|source| KilnError::Parse {
        path: config_path.to_path_buf(),
        source,
    })?;

    let root = normalize(config_path.parent().unwrap_or(Path::new(".")));
    let mut compiler = compiler_from_config(&config, root, vfs)?;
    Ok(compiler.run()?)
}
