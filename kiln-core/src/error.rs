//! Error types for the bundler
//!
//! Every build failure is fatal: a build either produces all of its assets
//! or none. Each variant carries the module id and/or path needed to
//! diagnose the failure without re-running.

use crate::ast::{SourcePosition, SyntaxError};
use crate::component::ComponentKind;
use crate::graph::ModuleId;
use crate::hooks::HookName;
use kiln_vfs::VfsError;
use std::path::PathBuf;
use thiserror::Error;

/// Build error
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("cannot resolve '{specifier}' from '{}'{}", base.display(), required_by(importer))]
    Resolution {
        specifier: String,
        base: PathBuf,
        importer: Option<ModuleId>,
        tried: Vec<PathBuf>,
    },

    #[error("loader '{loader}' (rule {rule}) failed on module {module}: {source}")]
    Loader {
        rule: String,
        loader: String,
        module: ModuleId,
        #[source]
        source: TransformError,
    },

    #[error("cannot parse module {module}: {source}")]
    Parse {
        module: ModuleId,
        #[source]
        source: SyntaxError,
    },

    #[error("unsupported dependency in module {module} at {position}: require({argument}) must take a single string literal")]
    UnsupportedDependency {
        module: ModuleId,
        position: SourcePosition,
        argument: String,
    },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("'{hook}' hook callback '{tap}' failed: {source}")]
    Hook {
        hook: HookName,
        tap: String,
        #[source]
        source: HookError,
    },

    #[error("chunks '{first}' and '{second}' both render to asset '{filename}'")]
    AssetConflict {
        filename: String,
        first: String,
        second: String,
    },
}

fn required_by(importer: &Option<ModuleId>) -> String {
    match importer {
        Some(id) => format!(" (required by {})", id),
        None => String::new(),
    }
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: VfsError) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short name of the error class
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::Resolution { .. } => "resolution",
            BuildError::Loader { .. } => "loader",
            BuildError::Parse { .. } => "parse",
            BuildError::UnsupportedDependency { .. } => "unsupported-dependency",
            BuildError::Io { .. } => "io",
            BuildError::Hook { .. } => "hook",
            BuildError::AssetConflict { .. } => "asset-conflict",
        }
    }
}

/// Error raised by a transform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransformError {
    message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for TransformError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TransformError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Error raised by a hook callback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Configuration error, raised before any build runs
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no entry points configured")]
    NoEntries,

    #[error("output filename must not be empty")]
    EmptyFilename,

    #[error("invalid rule pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{kind} not found: '{name}'")]
    ComponentNotFound { kind: ComponentKind, name: String },

    #[error("invalid options for {kind} '{name}': {message}")]
    InvalidOptions {
        kind: ComponentKind,
        name: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_message() {
        let err = BuildError::Resolution {
            specifier: "./missing".to_string(),
            base: PathBuf::from("/p/src"),
            importer: Some(ModuleId::new("./src/main.js")),
            tried: vec![PathBuf::from("/p/src/missing")],
        };
        assert_eq!(
            err.to_string(),
            "cannot resolve './missing' from '/p/src' (required by ./src/main.js)"
        );
        assert_eq!(err.kind(), "resolution");
    }

    #[test]
    fn test_io_message() {
        let err = BuildError::io("/p/a.js", VfsError::NotFound { path: "/p/a.js".into() });
        assert_eq!(err.to_string(), "I/O error on '/p/a.js': Path not found: /p/a.js");
    }

    #[test]
    fn test_transform_error_from_str() {
        let err: TransformError = "boom".into();
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "boom");
    }
}
