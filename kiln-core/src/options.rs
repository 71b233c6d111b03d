//! Compiler options
//!
//! [`CompilerOptions`] is the resolved form of a [`BundlerConfig`]: paths
//! are absolute, rule patterns are compiled and component names have been
//! turned into transforms and plugins. Library users may also build it
//! directly, with closures as transforms.

use crate::error::ConfigError;
use crate::loader::{Rule, Transform};
use crate::plugin::Plugin;
use crate::registry::{LoaderRegistry, PluginRegistry};
use kiln_config::{BundlerConfig, OutputConfig, DEFAULT_CHUNK_NAME, NAME_TOKEN};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub struct CompilerOptions {
    /// Build root: entries resolve against it and module ids are relative to it
    pub root: PathBuf,
    /// `(chunk name, entry specifier)` pairs, in chunk order
    pub entries: Vec<(String, String)>,
    /// Directory assets are written to
    pub output_path: PathBuf,
    /// Asset filename pattern; `[name]` is replaced with the chunk name
    pub filename: String,
    pub rules: Vec<Rule>,
    pub extensions: Vec<String>,
    pub plugins: Vec<Box<dyn Plugin>>,
}

impl CompilerOptions {
    /// Options with no entries and default output and resolution settings
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let output = OutputConfig::default();
        Self {
            output_path: root.join(&output.path),
            root,
            entries: Vec::new(),
            filename: output.filename,
            rules: Vec::new(),
            extensions: vec![".js".to_string()],
            plugins: Vec::new(),
        }
    }

    /// Add an entry; `main` is the conventional name for a single entry
    pub fn entry(mut self, name: impl Into<String>, specifier: impl Into<String>) -> Self {
        self.entries.push((name.into(), specifier.into()));
        self
    }

    /// Shorthand for a single entry named `main`
    pub fn single_entry(self, specifier: impl Into<String>) -> Self {
        self.entry(DEFAULT_CHUNK_NAME, specifier)
    }

    pub fn output(mut self, path: impl AsRef<Path>, filename: impl Into<String>) -> Self {
        self.output_path = self.root.join(path);
        self.filename = filename.into();
        self
    }

    /// Add a rule applying `transforms` to paths matching `pattern`
    pub fn rule(mut self, pattern: &str, transforms: Vec<Arc<dyn Transform>>) -> Result<Self, ConfigError> {
        self.rules.push(Rule::new(pattern, transforms)?);
        Ok(self)
    }

    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn plugin(mut self, plugin: Box<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Asset filename of the chunk `name`
    pub fn filename_for(&self, name: &str) -> String {
        self.filename.replace(NAME_TOKEN, name)
    }

    /// Resolve a configuration file's contents against `root`
    ///
    /// Loader and plugin names are looked up in the given registries; any
    /// unknown name, invalid options or invalid pattern fails here, before a
    /// build can start.
    pub fn from_config(
        config: &BundlerConfig,
        root: impl Into<PathBuf>,
        loaders: &LoaderRegistry,
        plugins: &PluginRegistry,
    ) -> Result<Self, ConfigError> {
        let root = root.into();

        let entries = config.entry.entries();
        if entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }
        if config.output.filename.is_empty() {
            return Err(ConfigError::EmptyFilename);
        }

        let mut rules = Vec::with_capacity(config.module.rules.len());
        for rule in &config.module.rules {
            let transforms = rule
                .uses
                .iter()
                .map(|spec| loaders.create(spec))
                .collect::<Result<Vec<_>, _>>()?;
            rules.push(Rule::new(&rule.test, transforms)?);
        }

        let plugins = config
            .plugins
            .iter()
            .map(|spec| plugins.create(spec))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            target: "kiln::cli",
            root = %root.display(),
            entries = entries.len(),
            rules = rules.len(),
            plugins = plugins.len(),
            "options resolved"
        );

        Ok(Self {
            output_path: root.join(&config.output.path),
            root,
            entries,
            filename: config.output.filename.clone(),
            rules,
            extensions: config.resolve.extensions.clone(),
            plugins,
        })
    }
}

impl fmt::Debug for CompilerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("CompilerOptions")
            .field("root", &self.root)
            .field("entries", &self.entries)
            .field("output_path", &self.output_path)
            .field("filename", &self.filename)
            .field("rules", &self.rules)
            .field("extensions", &self.extensions)
            .field("plugins", &plugins)
            .finish()
    }
}
