//! Loader pipeline
//!
//! A loader is a pure source-to-source transform selected by a path
//! pattern. All transforms of all matching rules are collected in declared
//! order and then applied right-to-left: the last-declared transform sees
//! the raw source first.

pub mod builtin;

use crate::component::Component;
use crate::error::{BuildError, ConfigError, TransformError};
use crate::graph::{to_unix, ModuleId};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A pure `(source) -> source` transform
pub trait Transform: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    fn transform(&self, source: &str) -> Result<String, TransformError>;
}

/// Transform backed by a closure
pub struct FnTransform<F> {
    name: String,
    f: F,
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&str) -> Result<String, TransformError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, source: &str) -> Result<String, TransformError> {
        (self.f)(source)
    }
}

/// Wrap a closure as a named transform
pub fn transform_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn Transform>
where
    F: Fn(&str) -> Result<String, TransformError> + Send + Sync + 'static,
{
    Arc::new(FnTransform {
        name: name.into(),
        f,
    })
}

/// Factory for a named loader
pub trait LoaderFactory: Component {
    /// Create a transform configured with `options`
    fn create(&self, options: &serde_json::Value) -> Result<Arc<dyn Transform>, String>;
}

/// A `test` pattern and the transforms it selects
#[derive(Clone)]
pub struct Rule {
    test: Regex,
    transforms: Vec<Arc<dyn Transform>>,
}

impl Rule {
    /// Compile a rule from a regular expression
    pub fn new(pattern: &str, transforms: Vec<Arc<dyn Transform>>) -> Result<Self, ConfigError> {
        let test = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { test, transforms })
    }

    pub fn pattern(&self) -> &str {
        self.test.as_str()
    }

    pub fn transforms(&self) -> &[Arc<dyn Transform>] {
        &self.transforms
    }

    /// Whether this rule applies to the module at `path`
    pub fn matches(&self, path: &Path) -> bool {
        self.test.is_match(&to_unix(path))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.transforms.iter().map(|t| t.name()).collect();
        f.debug_struct("Rule")
            .field("test", &self.test.as_str())
            .field("use", &names)
            .finish()
    }
}

/// Ordered list of rules
#[derive(Debug, Clone, Default)]
pub struct LoaderPipeline {
    rules: Vec<Rule>,
}

impl LoaderPipeline {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Transforms applicable to `path`, in the order they run
    pub fn matching(&self, path: &Path) -> Vec<(&Rule, &Arc<dyn Transform>)> {
        let mut selected: Vec<(&Rule, &Arc<dyn Transform>)> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(path))
            .flat_map(|rule| rule.transforms.iter().map(move |t| (rule, t)))
            .collect();
        selected.reverse();
        selected
    }

    /// Run the matching transforms over `source`
    #[instrument(target = "kiln::loader", skip(self, path, source), fields(module = %module))]
    pub fn apply(&self, module: &ModuleId, path: &Path, source: String) -> Result<String, BuildError> {
        let mut current = source;
        for (rule, transform) in self.matching(path) {
            debug!(target: "kiln::loader", loader = transform.name(), rule = rule.pattern(), "applying");
            current = transform
                .transform(&current)
                .map_err(|source| BuildError::Loader {
                    rule: rule.pattern().to_string(),
                    loader: transform.name().to_string(),
                    module: module.clone(),
                    source,
                })?;
        }
        Ok(current)
    }
}
