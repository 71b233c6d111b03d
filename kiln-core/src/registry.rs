//! Component registries
//!
//! Loader and plugin factories, looked up by the names used in `kiln.json`.

use crate::component::{Component, ComponentExt, ComponentKind};
use crate::error::ConfigError;
use crate::loader::{builtin, LoaderFactory, Transform};
use crate::plugin::{self, Plugin, PluginFactory};
use kiln_config::ComponentSpec;
use std::collections::HashMap;
use std::sync::Arc;

/// Generic registry for components
///
/// Note: This registry stores boxed trait objects. When using with dyn types
/// like `dyn LoaderFactory`, use `Registry<dyn LoaderFactory>` as the type.
pub struct Registry<T: Component + ?Sized> {
    components: HashMap<String, Box<T>>,
}

impl<T: Component + ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            components: HashMap::new(),
        }
    }
}

impl<T: Component + ?Sized> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.names())
            .finish()
    }
}

impl<T: Component + ?Sized> Registry<T> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component, replacing any component with the same name
    pub fn register(&mut self, component: Box<T>) {
        let name = component.name().to_string();
        self.components.insert(name, component);
    }

    /// Get a component by name
    pub fn get(&self, name: &str) -> Option<&T> {
        self.components.get(name).map(|b| b.as_ref())
    }

    /// Check if a component exists
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Remove a component
    pub fn remove(&mut self, name: &str) -> Option<Box<T>> {
        self.components.remove(name)
    }

    /// All component names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.components.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Look up `spec.name` and validate `spec.options` against it
    fn lookup(&self, kind: ComponentKind, spec: &ComponentSpec) -> Result<&T, ConfigError> {
        let component = self.get(&spec.name).ok_or_else(|| ConfigError::ComponentNotFound {
            kind,
            name: spec.name.clone(),
        })?;
        component
            .validate_options(&spec.options)
            .map_err(|message| invalid_options(component, message))?;
        Ok(component)
    }
}

fn invalid_options<T: Component + ?Sized>(component: &T, message: String) -> ConfigError {
    let meta = component.metadata();
    ConfigError::InvalidOptions {
        kind: meta.kind,
        name: meta.name.to_string(),
        message,
    }
}

/// Registry of loader factories
pub type LoaderRegistry = Registry<dyn LoaderFactory>;

/// Registry of plugin factories
pub type PluginRegistry = Registry<dyn PluginFactory>;

impl Registry<dyn LoaderFactory> {
    /// Registry holding the built-in loaders
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(builtin::BannerLoader));
        registry.register(Box::new(builtin::FooterLoader));
        registry.register(Box::new(builtin::JsonLoader));
        registry.register(Box::new(builtin::StripBomLoader));
        registry
    }

    /// Instantiate the transform named by `spec`
    pub fn create(&self, spec: &ComponentSpec) -> Result<Arc<dyn Transform>, ConfigError> {
        let factory = self.lookup(ComponentKind::Loader, spec)?;
        factory
            .create(&spec.options)
            .map_err(|message| invalid_options(factory, message))
    }
}

impl Registry<dyn PluginFactory> {
    /// Registry holding the built-in plugins
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(plugin::BuildStartLogPlugin));
        registry.register(Box::new(plugin::BuildDoneLogPlugin));
        registry.register(Box::new(plugin::BuildTimerPlugin));
        registry
    }

    /// Instantiate the plugin named by `spec`
    pub fn create(&self, spec: &ComponentSpec) -> Result<Box<dyn Plugin>, ConfigError> {
        let factory = self.lookup(ComponentKind::Plugin, spec)?;
        factory
            .create(&spec.options)
            .map_err(|message| invalid_options(factory, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentMetadata;
    use crate::error::TransformError;
    use crate::loader::transform_fn;
    use serde_json::json;

    struct UpperLoader;

    impl Component for UpperLoader {
        fn metadata(&self) -> ComponentMetadata {
            ComponentMetadata::new("upper", "1.0.0", ComponentKind::Loader, None)
        }

        fn validate_options(&self, options: &serde_json::Value) -> Result<(), String> {
            match options {
                serde_json::Value::Null => Ok(()),
                _ => Err("upper takes no options".to_string()),
            }
        }
    }

    impl LoaderFactory for UpperLoader {
        fn create(&self, _options: &serde_json::Value) -> Result<Arc<dyn Transform>, String> {
            Ok(transform_fn("upper", |s: &str| {
                Ok::<_, TransformError>(s.to_uppercase())
            }))
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = LoaderRegistry::new();
        assert!(registry.is_empty());
        registry.register(Box::new(UpperLoader));

        assert!(registry.contains("upper"));
        assert_eq!(registry.len(), 1);

        let transform = registry.create(&ComponentSpec::named("upper")).unwrap();
        assert_eq!(transform.name(), "upper");
        assert_eq!(transform.transform("abc").unwrap(), "ABC");
    }

    #[test]
    fn test_unknown_component() {
        let registry = LoaderRegistry::with_builtins();
        let Err(err) = registry.create(&ComponentSpec::named("nope")) else {
            panic!("unknown loader accepted");
        };
        assert!(matches!(
            err,
            ConfigError::ComponentNotFound { kind: ComponentKind::Loader, ref name } if name == "nope"
        ));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut registry = LoaderRegistry::new();
        registry.register(Box::new(UpperLoader));
        let Err(err) = registry.create(&ComponentSpec::with_options("upper", json!({ "x": 1 }))) else {
            panic!("invalid options accepted");
        };
        assert!(matches!(err, ConfigError::InvalidOptions { ref name, .. } if name == "upper"));
    }

    #[test]
    fn test_builtins() {
        let loaders = LoaderRegistry::with_builtins();
        assert_eq!(loaders.names(), vec!["banner", "footer", "json", "strip-bom"]);

        let plugins = PluginRegistry::with_builtins();
        assert_eq!(
            plugins.names(),
            vec!["build-done-log", "build-start-log", "build-timer"]
        );
        let plugin = plugins.create(&ComponentSpec::named("build-timer")).unwrap();
        assert_eq!(plugin.name(), "build-timer");
    }

    #[test]
    fn test_remove() {
        let mut registry = LoaderRegistry::with_builtins();
        assert!(registry.remove("json").is_some());
        assert!(!registry.contains("json"));
        assert!(registry.get("json").is_none());
    }
}
