//! Component trait definitions
//!
//! Named loaders and plugins are registered as components so that a
//! configuration file can refer to them by name.

use std::fmt;

/// The kind of component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Loader: a source-to-source transform applied before parsing
    Loader,
    /// Plugin: taps the compiler's lifecycle hooks
    Plugin,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Loader => write!(f, "loader"),
            ComponentKind::Plugin => write!(f, "plugin"),
        }
    }
}

/// Metadata about a component
#[derive(Debug, Clone)]
pub struct ComponentMetadata {
    /// The component name (unique identifier)
    pub name: &'static str,
    /// The component version
    pub version: &'static str,
    /// The kind of component
    pub kind: ComponentKind,
    /// Optional description
    pub description: Option<&'static str>,
}

impl ComponentMetadata {
    /// Create new metadata
    pub fn new(
        name: &'static str,
        version: &'static str,
        kind: ComponentKind,
        description: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            version,
            kind,
            description,
        }
    }
}

/// The base trait for all registered components
pub trait Component: Send + Sync {
    /// Get the component metadata
    fn metadata(&self) -> ComponentMetadata;

    /// Validate the options given to this component (optional)
    ///
    /// Default implementation always returns Ok(())
    fn validate_options(&self, _options: &serde_json::Value) -> Result<(), String> {
        Ok(())
    }
}

/// Helper methods for components
pub trait ComponentExt: Component {
    /// Check if this component is of the given kind
    fn is_kind(&self, kind: ComponentKind) -> bool {
        self.metadata().kind == kind
    }

    /// Get the component name
    fn name(&self) -> &'static str {
        self.metadata().name
    }
}

impl<T: Component + ?Sized> ComponentExt for T {}

/// Options check for components that take none
pub(crate) fn no_options(options: &serde_json::Value) -> Result<(), String> {
    match options {
        serde_json::Value::Null => Ok(()),
        serde_json::Value::Object(map) if map.is_empty() => Ok(()),
        _ => Err("takes no options".to_string()),
    }
}
