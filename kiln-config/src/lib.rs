//! Kiln Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Kiln crates:
//! the shape of a `kiln.json` file and the phase names used as log targets.

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// Chunk name used when `entry` is a single path string
pub const DEFAULT_CHUNK_NAME: &str = "main";

/// Token substituted with the chunk name in `output.filename`
pub const NAME_TOKEN: &str = "[name]";

/// Bundling phase, used for phase-specific log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Resolve,
    Loader,
    Parse,
    Graph,
    Chunk,
    Emit,
    Hooks,
}

impl Phase {
    /// All phases, in pipeline order
    pub const ALL: [Phase; 7] = [
        Phase::Resolve,
        Phase::Loader,
        Phase::Parse,
        Phase::Graph,
        Phase::Chunk,
        Phase::Emit,
        Phase::Hooks,
    ];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Resolve => "resolve",
            Phase::Loader => "loader",
            Phase::Parse => "parse",
            Phase::Graph => "graph",
            Phase::Chunk => "chunk",
            Phase::Emit => "emit",
            Phase::Hooks => "hooks",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("kiln::{}", self.as_str())
    }
}

/// Top-level bundler configuration, as read from `kiln.json`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundlerConfig {
    /// Entry point(s)
    pub entry: EntryConfig,
    /// Where and how assets are written
    #[serde(default)]
    pub output: OutputConfig,
    /// Transform rules
    #[serde(default)]
    pub module: ModuleConfig,
    /// Resolution options
    #[serde(default)]
    pub resolve: ResolveConfig,
    /// Plugins, by registered name
    #[serde(default)]
    pub plugins: Vec<ComponentSpec>,
}

impl BundlerConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Create a configuration with a single entry and defaults everywhere else
    pub fn with_entry(path: impl Into<String>) -> Self {
        Self {
            entry: EntryConfig::Single(path.into()),
            output: OutputConfig::default(),
            module: ModuleConfig::default(),
            resolve: ResolveConfig::default(),
            plugins: Vec::new(),
        }
    }
}

/// Either one entry path or a mapping from chunk name to path
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    Single(String),
    Named(NamedEntries),
}

impl EntryConfig {
    /// Normalize to `(chunk name, path)` pairs, in declaration order
    pub fn entries(&self) -> Vec<(String, String)> {
        match self {
            EntryConfig::Single(path) => vec![(DEFAULT_CHUNK_NAME.to_string(), path.clone())],
            EntryConfig::Named(named) => named.0.clone(),
        }
    }
}

/// Named entries that keep the order in which they were written
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedEntries(pub Vec<(String, String)>);

impl<'de> Deserialize<'de> for NamedEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = NamedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from chunk name to entry path")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, String)> = Vec::new();
                while let Some((name, path)) = map.next_entry::<String, String>()? {
                    if entries.iter().any(|(existing, _)| *existing == name) {
                        return Err(de::Error::custom(format!("duplicate entry '{}'", name)));
                    }
                    entries.push((name, path));
                }
                Ok(NamedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Output options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for written assets, created if absent
    pub path: String,
    /// Filename pattern; `[name]` is replaced with the chunk name
    pub filename: String,
}

impl OutputConfig {
    /// Asset filename for the given chunk
    pub fn filename_for(&self, chunk_name: &str) -> String {
        self.filename.replace(NAME_TOKEN, chunk_name)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "dist".to_string(),
            filename: format!("{}.js", NAME_TOKEN),
        }
    }
}

/// `module` section: transform rules
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleConfig {
    pub rules: Vec<RuleConfig>,
}

/// One transform rule
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Regular expression matched against the module's absolute path
    pub test: String,
    /// Loaders applied to matching modules, in declared order
    #[serde(rename = "use", default)]
    pub uses: Vec<ComponentSpec>,
}

/// `resolve` section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveConfig {
    /// Extensions tried, in order, when a specifier does not name a file verbatim
    pub extensions: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".js".to_string()],
        }
    }
}

/// Reference to a registered component (loader or plugin) plus its options
///
/// Written either as a bare name (`"banner"`) or as an object
/// (`{ "name": "banner", "options": { "text": "hi" } }`).
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    pub name: String,
    pub options: serde_json::Value,
}

impl ComponentSpec {
    /// Create a spec without options
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: serde_json::Value::Null,
        }
    }

    /// Create a spec with options
    pub fn with_options(name: impl Into<String>, options: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawComponentSpec {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        options: serde_json::Value,
    },
}

impl<'de> Deserialize<'de> for ComponentSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawComponentSpec::deserialize(deserializer)? {
            RawComponentSpec::Name(name) => ComponentSpec::named(name),
            RawComponentSpec::Full { name, options } => ComponentSpec { name, options },
        })
    }
}
