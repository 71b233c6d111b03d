//! Built-in loaders

use super::{LoaderFactory, Transform};
use crate::component::{no_options, Component, ComponentKind, ComponentMetadata};
use crate::error::TransformError;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_TEXT: &str = "kiln";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TextOptions {
    #[serde(default = "default_text")]
    text: String,
}

fn default_text() -> String {
    DEFAULT_TEXT.to_string()
}

fn text_option(options: &serde_json::Value) -> Result<String, String> {
    if options.is_null() {
        return Ok(default_text());
    }
    serde_json::from_value::<TextOptions>(options.clone())
        .map(|o| o.text)
        .map_err(|e| e.to_string())
}

fn loader_metadata(name: &'static str, description: &'static str) -> ComponentMetadata {
    ComponentMetadata::new(name, env!("CARGO_PKG_VERSION"), ComponentKind::Loader, Some(description))
}

/// Prepends `// <text>` as the first line
pub struct BannerLoader;

struct Banner {
    text: String,
}

impl Transform for Banner {
    fn name(&self) -> &str {
        "banner"
    }

    fn transform(&self, source: &str) -> Result<String, TransformError> {
        Ok(format!("// {}\n{}", self.text, source))
    }
}

impl Component for BannerLoader {
    fn metadata(&self) -> ComponentMetadata {
        loader_metadata("banner", "Prepend a comment line")
    }
}

impl LoaderFactory for BannerLoader {
    fn create(&self, options: &serde_json::Value) -> Result<Arc<dyn Transform>, String> {
        Ok(Arc::new(Banner {
            text: text_option(options)?,
        }))
    }
}

/// Appends `// <text>` as the last line
pub struct FooterLoader;

struct Footer {
    text: String,
}

impl Transform for Footer {
    fn name(&self) -> &str {
        "footer"
    }

    fn transform(&self, source: &str) -> Result<String, TransformError> {
        Ok(format!("{}\n// {}", source, self.text))
    }
}

impl Component for FooterLoader {
    fn metadata(&self) -> ComponentMetadata {
        loader_metadata("footer", "Append a comment line")
    }
}

impl LoaderFactory for FooterLoader {
    fn create(&self, options: &serde_json::Value) -> Result<Arc<dyn Transform>, String> {
        Ok(Arc::new(Footer {
            text: text_option(options)?,
        }))
    }
}

/// Turns a JSON document into a module exporting it
pub struct JsonLoader;

struct JsonModule;

impl Transform for JsonModule {
    fn name(&self) -> &str {
        "json"
    }

    fn transform(&self, source: &str) -> Result<String, TransformError> {
        // Validated but emitted as written: key order and number literals are data
        let document = source.trim_start_matches('\u{feff}').trim();
        serde_json::from_str::<serde::de::IgnoredAny>(document)
            .map_err(|e| TransformError::new(format!("invalid JSON: {}", e)))?;
        Ok(format!("module.exports = {};", document))
    }
}

impl Component for JsonLoader {
    fn metadata(&self) -> ComponentMetadata {
        loader_metadata("json", "Export a JSON document")
    }

    fn validate_options(&self, options: &serde_json::Value) -> Result<(), String> {
        no_options(options)
    }
}

impl LoaderFactory for JsonLoader {
    fn create(&self, _options: &serde_json::Value) -> Result<Arc<dyn Transform>, String> {
        Ok(Arc::new(JsonModule))
    }
}

/// Removes a leading byte order mark
pub struct StripBomLoader;

struct StripBom;

impl Transform for StripBom {
    fn name(&self) -> &str {
        "strip-bom"
    }

    fn transform(&self, source: &str) -> Result<String, TransformError> {
        Ok(source.strip_prefix('\u{feff}').unwrap_or(source).to_string())
    }
}

impl Component for StripBomLoader {
    fn metadata(&self) -> ComponentMetadata {
        loader_metadata("strip-bom", "Remove a leading byte order mark")
    }

    fn validate_options(&self, options: &serde_json::Value) -> Result<(), String> {
        no_options(options)
    }
}

impl LoaderFactory for StripBomLoader {
    fn create(&self, _options: &serde_json::Value) -> Result<Arc<dyn Transform>, String> {
        Ok(Arc::new(StripBom))
    }
}
