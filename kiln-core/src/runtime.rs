//! Runtime bundle generation
//!
//! Each chunk becomes one self-executing program:
//!
//! ```text
//! (() => {
//!   var modules = { "<id>": (module, exports, require) => { <body> }, ... };
//!   var cache = {};
//!   function require(moduleId) { ... }
//!   var exports = {};
//!   <entry module body>
//! })()
//! ```
//!
//! A module is put in the cache before its wrapper runs, so circular
//! requires see the partially populated exports object.

use crate::chunk::Chunk;
use crate::graph::{Module, ModuleGraph};
use tracing::{debug, instrument};

const REQUIRE_SHIM: &str = concat!(
    "  var cache = {};\n",
    "  function require(moduleId) {\n",
    "    if (cache[moduleId] !== undefined) return cache[moduleId].exports;\n",
    "    var module = (cache[moduleId] = { exports: {} });\n",
    "    modules[moduleId](module, module.exports, require);\n",
    "    return module.exports;\n",
    "  }\n",
);

/// Renders chunks into runtime bundles
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeCodeGenerator;

impl RuntimeCodeGenerator {
    #[instrument(target = "kiln::emit", skip_all, fields(chunk = %chunk.name))]
    pub fn render(chunk: &Chunk, graph: &ModuleGraph) -> String {
        let modules: Vec<&Module> = chunk.module_ids.iter().filter_map(|id| graph.get(id)).collect();

        let mut out = String::from("(() => {\n  var modules = {\n");
        for module in &modules {
            out.push_str(&format!("    {}: (module, exports, require) => {{\n", quote_id(module)));
            push_body(&mut out, &module.transformed_source);
            out.push_str("    },\n");
        }
        out.push_str("  };\n");
        out.push_str(REQUIRE_SHIM);
        out.push_str("  var exports = {};\n");
        if let Some(entry) = graph.get(&chunk.entry_module_id) {
            push_body(&mut out, &entry.transformed_source);
        }
        out.push_str("})()\n");

        debug!(target: "kiln::emit", modules = modules.len(), bytes = out.len(), "rendered");
        out
    }
}

fn quote_id(module: &Module) -> String {
    serde_json::Value::String(module.id.as_str().to_string()).to_string()
}

/// Module bodies are inserted verbatim, on lines of their own
fn push_body(out: &mut String, body: &str) {
    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
}
