//! Chunk assembly

use crate::graph::{ModuleGraph, ModuleId};
use serde::Serialize;
use tracing::debug;

/// The modules reachable from one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub name: String,
    pub entry_module_id: ModuleId,
    /// Member modules, in discovery order across the build
    pub module_ids: Vec<ModuleId>,
}

/// Groups built modules by the chunks they belong to
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkAssembler;

impl ChunkAssembler {
    /// One chunk per entry, in entry order
    pub fn assemble(entries: &[(String, ModuleId)], graph: &ModuleGraph) -> Vec<Chunk> {
        entries
            .iter()
            .map(|(name, entry)| {
                let module_ids: Vec<ModuleId> = graph
                    .iter()
                    .filter(|m| m.in_chunk(name))
                    .map(|m| m.id.clone())
                    .collect();
                debug!(target: "kiln::chunk", chunk = %name, modules = module_ids.len(), "assembled");
                Chunk {
                    name: name.clone(),
                    entry_module_id: entry.clone(),
                    module_ids,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SwcParser;
    use crate::graph::ModuleGraphBuilder;
    use crate::loader::LoaderPipeline;
    use crate::resolver::PathResolver;
    use kiln_vfs::MemoryFileSystem;
    use std::path::Path;

    #[test]
    fn test_chunks_follow_discovery_order() {
        let fs = MemoryFileSystem::with_text_files(vec![
            ("/p/main.js", "require('./a');"),
            ("/p/a.js", "require('./b');"),
            ("/p/b.js", ""),
            ("/p/alt.js", "require('./b');"),
        ]);
        let resolver = PathResolver::default();
        let loaders = LoaderPipeline::default();
        let parser = SwcParser::new();
        let mut builder = ModuleGraphBuilder::new(&fs, Path::new("/p"), &resolver, &loaders, &parser);
        let main = builder.build_entry("main", "./main.js").unwrap();
        let alt = builder.build_entry("alt", "./alt.js").unwrap();

        let entries = vec![("main".to_string(), main), ("alt".to_string(), alt)];
        let chunks = ChunkAssembler::assemble(&entries, builder.graph());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].name, "main");
        assert_eq!(chunks[0].entry_module_id.as_str(), "./main.js");
        assert_eq!(
            chunks[0].module_ids,
            vec![ModuleId::new("./main.js"), ModuleId::new("./a.js"), ModuleId::new("./b.js")]
        );
        // b.js was discovered before alt.js
        assert_eq!(
            chunks[1].module_ids,
            vec![ModuleId::new("./b.js"), ModuleId::new("./alt.js")]
        );
    }
}
