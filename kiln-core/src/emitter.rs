//! Asset emission through the virtual file system

use crate::error::BuildError;
use kiln_vfs::VirtualFileSystem;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Writes rendered assets under an output directory
pub struct AssetEmitter<'a> {
    vfs: &'a dyn VirtualFileSystem,
    output_path: &'a Path,
}

impl<'a> AssetEmitter<'a> {
    pub fn new(vfs: &'a dyn VirtualFileSystem, output_path: &'a Path) -> Self {
        Self { vfs, output_path }
    }

    /// Create the output directory if needed and write every asset
    ///
    /// Returns the written paths, in filename order.
    #[instrument(target = "kiln::emit", skip_all, fields(output = %self.output_path.display(), assets = assets.len()))]
    pub fn emit(&self, assets: &BTreeMap<String, String>) -> Result<Vec<PathBuf>, BuildError> {
        self.vfs
            .create_dir_all(self.output_path)
            .map_err(|e| BuildError::io(self.output_path, e))?;

        let mut written = Vec::with_capacity(assets.len());
        for (filename, code) in assets {
            let path = self.output_path.join(filename);
            if let Some(parent) = path.parent() {
                if parent != self.output_path {
                    self.vfs
                        .create_dir_all(parent)
                        .map_err(|e| BuildError::io(parent, e))?;
                }
            }
            self.vfs
                .write_file(&path, code.as_bytes())
                .map_err(|e| BuildError::io(&path, e))?;
            debug!(target: "kiln::emit", path = %path.display(), bytes = code.len(), "wrote asset");
            written.push(path);
        }

        info!(target: "kiln::emit", count = written.len(), "assets written");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_vfs::MemoryFileSystem;

    fn assets(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_emit_creates_directories() {
        let fs = MemoryFileSystem::new();
        let emitter = AssetEmitter::new(&fs, Path::new("/p/dist"));
        let written = emitter
            .emit(&assets(&[("main.js", "m"), ("js/alt.js", "a")]))
            .unwrap();

        assert_eq!(
            written,
            vec![PathBuf::from("/p/dist/js/alt.js"), PathBuf::from("/p/dist/main.js")]
        );
        assert!(fs.is_dir(Path::new("/p/dist")));
        assert_eq!(fs.read_to_string(Path::new("/p/dist/main.js")).unwrap(), "m");
        assert_eq!(fs.read_to_string(Path::new("/p/dist/js/alt.js")).unwrap(), "a");
    }

    #[test]
    fn test_overwrites_existing_asset() {
        let fs = MemoryFileSystem::with_text_files(vec![("/out/main.js", "old")]);
        AssetEmitter::new(&fs, Path::new("/out"))
            .emit(&assets(&[("main.js", "new")]))
            .unwrap();
        assert_eq!(fs.read_to_string(Path::new("/out/main.js")).unwrap(), "new");
    }

    #[test]
    fn test_output_path_is_a_file() {
        let fs = MemoryFileSystem::with_text_files(vec![("/out", "not a dir")]);
        let err = AssetEmitter::new(&fs, Path::new("/out"))
            .emit(&assets(&[("main.js", "x")]))
            .unwrap_err();
        match err {
            BuildError::Io { path, .. } => assert_eq!(path, PathBuf::from("/out")),
            other => panic!("expected io error, got {:?}", other),
        }
    }
}
