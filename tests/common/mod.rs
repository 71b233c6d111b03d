//! Test helpers
//!
//! Scratch projects on the real file system

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A project written into a temporary directory, removed on drop
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// Write `files` (paths relative to the project root)
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        for (path, content) in files {
            let full = dir.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).expect("create parent dir");
            }
            fs::write(&full, content).expect("write project file");
        }
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).expect("read project file")
    }
}
