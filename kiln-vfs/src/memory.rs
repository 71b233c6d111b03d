//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct MemoryTree {
    files: BTreeMap<String, Vec<u8>>,
    /// Explicitly created directories; parents of files are implicit
    dirs: BTreeSet<String>,
}

impl MemoryTree {
    fn has_dir(&self, normalized: &str) -> bool {
        if normalized == "/" || self.dirs.contains(normalized) {
            return true;
        }
        let prefix = format!("{}/", normalized);
        self.files
            .range(prefix.clone()..)
            .next()
            .map_or(false, |(key, _)| key.starts_with(&prefix))
    }
}

/// An in-memory file system implementation.
///
/// All files are stored in memory using a `BTreeMap`, making it suitable
/// for testing and scenarios where disk access is not desired. Directories
/// are implied by the files below them; writing a file never fails for a
/// missing parent.
///
/// # Example
/// ```
/// use kiln_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::with_text_files([("/project/src/main.js", "require('./a');")]);
/// assert!(fs.is_file(Path::new("/project/src/main.js")));
/// assert!(fs.is_dir(Path::new("/project/src")));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    tree: Arc<RwLock<MemoryTree>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self {
            tree: Arc::new(RwLock::new(MemoryTree::default())),
        }
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        if let Ok(mut tree) = fs.tree.write() {
            for (path, content) in files {
                let normalized = normalize_path(Path::new(path.as_ref()));
                tree.files.insert(normalized, content);
            }
        }
        fs
    }

    /// Create a new memory file system pre-populated with UTF-8 files.
    pub fn with_text_files<I, S, T>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self::with_files(
            files
                .into_iter()
                .map(|(path, text)| (path.as_ref().to_string(), text.as_ref().as_bytes().to_vec())),
        )
    }

    /// Paths of all stored files, sorted.
    pub fn file_paths(&self) -> Vec<String> {
        match self.tree.read() {
            Ok(tree) => tree.files.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a path string for internal storage.
/// Uses forward slashes and no trailing separator.
fn normalize_path(path: &Path) -> String {
    let mut normalized = path.to_string_lossy().replace('\\', "/");
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

fn lock_poisoned() -> VfsError {
    VfsError::Custom {
        message: String::from("Lock poisoned"),
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = normalize_path(path);
        let tree = self.tree.read().map_err(|_| lock_poisoned())?;

        tree.files
            .get(&normalized)
            .cloned()
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut tree = self.tree.write().map_err(|_| lock_poisoned())?;
        if tree.has_dir(&normalized) {
            return Err(VfsError::NotADirectory { path: normalized });
        }
        tree.files.insert(normalized, content.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut tree = self.tree.write().map_err(|_| lock_poisoned())?;

        let mut current = String::new();
        for component in normalized.split('/').filter(|c| !c.is_empty()) {
            current.push('/');
            current.push_str(component);
            if tree.files.contains_key(&current) {
                return Err(VfsError::NotADirectory { path: current });
            }
        }
        tree.dirs.insert(normalized);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        match self.tree.read() {
            Ok(tree) => tree.files.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        match self.tree.read() {
            Ok(tree) => tree.has_dir(&normalized),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_fs_is_empty() {
        let fs = MemoryFileSystem::new();
        assert!(!fs.exists(Path::new("/anything.js")));
        assert!(fs.file_paths().is_empty());
    }

    #[test]
    fn test_write_and_read() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/src/index.js");

        fs.write_file(path, b"console.log(1);").unwrap();

        assert_eq!(fs.read_file(path).unwrap(), b"console.log(1);");
        assert_eq!(fs.read_to_string(path).unwrap(), "console.log(1);");
    }

    #[test]
    fn test_read_nonexistent() {
        let fs = MemoryFileSystem::new();
        let result = fs.read_file(Path::new("/missing.js"));

        assert!(matches!(result.unwrap_err(), VfsError::NotFound { .. }));
    }

    #[test]
    fn test_read_invalid_utf8() {
        let fs = MemoryFileSystem::with_files([("/bin.dat", vec![0xff, 0xfe, 0x00])]);
        let result = fs.read_to_string(Path::new("/bin.dat"));

        assert!(matches!(result.unwrap_err(), VfsError::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_parents_of_files_are_directories() {
        let fs = MemoryFileSystem::with_text_files([("/project/src/lib/a.js", "")]);

        assert!(fs.is_dir(Path::new("/")));
        assert!(fs.is_dir(Path::new("/project")));
        assert!(fs.is_dir(Path::new("/project/src/lib")));
        assert!(fs.is_dir(Path::new("/project/src/lib/")));
        assert!(!fs.is_dir(Path::new("/project/src/lib/a.js")));
        assert!(!fs.is_dir(Path::new("/proj")));
        assert!(!fs.is_file(Path::new("/project/src")));
    }

    #[test]
    fn test_sibling_prefix_is_not_a_directory() {
        let fs = MemoryFileSystem::with_text_files([("/a-b/c.js", "")]);
        assert!(!fs.is_dir(Path::new("/a")));
    }

    #[test]
    fn test_create_dir_all() {
        let fs = MemoryFileSystem::new();
        let dir = Path::new("/out/assets");

        assert!(!fs.is_dir(dir));
        fs.create_dir_all(dir).unwrap();
        assert!(fs.is_dir(dir));
        assert!(fs.exists(dir));
        assert!(!fs.is_file(dir));

        // Idempotent
        fs.create_dir_all(dir).unwrap();
    }

    #[test]
    fn test_create_dir_over_file_fails() {
        let fs = MemoryFileSystem::with_text_files([("/out", "not a dir")]);
        let result = fs.create_dir_all(Path::new("/out/assets"));

        assert!(matches!(result.unwrap_err(), VfsError::NotADirectory { .. }));
    }

    #[test]
    fn test_write_over_directory_fails() {
        let fs = MemoryFileSystem::with_text_files([("/dist/a.js", "")]);
        let result = fs.write_file(Path::new("/dist"), b"x");

        assert!(matches!(result.unwrap_err(), VfsError::NotADirectory { .. }));
    }

    #[test]
    fn test_backslashes_normalized() {
        let fs = MemoryFileSystem::new();
        fs.write_file(Path::new("\\src\\a.js"), b"a").unwrap();

        assert!(fs.is_file(Path::new("/src/a.js")));
    }

    #[test]
    fn test_overwrite_file() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/dist/main.js");

        fs.write_file(path, b"first").unwrap();
        fs.write_file(path, b"second").unwrap();

        assert_eq!(fs.read_file(path).unwrap(), b"second");
    }

    #[test]
    fn test_clone_shares_data() {
        let fs1 = MemoryFileSystem::new();
        let path = Path::new("/shared.js");

        fs1.write_file(path, b"shared").unwrap();

        let fs2 = fs1.clone();
        assert!(fs2.exists(path));

        fs2.write_file(path, b"modified").unwrap();
        assert_eq!(fs1.read_file(path).unwrap(), b"modified");
    }

    #[test]
    fn test_concurrent_reads() {
        let fs = MemoryFileSystem::with_text_files([("/test.js", "concurrent")]);
        let mut handles = vec![];

        for _ in 0..8 {
            let fs_clone = fs.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    let content = fs_clone.read_to_string(Path::new("/test.js")).unwrap();
                    assert_eq!(content, "concurrent");
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
