//! Module identifiers and path normalization

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Module identifier
///
/// A root-relative path with `/` separators and a leading `./`, e.g.
/// `./src/math/add.js`. Two specifiers that resolve to the same file always
/// produce the same id; it is the deduplication key of a build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Wrap an already-formed id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the file at `path`, relative to the build `root`
    ///
    /// # Examples
    /// ```
    /// use kiln_core::graph::ModuleId;
    /// use std::path::Path;
    ///
    /// let id = ModuleId::from_path(Path::new("/project"), Path::new("/project/src/./a/../b.js"));
    /// assert_eq!(id.as_str(), "./src/b.js");
    /// ```
    pub fn from_path(root: &Path, path: &Path) -> Self {
        Self(format!("./{}", relative_to(&normalize(root), &normalize(path))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into
/// their parent. Does not touch the file system.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `path` relative to `base`, with `/` separators
///
/// Both paths are expected to be normalized.
pub fn relative_to(base: &Path, path: &Path) -> String {
    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = path.components().collect();
    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base.len() {
        parts.push("..".to_string());
    }
    for component in &target[common..] {
        parts.push(component.as_os_str().to_string_lossy().to_string());
    }
    parts.join("/")
}

/// Path as text with `/` separators
pub fn to_unix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
