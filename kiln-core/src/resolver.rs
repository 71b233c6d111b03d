//! Dependency specifier resolution

use crate::error::BuildError;
use crate::graph::{normalize, ModuleId};
use kiln_vfs::VirtualFileSystem;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace};

/// Resolves a specifier against a base directory to an existing file
///
/// The joined path is tried verbatim first, then with each configured
/// extension appended, in order. Only regular files count as hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    extensions: Vec<String>,
}

impl PathResolver {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Candidate paths for `specifier`, in the order they are tried
    pub fn candidates(&self, base: &Path, specifier: &str) -> Vec<PathBuf> {
        let verbatim = normalize(&base.join(specifier));
        let mut candidates = Vec::with_capacity(self.extensions.len() + 1);
        for extension in &self.extensions {
            let mut with_extension = verbatim.clone().into_os_string();
            with_extension.push(extension);
            candidates.push(PathBuf::from(with_extension));
        }
        candidates.insert(0, verbatim);
        candidates
    }

    /// Resolve `specifier` relative to `base`
    ///
    /// `importer` is only used to give a failed resolution its context.
    #[instrument(target = "kiln::resolve", skip(self, vfs, importer), fields(base = %base.display()))]
    pub fn resolve(
        &self,
        vfs: &dyn VirtualFileSystem,
        base: &Path,
        specifier: &str,
        importer: Option<&ModuleId>,
    ) -> Result<PathBuf, BuildError> {
        let candidates = self.candidates(base, specifier);
        for candidate in &candidates {
            trace!(target: "kiln::resolve", candidate = %candidate.display(), "trying");
            if vfs.is_file(candidate) {
                debug!(target: "kiln::resolve", resolved = %candidate.display(), "resolved");
                return Ok(candidate.clone());
            }
        }
        Err(BuildError::Resolution {
            specifier: specifier.to_string(),
            base: base.to_path_buf(),
            importer: importer.cloned(),
            tried: candidates,
        })
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(vec![".js".to_string()])
    }
}
