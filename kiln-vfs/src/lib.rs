//! Kiln Virtual File System
//!
//! A virtual file system abstraction with multiple backend implementations.
//! The bundler reads sources, probes candidate paths and writes assets only
//! through [`VirtualFileSystem`], so a whole build can run in memory.
//!
//! # Usage
//! ```rust
//! use kiln_vfs::{VirtualFileSystem, MemoryFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/src/a.js"), b"module.exports = 1;").unwrap();
//! assert!(fs.is_dir(Path::new("/src")));
//! assert_eq!(fs.read_to_string(Path::new("/src/a.js")).unwrap(), "module.exports = 1;");
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::VirtualFileSystem;

