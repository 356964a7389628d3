//! Working trees the rule engine reads from and writes to.
//!
//! [`WorkingTree`] is the only view the core has of a repository: read a
//! file if it exists, write new content back. [`MemoryFS`] keeps everything
//! in memory for tests and dry runs, [`DiskTree`] is a checked-out
//! repository on disk.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File access relative to a repository root.
pub trait WorkingTree {
    /// Read a file as UTF-8. `Ok(None)` when it does not exist.
    fn read_file(&self, path: &str) -> Result<Option<String>>;

    /// Replace a file's content.
    fn write_file(&mut self, path: &str, content: &str) -> Result<()>;
}

/// Represents a file with content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }
}

/// In-memory working tree
#[derive(Debug, Clone, Default)]
pub struct MemoryFS {
    /// Files stored as path -> content mapping
    files: HashMap<PathBuf, File>,
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a file
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, file: File) {
        self.files.insert(path.as_ref().to_path_buf(), file);
    }

    /// Add a file with string content
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) {
        self.add_file(path, File::from_string(content));
    }

    /// File content as a string, if present and valid UTF-8
    pub fn get_string<P: AsRef<Path>>(&self, path: P) -> Option<&str> {
        self.files
            .get(path.as_ref())
            .and_then(|file| std::str::from_utf8(&file.content).ok())
    }

    /// Check if a file exists
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.files.contains_key(path.as_ref())
    }
}

impl WorkingTree for MemoryFS {
    fn read_file(&self, path: &str) -> Result<Option<String>> {
        match self.files.get(Path::new(path)) {
            None => Ok(None),
            Some(file) => String::from_utf8(file.content.clone())
                .map(Some)
                .map_err(|_| Error::Filesystem {
                    message: format!("{} is not valid UTF-8", path),
                }),
        }
    }

    fn write_file(&mut self, path: &str, content: &str) -> Result<()> {
        self.add_file_string(path, content);
        Ok(())
    }
}

/// A repository checked out on disk
#[derive(Debug, Clone)]
pub struct DiskTree {
    root: PathBuf,
}

impl DiskTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl WorkingTree for DiskTree {
    fn read_file(&self, path: &str) -> Result<Option<String>> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&full)?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| Error::Filesystem {
                message: format!("{} is not valid UTF-8", full.display()),
            })
    }

    fn write_file(&mut self, path: &str, content: &str) -> Result<()> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full, content)?;
        Ok(())
    }
}
