/// File API abstraction
///
/// Provides the synchronous read operations exposed to scripts.
/// This module is runtime-agnostic: the JavaScript bindings only convert
/// arguments and results.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::FileError;

/// File API implementation
///
/// Paths are used as given. Relative paths resolve against `base_dir` when one
/// is configured, otherwise against the process working directory.
#[derive(Clone, Debug, Default)]
pub struct FileApi {
    base_dir: Option<PathBuf>,
}

impl FileApi {
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Resolve relative paths against `base_dir`
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Resolve a script-supplied path to the path actually opened
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Read the whole file into memory
    ///
    /// # Errors
    /// Reading a directory fails with [`FileError::Read`] instead of returning
    /// an empty buffer.
    pub fn read_bytes(&self, path: &str) -> Result<Vec<u8>, FileError> {
        let resolved = self.resolve(path);

        let mut file = fs::File::open(&resolved).map_err(|source| FileError::Open {
            path: resolved.clone(),
            source,
        })?;

        let metadata = file.metadata().map_err(|source| FileError::Stat {
            path: resolved.clone(),
            source,
        })?;

        if metadata.is_dir() {
            return Err(FileError::Read {
                path: resolved,
                source: std::io::Error::other("Is a directory"),
            });
        }

        // Size is a hint only; the file may change between stat and read.
        // Sparse or huge files must fail here instead of aborting on allocation.
        let mut data = Vec::new();
        let reserved = usize::try_from(metadata.len())
            .map_err(|e| e.to_string())
            .and_then(|len| data.try_reserve_exact(len).map_err(|e| e.to_string()));
        if let Err(reason) = reserved {
            return Err(FileError::Read {
                path: resolved,
                source: std::io::Error::new(std::io::ErrorKind::OutOfMemory, reason),
            });
        }

        file.read_to_end(&mut data).map_err(|source| FileError::Read {
            path: resolved,
            source,
        })?;

        Ok(data)
    }

    /// Read the whole file and decode it byte-per-character as Latin-1
    ///
    /// Never fails on content: ASCII bytes map to themselves and bytes
    /// `0x80..=0xFF` become U+0080..U+00FF.
    pub fn read_text(&self, path: &str) -> Result<String, FileError> {
        self.read_bytes(path).map(|data| latin1_to_string(&data))
    }

    /// Whether a file or directory exists at `path`, following symlinks
    pub fn exists(&self, path: &str) -> bool {
        fs::metadata(self.resolve(path)).is_ok()
    }
}

/// Decode raw bytes as Latin-1
pub fn latin1_to_string(data: &[u8]) -> String {
    data.iter().map(|&b| char::from(b)).collect()
}
