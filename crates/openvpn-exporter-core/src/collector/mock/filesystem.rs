//! In-memory mock filesystem for testing collectors without real status files.

use crate::collector::traits::FileSystem;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores file contents keyed by path so tests can simulate any mix of
/// present, missing and malformed status files.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file with the given content.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Removes a file, simulating a status file that vanished between passes.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }
}

impl FileSystem for MockFs {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        self.files
            .get(path)
            .map(|content| Box::new(Cursor::new(content.clone())) as Box<dyn Read + Send>)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("file not found: {:?}", path),
                )
            })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}
