//! Font file I/O.

use std::{
    fs::{create_dir_all, read, write},
    path::{Path, PathBuf},
};

use crate::{EngineError, Result};

/// A font file on disk.
#[derive(Debug, Clone)]
pub struct FontFile {
    path: PathBuf,
}

impl FontFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        read(&self.path).map_err(|source| self.io_error(source))
    }

    /// Write `data`, creating the parent directory if needed.
    pub fn write(&self, data: impl AsRef<[u8]>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent).map_err(|source| EngineError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        write(&self.path, data).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> EngineError {
        EngineError::Io { path: self.path.clone(), source }
    }
}

impl AsRef<Path> for FontFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let file = FontFile::new(dir.path().join("nested/out.ttf"));
        file.write(b"data").unwrap();
        assert_eq!(file.read().unwrap(), b"data");
    }

    #[test]
    fn test_read_missing_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = FontFile::new(dir.path().join("missing.ttf"));
        match file.read().unwrap_err() {
            EngineError::Io { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
