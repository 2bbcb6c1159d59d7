//! Scratch files that never outlive the stage that created them.

use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use crate::{
    Error, Result,
    config::{TEMP_PREFIX, TEMP_RETRIES},
};

/// A file reserved in a scratch directory, removed when dropped.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    /// Reserve a fresh `tmp_<random>.<extension>` file in `dir`.
    pub fn create(dir: &Path, extension: &str) -> Result<Self> {
        Self::create_with(dir, extension, TEMP_RETRIES, random_name)
    }

    /// Reserve a file named by `candidate`, trying at most `retries` names.
    ///
    /// A name is reserved only if no file by that name exists yet; the check
    /// and the creation are a single filesystem operation.
    pub fn create_with(
        dir: &Path,
        extension: &str,
        retries: usize,
        mut candidate: impl FnMut() -> String,
    ) -> Result<Self> {
        for _ in 0..retries {
            let path = dir.join(format!("{TEMP_PREFIX}{}.{extension}", candidate()));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => {
                    debug!("Reserved scratch file {}", path.display());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(Error::Io { path, source }),
            }
        }
        Err(Error::TempFileAllocation { dir: dir.to_path_buf(), retries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {e}", self.path.display()),
        }
    }
}

fn random_name() -> String {
    format!("{:032x}", rand::random::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("{n}")
        }
    }

    fn occupy(dir: &Path, count: usize) {
        for n in 1..=count {
            fs::write(dir.join(format!("{TEMP_PREFIX}{n}.sfd")), b"taken").unwrap();
        }
    }

    #[test]
    fn test_random_names_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempFile::create(dir.path(), "sfd").unwrap();
        let b = TempFile::create(dir.path(), "sfd").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().file_name().unwrap().to_str().unwrap().starts_with(TEMP_PREFIX));
    }

    #[test]
    fn test_skips_existing_names() {
        let dir = tempfile::tempdir().unwrap();
        occupy(dir.path(), 9);

        let file = TempFile::create_with(dir.path(), "sfd", 10, counter()).unwrap();
        assert_eq!(file.path(), dir.path().join("tmp_10.sfd"));
        // existing files untouched
        assert_eq!(fs::read(dir.path().join("tmp_1.sfd")).unwrap(), b"taken");
    }

    #[test]
    fn test_gives_up_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        occupy(dir.path(), 10);

        let err = TempFile::create_with(dir.path(), "sfd", 10, counter()).unwrap_err();
        assert!(matches!(err, Error::TempFileAllocation { retries: 10, .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 10);
    }

    #[test]
    fn test_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let file = TempFile::create(dir.path(), "sfd").unwrap();
            assert!(file.path().exists());
            file.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
