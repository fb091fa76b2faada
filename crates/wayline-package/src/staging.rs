//! Atomic file staging.
//!
//! Output is written to a temporary file beside its destination and renamed into
//! place on success. Dropping a [`StagedFile`] without promoting it removes the
//! temporary file, so every error path cleans up after itself.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use crate::error::Result;

pub struct StagedFile {
    file: NamedTempFile,
    destination: PathBuf,
}

impl StagedFile {
    /// Stage a write that will land at `destination`.
    pub fn new(destination: &Path) -> Result<Self> {
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let file = Builder::new()
            .prefix(".wayline-")
            .suffix(".partial")
            .tempfile_in(&dir)?;

        Ok(Self {
            file,
            destination: destination.to_path_buf(),
        })
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        Ok(())
    }

    /// Temporary path, valid until the file is promoted or dropped.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Flush and rename into place.
    pub fn promote(mut self) -> Result<PathBuf> {
        self.file.flush()?;
        self.file.as_file().sync_all()?;
        self.file
            .persist(&self.destination)
            .map_err(|err| err.error)?;
        Ok(self.destination)
    }
}

/// Write `bytes` to `path` atomically.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut staged = StagedFile::new(path)?;
    staged.write_all(bytes)?;
    staged.promote()?;
    Ok(())
}
