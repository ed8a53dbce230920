// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Scratch Files
//!
//! Per-invocation temporary files used while assembling archive bodies.
//! Each [`ScratchFile`] removes its backing file when dropped, so every exit
//! path of a handler (success, error, panic unwinding) leaves the scratch
//! directory as it found it.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// Directory from which scratch files are allocated.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Scratch space in the OS temp directory
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a new uniquely named file under the root.
    pub fn create(&self, prefix: &str, suffix: &str) -> io::Result<ScratchFile> {
        std::fs::create_dir_all(&self.root)?;
        let inner = Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&self.root)?;
        tracing::trace!(path = %inner.path().display(), "Allocated scratch file");
        Ok(ScratchFile { inner })
    }
}

/// Scratch file guard; the file is deleted on drop.
pub struct ScratchFile {
    inner: NamedTempFile,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Replace the file content
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let file = self.inner.as_file_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(data)?;
        file.flush()
    }

    /// Handle for streaming writes
    pub fn writer(&mut self) -> &mut File {
        self.inner.as_file_mut()
    }

    /// Read the whole file back from the start
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let file = self.inner.as_file_mut();
        file.flush()?;
        file.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        // NamedTempFile unlinks itself right after this runs
        tracing::trace!(path = %self.inner.path().display(), "Removing scratch file");
    }
}
