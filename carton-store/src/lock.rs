//! Locked file handle
//!
//! Owns the path and the open descriptor of one state file and applies
//! OS advisory locks to it:
//! - shared lock — any number of concurrent readers
//! - exclusive lock — a single writer, no readers
//!
//! All lock calls block until granted; there are no timeouts. Callers
//! that need bounded waiting must layer it externally. Dropping the
//! handle closes the descriptor, which releases any lock it holds, so
//! a crashed process never leaves a stale lock behind.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs4::FileExt;

/// How the underlying file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only; fails if the file does not exist.
    Read,
    /// Read-write, creating the file if absent.
    Append,
}

/// An open state-file descriptor with advisory-lock primitives.
#[derive(Debug)]
pub struct LockedFile {
    path: PathBuf,
    handle: File,
}

impl LockedFile {
    /// Open the file at `path` in the given mode.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let handle = match mode {
            OpenMode::Read => OpenOptions::new().read(true).open(&path)?,
            OpenMode::Append => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(&path)?,
        };
        Ok(Self { path, handle })
    }

    /// Existence probe; takes no lock.
    pub fn exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().exists()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until a shared lock is granted. Multiple holders are
    /// allowed concurrently; mutually exclusive with any writer.
    pub fn lock_shared(&self) -> io::Result<()> {
        FileExt::lock_shared(&self.handle)
    }

    /// Block until an exclusive lock is granted.
    ///
    /// The shared lock is taken first and then upgraded. This narrows
    /// the window between competing writers but is best effort, not a
    /// proven protocol.
    /// TODO: prove the shared-then-upgrade sequence safe against two
    /// simultaneous writers, or collapse it to a single request.
    pub fn lock_exclusive(&self) -> io::Result<()> {
        self.lock_shared()?;
        FileExt::lock_exclusive(&self.handle)
    }

    /// Release any held lock explicitly.
    ///
    /// Rarely needed: closing the descriptor releases locks anyway.
    /// Kept for diagnostics.
    pub fn unlock(&self) -> io::Result<()> {
        FileExt::unlock(&self.handle)
    }

    /// Duplicate the descriptor for the table engine. The duplicate
    /// shares the open file description, so the advisory lock held
    /// through this handle covers I/O done through the duplicate.
    pub fn duplicate(&self) -> io::Result<File> {
        self.handle.try_clone()
    }
}
