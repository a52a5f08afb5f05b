//! Scoped ownership of transient files
//!
//! An [`ArtifactGuard`] deletes its file when dropped. Dropping happens on
//! every exit path: early `?` returns, panics, and futures abandoned mid-await
//! (a client disconnect drops the request future). This is what keeps a failed
//! job from leaving more residue than a successful one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Deletes a file on drop unless disarmed
#[derive(Debug)]
pub struct ArtifactGuard {
    path: PathBuf,
    armed: bool,
}

impl ArtifactGuard {
    /// Take ownership of `path`. The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// Path being guarded
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Give up ownership; the file is kept
    pub fn disarm(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.armed {
            remove_quietly(&self.path);
        }
    }
}

/// Best-effort delete.
///
/// A missing file counts as removed. Other failures are logged and swallowed:
/// by the time cleanup runs the job outcome is already decided.
pub fn remove_quietly(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            warn!("Failed to remove {}: {}", path.display(), e);
            false
        }
    }
}
