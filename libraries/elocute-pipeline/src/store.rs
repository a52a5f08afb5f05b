/// Shared directory store - the rendezvous point with the analysis engine
use crate::{
    artifact::{remove_quietly, ArtifactGuard},
    error::{PipelineError, Result},
};
use elocute_core::JobId;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::debug;

/// Subdirectory of the shared root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubArea {
    /// Written by us, read by the engine
    Input,
    /// Written by the engine, read by us
    Output,
}

impl SubArea {
    pub fn dir_name(&self) -> &'static str {
        match self {
            SubArea::Input => "input",
            SubArea::Output => "output",
        }
    }
}

/// A file found in one of the store's areas
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Owns path construction and deletion under the shared root.
///
/// The engine reads the same layout, so every path handed to it is built here.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Relative roots are resolved against the working directory once, so
    /// both sides of the exchange see the same absolute layout.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&root))
                .unwrap_or(root)
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, area: SubArea) -> PathBuf {
        self.root.join(area.dir_name())
    }

    pub fn path(&self, area: SubArea, name: &str) -> PathBuf {
        self.dir(area).join(name)
    }

    /// `<job-id>.wav`
    pub fn wav_name(job_id: &JobId) -> String {
        format!("{}.wav", job_id.as_str())
    }

    /// `<job-id>.request`
    pub fn request_name(job_id: &JobId) -> String {
        format!("{}.request", job_id.as_str())
    }

    /// `<job-id>.wav.result`
    pub fn result_name(job_id: &JobId) -> String {
        format!("{}.wav.result", job_id.as_str())
    }

    /// Create `input/` and `output/` if missing
    pub async fn ensure_directories(&self) -> Result<()> {
        for area in [SubArea::Input, SubArea::Output] {
            let dir = self.dir(area);
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| PipelineError::io(format!("create {}", dir.display()), e))?;

            let meta = fs::metadata(&dir)
                .await
                .map_err(|e| PipelineError::io(format!("verify {}", dir.display()), e))?;
            if !meta.is_dir() {
                return Err(PipelineError::io(
                    format!("verify {}", dir.display()),
                    std::io::Error::other("not a directory"),
                ));
            }
        }
        debug!("Shared directories ready under {}", self.root.display());
        Ok(())
    }

    /// Guard that removes `area/name` when dropped
    pub fn guard(&self, area: SubArea, name: &str) -> ArtifactGuard {
        ArtifactGuard::new(self.path(area, name))
    }

    /// Move `file` into the store.
    ///
    /// Rename first; when source and store live on different filesystems,
    /// fall back to copy then delete. The engine never sees a partial file
    /// because the copy target is only announced later by the request.
    pub async fn place(&self, file: &Path, area: SubArea, name: &str) -> Result<PathBuf> {
        let dest = self.path(area, name);

        if fs::rename(file, &dest).await.is_err() {
            let partial = ArtifactGuard::new(&dest);
            fs::copy(file, &dest).await.map_err(|e| {
                PipelineError::io(
                    format!("copy {} to {}", file.display(), dest.display()),
                    e,
                )
            })?;
            partial.disarm();
            remove_quietly(file);
        }

        debug!("Placed {} at {}", file.display(), dest.display());
        Ok(dest)
    }

    /// Write `bytes` so readers only ever see the complete file.
    ///
    /// Content goes to `<name>.tmp` and is renamed into place.
    pub async fn write_atomic(&self, area: SubArea, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dest = self.path(area, name);
        let tmp = self.path(area, &format!("{}.tmp", name));
        let tmp_guard = ArtifactGuard::new(&tmp);

        fs::write(&tmp, bytes)
            .await
            .map_err(|e| PipelineError::io(format!("write {}", tmp.display()), e))?;
        fs::rename(&tmp, &dest)
            .await
            .map_err(|e| PipelineError::io(format!("rename into {}", dest.display()), e))?;

        tmp_guard.disarm();
        Ok(dest)
    }

    pub async fn read(&self, area: SubArea, name: &str) -> Result<Vec<u8>> {
        let path = self.path(area, name);
        fs::read(&path)
            .await
            .map_err(|e| PipelineError::io(format!("read {}", path.display()), e))
    }

    pub async fn exists(&self, area: SubArea, name: &str) -> bool {
        fs::try_exists(self.path(area, name)).await.unwrap_or(false)
    }

    /// Idempotent, best-effort delete. Returns whether the file is gone.
    pub async fn remove(&self, area: SubArea, name: &str) -> bool {
        let path = self.path(area, name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed {}", path.display());
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                tracing::warn!("Failed to remove {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Regular files currently in `area`
    pub async fn entries(&self, area: SubArea) -> Result<Vec<StoredArtifact>> {
        let dir = self.dir(area);
        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PipelineError::io(format!("list {}", dir.display()), e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| PipelineError::io(format!("list {}", dir.display()), e))?
        {
            // Entries can vanish between listing and stat; the engine deletes too.
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            entries.push(StoredArtifact {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                size: meta.len(),
                modified: meta.modified().unwrap_or_else(|_| SystemTime::now()),
            });
        }
        Ok(entries)
    }
}
