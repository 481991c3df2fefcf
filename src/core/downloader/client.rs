use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::source::ArtifactSource;
use crate::core::checksum::same_hash;
use crate::core::error::{SyncError, SyncResult};

/// Prefix of in-flight download files inside a destination directory.
pub const PART_PREFIX: &str = ".modsync-";

/// A verified download waiting to be moved into place.
///
/// The staging file is deleted on drop unless `persist` succeeded, so an
/// aborted or cancelled install never leaves partial bytes behind.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    sha1: String,
    persisted: bool,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sha1(&self) -> &str {
        &self.sha1
    }

    /// Move the artifact to `dest`, first renaming any file already there
    /// aside as a timestamped backup. Returns the backup path, if one was made.
    ///
    /// If the final rename fails the backup is moved back to `dest`.
    pub async fn persist(mut self, dest: &Path) -> SyncResult<Option<PathBuf>> {
        let backup = backup_if_exists(dest).await?;
        if let Err(e) = tokio::fs::rename(&self.path, dest).await {
            if let Some(backup) = &backup {
                if let Err(restore) = tokio::fs::rename(backup, dest).await {
                    warn!("Could not restore {:?} from {:?}: {}", dest, backup, restore);
                }
            }
            return Err(SyncError::io(dest, e));
        }
        self.persisted = true;
        Ok(backup)
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Streaming, SHA-1 validated artifact downloader.
#[derive(Clone)]
pub struct ArtifactFetcher {
    source: Arc<dyn ArtifactSource>,
}

impl ArtifactFetcher {
    pub fn new(source: Arc<dyn ArtifactSource>) -> Self {
        Self { source }
    }

    /// Download `url` into a staging file inside `staging_dir`, hashing each
    /// chunk as it is written.
    ///
    /// Staging in the destination directory keeps the final rename on one
    /// filesystem. On a hash mismatch the staging file is removed and
    /// `ChecksumMismatch` is returned.
    pub async fn fetch(
        &self,
        url: &str,
        expected_sha1: &str,
        staging_dir: &Path,
    ) -> SyncResult<TempArtifact> {
        tokio::fs::create_dir_all(staging_dir)
            .await
            .map_err(|e| SyncError::io(staging_dir, e))?;

        let mut artifact = TempArtifact {
            path: staging_dir.join(format!("{PART_PREFIX}{}.part", Uuid::new_v4())),
            sha1: String::new(),
            persisted: false,
        };

        let mut stream = self.source.open(url).await?;
        let mut hasher = Sha1::new();
        let mut written: u64 = 0;

        // Write inside a block so the handle is closed before any rename.
        {
            // Created synchronously so a cancelled fetch cannot race the
            // cleanup in `Drop` and leave an orphaned part file.
            let file = std::fs::File::create(&artifact.path)
                .map_err(|e| SyncError::io(&artifact.path, e))?;
            let mut file = tokio::fs::File::from_std(file);

            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                hasher.update(&chunk);
                file.write_all(&chunk)
                    .await
                    .map_err(|e| SyncError::io(&artifact.path, e))?;
                written += chunk.len() as u64;
            }

            file.flush()
                .await
                .map_err(|e| SyncError::io(&artifact.path, e))?;
        }

        let actual = hex::encode(hasher.finalize());
        if !same_hash(&actual, expected_sha1) {
            return Err(SyncError::ChecksumMismatch {
                url: url.to_string(),
                expected: expected_sha1.to_string(),
                actual,
            });
        }

        debug!("Downloaded {} ({} bytes) -> {:?}", url, written, artifact.path);
        artifact.sha1 = actual;
        Ok(artifact)
    }
}

/// Rename an existing file to `<path>.<YYYYmmdd-HHMMSS>.bak`. Never deletes.
pub async fn backup_if_exists(path: &Path) -> SyncResult<Option<PathBuf>> {
    if !tokio::fs::try_exists(path)
        .await
        .map_err(|e| SyncError::io(path, e))?
    {
        return Ok(None);
    }

    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let mut backup = backup_path(path, &stamp, 0);
    let mut attempt = 0;
    while tokio::fs::try_exists(&backup)
        .await
        .map_err(|e| SyncError::io(&backup, e))?
    {
        attempt += 1;
        backup = backup_path(path, &stamp, attempt);
    }

    tokio::fs::rename(path, &backup)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    info!("Backed up {:?} -> {:?}", path, backup);
    Ok(Some(backup))
}

fn backup_path(path: &Path, stamp: &str, attempt: u32) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    if attempt == 0 {
        name.push(format!(".{stamp}.bak"));
    } else {
        name.push(format!(".{stamp}-{attempt}.bak"));
    }
    PathBuf::from(name)
}
