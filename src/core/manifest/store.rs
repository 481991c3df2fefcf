use std::path::{Path, PathBuf};

use tracing::debug;

use super::model::{Manifest, Minecraft};
use crate::core::error::{SyncError, SyncResult};

/// Loads and persists the manifest document at a fixed path.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> SyncResult<Manifest> {
        if !tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| SyncError::io(&self.path, e))?
        {
            return Err(SyncError::ManifestNotFound(self.path.clone()));
        }

        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SyncError::io(&self.path, e))?;

        let manifest: Manifest = serde_json::from_str(&json)?;
        Ok(manifest)
    }

    /// Write a fresh manifest; refuses to overwrite an existing one.
    pub async fn create(&self, minecraft: Minecraft) -> SyncResult<Manifest> {
        if tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| SyncError::io(&self.path, e))?
        {
            return Err(SyncError::ManifestExists(self.path.clone()));
        }
        let manifest = Manifest::new(minecraft);
        self.save(&manifest).await?;
        Ok(manifest)
    }

    /// Serialize the whole document and replace the file.
    ///
    /// Not safe to call concurrently for the same path; callers hold the
    /// manifest lock across mutate + save.
    pub async fn save(&self, manifest: &Manifest) -> SyncResult<()> {
        self.write(manifest).await.map_err(|source| SyncError::Persist {
            path: self.path.clone(),
            source: Box::new(source),
        })
    }

    async fn write(&self, manifest: &Manifest) -> SyncResult<()> {
        let json = serde_json::to_string_pretty(manifest)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::io(parent, e))?;
        }

        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, json)
            .await
            .map_err(|e| SyncError::io(&staging, e))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| SyncError::io(&self.path, e))?;

        debug!("Saved manifest {:?}", self.path);
        Ok(())
    }
}
