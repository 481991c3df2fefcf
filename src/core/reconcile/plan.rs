use futures_util::stream::{self, StreamExt, TryStreamExt};

use super::Reconciler;
use crate::core::error::{SyncError, SyncResult};
use crate::core::manifest::{Entry, Section};

/// Display classification of a planned update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    NewInstall,
    Current,
    NoCompatibleVersion,
    UpdateAvailable,
}

/// One entry whose recorded version differs from the newest compatible one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub section: Section,
    pub entry: Entry,
    /// Recorded version id, empty if never installed.
    pub current: String,
    /// Newest compatible version id, empty if none.
    pub target: String,
    pub target_label: String,
}

impl UpdatePlan {
    pub fn kind(&self) -> UpdateKind {
        classify(&self.current, &self.target)
    }
}

pub fn classify(current: &str, target: &str) -> UpdateKind {
    if current.is_empty() {
        UpdateKind::NewInstall
    } else if current == target {
        UpdateKind::Current
    } else if target.is_empty() {
        UpdateKind::NoCompatibleVersion
    } else {
        UpdateKind::UpdateAvailable
    }
}

impl Reconciler {
    /// Compare every enabled entry's recorded version with the newest
    /// compatible one. Read-only: no manifest or filesystem changes.
    ///
    /// An entry with no compatible version is planned with an empty target
    /// rather than failing the whole plan.
    pub async fn plan(&self) -> SyncResult<Vec<UpdatePlan>> {
        let (minecraft, entries) = {
            let manifest = self.manifest.lock().await;
            (manifest.minecraft.clone(), manifest.enabled())
        };
        let minecraft = &minecraft;

        let planned: Vec<Option<UpdatePlan>> = stream::iter(entries)
            .map(|(section, entry)| async move {
                let (target, target_label) =
                    match self.resolver.resolve(&entry, minecraft).await {
                        Ok(version) => (version.id, version.version_number),
                        Err(SyncError::NoCompatibleVersion { .. }) => {
                            (String::new(), String::new())
                        }
                        Err(e) => return Err(e),
                    };

                if entry.resolved_version_id == target {
                    return Ok(None);
                }
                Ok(Some(UpdatePlan {
                    section,
                    current: entry.resolved_version_id.clone(),
                    entry,
                    target,
                    target_label,
                }))
            })
            .buffered(self.config.concurrency)
            .try_collect()
            .await?;

        Ok(planned.into_iter().flatten().collect())
    }
}
