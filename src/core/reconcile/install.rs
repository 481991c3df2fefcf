use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::cancel::CancelSignal;
use super::Reconciler;
use crate::core::checksum;
use crate::core::downloader::backup_if_exists;
use crate::core::error::{SyncError, SyncResult};
use crate::core::manifest::{split_disabled, Entry, Minecraft, Section};

/// What the pipeline did for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Correct bytes already at the expected path; nothing downloaded.
    UpToDate { filename: String },
    /// Correct bytes found under another name and adopted; nothing downloaded.
    Healed { from: String, to: String },
    /// Downloaded, verified and moved into place.
    Installed {
        filename: String,
        version_label: String,
        /// Where a colliding or superseded file was moved.
        backups: Vec<PathBuf>,
    },
}

impl Reconciler {
    /// Install, update or repair every enabled entry of every section.
    ///
    /// At most `concurrency` entries run at once. The first entry-level
    /// error cancels the batch: running entries abort at their next network
    /// step, queued ones never start, and that first error is returned.
    /// Entries that finished earlier have already persisted their changes.
    pub async fn install(&self) -> SyncResult<Vec<(String, InstallOutcome)>> {
        let (minecraft, entries) = {
            let manifest = self.manifest.lock().await;
            (manifest.minecraft.clone(), manifest.enabled())
        };

        info!(
            "Installing {} enabled entries, concurrency={}",
            entries.len(),
            self.config.concurrency
        );

        let cancel = CancelSignal::new();
        let permits = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = JoinSet::new();

        for (section, entry) in entries {
            let this = self.clone();
            let cancel = cancel.clone();
            let permits = permits.clone();
            let minecraft = minecraft.clone();

            tasks.spawn(async move {
                let permit = cancel
                    .guard(async {
                        permits
                            .acquire_owned()
                            .await
                            .map_err(|_| SyncError::Cancelled)
                    })
                    .await?;

                let slug = entry.slug.clone();
                let result = this
                    .install_entry(section, entry, &minecraft, &cancel)
                    .await;
                // Trip the batch before the slot is handed to a queued entry.
                if matches!(&result, Err(err) if !matches!(err, SyncError::Cancelled)) {
                    cancel.cancel();
                }
                drop(permit);
                Ok::<_, SyncError>((slug, result?))
            });
        }

        let mut first_error = None;
        let mut done = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(SyncError::from).and_then(|r| r) {
                Ok(item) => done.push(item),
                Err(SyncError::Cancelled) => {}
                Err(err) => {
                    if first_error.is_none() {
                        warn!("Install failed, cancelling remaining entries: {}", err);
                        cancel.cancel();
                        first_error = Some(err);
                    } else {
                        debug!("Further install failure after cancel: {}", err);
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(done),
        }
    }

    /// The per-entry pipeline: resolve, fetch metadata, then no-op, heal or
    /// download. Network steps observe `cancel`; the final move + persist
    /// does not, so an entry is either fully committed or untouched.
    pub async fn install_entry(
        &self,
        section: Section,
        entry: Entry,
        minecraft: &Minecraft,
        cancel: &CancelSignal,
    ) -> SyncResult<InstallOutcome> {
        let version = cancel.guard(self.resolver.resolve(&entry, minecraft)).await?;
        let meta = cancel.guard(self.registry.version(&version.id)).await?;
        let file = meta.primary_file()?.clone();
        let version_label = if meta.version_number.is_empty() {
            version.version_number.clone()
        } else {
            meta.version_number.clone()
        };

        let dir = entry.dir(self.game_dir())?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| SyncError::io(&dir, e))?;
        let dest = dir.join(&file.filename);
        let sha1 = file.hashes.sha1.clone();

        // Already correct on disk.
        if cancel.guard(checksum::verify(&dest, &sha1)).await? {
            let recorded = entry.filename == file.filename
                && checksum::same_hash(&entry.content_hash, &sha1)
                && entry.resolved_version_id == meta.id;
            if !recorded {
                // Disk is right but the manifest never learned it.
                self.commit(section, &entry.slug, |e| {
                    e.filename = file.filename.clone();
                    e.content_hash = sha1.clone();
                    e.resolved_version_id = meta.id.clone();
                    e.version_label = version_label.clone();
                })
                .await?;
            }
            debug!("{} already up to date", entry.slug);
            return Ok(InstallOutcome::UpToDate {
                filename: file.filename,
            });
        }

        // Correct bytes under another name: adopt it instead of downloading.
        if let Some(found) = cancel.guard(checksum::locate(&dir, &sha1)).await? {
            let (name, enabled) = split_disabled(&found);
            if enabled {
                let name = name.to_string();
                let healed = self
                    .commit(section, &entry.slug, |e| {
                        e.filename = name.clone();
                        e.content_hash = sha1.clone();
                        e.resolved_version_id = meta.id.clone();
                        e.version_label = version_label.clone();
                    })
                    .await;
                if let Err(err) = healed {
                    warn!("Healed {} -> {} but could not persist: {}", entry.slug, name, err);
                }
                info!("Healed {}: {} -> {}", entry.slug, entry.filename, name);
                return Ok(InstallOutcome::Healed {
                    from: entry.filename,
                    to: name,
                });
            }
        }

        let artifact = cancel
            .guard(self.fetcher.fetch(&file.url, &sha1, &dir))
            .await?;

        // Commit: move into place and record, under the manifest lock.
        let mut manifest = self.manifest.lock().await;
        let mut backups = Vec::new();

        if let Some(collided) = artifact.persist(&dest).await? {
            backups.push(collided);
        }
        // The previous version's file, if it had a different name.
        if !entry.filename.is_empty() && entry.filename != file.filename {
            match backup_if_exists(&dir.join(&entry.filename)).await {
                Ok(Some(old)) => backups.push(old),
                Ok(None) => {}
                Err(err) => warn!("{}: previous file left in place: {}", entry.slug, err),
            }
        }

        let recorded = manifest
            .entry_mut(section, &entry.slug)
            .ok_or_else(|| SyncError::NotInManifest(entry.slug.clone()))?;
        recorded.filename = file.filename.clone();
        recorded.content_hash = sha1;
        recorded.resolved_version_id = meta.id.clone();
        recorded.version_label = version_label.clone();
        self.store.save(&manifest).await?;
        drop(manifest);

        info!(
            "[+] {} -> {} ({})",
            entry.slug, entry.destination, version_label
        );
        Ok(InstallOutcome::Installed {
            filename: file.filename,
            version_label,
            backups,
        })
    }
}
