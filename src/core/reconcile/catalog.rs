use std::io::ErrorKind;

use tracing::info;

use super::Reconciler;
use crate::core::checksum;
use crate::core::error::{SyncError, SyncResult};
use crate::core::manifest::{split_disabled, Destination, Entry, Section};
use crate::core::modrinth::parse_slug;

/// What `add` recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub slug: String,
    pub destination: Destination,
    pub section: Section,
    pub version_id: String,
    pub version_label: String,
    /// False when an existing entry was refreshed.
    pub created: bool,
}

impl Reconciler {
    /// Declare a project by slug or Modrinth URL.
    ///
    /// Nothing is downloaded; the entry is recorded with the newest
    /// compatible version and an empty filename, ready for `install`.
    pub async fn add(&self, input: &str, dest: Option<Destination>) -> SyncResult<AddOutcome> {
        let slug = parse_slug(input);
        let project = self.registry.project(&slug).await?;
        let slug = if project.slug.is_empty() {
            slug
        } else {
            project.slug.clone()
        };

        let destination = match dest {
            Some(d) => d,
            None => Destination::from_project_type(&slug, &project.project_type)?,
        };
        let section = destination.section();

        let minecraft = self.manifest.lock().await.minecraft.clone();
        let candidate = Entry::new(slug.clone(), destination);
        let latest = self.resolver.resolve(&candidate, &minecraft).await?;

        let mut manifest = self.manifest.lock().await;
        let created = match manifest.entry_mut(section, &slug) {
            Some(existing) => {
                existing.destination = destination.as_str().to_string();
                existing.resolved_version_id = latest.id.clone();
                existing.version_label = latest.version_number.clone();
                existing.enabled = true;
                false
            }
            None => {
                manifest.section_mut(section).push(Entry {
                    resolved_version_id: latest.id.clone(),
                    version_label: latest.version_number.clone(),
                    ..candidate
                });
                true
            }
        };
        self.store.save(&manifest).await?;

        info!(
            "{} {} {} ({}) to {}",
            if created { "Added" } else { "Updated" },
            slug,
            latest.version_number,
            latest.id,
            section
        );
        Ok(AddOutcome {
            slug,
            destination,
            section,
            version_id: latest.id,
            version_label: latest.version_number,
            created,
        })
    }

    /// Delete `slug`'s file (enabled or disabled) and drop its entry.
    ///
    /// An entry that was never installed (no filename, no hash) is removed
    /// without touching the disk.
    pub async fn remove(&self, slug: &str) -> SyncResult<Entry> {
        let mut manifest = self.manifest.lock().await;
        let (section, entry) = manifest.require_mut(slug)?;
        let dir = entry.dir(self.game_dir())?;

        let filename = if !entry.filename.is_empty() {
            Some(entry.filename.clone())
        } else if entry.content_hash.is_empty() {
            None
        } else {
            let found = checksum::locate(&dir, &entry.content_hash)
                .await?
                .ok_or_else(|| SyncError::CannotResolveFile {
                    slug: slug.to_string(),
                    dir: dir.clone(),
                    sha1: entry.content_hash.clone(),
                })?;
            Some(split_disabled(&found).0.to_string())
        };

        if let Some(filename) = filename {
            for path in [
                entry.enabled_path(self.game_dir(), &filename)?,
                entry.disabled_path(self.game_dir(), &filename)?,
            ] {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => info!("Deleted {:?}", path),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(SyncError::io(&path, e)),
                }
            }
        }

        let removed = manifest
            .remove(section, slug)
            .ok_or_else(|| SyncError::NotInManifest(slug.to_string()))?;
        self.store.save(&manifest).await?;
        Ok(removed)
    }
}
