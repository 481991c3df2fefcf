// ─── Entry State Machine ───
// Enabled: `<dest>/<filename>`. Disabled: `<dest>/<filename>.disabled`.
// Paths are re-derived from the manifest on every call.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::checksum;
use crate::core::downloader::backup_if_exists;
use crate::core::error::{SyncError, SyncResult};
use crate::core::manifest::{split_disabled, Manifest, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Enable,
    Disable,
}

impl Toggle {
    fn enabled(self) -> bool {
        matches!(self, Toggle::Enable)
    }
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Toggle::Enable => "enabled",
            Toggle::Disable => "disabled",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub section: Section,
    pub slug: String,
    pub from: PathBuf,
    pub to: PathBuf,
    /// Filename recovered by content hash before renaming.
    pub healed: Option<String>,
    /// Where a file already sitting at `to` was moved aside.
    pub backup: Option<PathBuf>,
}

/// Move `slug`'s file to the name matching `target` and flip `enabled`.
///
/// Mutates `manifest` in memory only; the caller persists.
pub async fn toggle(
    manifest: &mut Manifest,
    game_dir: &Path,
    slug: &str,
    target: Toggle,
) -> SyncResult<ToggleOutcome> {
    let (section, entry) = manifest.require_mut(slug)?;

    let mut healed = None;
    if entry.filename.is_empty() {
        let dir = entry.dir(game_dir)?;
        let found = checksum::locate(&dir, &entry.content_hash)
            .await?
            .ok_or_else(|| SyncError::CannotResolveFile {
                slug: slug.to_string(),
                dir: dir.clone(),
                sha1: entry.content_hash.clone(),
            })?;
        let (name, _) = split_disabled(&found);
        info!("{}: recovered filename {}", slug, name);
        entry.filename = name.to_string();
        healed = Some(entry.filename.clone());
    }

    let plain = entry.enabled_path(game_dir, &entry.filename)?;
    let disabled = entry.disabled_path(game_dir, &entry.filename)?;
    let (from, to) = match target {
        Toggle::Enable => (disabled, plain),
        Toggle::Disable => (plain, disabled),
    };

    if !tokio::fs::try_exists(&from)
        .await
        .map_err(|e| SyncError::io(&from, e))?
    {
        return Err(SyncError::FileNotFound {
            slug: slug.to_string(),
            path: from,
        });
    }

    // Both names present: keep the one being replaced.
    let backup = backup_if_exists(&to).await?;
    tokio::fs::rename(&from, &to)
        .await
        .map_err(|e| SyncError::io(&from, e))?;
    entry.enabled = target.enabled();
    info!("{}: {} ({:?} -> {:?})", slug, target, from, to);

    Ok(ToggleOutcome {
        section,
        slug: slug.to_string(),
        from,
        to,
        healed,
        backup,
    })
}
