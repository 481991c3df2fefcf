// ─── Version Resolver ───
// Picks the newest registry version compatible with the manifest environment.

use std::sync::Arc;

use tracing::debug;

use crate::core::error::{SyncError, SyncResult};
use crate::core::manifest::{Entry, LoaderPolicy, Minecraft};
use crate::core::modrinth::Version;
use crate::core::registry::Registry;

#[derive(Clone)]
pub struct VersionResolver {
    registry: Arc<dyn Registry>,
}

impl VersionResolver {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    /// Newest version of `entry` compatible with `minecraft`.
    ///
    /// Mods must match the loader. Resource packs and shaders ignore it, and
    /// when even the game-version filter finds nothing they retry with no
    /// filters at all.
    pub async fn resolve(&self, entry: &Entry, minecraft: &Minecraft) -> SyncResult<Version> {
        let dest = entry.dest()?;
        let game_version = non_empty(&minecraft.version);
        let loader = non_empty(&minecraft.loader);

        let mut versions = match dest.loader_policy() {
            LoaderPolicy::Strict => {
                self.registry
                    .project_versions(&entry.slug, game_version, loader)
                    .await?
            }
            LoaderPolicy::LooseWithFallback => {
                let filtered = self
                    .registry
                    .project_versions(&entry.slug, game_version, None)
                    .await?;
                if filtered.is_empty() {
                    debug!("No filtered versions for {}, retrying unfiltered", entry.slug);
                    self.registry
                        .project_versions(&entry.slug, None, None)
                        .await?
                } else {
                    filtered
                }
            }
        };

        newest_first(&mut versions);
        versions
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::NoCompatibleVersion {
                slug: entry.slug.clone(),
                game_version: minecraft.version.clone(),
                loader: minecraft.loader.clone(),
            })
    }
}

/// Order by publication time, newest first. Stable, so equal timestamps keep
/// registry order.
pub fn newest_first(versions: &mut [Version]) {
    versions.sort_by(|a, b| b.date_published.cmp(&a.date_published));
}

fn non_empty(s: &str) -> Option<&str> {
    Some(s).filter(|s| !s.is_empty())
}
