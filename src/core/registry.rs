use async_trait::async_trait;

use crate::core::error::SyncResult;
use crate::core::modrinth::{Project, Version};

/// Remote registry operations the engine depends on.
///
/// Implementations must return `date_published` as fixed-width ISO-8601
/// text; version selection orders on it lexicographically.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Versions of `slug` compatible with the given filters, registry order.
    /// `None` filters are omitted from the query.
    async fn project_versions(
        &self,
        slug: &str,
        game_version: Option<&str>,
        loader: Option<&str>,
    ) -> SyncResult<Vec<Version>>;

    /// Metadata of one version, including its files.
    async fn version(&self, version_id: &str) -> SyncResult<Version>;

    /// Project metadata by slug or id.
    async fn project(&self, slug_or_id: &str) -> SyncResult<Project>;
}
