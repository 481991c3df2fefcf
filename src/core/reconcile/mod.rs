// ─── Reconciliation Engine ───
// Drives registry, filesystem and manifest toward agreement.
//
//   install — bounded, fail-fast concurrent install/repair of enabled entries
//   plan    — update planning (read-only)
//   check   — consistency scan with filename self-healing
//   catalog — add / remove entries

pub mod cancel;
pub mod catalog;
pub mod check;
pub mod install;
pub mod plan;

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::core::config::SyncConfig;
use crate::core::downloader::{ArtifactFetcher, ArtifactSource, HttpSource};
use crate::core::error::{SyncError, SyncResult};
use crate::core::http::build_http_client;
use crate::core::manifest::{Entry, Manifest, ManifestStore, Section};
use crate::core::modrinth::ModrinthClient;
use crate::core::registry::Registry;
use crate::core::resolver::VersionResolver;
use crate::core::toggle::{self, Toggle, ToggleOutcome};

pub use cancel::CancelSignal;
pub use catalog::AddOutcome;
pub use check::{CheckReport, Drift, DriftKind};
pub use install::InstallOutcome;
pub use plan::{classify, UpdateKind, UpdatePlan};

/// Owns the manifest for one command invocation.
///
/// Cloning is cheap; clones share the same manifest. Every
/// "mutate entry + save document" step runs while holding the manifest
/// lock, so concurrent workers never lose each other's updates.
#[derive(Clone)]
pub struct Reconciler {
    config: SyncConfig,
    registry: Arc<dyn Registry>,
    resolver: VersionResolver,
    fetcher: ArtifactFetcher,
    store: ManifestStore,
    manifest: Arc<Mutex<Manifest>>,
}

impl Reconciler {
    pub fn new(
        config: SyncConfig,
        registry: Arc<dyn Registry>,
        source: Arc<dyn ArtifactSource>,
        store: ManifestStore,
        manifest: Manifest,
    ) -> Self {
        Self {
            resolver: VersionResolver::new(registry.clone()),
            fetcher: ArtifactFetcher::new(source),
            registry,
            config,
            store,
            manifest: Arc::new(Mutex::new(manifest)),
        }
    }

    /// Load the manifest named by `config` and wire up the Modrinth client
    /// and HTTP downloader.
    pub async fn open(config: SyncConfig) -> SyncResult<Self> {
        let store = ManifestStore::new(config.manifest_path());
        let manifest = store.load().await?;

        let registry = Arc::new(ModrinthClient::from_config(&config)?);
        let source = Arc::new(HttpSource::new(build_http_client(
            config.download_timeout,
        )?));

        Ok(Self::new(config, registry, source, store, manifest))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn game_dir(&self) -> &Path {
        &self.config.game_dir
    }

    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }

    /// Copy of the current in-memory manifest.
    pub async fn snapshot(&self) -> Manifest {
        self.manifest.lock().await.clone()
    }

    /// Write the current manifest.
    pub async fn persist(&self) -> SyncResult<()> {
        let manifest = self.manifest.lock().await;
        self.store.save(&manifest).await
    }

    /// Mutate one entry and save the whole document as a single critical
    /// section.
    async fn commit<F>(&self, section: Section, slug: &str, mutate: F) -> SyncResult<()>
    where
        F: FnOnce(&mut Entry),
    {
        let mut manifest = self.manifest.lock().await;
        let entry = manifest
            .entry_mut(section, slug)
            .ok_or_else(|| SyncError::NotInManifest(slug.to_string()))?;
        mutate(entry);
        self.store.save(&manifest).await
    }

    /// Enable or disable `slug` by renaming its file, then persist.
    pub async fn toggle(&self, slug: &str, target: Toggle) -> SyncResult<ToggleOutcome> {
        let mut manifest = self.manifest.lock().await;
        let before = manifest.clone();
        match toggle::toggle(&mut manifest, self.game_dir(), slug, target).await {
            Ok(outcome) => {
                self.store.save(&manifest).await?;
                Ok(outcome)
            }
            Err(err) => {
                // A filename healed before the failure is still worth keeping.
                if *manifest != before {
                    if let Err(save_err) = self.store.save(&manifest).await {
                        warn!("Could not persist healed filename for {}: {}", slug, save_err);
                    }
                }
                Err(err)
            }
        }
    }
}
