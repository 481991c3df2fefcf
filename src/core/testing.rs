// In-memory collaborators shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use sha1::{Digest, Sha1};

use crate::core::downloader::{ArtifactSource, ByteStream};
use crate::core::error::{SyncError, SyncResult};
use crate::core::modrinth::{Hashes, Project, Version, VersionFile};
use crate::core::registry::Registry;

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// A single-file version whose artifact is `body`.
pub fn version(id: &str, published: &str, filename: &str, body: &[u8]) -> Version {
    Version {
        id: id.to_string(),
        version_number: format!("{id}-label"),
        date_published: published.to_string(),
        files: vec![VersionFile {
            filename: filename.to_string(),
            url: url_for(id, filename),
            primary: true,
            hashes: Hashes {
                sha1: sha1_hex(body),
            },
        }],
    }
}

pub fn url_for(version_id: &str, filename: &str) -> String {
    format!("https://cdn.test/{version_id}/{filename}")
}

#[derive(Default)]
struct Listing {
    filtered: Vec<Version>,
    unfiltered: Vec<Version>,
}

/// Registry double that records every call.
#[derive(Default)]
pub struct FakeRegistry {
    listings: HashMap<String, Listing>,
    versions: HashMap<String, Version>,
    projects: HashMap<String, Project>,
    hanging: HashSet<String>,
    failing: HashSet<String>,
    pub list_calls: Mutex<Vec<(String, Option<String>, Option<String>)>>,
    pub version_calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Versions returned for both filtered and unfiltered queries.
    pub fn with_versions(mut self, slug: &str, versions: Vec<Version>) -> Self {
        self.index(&versions);
        self.listings.insert(
            slug.to_string(),
            Listing {
                filtered: versions.clone(),
                unfiltered: versions,
            },
        );
        self
    }

    /// Versions returned only when the query carries no filters at all.
    pub fn with_unfiltered_only(mut self, slug: &str, versions: Vec<Version>) -> Self {
        self.index(&versions);
        self.listings.insert(
            slug.to_string(),
            Listing {
                filtered: Vec::new(),
                unfiltered: versions,
            },
        );
        self
    }

    pub fn with_project(mut self, project_type: &str, slug: &str) -> Self {
        self.projects.insert(
            slug.to_string(),
            Project {
                id: format!("id-{slug}"),
                slug: slug.to_string(),
                title: slug.to_string(),
                project_type: project_type.to_string(),
                ..Project::default()
            },
        );
        self
    }

    /// Listing `slug` never completes.
    pub fn hanging(mut self, slug: &str) -> Self {
        self.hanging.insert(slug.to_string());
        self
    }

    /// Listing `slug` fails with a registry error.
    pub fn failing(mut self, slug: &str) -> Self {
        self.failing.insert(slug.to_string());
        self
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    pub fn version_call_count(&self) -> usize {
        self.version_calls.load(Ordering::SeqCst)
    }

    fn index(&mut self, versions: &[Version]) {
        for v in versions {
            self.versions.insert(v.id.clone(), v.clone());
        }
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn project_versions(
        &self,
        slug: &str,
        game_version: Option<&str>,
        loader: Option<&str>,
    ) -> SyncResult<Vec<Version>> {
        if let Ok(mut calls) = self.list_calls.lock() {
            calls.push((
                slug.to_string(),
                game_version.map(str::to_string),
                loader.map(str::to_string),
            ));
        }

        if self.hanging.contains(slug) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(slug) {
            return Err(SyncError::RegistryStatus {
                path: format!("project/{slug}/version"),
                status: 503,
            });
        }

        let Some(listing) = self.listings.get(slug) else {
            return Ok(Vec::new());
        };
        if game_version.is_none() && loader.is_none() {
            Ok(listing.unfiltered.clone())
        } else {
            Ok(listing.filtered.clone())
        }
    }

    async fn version(&self, version_id: &str) -> SyncResult<Version> {
        self.version_calls.fetch_add(1, Ordering::SeqCst);
        self.versions
            .get(version_id)
            .cloned()
            .ok_or_else(|| SyncError::RegistryStatus {
                path: format!("version/{version_id}"),
                status: 404,
            })
    }

    async fn project(&self, slug_or_id: &str) -> SyncResult<Project> {
        self.projects
            .get(slug_or_id)
            .cloned()
            .ok_or_else(|| SyncError::RegistryStatus {
                path: format!("project/{slug_or_id}"),
                status: 404,
            })
    }
}

/// Artifact source serving fixed bodies in small chunks.
#[derive(Default)]
pub struct MemorySource {
    bodies: HashMap<String, Vec<u8>>,
    opens: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactSource for MemorySource {
    async fn open(&self, url: &str) -> SyncResult<ByteStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let body = self
            .bodies
            .get(url)
            .cloned()
            .ok_or_else(|| SyncError::DownloadFailed {
                url: url.to_string(),
                status: 404,
            })?;

        let chunks: Vec<SyncResult<Vec<u8>>> =
            body.chunks(16 * 1024).map(|c| Ok(c.to_vec())).collect();
        Ok(stream::iter(chunks).boxed())
    }
}

/// Engine over `game_dir` with in-memory collaborators.
pub fn reconciler(
    game_dir: &std::path::Path,
    registry: std::sync::Arc<FakeRegistry>,
    source: std::sync::Arc<MemorySource>,
    manifest: crate::core::manifest::Manifest,
) -> crate::core::reconcile::Reconciler {
    let config = crate::core::config::SyncConfig::new(game_dir);
    let store = crate::core::manifest::ManifestStore::new(config.manifest_path());
    crate::core::reconcile::Reconciler::new(config, registry, source, store, manifest)
}
