use std::fmt;
use std::path::PathBuf;

use tracing::{info, warn};

use super::Reconciler;
use crate::core::checksum;
use crate::core::error::{SyncError, SyncResult};
use crate::core::manifest::{split_disabled, Section};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftKind {
    /// Recorded name was wrong; a same-hash file was found and adopted.
    Renamed { from: String, to: String },
    /// File is where it should be but its content changed. Never healed.
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    /// Expected file is gone and nothing in the directory has its hash.
    Missing { path: PathBuf },
    /// No filename recorded and nothing in the directory has the hash.
    NotInstalled { dir: PathBuf },
    /// `dest` is not one of the known folders; the entry was not scanned.
    UnknownDestination { dest: String },
}

impl DriftKind {
    /// True for drift that was repaired in place.
    pub fn is_healed(&self) -> bool {
        matches!(self, DriftKind::Renamed { .. })
    }
}

/// One entry whose files disagree with the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub section: Section,
    pub slug: String,
    pub kind: DriftKind,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DriftKind::Renamed { from, to } if from.is_empty() => {
                write!(f, "{}: filename recovered as {}", self.slug, to)
            }
            DriftKind::Renamed { from, to } => {
                write!(f, "{}: filename changed from {} to {}", self.slug, from, to)
            }
            DriftKind::HashMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "{}: {} checksum mismatch (want {}, got {})",
                self.slug,
                path.display(),
                expected,
                actual
            ),
            DriftKind::Missing { path } => write!(
                f,
                "{}: file {} not found and no match by checksum",
                self.slug,
                path.display()
            ),
            DriftKind::NotInstalled { dir } => write!(
                f,
                "{}: no filename recorded and nothing in {} matches; not installed yet?",
                self.slug,
                dir.display()
            ),
            DriftKind::UnknownDestination { dest } => write!(
                f,
                "{}: unknown destination {:?}; expected mods, resourcepacks or shaderpacks",
                self.slug, dest
            ),
        }
    }
}

/// Result of a consistency scan.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub drift: Vec<Drift>,
    /// Set when healed filenames could not be written back.
    pub persist_error: Option<SyncError>,
}

impl CheckReport {
    /// Drift that still needs a human (anything not healed).
    pub fn unresolved(&self) -> impl Iterator<Item = &Drift> {
        self.drift.iter().filter(|d| !d.kind.is_healed())
    }

    pub fn is_clean(&self) -> bool {
        self.unresolved().next().is_none() && self.persist_error.is_none()
    }
}

impl Reconciler {
    /// Verify every entry of every section against its recorded hash.
    ///
    /// Renamed files are healed in memory and persisted once at the end.
    /// A changed file at the expected path is only reported.
    pub async fn check(&self) -> SyncResult<CheckReport> {
        let mut manifest = self.manifest.lock().await;
        let game_dir = self.game_dir().to_path_buf();
        let mut report = CheckReport::default();

        for section in Section::ALL {
            for entry in manifest.section_mut(section).iter_mut() {
                let dir = match entry.dir(&game_dir) {
                    Ok(dir) => dir,
                    Err(err) => {
                        warn!("Not checked: {}", err);
                        report.drift.push(Drift {
                            section,
                            slug: entry.slug.clone(),
                            kind: DriftKind::UnknownDestination {
                                dest: entry.destination.clone(),
                            },
                        });
                        continue;
                    }
                };
                let expected = entry.expected_path(&game_dir)?;

                if let Some(path) = &expected {
                    if checksum::verify(path, &entry.content_hash).await? {
                        continue;
                    }
                }

                if let Some(found) = checksum::locate(&dir, &entry.content_hash).await? {
                    let (name, enabled) = split_disabled(&found);
                    let from = expected
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    info!("{}: healed filename {:?} -> {}", entry.slug, from, found);
                    entry.filename = name.to_string();
                    entry.enabled = enabled;
                    report.drift.push(Drift {
                        section,
                        slug: entry.slug.clone(),
                        kind: DriftKind::Renamed { from, to: found },
                    });
                    continue;
                }

                let kind = match expected {
                    None => DriftKind::NotInstalled { dir },
                    Some(path) => match checksum::sha1_file(&path).await {
                        Ok(actual) => DriftKind::HashMismatch {
                            path,
                            expected: entry.content_hash.clone(),
                            actual,
                        },
                        Err(SyncError::Io { ref source, .. })
                            if source.kind() == std::io::ErrorKind::NotFound =>
                        {
                            DriftKind::Missing { path }
                        }
                        Err(e) => return Err(e),
                    },
                };
                report.drift.push(Drift {
                    section,
                    slug: entry.slug.clone(),
                    kind,
                });
            }
        }

        if report.drift.iter().any(|d| d.kind.is_healed()) {
            if let Err(err) = self.store.save(&manifest).await {
                warn!("Healed filenames could not be saved: {}", err);
                report.persist_error = Some(err);
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::{Destination, Entry, Manifest};
    use crate::core::testing::{reconciler, sha1_hex, FakeRegistry, MemorySource};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn installed(slug: &str, dest: Destination, filename: &str, body: &[u8]) -> Entry {
        let mut entry = Entry::new(slug, dest);
        entry.filename = filename.into();
        entry.content_hash = sha1_hex(body);
        entry.resolved_version_id = "v1".into();
        entry
    }

    fn engine_for(tmp: &TempDir, manifest: Manifest) -> Reconciler {
        engine_for_dir(tmp.path(), manifest)
    }

    fn engine_for_dir(game: &std::path::Path, manifest: Manifest) -> Reconciler {
        reconciler(
            game,
            Arc::new(FakeRegistry::new()),
            Arc::new(MemorySource::new()),
            manifest,
        )
    }

    #[tokio::test]
    async fn matching_files_produce_no_report() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("mods")).unwrap();
        std::fs::write(tmp.path().join("mods/a.jar"), b"a").unwrap();
        std::fs::write(tmp.path().join("mods/b.jar.disabled"), b"b").unwrap();

        let mut manifest = Manifest::default();
        manifest.mods.push(installed("a", Destination::Mods, "a.jar", b"a"));
        let mut b = installed("b", Destination::Mods, "b.jar", b"b");
        b.enabled = false;
        manifest.mods.push(b);

        let report = engine_for(&tmp, manifest).check().await.unwrap();
        assert!(report.drift.is_empty());
        assert!(report.is_clean());
        assert!(!tmp.path().join("project.json").exists());
    }

    #[tokio::test]
    async fn renamed_file_is_healed_and_persisted_once() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("resourcepacks")).unwrap();
        std::fs::write(tmp.path().join("resourcepacks/Renamed Pack.zip"), b"pack").unwrap();

        let mut manifest = Manifest::default();
        manifest.resourcepacks.push(installed(
            "faithful",
            Destination::ResourcePacks,
            "faithful-32x.zip",
            b"pack",
        ));
        let engine = engine_for(&tmp, manifest);

        let report = engine.check().await.unwrap();

        assert_eq!(
            report.drift,
            vec![Drift {
                section: Section::ResourcePacks,
                slug: "faithful".into(),
                kind: DriftKind::Renamed {
                    from: "faithful-32x.zip".into(),
                    to: "Renamed Pack.zip".into()
                },
            }]
        );
        assert!(report.is_clean());
        let saved: Manifest = serde_json::from_str(
            &std::fs::read_to_string(tmp.path().join("project.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(saved.resourcepacks[0].filename, "Renamed Pack.zip");
    }

    #[tokio::test]
    async fn modified_file_is_reported_never_healed() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("mods")).unwrap();
        std::fs::write(tmp.path().join("mods/a.jar"), b"tampered").unwrap();

        let mut manifest = Manifest::default();
        manifest.mods.push(installed("a", Destination::Mods, "a.jar", b"original"));
        let engine = engine_for(&tmp, manifest);

        let report = engine.check().await.unwrap();

        assert_eq!(report.drift.len(), 1);
        match &report.drift[0].kind {
            DriftKind::HashMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, &sha1_hex(b"original"));
                assert_eq!(actual, &sha1_hex(b"tampered"));
            }
            other => panic!("expected hash mismatch, got {other:?}"),
        }
        assert!(!report.is_clean());
        assert_eq!(engine.snapshot().await.mods[0].filename, "a.jar");
        assert!(!tmp.path().join("project.json").exists());
    }

    #[tokio::test]
    async fn missing_and_uninstalled_entries_are_reported() {
        let tmp = TempDir::new().unwrap();
        let mut manifest = Manifest::default();
        manifest.shaders.push(installed(
            "complementary",
            Destination::ShaderPacks,
            "complementary.zip",
            b"shader",
        ));
        manifest
            .mods
            .push(Entry::new("pending", Destination::Mods));

        let report = engine_for(&tmp, manifest).check().await.unwrap();

        let kinds: Vec<_> = report.drift.iter().map(|d| (d.slug.as_str(), &d.kind)).collect();
        assert!(matches!(kinds[0], ("pending", DriftKind::NotInstalled { .. })));
        assert!(matches!(kinds[1], ("complementary", DriftKind::Missing { .. })));
    }

    #[tokio::test]
    async fn healing_follows_disabled_suffix_on_disk() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("mods")).unwrap();
        std::fs::write(tmp.path().join("mods/moved.jar.disabled"), b"m").unwrap();

        let mut manifest = Manifest::default();
        manifest.mods.push(installed("m", Destination::Mods, "", b"m"));
        let engine = engine_for(&tmp, manifest);

        let report = engine.check().await.unwrap();

        assert_eq!(report.drift.len(), 1);
        assert!(report.drift[0].kind.is_healed());
        let entry = engine.snapshot().await.mods[0].clone();
        assert_eq!(entry.filename, "moved.jar");
        assert!(!entry.enabled);
    }

    #[tokio::test]
    async fn unknown_destination_is_reported_not_scanned() {
        let tmp = TempDir::new().unwrap();
        let game = tmp.path().join("game");
        std::fs::create_dir_all(&game).unwrap();
        std::fs::write(tmp.path().join("victim.txt"), b"outside").unwrap();

        let mut manifest = Manifest::default();
        let mut escaping = installed("victim", Destination::Mods, "victim.txt", b"outside");
        escaping.destination = "..".into();
        manifest.mods.push(escaping);
        let mut saves = installed("world", Destination::Mods, "", b"world");
        saves.destination = "saves".into();
        manifest.mods.push(saves);

        let report = engine_for_dir(&game, manifest).check().await.unwrap();

        let dests: Vec<_> = report
            .drift
            .iter()
            .map(|d| match &d.kind {
                DriftKind::UnknownDestination { dest } => dest.as_str(),
                other => panic!("expected unknown destination, got {other:?}"),
            })
            .collect();
        assert_eq!(dests, vec!["..", "saves"]);
        assert!(!report.is_clean());
        assert!(!game.join("project.json").exists());
    }
}
