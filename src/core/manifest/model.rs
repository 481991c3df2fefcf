use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::error::{SyncError, SyncResult};

pub const SCHEMA_VERSION: u32 = 1;

/// Suffix appended to a file's name while its entry is disabled.
pub const DISABLED_SUFFIX: &str = ".disabled";

/// How the loader filter is applied when resolving versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderPolicy {
    /// Loader must match; no fallback.
    Strict,
    /// Loader is ignored; an empty result retries with no filters at all.
    LooseWithFallback,
}

/// Install directory of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Mods,
    ResourcePacks,
    ShaderPacks,
}

impl Destination {
    /// Folder name under the game directory.
    pub fn as_str(self) -> &'static str {
        match self {
            Destination::Mods => "mods",
            Destination::ResourcePacks => "resourcepacks",
            Destination::ShaderPacks => "shaderpacks",
        }
    }

    /// Parse a recorded `dest` value for the entry `slug`.
    pub fn parse(slug: &str, dest: &str) -> SyncResult<Self> {
        match dest {
            "mods" => Ok(Destination::Mods),
            "resourcepacks" => Ok(Destination::ResourcePacks),
            "shaderpacks" => Ok(Destination::ShaderPacks),
            other => Err(SyncError::UnknownDestination {
                slug: slug.to_string(),
                dest: other.to_string(),
            }),
        }
    }

    /// Destination implied by a registry project type.
    pub fn from_project_type(slug: &str, project_type: &str) -> SyncResult<Self> {
        match project_type {
            "mod" => Ok(Destination::Mods),
            "resourcepack" => Ok(Destination::ResourcePacks),
            "shader" => Ok(Destination::ShaderPacks),
            other => Err(SyncError::UnknownProjectType {
                slug: slug.to_string(),
                project_type: other.to_string(),
            }),
        }
    }

    pub fn loader_policy(self) -> LoaderPolicy {
        match self {
            Destination::Mods => LoaderPolicy::Strict,
            Destination::ResourcePacks | Destination::ShaderPacks => {
                LoaderPolicy::LooseWithFallback
            }
        }
    }

    /// Manifest section entries with this destination are filed under.
    pub fn section(self) -> Section {
        match self {
            Destination::Mods => Section::Mods,
            Destination::ResourcePacks => Section::ResourcePacks,
            Destination::ShaderPacks => Section::Shaders,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three ordered lists in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Mods,
    ResourcePacks,
    Shaders,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Mods, Section::ResourcePacks, Section::Shaders];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Mods => "mods",
            Section::ResourcePacks => "resourcepacks",
            Section::Shaders => "shaders",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mod loaders a manifest can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    Fabric,
    Forge,
    NeoForge,
    Quilt,
}

impl Loader {
    pub const ALL: [Loader; 4] = [Loader::Fabric, Loader::Forge, Loader::NeoForge, Loader::Quilt];

    pub fn as_str(self) -> &'static str {
        match self {
            Loader::Fabric => "fabric",
            Loader::Forge => "forge",
            Loader::NeoForge => "neoforge",
            Loader::Quilt => "quilt",
        }
    }

    pub fn parse(s: &str) -> SyncResult<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == lower)
            .ok_or_else(|| SyncError::UnknownLoader(s.to_string()))
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environment constraints every entry is resolved against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minecraft {
    /// fabric, forge, neoforge, quilt
    pub loader: String,
    pub loader_version: String,
    #[serde(rename = "minecraft_version")]
    pub version: String,
}

impl Minecraft {
    /// Environment for a new manifest; no loader version means `latest`.
    pub fn new(version: impl Into<String>, loader: Loader, loader_version: Option<String>) -> Self {
        Self {
            loader: loader.as_str().to_string(),
            loader_version: loader_version
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "latest".to_string()),
            version: version.into(),
        }
    }
}

/// One declared package and its installation state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub slug: String,
    /// Registry id of the last installed version, empty if never installed.
    #[serde(rename = "version", default)]
    pub resolved_version_id: String,
    /// Human-readable version string, display only.
    #[serde(rename = "version_number", default)]
    pub version_label: String,
    #[serde(rename = "dest")]
    pub destination: String,
    /// SHA-1 of the installed artifact.
    #[serde(rename = "sha1", default)]
    pub content_hash: String,
    /// Last known on-disk name, without the `.disabled` suffix.
    #[serde(default)]
    pub filename: String,
    #[serde(rename = "enable", default)]
    pub enabled: bool,
}

impl Entry {
    /// A fresh, enabled entry with nothing installed yet.
    pub fn new(slug: impl Into<String>, destination: Destination) -> Self {
        Self {
            slug: slug.into(),
            destination: destination.as_str().to_string(),
            enabled: true,
            ..Self::default()
        }
    }

    pub fn dest(&self) -> SyncResult<Destination> {
        Destination::parse(&self.slug, &self.destination)
    }

    /// `<game_dir>/<dest>`. Only the three known folders are accepted.
    pub fn dir(&self, game_dir: &Path) -> SyncResult<PathBuf> {
        Ok(game_dir.join(self.dest()?.as_str()))
    }

    /// Path of `filename` as seen while enabled.
    pub fn enabled_path(&self, game_dir: &Path, filename: &str) -> SyncResult<PathBuf> {
        Ok(self.dir(game_dir)?.join(filename))
    }

    /// Path of `filename` as seen while disabled.
    pub fn disabled_path(&self, game_dir: &Path, filename: &str) -> SyncResult<PathBuf> {
        Ok(self
            .dir(game_dir)?
            .join(format!("{filename}{DISABLED_SUFFIX}")))
    }

    /// Where the recorded file is expected to live given the `enabled` flag.
    /// `None` when no filename has been recorded.
    pub fn expected_path(&self, game_dir: &Path) -> SyncResult<Option<PathBuf>> {
        if self.filename.is_empty() {
            return Ok(None);
        }
        let path = if self.enabled {
            self.enabled_path(game_dir, &self.filename)?
        } else {
            self.disabled_path(game_dir, &self.filename)?
        };
        Ok(Some(path))
    }
}

/// Split a located on-disk name into `(filename, enabled)`.
pub fn split_disabled(name: &str) -> (&str, bool) {
    match name.strip_suffix(DISABLED_SUFFIX) {
        Some(stem) if !stem.is_empty() => (stem, false),
        _ => (name, true),
    }
}

/// The full declaration set persisted as the manifest document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema: u32,
    pub minecraft: Minecraft,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mods: Vec<Entry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resourcepacks: Vec<Entry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub shaders: Vec<Entry>,
}

impl Manifest {
    pub fn new(minecraft: Minecraft) -> Self {
        Self {
            schema: SCHEMA_VERSION,
            minecraft,
            ..Self::default()
        }
    }

    pub fn section(&self, section: Section) -> &[Entry] {
        match section {
            Section::Mods => &self.mods,
            Section::ResourcePacks => &self.resourcepacks,
            Section::Shaders => &self.shaders,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut Vec<Entry> {
        match section {
            Section::Mods => &mut self.mods,
            Section::ResourcePacks => &mut self.resourcepacks,
            Section::Shaders => &mut self.shaders,
        }
    }

    /// Every entry of every section, in section order.
    pub fn entries(&self) -> impl Iterator<Item = (Section, &Entry)> {
        Section::ALL
            .into_iter()
            .flat_map(move |section| self.section(section).iter().map(move |e| (section, e)))
    }

    /// Snapshot of every enabled entry, in section order.
    pub fn enabled(&self) -> Vec<(Section, Entry)> {
        self.entries()
            .filter(|(_, e)| e.enabled)
            .map(|(section, e)| (section, e.clone()))
            .collect()
    }

    /// First section holding `slug`.
    pub fn find(&self, slug: &str) -> Option<Section> {
        self.entries()
            .find(|(_, e)| e.slug == slug)
            .map(|(section, _)| section)
    }

    pub fn entry(&self, section: Section, slug: &str) -> Option<&Entry> {
        self.section(section).iter().find(|e| e.slug == slug)
    }

    pub fn entry_mut(&mut self, section: Section, slug: &str) -> Option<&mut Entry> {
        self.section_mut(section).iter_mut().find(|e| e.slug == slug)
    }

    /// Find `slug` in any section, or fail with `NotInManifest`.
    pub fn require_mut(&mut self, slug: &str) -> SyncResult<(Section, &mut Entry)> {
        let section = self
            .find(slug)
            .ok_or_else(|| SyncError::NotInManifest(slug.to_string()))?;
        let entry = self
            .entry_mut(section, slug)
            .ok_or_else(|| SyncError::NotInManifest(slug.to_string()))?;
        Ok((section, entry))
    }

    /// Drop `slug` from `section`, returning the removed entry.
    pub fn remove(&mut self, section: Section, slug: &str) -> Option<Entry> {
        let list = self.section_mut(section);
        let index = list.iter().position(|e| e.slug == slug)?;
        Some(list.remove(index))
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Entry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Entry>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_manifest_with_null_sections() {
        let json = r#"{
            "schema": 1,
            "minecraft": {"loader": "fabric", "loader_version": "0.16.10", "minecraft_version": "1.21.1"},
            "mods": [{
                "slug": "sodium",
                "version": "AbC123",
                "version_number": "0.6.0",
                "dest": "mods",
                "sha1": "deadbeef",
                "filename": "sodium-0.6.0.jar",
                "enable": true
            }],
            "resourcepacks": null,
            "shaders": null
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.minecraft.version, "1.21.1");
        assert_eq!(manifest.mods[0].resolved_version_id, "AbC123");
        assert_eq!(manifest.mods[0].content_hash, "deadbeef");
        assert!(manifest.resourcepacks.is_empty());
        assert!(manifest.shaders.is_empty());
    }

    #[test]
    fn serialize_uses_manifest_field_names() {
        let mut manifest = Manifest::new(Minecraft::default());
        manifest.mods.push(Entry::new("lithium", Destination::Mods));
        let value = serde_json::to_value(&manifest).unwrap();
        let entry = &value["mods"][0];
        assert_eq!(entry["dest"], "mods");
        assert_eq!(entry["enable"], true);
        assert!(entry.get("sha1").is_some());
        assert!(entry.get("version_number").is_some());
    }

    #[test]
    fn unknown_destination_is_reported_per_entry() {
        let mut entry = Entry::new("odd", Destination::Mods);
        entry.destination = "datapacks".into();
        assert!(matches!(
            entry.dest(),
            Err(SyncError::UnknownDestination { ref dest, .. }) if dest == "datapacks"
        ));
    }

    #[test]
    fn loader_policy_is_strict_only_for_mods() {
        assert_eq!(Destination::Mods.loader_policy(), LoaderPolicy::Strict);
        assert_eq!(
            Destination::ShaderPacks.loader_policy(),
            LoaderPolicy::LooseWithFallback
        );
        assert_eq!(
            Destination::ResourcePacks.loader_policy(),
            LoaderPolicy::LooseWithFallback
        );
    }

    #[test]
    fn expected_path_follows_enabled_flag() {
        let game = Path::new("/game");
        let mut entry = Entry::new("iris", Destination::ShaderPacks);
        assert_eq!(entry.expected_path(game).unwrap(), None);

        entry.filename = "iris.zip".into();
        assert_eq!(
            entry.expected_path(game).unwrap(),
            Some(PathBuf::from("/game/shaderpacks/iris.zip"))
        );

        entry.enabled = false;
        assert_eq!(
            entry.expected_path(game).unwrap(),
            Some(PathBuf::from("/game/shaderpacks/iris.zip.disabled"))
        );
    }

    #[test]
    fn paths_refuse_unknown_destinations() {
        let game = Path::new("/game");
        let mut entry = Entry::new("victim", Destination::Mods);
        entry.filename = "victim.txt".into();
        for dest in ["..", "saves", "mods/../.."] {
            entry.destination = dest.into();
            assert!(matches!(
                entry.dir(game),
                Err(SyncError::UnknownDestination { .. })
            ));
            assert!(entry.expected_path(game).is_err());
            assert!(entry.disabled_path(game, "victim.txt").is_err());
        }
    }

    #[test]
    fn loader_parsing_and_default_version() {
        assert_eq!(Loader::parse("NeoForge").unwrap(), Loader::NeoForge);
        assert!(matches!(
            Loader::parse("vanilla"),
            Err(SyncError::UnknownLoader(ref l)) if l == "vanilla"
        ));

        let mc = Minecraft::new("1.21.1", Loader::Quilt, None);
        assert_eq!(mc.loader, "quilt");
        assert_eq!(mc.loader_version, "latest");
        let mc = Minecraft::new("1.20.1", Loader::Forge, Some("47.3.0".into()));
        assert_eq!(mc.loader_version, "47.3.0");
    }

    #[test]
    fn split_disabled_strips_suffix() {
        assert_eq!(split_disabled("a.jar.disabled"), ("a.jar", false));
        assert_eq!(split_disabled("a.jar"), ("a.jar", true));
        assert_eq!(split_disabled(".disabled"), (".disabled", true));
    }

    #[test]
    fn require_mut_searches_every_section() {
        let mut manifest = Manifest::new(Minecraft::default());
        manifest
            .shaders
            .push(Entry::new("complementary", Destination::ShaderPacks));

        let (section, _) = manifest.require_mut("complementary").unwrap();
        assert_eq!(section, Section::Shaders);
        assert!(matches!(
            manifest.require_mut("missing"),
            Err(SyncError::NotInManifest(_))
        ));
    }
}
