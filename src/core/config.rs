use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MANIFEST_NAME: &str = "project.json";
pub const DEFAULT_API_BASE: &str = "https://api.modrinth.com/v2/";
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Settings threaded into the engine for one command invocation.
///
/// Built once from CLI flags / environment and passed by value; nothing in
/// the core reads ambient state.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Game directory holding `mods/`, `resourcepacks/`, `shaderpacks/`.
    pub game_dir: PathBuf,
    /// Manifest filename, relative to `game_dir`.
    pub manifest_name: String,
    /// Maximum number of entries installed in parallel.
    pub concurrency: usize,
    /// Registry API base URL (with trailing slash).
    pub api_base: String,
    /// Per-request timeout for registry metadata calls.
    pub api_timeout: Duration,
    /// Per-request timeout for artifact downloads.
    pub download_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            game_dir: PathBuf::from("."),
            manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            api_base: DEFAULT_API_BASE.to_string(),
            api_timeout: Duration::from_secs(15),
            download_timeout: Duration::from_secs(45),
        }
    }
}

impl SyncConfig {
    pub fn new(game_dir: impl Into<PathBuf>) -> Self {
        Self {
            game_dir: game_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    /// A zero limit would deadlock the pool, so it is clamped to one.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.api_base = base;
        self
    }

    /// Full path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.game_dir.join(&self.manifest_name)
    }

    pub fn game_dir(&self) -> &Path {
        &self.game_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_path_joins_game_dir() {
        let cfg = SyncConfig::new("/srv/mc").with_manifest_name("pack.json");
        assert_eq!(cfg.manifest_path(), PathBuf::from("/srv/mc/pack.json"));
    }

    #[test]
    fn concurrency_never_drops_to_zero() {
        let cfg = SyncConfig::default().with_concurrency(0);
        assert_eq!(cfg.concurrency, 1);
    }

    #[test]
    fn api_base_gets_trailing_slash() {
        let cfg = SyncConfig::default().with_api_base("http://localhost:8080/v2");
        assert_eq!(cfg.api_base, "http://localhost:8080/v2/");
    }
}
