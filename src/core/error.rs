use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the whole sync engine.
/// Every module returns `Result<T, SyncError>`.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry returned HTTP {status} for {path}")]
    RegistryStatus { path: String, status: u16 },

    #[error("Invalid registry API base URL {0:?}")]
    InvalidApiBase(String),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Resolution ──────────────────────────────────────
    #[error("No compatible version for {slug} (minecraft={game_version}, loader={loader})")]
    NoCompatibleVersion {
        slug: String,
        game_version: String,
        loader: String,
    },

    #[error("Unknown destination {dest:?} for {slug}; expected mods, resourcepacks or shaderpacks")]
    UnknownDestination { slug: String, dest: String },

    #[error("Version {version_id} has no downloadable files")]
    NoFiles { version_id: String },

    #[error("Cannot infer destination for {slug}: project type {project_type:?}; pass --to")]
    UnknownProjectType { slug: String, project_type: String },

    #[error("Unknown loader {0:?}; expected fabric, forge, neoforge or quilt")]
    UnknownLoader(String),

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    // ── Entry state ─────────────────────────────────────
    #[error("File for {slug} not found; expected {path:?}")]
    FileNotFound { slug: String, path: PathBuf },

    #[error("No filename recorded for {slug} and no file in {dir:?} matches sha1 {sha1}")]
    CannotResolveFile {
        slug: String,
        dir: PathBuf,
        sha1: String,
    },

    #[error("{0} is not in the manifest")]
    NotInManifest(String),

    // ── Manifest ────────────────────────────────────────
    #[error("Manifest not found at {0:?}; create one with `modsync init --mc <version> --loader <loader>`")]
    ManifestNotFound(PathBuf),

    #[error("Manifest already exists at {0:?}")]
    ManifestExists(PathBuf),

    #[error("Failed to persist manifest {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: Box<SyncError>,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Batch ───────────────────────────────────────────
    #[error("Cancelled after another entry failed")]
    Cancelled,

    #[error("Install worker failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Convenience alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Wrap an IO error with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(source: std::io::Error) -> Self {
        SyncError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
