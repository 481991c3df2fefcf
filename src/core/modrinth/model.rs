use serde::{Deserialize, Serialize};

use crate::core::error::{SyncError, SyncResult};

/// File checksums advertised by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hashes {
    #[serde(default)]
    pub sha1: String,
}

/// One downloadable artifact of a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFile {
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub hashes: Hashes,
}

/// A published version of a project.
///
/// `date_published` is an ISO-8601 UTC timestamp with a fixed layout, so
/// comparing it as text orders versions chronologically. Parse it if the
/// registry ever changes that layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: String,
    #[serde(default)]
    pub version_number: String,
    #[serde(default)]
    pub date_published: String,
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

impl Version {
    /// The file flagged primary, else the first file.
    pub fn primary_file(&self) -> SyncResult<&VersionFile> {
        self.files
            .iter()
            .find(|f| f.primary)
            .or_else(|| self.files.first())
            .ok_or_else(|| SyncError::NoFiles {
                version_id: self.id.clone(),
            })
    }
}

/// Project metadata, from `project/{id}` or a search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, alias = "project_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    pub project_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Game versions the project supports.
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub downloads: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<Project>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total_hits: u64,
}
