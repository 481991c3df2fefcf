// ─── Checksum Locator ───
// SHA-1 helpers plus content-addressed lookup inside one directory.

use std::io::ErrorKind;
use std::path::Path;

use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::core::downloader::PART_PREFIX;
use crate::core::error::{SyncError, SyncResult};

const READ_CHUNK: usize = 64 * 1024;

/// Hex SHA-1 of a file, streamed in fixed-size chunks.
pub async fn sha1_file(path: &Path) -> SyncResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| SyncError::io(path, e))?;

    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf).await.map_err(|e| SyncError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// True when `path` exists and its SHA-1 equals `expected`.
/// A missing file is `Ok(false)`, not an error.
pub async fn verify(path: &Path, expected: &str) -> SyncResult<bool> {
    match sha1_file(path).await {
        Ok(actual) => Ok(same_hash(&actual, expected)),
        Err(SyncError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Find the regular file directly inside `dir` whose content hashes to `sha1`.
///
/// Non-recursive; in-flight `.modsync-*.part` files are skipped. Names are
/// scanned in sorted order so the result is stable when several files share
/// the hash. A missing directory or an empty hash yields `None`.
pub async fn locate(dir: &Path, sha1: &str) -> SyncResult<Option<String>> {
    if sha1.is_empty() {
        return Ok(None);
    }

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SyncError::io(dir, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SyncError::io(dir, e))?
    {
        let file_type = entry.file_type().await.map_err(|e| SyncError::io(dir, e))?;
        if !file_type.is_file() {
            continue;
        }
        // In-flight downloads of concurrent workers are never candidates.
        if let Some(name) = entry
            .file_name()
            .to_str()
            .filter(|n| !n.starts_with(PART_PREFIX))
        {
            names.push(name.to_string());
        }
    }
    names.sort();

    for name in names {
        let path = dir.join(&name);
        if verify(&path, sha1).await? {
            debug!("Located {} by sha1 {}", name, sha1);
            return Ok(Some(name));
        }
    }
    Ok(None)
}

pub fn same_hash(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
