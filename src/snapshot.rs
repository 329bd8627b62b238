//! JSON persistence for snapshots and merged catalogs.
//!
//! Writes are atomic: the document is serialized to a sibling temp file which
//! is then renamed over the destination.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::model::SnapshotDocument;
use crate::traits::SnapshotError;

/// Writes `value` as pretty-printed UTF-8 JSON, replacing any existing file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut serialized = serde_json::to_string_pretty(value)?;
    serialized.push('\n');

    let temp_path = temp_sibling(path);
    fs::write(&temp_path, serialized.as_bytes())?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    debug!(path = %path.display(), bytes = serialized.len(), "Wrote JSON document");
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

pub fn write_snapshot(path: &Path, snapshot: &SnapshotDocument) -> Result<(), SnapshotError> {
    write_json(path, snapshot)
}

pub fn read_snapshot(path: &Path) -> Result<SnapshotDocument, SnapshotError> {
    read_json(path)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "catalog".into());
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}
