//! Catalog merger: combines two independently harvested snapshots into one
//! catalog tagged with per-artifact provenance.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::model::{MergedCatalogDocument, SnapshotDocument, SourceSummary, SourcedArtifact};
use crate::snapshot::read_snapshot;
use crate::traits::MergeError;

/// Loads a snapshot for merging; a missing or unreadable file counts as absent.
pub fn load_snapshot(path: &Path) -> Option<SnapshotDocument> {
    if !path.exists() {
        warn!(path = %path.display(), "Snapshot not found, skipping");
        return None;
    }
    match read_snapshot(path) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Snapshot unreadable, skipping");
            None
        }
    }
}

/// Merges `first` and `second` into one catalog.
///
/// Artifacts keep their snapshot order, `first` before `second`, and are
/// never deduplicated across snapshots. Each artifact's `source` is its
/// snapshot's provenance tag.
///
/// # Errors
///
/// Fails when both inputs are absent, or when both carry the same
/// provenance tag (their sources could not be told apart).
pub fn merge(
    first: Option<SnapshotDocument>,
    second: Option<SnapshotDocument>,
) -> Result<MergedCatalogDocument, MergeError> {
    if let (Some(a), Some(b)) = (&first, &second) {
        if a.provenance_tag == b.provenance_tag {
            return Err(MergeError::DuplicateProvenance(a.provenance_tag.clone()));
        }
    }

    let snapshots: Vec<SnapshotDocument> = first.into_iter().chain(second).collect();
    let snapshot_timestamp = snapshots
        .iter()
        .map(|s| s.completed_at)
        .max()
        .ok_or(MergeError::BothInputsAbsent)?;

    let mut sources = BTreeMap::new();
    let mut artifacts = Vec::new();
    for snapshot in snapshots {
        info!(
            source = %snapshot.provenance_tag,
            artifacts = snapshot.artifacts.len(),
            "Merging snapshot"
        );
        sources.insert(
            snapshot.provenance_tag.clone(),
            SourceSummary {
                snapshot_timestamp: snapshot.started_at,
                completed_at: snapshot.completed_at,
                duration_seconds: snapshot.duration_seconds,
                artifact_count: snapshot.artifacts.len(),
            },
        );
        let source = snapshot.provenance_tag;
        artifacts.extend(snapshot.artifacts.into_iter().map(|artifact| SourcedArtifact {
            artifact,
            source: source.clone(),
        }));
    }

    Ok(MergedCatalogDocument {
        snapshot_timestamp,
        sources,
        total_artifacts: artifacts.len(),
        artifacts,
    })
}
