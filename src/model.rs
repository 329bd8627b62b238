//! Catalog data model shared by the harvest, snapshot and merge stages.
//!
//! Field names on the Rust side follow the domain vocabulary; the serialized
//! key names stay compatible with the JSON catalogs consumed downstream
//! (`slug`, `pulls`, `models`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which slice of the listing a harvest run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestMode {
    /// Identifiers without a namespace separator (`llama3`).
    Primary,
    /// Namespace-qualified identifiers (`someone/model`).
    Community,
    /// Everything the listing links to.
    All,
}

impl HarvestMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Community => "community",
            Self::All => "all",
        }
    }

    /// Returns `true` if `identifier` belongs to this mode's partition.
    pub fn admits(&self, identifier: &str) -> bool {
        let namespaced = identifier.contains('/');
        match self {
            Self::Primary => !namespaced,
            Self::Community => namespaced,
            Self::All => true,
        }
    }
}

impl fmt::Display for HarvestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lightweight reference to an artifact discovered on the listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateRecord {
    #[serde(rename = "slug")]
    pub identifier: String,

    #[serde(rename = "capabilities")]
    pub capability_tags: BTreeSet<String>,

    #[serde(rename = "pulls")]
    pub popularity_count: Option<u64>,

    #[serde(rename = "pulls_text")]
    pub popularity_raw_text: Option<String>,

    #[serde(rename = "blurb")]
    pub summary_text: Option<String>,
}

/// One fully harvested catalog entry.
///
/// Failed harvests are still represented: `harvest_error` is set and every
/// field populated before the failure is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactRecord {
    #[serde(rename = "slug")]
    pub identifier: String,

    #[serde(rename = "name")]
    pub display_name: Option<String>,

    #[serde(rename = "pulls")]
    pub popularity_count: Option<u64>,

    #[serde(rename = "pulls_text")]
    pub popularity_raw_text: Option<String>,

    #[serde(rename = "capabilities")]
    pub capability_tags: BTreeSet<String>,

    #[serde(rename = "blurb")]
    pub summary_text: Option<String>,

    pub description: Option<String>,

    #[serde(rename = "tags_count")]
    pub variant_count: Option<usize>,

    pub variants: Vec<VariantRecord>,

    #[serde(rename = "error")]
    pub harvest_error: Option<String>,
}

impl ArtifactRecord {
    /// Popularity used for ordering; an unknown count ranks as zero.
    pub fn popularity(&self) -> u64 {
        self.popularity_count.unwrap_or(0)
    }
}

impl From<CandidateRecord> for ArtifactRecord {
    fn from(candidate: CandidateRecord) -> Self {
        Self {
            identifier: candidate.identifier,
            capability_tags: candidate.capability_tags,
            popularity_count: candidate.popularity_count,
            popularity_raw_text: candidate.popularity_raw_text,
            summary_text: candidate.summary_text,
            ..Default::default()
        }
    }
}

/// A distributable build of an artifact, keyed by its full tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantRecord {
    /// Full tag including the identifier, e.g. `llama3:8b-instruct-q4_0`
    #[serde(rename = "tag")]
    pub variant_tag: String,

    pub size_bytes: Option<u64>,

    #[serde(rename = "size_text")]
    pub size_raw_text: Option<String>,

    /// Context window as displayed, e.g. `8K`
    #[serde(rename = "context")]
    pub context_length: Option<String>,

    #[serde(rename = "input")]
    pub input_modality: Option<String>,
}

/// Output of one harvest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(rename = "scraped_at")]
    pub started_at: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,

    pub duration_seconds: f64,

    #[serde(rename = "model_type")]
    pub provenance_tag: String,

    #[serde(rename = "models", default)]
    pub artifacts: Vec<ArtifactRecord>,
}

/// Per-source metadata carried into a merged catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    #[serde(rename = "scraped_at")]
    pub snapshot_timestamp: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,

    pub duration_seconds: f64,

    #[serde(rename = "model_count")]
    pub artifact_count: usize,
}

/// An artifact tagged with the provenance of the snapshot it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedArtifact {
    #[serde(flatten)]
    pub artifact: ArtifactRecord,

    pub source: String,
}

/// Combined catalog built from up to two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedCatalogDocument {
    /// Latest `completed_at` among the merged snapshots
    #[serde(rename = "scraped_at")]
    pub snapshot_timestamp: DateTime<Utc>,

    pub sources: BTreeMap<String, SourceSummary>,

    #[serde(rename = "total_models")]
    pub total_artifacts: usize,

    #[serde(rename = "models")]
    pub artifacts: Vec<SourcedArtifact>,
}
