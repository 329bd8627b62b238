//! Stage abstraction for the per-artifact harvest and the record builder the
//! stages write into.

use super::markup::Document;
use super::text::{truncate_chars, Count, DESCRIPTION_LIMIT};
use crate::model::{ArtifactRecord, CandidateRecord, VariantRecord};
use crate::traits::ExtractError;

// ============================================================================
// Stage Trait
// ============================================================================

/// One extraction step applied to a fetched page.
///
/// Stages must be deterministic: applying the same stage to the same page and
/// the same starting record always yields the same record. A stage only ever
/// adds information; a field the page does not mention is left untouched.
///
/// # Thread Safety
///
/// Stages are shared across concurrently running harvest tasks and must be
/// `Send + Sync`.
pub trait HarvestStage: Send + Sync {
    /// Reads `page` and records what it finds in `record`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] only when the stage cannot run at all; a
    /// missing element is not an error.
    fn apply(&self, page: &Document, record: &mut ArtifactBuilder) -> Result<(), ExtractError>;

    /// Returns a human-readable name for this stage.
    ///
    /// Used for logging and in recorded harvest errors.
    fn stage_name(&self) -> &'static str;
}

// ============================================================================
// Record Builder
// ============================================================================

/// Accumulates one artifact's fields over the course of its harvest task.
///
/// Every setter is best-effort: fields set before a failure stay set, and the
/// failure goes into the single error slot.
#[derive(Debug, Clone)]
pub struct ArtifactBuilder {
    record: ArtifactRecord,
}

impl ArtifactBuilder {
    pub fn new(candidate: CandidateRecord) -> Self {
        Self {
            record: ArtifactRecord::from(candidate),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.record.identifier
    }

    pub fn set_display_name(&mut self, name: String) {
        self.record.display_name = Some(name);
    }

    /// Replaces the popularity figures with a freshly parsed count.
    pub fn set_popularity(&mut self, count: Count) {
        self.record.popularity_count = Some(count.value);
        self.record.popularity_raw_text = Some(count.raw);
    }

    /// Adds tags; existing tags are never removed.
    pub fn add_capabilities(&mut self, tags: impl IntoIterator<Item = String>) {
        self.record.capability_tags.extend(tags);
    }

    /// Stores the description, truncated to [`DESCRIPTION_LIMIT`] characters.
    pub fn set_description(&mut self, description: &str) {
        self.record.description = Some(truncate_chars(description, DESCRIPTION_LIMIT));
    }

    /// Stores the variant list and its length.
    pub fn set_variants(&mut self, variants: Vec<VariantRecord>) {
        self.record.variant_count = Some(variants.len());
        self.record.variants = variants;
    }

    /// Records a failure. Later failures are appended to the same slot.
    pub fn record_error(&mut self, error: impl std::fmt::Display) {
        let message = error.to_string();
        self.record.harvest_error = Some(match self.record.harvest_error.take() {
            Some(previous) => format!("{}; {}", previous, message),
            None => message,
        });
    }

    pub fn has_error(&self) -> bool {
        self.record.harvest_error.is_some()
    }

    pub fn finish(self) -> ArtifactRecord {
        self.record
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn builder() -> ArtifactBuilder {
        ArtifactBuilder::new(CandidateRecord {
            identifier: "alpha".to_string(),
            capability_tags: BTreeSet::from(["tools".to_string()]),
            ..Default::default()
        })
    }

    #[test]
    fn test_capabilities_only_grow() {
        let mut b = builder();
        b.add_capabilities(["vision".to_string()]);
        b.add_capabilities(Vec::new());
        let record = b.finish();
        assert_eq!(
            record.capability_tags,
            BTreeSet::from(["tools".to_string(), "vision".to_string()])
        );
    }

    #[test]
    fn test_description_truncated() {
        let mut b = builder();
        b.set_description(&"x".repeat(DESCRIPTION_LIMIT + 50));
        assert_eq!(b.finish().description.unwrap().chars().count(), DESCRIPTION_LIMIT);
    }

    #[test]
    fn test_error_slot_keeps_partial_fields() {
        let mut b = builder();
        b.set_display_name("Alpha".to_string());
        b.record_error("detail failed");
        b.record_error("variants failed");
        assert!(b.has_error());

        let record = b.finish();
        assert_eq!(record.display_name.as_deref(), Some("Alpha"));
        assert_eq!(
            record.harvest_error.as_deref(),
            Some("detail failed; variants failed")
        );
    }

    #[test]
    fn test_variant_count_matches_list() {
        let mut b = builder();
        b.set_variants(vec![VariantRecord {
            variant_tag: "alpha:1b".to_string(),
            ..Default::default()
        }]);
        let record = b.finish();
        assert_eq!(record.variant_count, Some(1));
    }
}
