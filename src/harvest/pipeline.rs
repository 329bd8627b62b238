//! Per-artifact harvest task.
//!
//! This module provides the [`HarvestPipeline`] that turns one candidate into
//! one [`ArtifactRecord`]:
//! - Detail and variant pages are fetched concurrently through the retry wrapper
//! - Each fetched page is handed to its [`HarvestStage`]
//! - Any failure lands in the record's error slot; the task itself never fails

use tracing::{debug, warn};

use super::detail::DetailExtractor;
use super::markup::Document;
use super::traits::{ArtifactBuilder, HarvestStage};
use super::variants::VariantExtractor;
use crate::config::HarvestConfig;
use crate::fetch::RetryingFetcher;
use crate::model::{ArtifactRecord, CandidateRecord};
use crate::traits::{FetchError, HarvestTaskError, PageFetcher};

// ============================================================================
// Pipeline Types
// ============================================================================

/// Harvest task shared by every worker of a run.
///
/// # Thread Safety
///
/// The pipeline is `Send + Sync` and is shared across tasks behind an `Arc`.
///
/// # Example
///
/// ```ignore
/// let fetcher = RetryingFetcher::new(transport, RetryPolicy::default());
/// let pipeline = HarvestPipeline::new(fetcher, HarvestConfig::default());
/// let record = pipeline.harvest_artifact(candidate).await;
/// println!("{} has {} variants", record.identifier, record.variants.len());
/// ```
pub struct HarvestPipeline<F> {
    fetcher: RetryingFetcher<F>,

    /// Source of the detail and variant URLs
    config: HarvestConfig,

    detail_stage: Box<dyn HarvestStage>,

    variant_stage: Box<dyn HarvestStage>,
}

impl<F: PageFetcher> HarvestPipeline<F> {
    /// Creates a pipeline with the standard detail and variant stages.
    pub fn new(fetcher: RetryingFetcher<F>, config: HarvestConfig) -> Self {
        Self {
            fetcher,
            config,
            detail_stage: Box::new(DetailExtractor),
            variant_stage: Box::new(VariantExtractor),
        }
    }

    /// Replaces the extraction stages.
    pub fn with_stages(
        mut self,
        detail_stage: Box<dyn HarvestStage>,
        variant_stage: Box<dyn HarvestStage>,
    ) -> Self {
        self.detail_stage = detail_stage;
        self.variant_stage = variant_stage;
        self
    }

    pub fn fetcher(&self) -> &RetryingFetcher<F> {
        &self.fetcher
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Harvests one artifact.
    ///
    /// Never fails: fetch and extraction errors are recorded in
    /// `harvest_error`, and whatever was extracted before the failure is kept.
    pub async fn harvest_artifact(&self, candidate: CandidateRecord) -> ArtifactRecord {
        let mut builder = ArtifactBuilder::new(candidate);
        let detail_url = self.config.detail_url(builder.identifier());
        let variants_url = self.config.variants_url(builder.identifier());

        let (detail_page, variants_page) = tokio::join!(
            self.fetcher.fetch_with_retry(&detail_url),
            self.fetcher.fetch_with_retry(&variants_url),
        );

        let steps = [
            (self.detail_stage.as_ref(), detail_page),
            (self.variant_stage.as_ref(), variants_page),
        ];
        for (stage, page) in steps {
            if let Err(e) = run_stage(stage, page, &mut builder) {
                warn!(
                    identifier = builder.identifier(),
                    stage = stage.stage_name(),
                    error = %e,
                    "Harvest step failed"
                );
                builder.record_error(e);
            }
        }

        debug!(
            identifier = builder.identifier(),
            failed = builder.has_error(),
            "Artifact harvested"
        );
        builder.finish()
    }
}

// ============================================================================
// Stage Execution
// ============================================================================

/// Parses a fetched page and applies `stage` to it.
///
/// Kept synchronous so the parsed document never lives across an await.
fn run_stage(
    stage: &dyn HarvestStage,
    page: Result<String, FetchError>,
    builder: &mut ArtifactBuilder,
) -> Result<(), HarvestTaskError> {
    let body = page?;
    let document = Document::parse(&body);
    stage
        .apply(&document, builder)
        .map_err(|source| HarvestTaskError::Extract {
            stage: stage.stage_name(),
            source,
        })
}

// ============================================================================
// Tests
// ============================================================================
