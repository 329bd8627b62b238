//! One complete harvest run: listing → mode filter → bounded harvest →
//! sorted snapshot.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::config::HarvestConfig;
use crate::executor::HarvesterExecutor;
use crate::fetch::{HttpTransport, RetryingFetcher};
use crate::harvest::listing::parse_listing;
use crate::harvest::pipeline::HarvestPipeline;
use crate::model::{HarvestMode, SnapshotDocument};
use crate::traits::{HarvestError, PageFetcher, TransportError};

pub struct Harvester<F> {
    pipeline: Arc<HarvestPipeline<F>>,
    executor: HarvesterExecutor,
}

impl Harvester<HttpTransport> {
    /// Builds a harvester talking to the real site described by `config`.
    pub fn from_config(config: HarvestConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config.user_agent, config.request_timeout)?;
        Ok(Self::new(transport, config))
    }
}

impl<F: PageFetcher + 'static> Harvester<F> {
    pub fn new(transport: F, config: HarvestConfig) -> Self {
        let fetcher = RetryingFetcher::new(transport, config.retry.clone())
            .with_attempt_timeout(config.request_timeout);
        let executor = HarvesterExecutor::new(config.concurrency);
        Self {
            pipeline: Arc::new(HarvestPipeline::new(fetcher, config)),
            executor,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        self.pipeline.config()
    }

    /// Runs a full harvest for `mode`.
    ///
    /// # Errors
    ///
    /// Only listing-level failures are returned; per-artifact failures are
    /// recorded on the artifacts themselves.
    #[instrument(skip(self, mode), fields(mode = %mode))]
    pub async fn run(&self, mode: HarvestMode) -> Result<SnapshotDocument, HarvestError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let config = self.pipeline.config();

        let listing = self
            .pipeline
            .fetcher()
            .fetch_with_retry(&config.listing_url())
            .await
            .map_err(HarvestError::Listing)?;

        let mut candidates = parse_listing(&listing, mode).map_err(HarvestError::ListingParse)?;
        if let Some(limit) = config.limit {
            candidates.truncate(limit);
        }
        info!(candidates = candidates.len(), "Discovered candidates");

        let artifacts = self
            .executor
            .execute(Arc::clone(&self.pipeline), candidates)
            .await;

        let completed_at = Utc::now();
        let duration_seconds = (clock.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        info!(
            artifacts = artifacts.len(),
            failed = artifacts.iter().filter(|a| a.harvest_error.is_some()).count(),
            duration_seconds,
            "Harvest completed"
        );

        Ok(SnapshotDocument {
            started_at,
            completed_at,
            duration_seconds,
            provenance_tag: mode.as_str().to_string(),
            artifacts,
        })
    }
}
