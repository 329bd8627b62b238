use crate::harvest::pipeline::HarvestPipeline;
use crate::harvest::traits::ArtifactBuilder;
use crate::model::{ArtifactRecord, CandidateRecord};
use crate::traits::{HarvestTaskError, PageFetcher};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};

/// Runs harvest tasks with a bound on how many are in flight.
pub struct HarvesterExecutor {
    semaphore: Arc<Semaphore>,
    concurrency_limit: usize,
}

impl HarvesterExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        let concurrency_limit = concurrency_limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit)),
            concurrency_limit,
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Harvests every candidate and returns one record per candidate, sorted
    /// with [`sort_artifacts`].
    ///
    /// A failing or panicking task produces a record carrying
    /// `harvest_error`; it never aborts the batch.
    #[instrument(skip(self, pipeline, candidates), fields(candidates = candidates.len(), limit = self.concurrency_limit))]
    pub async fn execute<F>(
        &self,
        pipeline: Arc<HarvestPipeline<F>>,
        candidates: Vec<CandidateRecord>,
    ) -> Vec<ArtifactRecord>
    where
        F: PageFetcher + 'static,
    {
        let total = candidates.len();
        let mut tasks = JoinSet::new();

        for candidate in candidates {
            let semaphore = Arc::clone(&self.semaphore);
            let pipeline = Arc::clone(&pipeline);

            tasks.spawn(async move {
                // released on drop, whichever way the task ends
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return failed_record(
                            candidate,
                            HarvestTaskError::Aborted(format!("Semaphore error: {}", e)),
                        )
                    }
                };

                let fallback = candidate.clone();
                let worker = tokio::spawn(async move { pipeline.harvest_artifact(candidate).await });
                match worker.await {
                    Ok(record) => record,
                    Err(e) => failed_record(fallback, HarvestTaskError::Aborted(e.to_string())),
                }
            });
        }

        let mut records = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(record) => {
                    records.push(record);
                    debug!(done = records.len(), total, "Harvest progress");
                }
                Err(e) => error!(error = %e, "Harvest task could not be joined"),
            }
        }

        let failed = records.iter().filter(|r| r.harvest_error.is_some()).count();
        info!(harvested = records.len(), failed, "Finished harvest batch");

        sort_artifacts(&mut records);
        records
    }
}

fn failed_record(candidate: CandidateRecord, error: HarvestTaskError) -> ArtifactRecord {
    let mut builder = ArtifactBuilder::new(candidate);
    builder.record_error(error);
    builder.finish()
}

/// Orders records by descending popularity (unknown counts as zero), then by
/// identifier.
pub fn sort_artifacts(records: &mut [ArtifactRecord]) {
    records.sort_by(|a, b| {
        b.popularity()
            .cmp(&a.popularity())
            .then_with(|| a.identifier.cmp(&b.identifier))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarvestConfig;
    use crate::fetch::mock::StaticFetcher;
    use crate::fetch::{RetryPolicy, RetryingFetcher};
    use crate::harvest::markup::Document;
    use crate::harvest::traits::HarvestStage;
    use crate::harvest::VariantExtractor;
    use crate::traits::{ExtractError, TransportError};
    use std::time::Duration;

    const BASE: &str = "http://catalog.test";

    fn candidate(identifier: &str, pulls: Option<u64>) -> CandidateRecord {
        CandidateRecord {
            identifier: identifier.to_string(),
            popularity_count: pulls,
            ..Default::default()
        }
    }

    fn serve(fetcher: StaticFetcher, identifiers: &[&str]) -> StaticFetcher {
        identifiers.iter().fold(fetcher, |f, id| {
            f.page(&format!("{BASE}/library/{id}"), &format!("<h1>{id}</h1>"))
                .page(&format!("{BASE}/library/{id}/tags"), "<p>no tags</p>")
        })
    }

    fn pipeline(fetcher: StaticFetcher) -> Arc<HarvestPipeline<StaticFetcher>> {
        Arc::new(HarvestPipeline::new(
            RetryingFetcher::new(fetcher, RetryPolicy::immediate(2)),
            HarvestConfig::default().with_base_url(BASE),
        ))
    }

    #[test]
    fn test_sort_by_popularity_then_identifier() {
        let mut records: Vec<ArtifactRecord> = vec![
            candidate("zeta", Some(5)).into(),
            candidate("beta", None).into(),
            candidate("alpha", Some(5)).into(),
            candidate("gamma", Some(100)).into(),
            candidate("aardvark", Some(0)).into(),
        ];
        sort_artifacts(&mut records);

        let order: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(order, vec!["gamma", "alpha", "zeta", "aardvark", "beta"]);
    }

    #[tokio::test]
    async fn test_single_failure_is_isolated() {
        let ids = ["a", "b", "c", "d"];
        let fetcher = serve(StaticFetcher::new(), &ids).fail(
            &format!("{BASE}/library/c"),
            TransportError::Network("connection refused".to_string()),
        );
        let candidates = ids.iter().map(|id| candidate(id, None)).collect();

        let records = HarvesterExecutor::new(2)
            .execute(pipeline(fetcher), candidates)
            .await;

        assert_eq!(records.len(), ids.len());
        let failed: Vec<&str> = records
            .iter()
            .filter(|r| r.harvest_error.is_some())
            .map(|r| r.identifier.as_str())
            .collect();
        assert_eq!(failed, vec!["c"]);
        let c = records.iter().find(|r| r.identifier == "c").unwrap();
        assert_eq!(c.variant_count, Some(0));
    }

    /// Detail stage that panics on one identifier.
    struct PanicsOn(&'static str);

    impl HarvestStage for PanicsOn {
        fn apply(&self, _page: &Document, record: &mut ArtifactBuilder) -> Result<(), ExtractError> {
            if record.identifier() == self.0 {
                panic!("stage blew up on {}", self.0);
            }
            Ok(())
        }

        fn stage_name(&self) -> &'static str {
            "panics-on"
        }
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_error_record_and_frees_slot() {
        let ids = ["a", "b", "c"];
        let pipeline = HarvestPipeline::new(
            RetryingFetcher::new(serve(StaticFetcher::new(), &ids), RetryPolicy::immediate(1)),
            HarvestConfig::default().with_base_url(BASE),
        )
        .with_stages(Box::new(PanicsOn("b")), Box::new(VariantExtractor));
        let candidates = ids.iter().map(|id| candidate(id, None)).collect();

        // a leaked permit would leave "c" waiting forever with a limit of one
        let records = tokio::time::timeout(
            Duration::from_secs(5),
            HarvesterExecutor::new(1).execute(Arc::new(pipeline), candidates),
        )
        .await
        .expect("executor hung after a task panicked");

        assert_eq!(records.len(), ids.len());
        for record in &records {
            match record.identifier.as_str() {
                "b" => {
                    let error = record.harvest_error.as_deref().unwrap();
                    assert!(error.contains("aborted"), "unexpected error: {error}");
                }
                _ => assert!(record.harvest_error.is_none()),
            }
        }
    }

    #[tokio::test]
    async fn test_concurrency_limit_respected() {
        let ids: Vec<String> = (0..10).map(|i| format!("m{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let fetcher = serve(StaticFetcher::new(), &refs)
            .with_delay(Duration::from_millis(20))
            .track_peak(|url| !url.ends_with("/tags"));
        let pipeline = pipeline(fetcher);
        let candidates = refs.iter().map(|id| candidate(id, None)).collect();

        let records = HarvesterExecutor::new(3)
            .execute(Arc::clone(&pipeline), candidates)
            .await;

        assert_eq!(records.len(), 10);
        let peak = pipeline.fetcher().inner().peak();
        assert!(peak <= 3, "peak {peak} exceeded the limit");
        assert!(peak > 1, "tasks never overlapped");
    }

    #[tokio::test]
    async fn test_empty_candidate_set() {
        let records = HarvesterExecutor::new(4)
            .execute(pipeline(StaticFetcher::new()), Vec::new())
            .await;
        assert!(records.is_empty());
    }

    #[test]
    fn test_zero_limit_raised_to_one() {
        assert_eq!(HarvesterExecutor::new(0).concurrency_limit(), 1);
    }
}
