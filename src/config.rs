//! Run configuration: endpoints, concurrency, retry budget and output paths.

use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::RetryPolicy;
use crate::model::HarvestMode;

/// Settings for one harvest run.
///
/// Built with [`Default`] and adjusted through the `with_*` methods; the CLI
/// maps its flags onto these.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Catalog site root, without a trailing slash
    pub base_url: String,

    /// Maximum number of artifacts harvested at once
    pub concurrency: usize,

    /// Optional cap on the number of candidates harvested
    pub limit: Option<usize>,

    pub user_agent: String,

    /// Bound on a single fetch attempt
    pub request_timeout: Duration,

    pub retry: RetryPolicy,

    /// Directory for the default snapshot and catalog paths
    pub output_dir: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ollama.com".to_string(),
            concurrency: 6,
            limit: None,
            user_agent: format!(
                "Mozilla/5.0 (compatible; CatalogHarvester/{})",
                env!("CARGO_PKG_VERSION")
            ),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            output_dir: PathBuf::from("out"),
        }
    }
}

impl HarvestConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the concurrency limit; zero is raised to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn listing_url(&self) -> String {
        format!("{}/search", self.base_url)
    }

    pub fn detail_url(&self, identifier: &str) -> String {
        format!("{}/library/{}", self.base_url, identifier)
    }

    pub fn variants_url(&self, identifier: &str) -> String {
        format!("{}/library/{}/tags", self.base_url, identifier)
    }

    /// Default snapshot location for a mode.
    ///
    /// The CLI splits `all` into a primary and a community run, but a library
    /// caller may harvest both partitions in one run; that snapshot gets its
    /// own file so it never overwrites the merged catalog.
    pub fn snapshot_path(&self, mode: HarvestMode) -> PathBuf {
        self.output_dir.join(format!("models_{}.json", mode.as_str()))
    }

    /// Default location of the merged catalog.
    pub fn merged_path(&self) -> PathBuf {
        self.output_dir.join("models.json")
    }
}
