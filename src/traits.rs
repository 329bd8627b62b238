use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single transport attempt. Every variant is transient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },
    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// A fetch that still failed after the retry budget was spent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Fetching {url} failed after {attempts} attempt(s): {source}")]
pub struct FetchError {
    pub url: String,
    pub attempts: u32,
    #[source]
    pub source: TransportError,
}

/// An extraction stage could not run at all.
///
/// Missing fields in the markup are not errors; they surface as absent values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

/// Per-artifact failure. Never escapes the artifact's own record.
#[derive(Error, Debug)]
pub enum HarvestTaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{stage} extraction failed: {source}")]
    Extract {
        stage: &'static str,
        #[source]
        source: ExtractError,
    },
    #[error("Harvest task aborted: {0}")]
    Aborted(String),
}

/// Run-level failure: nothing can be harvested.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Listing fetch failed: {0}")]
    Listing(#[source] FetchError),
    #[error("Listing could not be parsed: {0}")]
    ListingParse(#[source] ExtractError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("No snapshot could be loaded; both merge inputs are absent")]
    BothInputsAbsent,
    #[error("Both snapshots carry the provenance tag `{0}`")]
    DuplicateProvenance(String),
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Single GET-style page fetch. Implementations do not retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns the response body as text.
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}
