//! Page transport and the retry wrapper around it.

pub mod http;
pub mod retry;

#[cfg(test)]
pub(crate) mod mock;

pub use http::HttpTransport;
pub use retry::{RetryPolicy, RetryingFetcher};
