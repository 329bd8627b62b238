//! In-memory transport for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::traits::{PageFetcher, TransportError};

enum Route {
    Page(String),
    Fail(TransportError),
    Flaky { failures: u32, body: String },
}

pub(crate) struct StaticFetcher {
    routes: HashMap<String, Route>,
    calls: Mutex<HashMap<String, u32>>,
    delay: Duration,
    tracked: Option<fn(&str) -> bool>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StaticFetcher {
    pub(crate) fn new() -> Self {
        Self {
            routes: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
            tracked: None,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub(crate) fn page(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(url.to_string(), Route::Page(body.to_string()));
        self
    }

    pub(crate) fn fail(mut self, url: &str, error: TransportError) -> Self {
        self.routes.insert(url.to_string(), Route::Fail(error));
        self
    }

    /// Fails the first `failures` calls, then serves `body`.
    pub(crate) fn flaky(mut self, url: &str, failures: u32, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            Route::Flaky {
                failures,
                body: body.to_string(),
            },
        );
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Only URLs accepted by `filter` count towards [`Self::peak`].
    pub(crate) fn track_peak(mut self, filter: fn(&str) -> bool) -> Self {
        self.tracked = Some(filter);
        self
    }

    pub(crate) fn calls(&self, url: &str) -> u32 {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let _guard = match self.tracked {
            Some(filter) if filter(url) => {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                Some(InFlight(&self.in_flight))
            }
            _ => None,
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.routes.get(url) {
            Some(Route::Page(body)) => Ok(body.clone()),
            Some(Route::Fail(error)) => Err(error.clone()),
            Some(Route::Flaky { failures, body }) if call > *failures => Ok(body.clone()),
            Some(Route::Flaky { .. }) => Err(TransportError::Network("connection reset".to_string())),
            None => Err(TransportError::Status { status: 404 }),
        }
    }
}
