//! Per-host politeness delay for board fetches.
//!
//! Several sources usually live on the same ATS host (every Lever board is
//! served from `api.lever.co`), so spacing requests per host rather than per
//! source keeps a run from hammering one provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use url::Url;

use crate::error::AppError;
use crate::traits::Fetcher;

/// Spacing between consecutive requests to the same host.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub delay: Duration,
    /// Upper bound of a random extra delay added to each wait.
    pub jitter: Duration,
}

impl ThrottleConfig {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn next_interval(&self) -> Duration {
        if self.jitter.is_zero() {
            self.delay
        } else {
            self.delay + Duration::from_millis(jitter_ms(self.jitter.as_millis() as u64))
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            jitter: Duration::from_millis(250),
        }
    }
}

/// A [`Fetcher`] that waits out the per-host delay before delegating.
#[derive(Clone)]
pub struct ThrottledFetcher<F> {
    inner: F,
    config: ThrottleConfig,
    last_hit: Arc<Mutex<HashMap<String, Instant>>>,
}

impl<F: Fetcher> ThrottledFetcher<F> {
    pub fn new(inner: F, config: ThrottleConfig) -> Self {
        Self {
            inner,
            config,
            last_hit: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// `host:port` of a URL, or `None` if it does not parse.
    fn host_key(url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();
        match url.port_or_known_default() {
            Some(port) => Some(format!("{host}:{port}")),
            None => Some(host),
        }
    }

    async fn wait_turn(&self, host: &str) {
        let wait = {
            let map = self.last_hit.lock().await;
            map.get(host).and_then(|last| {
                let interval = self.config.next_interval();
                interval.checked_sub(last.elapsed())
            })
        };

        if let Some(wait) = wait.filter(|w| !w.is_zero()) {
            tracing::debug!(%host, wait_ms = %wait.as_millis(), "Throttling board request");
            tokio::time::sleep(wait).await;
        }

        self.last_hit
            .lock()
            .await
            .insert(host.to_string(), Instant::now());
    }
}

impl<F: Fetcher> Fetcher for ThrottledFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        if let Some(host) = Self::host_key(url) {
            self.wait_turn(&host).await;
        }
        self.inner.fetch(url).await
    }
}

/// Cheap time-seeded xorshift. Only used to spread request timing.
fn jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
        | 1;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
