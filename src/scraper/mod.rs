use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Settings;
use crate::models::ScrapeResult;

mod extract;
mod fetch;

pub use extract::extract_product;
pub use fetch::{FetchError, PageFetcher};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            attempts: settings.retry_attempts.max(1),
            backoff: Duration::from_secs(settings.retry_backoff_secs),
        }
    }
}

/// Why one fetch-and-extract attempt produced nothing. A reachable page with
/// zero extractable fields is retried just like a transport failure, but the
/// two are logged as distinct outcomes.
enum AttemptFailure {
    Transport(FetchError),
    EmptyDocument,
}

/// Combines the page fetcher and the field extractor into the resilient
/// "full info" and "price only" operations. All retrying happens here, around
/// the whole fetch+extract sequence, not inside the fetcher.
pub struct ProductScraper {
    fetcher: Arc<PageFetcher>,
    retry: RetryPolicy,
}

impl ProductScraper {
    pub fn new(fetcher: Arc<PageFetcher>, retry: RetryPolicy) -> Self {
        Self { fetcher, retry }
    }

    /// Fetch and extract with bounded retries. Returns as soon as any field
    /// is present; after exhausting all attempts, returns an all-absent
    /// result rather than an error. The fixed backoff runs between attempts
    /// only, never after the last one.
    pub async fn fetch_full_info(&self, url: &str) -> ScrapeResult {
        for attempt in 1..=self.retry.attempts {
            info!(attempt, url, "fetching product page");

            let failure = match self.fetcher.fetch(url).await {
                Ok(html) => {
                    let result = extract_product(&html);
                    if result.is_empty() {
                        AttemptFailure::EmptyDocument
                    } else {
                        info!(url, ?result, "product info extracted");
                        return result;
                    }
                }
                Err(e) => AttemptFailure::Transport(e),
            };

            match failure {
                AttemptFailure::Transport(e) => {
                    warn!(attempt, url, error = %e, "fetch attempt failed")
                }
                AttemptFailure::EmptyDocument => {
                    warn!(attempt, url, "page fetched but no fields extracted")
                }
            }

            if attempt < self.retry.attempts {
                sleep(self.retry.backoff).await;
            }
        }

        warn!(
            url,
            attempts = self.retry.attempts,
            "giving up, returning empty result"
        );
        ScrapeResult::default()
    }

    /// Price-only projection of `fetch_full_info`. Callers cannot distinguish
    /// an unreachable page from a page without a price field.
    pub async fn fetch_price(&self, url: &str) -> Option<f64> {
        self.fetch_full_info(url).await.price
    }
}
