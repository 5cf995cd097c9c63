use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, REFERER};
use reqwest::{Client, ClientBuilder, StatusCode};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Settings;

/// A single fetch attempt's failure. Retry policy lives one level up, in
/// `ProductScraper`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(StatusCode),
}

/// Issues page requests through one shared HTTP session. The underlying
/// client is created lazily on the first fetch and held until `close` is
/// called during shutdown.
pub struct PageFetcher {
    timeout: Duration,
    user_agent: String,
    referer: String,
    client: Mutex<Option<Client>>,
}

impl PageFetcher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.fetch_timeout_secs),
            user_agent: settings.user_agent.clone(),
            referer: settings.referer.clone(),
            client: Mutex::new(None),
        }
    }

    /// Fixed browser-emulation header set; sent on every request to reduce
    /// anti-bot rejection.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        headers.insert(
            "Upgrade-Insecure-Requests",
            HeaderValue::from_static("1"),
        );
        headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
        headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
        headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
        if let Ok(referer) = HeaderValue::from_str(&self.referer) {
            headers.insert(REFERER, referer);
        }
        headers
    }

    fn client(&self) -> Result<Client, FetchError> {
        let mut guard = self.client.lock().unwrap();
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let client = ClientBuilder::new()
            .user_agent(self.user_agent.as_str())
            .default_headers(self.default_headers())
            .timeout(self.timeout)
            .cookie_store(true)
            .build()?;
        info!("HTTP session initialized");
        *guard = Some(client.clone());
        Ok(client)
    }

    /// Single fetch attempt: GET the page, require a 2xx status, return the
    /// raw document body.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let client = self.client()?;
        let response = client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, url, "HTTP error status");
            return Err(FetchError::Status(status));
        }

        Ok(response.text().await?)
    }

    /// Drops the shared session. Called during orderly shutdown; a later
    /// fetch would lazily create a fresh one.
    pub fn close(&self) {
        let mut guard = self.client.lock().unwrap();
        if guard.take().is_some() {
            info!("HTTP session released");
        }
    }
}
