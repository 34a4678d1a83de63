// src/fetch/mod.rs

pub mod extract;

pub use extract::{extract_table, parse_selector};

use reqwest::Client;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::mode::ScrapeMode;
use crate::table::RawTable;

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// One page to scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// What the user typed: a security code, a symbol or a full URL.
    pub identifier: String,
    pub url: Url,
    /// Used as company name when the page has no usable title. `None` for
    /// sources given as full URLs.
    pub fallback_name: Option<String>,
}

impl Source {
    /// Full http(s) URLs are taken as-is, anything else is a code expanded
    /// through the mode's URL template.
    pub fn resolve(identifier: &str, mode: ScrapeMode) -> Result<Self> {
        let identifier = identifier.trim();
        let is_url = identifier.starts_with("http://") || identifier.starts_with("https://");
        let raw = if is_url {
            identifier.to_string()
        } else {
            mode.url_for(identifier)
        };
        let url = Url::parse(&raw)
            .map_err(|e| ScrapeError::Config(format!("bad source '{}': {}", identifier, e)))?;
        Ok(Self {
            identifier: identifier.to_string(),
            url,
            fallback_name: (!is_url).then(|| identifier.to_string()),
        })
    }
}

/// Anything that can turn a [`Source`] into a [`RawTable`].
#[allow(async_fn_in_trait)]
pub trait TableSource {
    async fn fetch(&self, source: &Source) -> Result<RawTable>;
}

/// HTTP settings for [`HttpTableSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    /// Pause after each page load before extracting.
    pub settle_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(
                "Mozilla/5.0 (X11; Linux x86_64) finscraper/",
                env!("CARGO_PKG_VERSION")
            )
            .to_string(),
            timeout_secs: 30,
            max_retries: 2,
            initial_backoff_ms: 500,
            settle_ms: 0,
        }
    }
}

/// Plain GET + HTML parse. One client is shared by every source of a batch
/// and released when this value is dropped.
pub struct HttpTableSource {
    client: Client,
    table_sel: Selector,
    config: FetchConfig,
}

impl HttpTableSource {
    pub fn new(config: FetchConfig, table_selector: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .gzip(true)
            .build()
            .map_err(|e| ScrapeError::Config(format!("building http client: {}", e)))?;
        Ok(Self {
            client,
            table_sel: parse_selector(table_selector)?,
            config,
        })
    }

    pub fn for_mode(config: FetchConfig, mode: ScrapeMode) -> Result<Self> {
        Self::new(config, mode.table_selector())
    }

    async fn get_text_core(&self, url: &Url) -> reqwest::Result<String> {
        debug!("Fetching text from {}", url);
        self.client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    async fn get_text_with_retry(&self, url: &Url) -> Result<String> {
        let mut attempts = 0;
        loop {
            match self.get_text_core(url).await {
                Ok(t) => return Ok(t),
                Err(e) if attempts < self.config.max_retries => {
                    attempts += 1;
                    let backoff = backoff_delay(self.config.initial_backoff_ms, attempts);
                    warn!(%url, attempt = attempts, delay_ms = backoff.as_millis() as u64, error = %e, "Retrying");
                    sleep(backoff).await;
                }
                Err(e) => {
                    error!(%url, error = %e, "Exhausted retries");
                    return Err(ScrapeError::fetch(url.as_str(), e));
                }
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based): doubles each time, capped
/// at [`MAX_BACKOFF`].
fn backoff_delay(initial_ms: u64, attempt: u32) -> Duration {
    let ms = 2u64
        .checked_pow(attempt.saturating_sub(1))
        .and_then(|f| initial_ms.checked_mul(f))
        .unwrap_or(u64::MAX);
    Duration::from_millis(ms).min(MAX_BACKOFF)
}

impl TableSource for HttpTableSource {
    #[instrument(level = "info", skip(self, source), fields(id = %source.identifier))]
    async fn fetch(&self, source: &Source) -> Result<RawTable> {
        let body = self.get_text_with_retry(&source.url).await?;
        if self.config.settle_ms > 0 {
            sleep(Duration::from_millis(self.config.settle_ms)).await;
        }
        Ok(extract_table(&body, &self.table_sel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_expands_through_mode_template() {
        let src = Source::resolve(" 500325 ", ScrapeMode::Quarterly).unwrap();
        assert_eq!(src.identifier, "500325");
        assert_eq!(src.fallback_name.as_deref(), Some("500325"));
        assert!(src.url.as_str().contains("/500325/500325/500325/"));
    }

    #[test]
    fn url_is_used_verbatim() {
        let src =
            Source::resolve("https://www.screener.in/company/TCS/", ScrapeMode::Screener).unwrap();
        assert_eq!(src.url.as_str(), "https://www.screener.in/company/TCS/");
        assert_eq!(src.fallback_name, None);
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(500, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(500, 3), Duration::from_millis(2000));
        assert_eq!(backoff_delay(500, 64), MAX_BACKOFF);
        assert_eq!(backoff_delay(u64::MAX, 2), MAX_BACKOFF);
        assert_eq!(backoff_delay(500, u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn client_builds_for_every_mode() {
        for mode in [ScrapeMode::Quarterly, ScrapeMode::Annual, ScrapeMode::Screener] {
            assert!(HttpTableSource::for_mode(FetchConfig::default(), mode).is_ok());
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_fetch_error() {
        let cfg = FetchConfig {
            timeout_secs: 2,
            max_retries: 0,
            ..FetchConfig::default()
        };
        let http = HttpTableSource::for_mode(cfg, ScrapeMode::Annual).unwrap();
        let src = Source::resolve("http://127.0.0.1:9/financials", ScrapeMode::Annual).unwrap();
        assert!(matches!(
            http.fetch(&src).await,
            Err(ScrapeError::Fetch { .. })
        ));
    }
}
