//! HTTP plumbing: the site client and the retry/backoff wrapper.
use crate::{
    config::{Cfg, HttpConfig, RetryConfig},
    error::{Error, Result},
};
use log::{debug, info};
use reqwest::Client;
use std::{future::Future, path::Path, time::Duration};
use tokio::{fs, time::Instant};

const DEFAULT_BASE_URL: &str = "https://www.sakugabooru.com";

/// Client for one booru instance.
///
/// Holds the reqwest client and the retry policy applied to every request;
/// the per-request timeout lives on the HTTP client and is independent of
/// the retry budget.
#[derive(Debug, Clone)]
pub struct SakugaClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl SakugaClient {
    pub fn new(cfg: &Cfg) -> Result<Self> {
        let http_config = cfg.http.clone().unwrap_or_default();
        let retry = cfg.retry.clone().unwrap_or_default();
        let client = Self::build_http_client(&http_config)?;
        let base_url = cfg
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        info!("Initialized HTTP client for {}", base_url);

        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    fn build_http_client(http_config: &HttpConfig) -> Result<Client> {
        let client = Client::builder()
            .user_agent(
                http_config
                    .user_agent
                    .as_deref()
                    .unwrap_or(crate::USER_AGENT),
            )
            .timeout(Duration::from_secs(http_config.timeout_secs.unwrap_or(10)))
            .connect_timeout(Duration::from_secs(
                http_config.connect_timeout_secs.unwrap_or(10),
            ))
            .build()?;

        Ok(client)
    }

    /// URL of a post's show page.
    pub fn post_url(&self, post_id: u64) -> String {
        format!("{}/post/show/{}", self.base_url, post_id)
    }

    /// Fetch a page, retrying transient transport failures.
    ///
    /// Returns the body together with the final URL after redirects. A
    /// non-success status surfaces immediately as [`Error::Status`].
    pub async fn fetch_page(&self, url: &str) -> Result<(String, String)> {
        with_retry(&self.retry, || async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Status {
                    status,
                    url: response.url().to_string(),
                });
            }

            let final_url = response.url().to_string();
            let body = response.text().await?;
            Ok((body, final_url))
        })
        .await
    }

    /// Download a binary resource to `dest`, retrying transient failures.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        with_retry(&self.retry, || async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Status {
                    status,
                    url: response.url().to_string(),
                });
            }

            let bytes = response.bytes().await?;
            fs::write(dest, &bytes).await?;
            Ok(())
        })
        .await
    }
}

/// Run `operation`, retrying transient errors with exponential backoff.
///
/// The delay doubles from `base_delay` up to `max_delay`; once the total
/// elapsed time reaches `budget`, the last error is returned unmodified.
/// Errors that are not transient return immediately.
pub async fn with_retry<T, F, Fut>(retry: &RetryConfig, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let mut delay = retry.base_delay();

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && started.elapsed() < retry.budget() => {
                debug!("transient error, retrying in {:?}: {}", delay, e);
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(retry.max_delay());
            }
            Err(e) => return Err(e),
        }
    }
}
