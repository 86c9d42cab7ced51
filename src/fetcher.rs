//! Outbound page fetching with anti-blocking policy.

use rand::seq::SliceRandom;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::config::AmazonConfig;
use crate::error::{Result, TrackerError};

/// Wraps outbound requests with user-agent rotation and a mandatory delay
/// between successive fetches within a monitoring pass.
///
/// One instance carries the shared HTTP session state explicitly; callers
/// pass it through the pipeline instead of reaching for a global. Retry and
/// backoff policy stay with the caller: the monitoring loop treats a failed
/// fetch for one product as non-fatal and continues to the next.
pub struct FetchController {
    client: reqwest::Client,
    user_agents: Vec<String>,
    delay: Duration,
    last_fetch: Option<Instant>,
}

impl FetchController {
    pub fn new(config: &AmazonConfig, delay_between_requests_secs: u64) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.5"),
        );
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            user_agents: config.user_agents.clone(),
            delay: Duration::from_secs(delay_between_requests_secs),
            last_fetch: None,
        })
    }

    /// Fetches one page body. Non-2xx responses and transport failures both
    /// surface as a retryable `TrackerError::Fetch`.
    pub async fn fetch(&mut self, url: &str) -> Result<String> {
        self.wait_for_slot().await;

        let user_agent = self.pick_user_agent();
        debug!(url, user_agent, "fetching page");

        let result = self
            .client
            .get(url)
            .header(header::USER_AGENT, user_agent)
            .send()
            .await;

        // The delay applies to every attempt, failed ones included; a run of
        // errors must not turn into a burst against the remote host.
        self.last_fetch = Some(Instant::now());

        let response = result.map_err(|e| TrackerError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        Ok(response.text().await.map_err(|e| TrackerError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?)
    }

    /// Back-pressure against the remote site: sleep out the remainder of the
    /// configured delay since the previous fetch.
    async fn wait_for_slot(&self) {
        if let Some(last) = self.last_fetch {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                tokio::time::sleep(self.delay - elapsed).await;
            }
        }
    }

    /// Randomness lives here and nowhere else in the pipeline; extraction
    /// stays deterministic.
    fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or("pricewatch/0.1")
    }
}
