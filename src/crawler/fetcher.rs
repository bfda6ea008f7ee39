//! HTTP fetch primitive
//!
//! Every request in a run goes through [`Fetcher::fetch`], which handles:
//! - the shared HTTP client (proxy, TLS verification, timeouts)
//! - HTTP 429 with `Retry-After` or exponential backoff
//! - transport errors with exponential backoff and jitter
//! - the polite delay after a successful request

use crate::config::{ProxySettings, ScraperSettings};
use crate::logging::SecretMask;
use crate::{FetchError, ScoutError};
use rand::Rng;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;

/// User agent sent with every request
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Endpoint used by the proxy connectivity check
pub const IP_CHECK_URL: &str = "https://ipapi.co/json/";

/// Body and status of a completed (non-429) response
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub body: String,
    pub status: u16,
}

impl FetchResponse {
    /// True for a 200 response with a non-empty body
    pub fn is_usable(&self) -> bool {
        self.status == StatusCode::OK.as_u16() && !self.body.is_empty()
    }
}

/// Outcome of a successful proxy connectivity check
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyCheck {
    pub ip: String,
    pub country: Option<String>,
}

/// Builds the HTTP client shared by every fetch of a run
///
/// The proxy is only installed when both credentials are present; the
/// credentials travel as proxy basic auth, never inside a URL.
///
/// # Example
///
/// ```no_run
/// use part_scout::config::Settings;
/// use part_scout::crawler::build_http_client;
///
/// let settings = Settings::default();
/// let client = build_http_client(&settings.scraper, &settings.proxy).unwrap();
/// ```
pub fn build_http_client(
    scraper: &ScraperSettings,
    proxy: &ProxySettings,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(scraper.timeout_secs))
        .connect_timeout(Duration::from_secs(scraper.connect_timeout_secs))
        .danger_accept_invalid_certs(!scraper.verify_ssl)
        .gzip(true)
        .brotli(true);

    match proxy.credentials() {
        Some((username, password)) if proxy.is_enabled() => {
            let upstream = Proxy::all(format!("http://{}", proxy.host.trim()))?
                .basic_auth(username, password);
            builder = builder.proxy(upstream);
        }
        _ => {
            tracing::warn!("Proxy credentials not configured; requests go out directly");
        }
    }

    builder.build()
}

/// Retrying HTTP GET shared by every pipeline invocation
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    polite_delay: Duration,
    backoff_unit: Duration,
    mask: SecretMask,
}

impl Fetcher {
    /// Creates a fetcher around an existing client
    pub fn new(client: Client, settings: &ScraperSettings, mask: SecretMask) -> Self {
        Self {
            client,
            max_retries: settings.max_retries.max(1),
            polite_delay: settings.request_delay(),
            backoff_unit: Duration::from_secs(1),
            mask,
        }
    }

    /// Builds the client from settings and wraps it
    pub fn from_settings(
        scraper: &ScraperSettings,
        proxy: &ProxySettings,
        mask: SecretMask,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(scraper, proxy)?;
        Ok(Self::new(client, scraper, mask))
    }

    /// Scales the exponential backoff (one second by default)
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fetches a URL, retrying on HTTP 429 and transport errors
    ///
    /// Any response other than 429 is returned as-is, whatever its status;
    /// deciding what a 404 or 500 means is up to the caller.
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResponse)` - A non-429 response was received
    /// * `Err(ScoutError::Fetch)` - Every attempt was rate limited or failed in transport
    /// * `Err(ScoutError::Reqwest)` - The request could not be built (e.g. malformed URL)
    pub async fn fetch(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<FetchResponse, ScoutError> {
        for attempt in 0..self.max_retries {
            let is_last = attempt + 1 == self.max_retries;

            let mut request = self.client.get(url);
            if !params.is_empty() {
                request = request.query(params);
            }

            let wait = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|value| value.to_str().ok())
                        .and_then(parse_retry_after);

                    match response.text().await {
                        Ok(body) if status != StatusCode::TOO_MANY_REQUESTS => {
                            if !self.polite_delay.is_zero() {
                                tokio::time::sleep(self.polite_delay).await;
                            }
                            return Ok(FetchResponse {
                                body,
                                status: status.as_u16(),
                            });
                        }
                        Ok(_) => {
                            let wait = retry_after
                                .unwrap_or_else(|| backoff_delay(self.backoff_unit, attempt));
                            tracing::debug!(
                                "Rate limited on {} (attempt {}/{}), waiting {:?}",
                                url,
                                attempt + 1,
                                self.max_retries,
                                wait
                            );
                            wait
                        }
                        Err(e) => {
                            tracing::warn!("HTTP error: {}", self.mask.mask(&e.to_string()));
                            backoff_delay(self.backoff_unit, attempt)
                        }
                    }
                }
                Err(e) if e.is_builder() => return Err(ScoutError::Reqwest(e)),
                Err(e) => {
                    tracing::warn!("HTTP error: {}", self.mask.mask(&e.to_string()));
                    backoff_delay(self.backoff_unit, attempt)
                }
            };

            if !is_last {
                tokio::time::sleep(wait).await;
            }
        }

        Err(FetchError {
            url: url.to_string(),
            attempts: self.max_retries,
        }
        .into())
    }

    /// Checks that requests get out through the configured client
    ///
    /// Queries an IP lookup service and reports the address seen by the
    /// outside world.
    pub async fn check_proxy(&self) -> Result<ProxyCheck, ScoutError> {
        let response = self.fetch(IP_CHECK_URL, &[]).await?;
        parse_ip_check(&response.body).ok_or_else(|| {
            FetchError {
                url: IP_CHECK_URL.to_string(),
                attempts: self.max_retries,
            }
            .into()
        })
    }
}

/// Parses a numeric `Retry-After` value (seconds)
///
/// HTTP dates and anything that is not all digits are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse::<u64>().ok().map(Duration::from_secs)
}

/// `2^attempt` units plus up to half a unit of jitter
fn backoff_delay(unit: Duration, attempt: u32) -> Duration {
    let jitter: f64 = rand::thread_rng().gen_range(0.0..0.5);
    let factor = 2f64.powi(attempt.min(16) as i32) + jitter;
    unit.mul_f64(factor)
}

fn parse_ip_check(body: &str) -> Option<ProxyCheck> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let ip = value.get("ip")?.as_str()?.to_string();
    let country = value
        .get("country_name")
        .and_then(|c| c.as_str())
        .map(str::to_string);
    Some(ProxyCheck { ip, country })
}
