use async_trait::async_trait;
use denysync_core::config::{HttpConfig, RemoteConfig};
use denysync_core::error::AppError;
use denysync_core::{Action, DenylistStore, DomainName, DomainSet};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

use crate::wire::{self, DenylistEnvelope};

const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the NextDNS denylist of a single profile.
///
/// All requests carry the `X-Api-Key` header. Reads are retried on transient
/// failures; mutations are sent exactly once.
///
/// # Examples
///
/// ```no_run
/// use denysync_client::NextDnsClient;
/// use denysync_core::config::{HttpConfig, RemoteConfig, DEFAULT_API_URL};
/// use denysync_core::DenylistStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let remote = RemoteConfig::new(Some("key".into()), Some("abc123".into()), DEFAULT_API_URL)?;
/// let client = NextDnsClient::new(&remote, &HttpConfig::default())?;
/// let entries = client.fetch_entries().await?;
/// println!("{} domains on the denylist", entries.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NextDnsClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl NextDnsClient {
    /// Creates a client for the denylist of `remote.profile_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the API URL or profile id do not form a valid URL.
    /// Returns `AppError::ConfigError` if the API key cannot be sent as a header.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(remote: &RemoteConfig, http: &HttpConfig) -> Result<Self, AppError> {
        let endpoint = denylist_endpoint(&remote.api_url, &remote.profile_id)?;

        let mut api_key = HeaderValue::from_str(&remote.api_key)
            .map_err(|_| AppError::ConfigError("API key is not a valid header value".into()))?;
        api_key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);

        let client = Client::builder()
            .user_agent(concat!("denysync/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(http.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            timeout: http.timeout,
            max_retries: http.max_retries.max(1),
            retry_base_delay: http.retry_base_delay,
        })
    }

    /// The denylist resource URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Makes an HTTP GET request with automatic retry on transient failures.
    ///
    /// Retries on:
    /// - Network errors
    /// - Timeouts
    /// - Server errors (5xx)
    /// - Rate limiting (429), with exponential backoff
    async fn request_with_retry(&self, url: &Url) -> Result<reqwest::Response, AppError> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.client.get(url.clone()).send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        return Ok(resp);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(AppError::RateLimitExceeded);
                        if attempt < self.max_retries {
                            let backoff = 2_u32.saturating_pow(attempt);
                            sleep(self.retry_base_delay.saturating_mul(backoff)).await;
                            continue;
                        }
                        break;
                    }

                    if status.is_server_error() {
                        last_error = Some(AppError::UnexpectedStatus {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                        if attempt < self.max_retries {
                            sleep(self.retry_base_delay.saturating_mul(attempt)).await;
                            continue;
                        }
                        break;
                    }

                    // Client error (4xx except 429) - don't retry
                    return Err(AppError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                Err(e) => {
                    let err = self.map_transport_error(e);
                    if attempt < self.max_retries && err.is_retryable() {
                        debug!(attempt, "Retrying GET {} after: {}", url, err);
                        last_error = Some(err);
                        sleep(self.retry_base_delay.saturating_mul(attempt)).await;
                        continue;
                    }
                    return Err(err);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AppError::ClientError("no request was sent".to_string())))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {}", e))
        } else {
            AppError::ClientError(e.to_string())
        }
    }
}

#[async_trait]
impl DenylistStore for NextDnsClient {
    async fn fetch_entries(&self) -> Result<DomainSet, AppError> {
        let body = self
            .request_with_retry(&self.endpoint)
            .await
            .map_err(baseline_error)?
            .text()
            .await
            .map_err(|e| baseline_error(self.map_transport_error(e)))?;

        let envelope: DenylistEnvelope = serde_json::from_str(&body)
            .map_err(|e| baseline_error(AppError::from(e)))?;

        Ok(wire::into_domain_set(envelope))
    }

    async fn submit(&self, action: Action, chunk: &[DomainName]) -> Result<(), AppError> {
        let body = wire::mutation_body(action, chunk);
        debug!(%action, domains = chunk.len(), "Submitting chunk");

        let response = self
            .client
            .request(wire::method_for(action), self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::MutationRejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn baseline_error(e: AppError) -> AppError {
    AppError::BaselineRead {
        status: e.status_code(),
        reason: e.to_string(),
    }
}

/// Builds `<api_url>/profiles/<profile_id>/denylist`.
fn denylist_endpoint(api_url: &str, profile_id: &str) -> Result<Url, AppError> {
    let mut base =
        Url::parse(api_url).map_err(|e| AppError::InvalidUrl(format!("{}: {}", api_url, e)))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(&format!("profiles/{}/denylist", profile_id))
        .map_err(|e| AppError::InvalidUrl(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use denysync_core::config::DEFAULT_API_URL;

    fn remote(api_url: &str) -> RemoteConfig {
        RemoteConfig::new(Some("secret".into()), Some("abc123".into()), api_url).unwrap()
    }

    #[test]
    fn test_new_with_default_url() {
        let client = NextDnsClient::new(&remote(DEFAULT_API_URL), &HttpConfig::default()).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://api.nextdns.io/profiles/abc123/denylist"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = denylist_endpoint("http://localhost:8080/api", "p1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/profiles/p1/denylist");
    }

    #[test]
    fn test_new_with_invalid_url() {
        let result = NextDnsClient::new(&remote("not-a-valid-url"), &HttpConfig::default());
        assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    }

    #[test]
    fn test_new_rejects_unprintable_key() {
        let remote = RemoteConfig {
            api_key: "bad\nkey".to_string(),
            profile_id: "abc123".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        };
        let result = NextDnsClient::new(&remote, &HttpConfig::default());
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
