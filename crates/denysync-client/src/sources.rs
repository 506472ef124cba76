use async_trait::async_trait;
use denysync_core::config::HttpConfig;
use denysync_core::error::AppError;
use denysync_core::SourceFetcher;
use reqwest::Client;

/// Downloads blocklist sources over plain HTTP(S).
///
/// No authentication and no retries: a source that fails is simply skipped
/// by the caller for this run.
#[derive(Clone)]
pub struct HttpSourceFetcher {
    client: Client,
}

impl HttpSourceFetcher {
    pub fn new(http: &HttpConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(concat!("denysync/", env!("CARGO_PKG_VERSION")))
            .timeout(http.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, AppError> {
        let fail = |reason: String| AppError::SourceFetch {
            url: url.to_string(),
            reason,
        };

        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                fail("request timed out".to_string())
            } else {
                fail(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status.as_u16())));
        }

        resp.text().await.map_err(|e| fail(e.to_string()))
    }
}
