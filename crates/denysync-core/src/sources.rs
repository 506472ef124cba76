//! Collection of the desired set from blocklist sources.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::models::DomainSet;
use crate::parser::parse_source;
use crate::store::SourceFetcher;

/// Result of fetching a single blocklist source.
#[derive(Debug, Clone)]
pub struct SourceReport {
    /// Source URL.
    pub url: String,
    /// Number of distinct domains parsed from this source.
    pub domains: usize,
    /// Error message if the fetch failed, None if successful.
    pub error: Option<String>,
}

impl SourceReport {
    pub fn success(url: String, domains: usize) -> Self {
        Self {
            url,
            domains,
            error: None,
        }
    }

    pub fn failure(url: String, error: String) -> Self {
        Self {
            url,
            domains: 0,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// The desired set together with per-source results.
#[derive(Debug, Clone, Default)]
pub struct CollectSummary {
    pub desired: DomainSet,
    pub reports: Vec<SourceReport>,
}

impl CollectSummary {
    /// Returns the count of sources that were fetched.
    pub fn successful_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_success()).count()
    }

    /// Returns the count of sources that could not be fetched.
    pub fn failed_count(&self) -> usize {
        self.reports.iter().filter(|r| !r.is_success()).count()
    }

    /// Returns the domain count before cross-source deduplication.
    pub fn raw_domains(&self) -> usize {
        self.reports.iter().map(|r| r.domains).sum()
    }
}

/// Fetches and parses every source, returning the union of their domains.
///
/// Sources are fetched up to `concurrency` at a time. A source that fails
/// contributes nothing and is logged; it never fails the collection.
pub async fn collect_desired(
    fetcher: &dyn SourceFetcher,
    urls: &[String],
    concurrency: usize,
) -> CollectSummary {
    let total = urls.len();
    info!("Fetching {} blocklist source(s)...", total);

    let results: Vec<(SourceReport, DomainSet)> = stream::iter(urls.iter().enumerate())
        .map(|(i, url)| async move {
            match fetcher.fetch_text(url).await {
                Ok(text) => {
                    let domains = parse_source(&text);
                    info!("[{}/{}] {} domains from {}", i + 1, total, domains.len(), url);
                    (SourceReport::success(url.clone(), domains.len()), domains)
                }
                Err(e) => {
                    warn!("[{}/{}] Skipping {}: {}", i + 1, total, url, e);
                    (
                        SourceReport::failure(url.clone(), e.to_string()),
                        DomainSet::new(),
                    )
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut summary = CollectSummary::default();
    for (report, domains) in results {
        summary.desired.extend(domains);
        summary.reports.push(report);
    }

    info!(
        "Collected {} unique domains ({} before deduplication) from {} source(s) ({} failed)",
        summary.desired.len(),
        summary.raw_domains(),
        summary.successful_count(),
        summary.failed_count()
    );

    summary
}
