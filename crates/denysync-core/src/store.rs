//! Seams between the reconciliation logic and the network.

use async_trait::async_trait;

use crate::batch::Action;
use crate::error::AppError;
use crate::models::{DomainName, DomainSet};

/// The remote denylist: one read capability, one bulk mutation capability.
#[async_trait]
pub trait DenylistStore: Send + Sync {
    /// Reads every entry currently on the denylist.
    async fn fetch_entries(&self) -> Result<DomainSet, AppError>;

    /// Applies `action` to every domain in `chunk` in a single call.
    async fn submit(&self, action: Action, chunk: &[DomainName]) -> Result<(), AppError>;
}

/// Downloads the raw text of a blocklist source.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, AppError>;
}
