//! denysync Client - HTTP clients for external services
//!
//! This crate provides the network side of a reconciliation run:
//!
//! - [`nextdns`] - the NextDNS denylist API (read + bulk add/remove)
//! - [`sources`] - plain downloads of blocklist sources
//! - [`wire`] - the denylist API's JSON payload shapes
//!
//! Both clients implement the seams defined in `denysync_core::store`, so the
//! reconciliation logic never sees reqwest directly.

pub mod nextdns;
pub mod sources;
pub mod wire;

// Re-export main client types
pub use nextdns::NextDnsClient;
pub use sources::HttpSourceFetcher;
