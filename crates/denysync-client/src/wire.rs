//! JSON payloads exchanged with the denylist API.
//!
//! This is the only module that knows the remote payload shape. Reads come back
//! wrapped in a `data` envelope; mutations are bare JSON arrays.
//!
//! ```json
//! GET    -> {"data": [{"id": "ads.example.com", "active": true}]}
//! POST   <- [{"id": "ads.example.com", "active": true}]
//! DELETE <- [{"id": "ads.example.com"}]
//! ```

use denysync_core::{Action, DomainName, DomainSet};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Response body of a denylist read.
#[derive(Deserialize, Debug)]
pub struct DenylistEnvelope {
    pub data: Vec<DenylistEntry>,
}

/// One entry as returned by the API.
///
/// Older API revisions named the key `domain`; both are accepted.
#[derive(Deserialize, Debug, Clone)]
pub struct DenylistEntry {
    #[serde(alias = "domain")]
    pub id: String,
    #[serde(default)]
    pub active: Option<bool>,
}

/// One entry of a mutation body.
#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum MutationEntry<'a> {
    Add { id: &'a str, active: bool },
    Remove { id: &'a str },
}

/// HTTP verb used for `action`.
pub fn method_for(action: Action) -> Method {
    match action {
        Action::Add => Method::POST,
        Action::Remove => Method::DELETE,
    }
}

/// Request body for applying `action` to `chunk`.
pub fn mutation_body(action: Action, chunk: &[DomainName]) -> Vec<MutationEntry<'_>> {
    chunk
        .iter()
        .map(|domain| match action {
            Action::Add => MutationEntry::Add {
                id: domain.as_str(),
                active: true,
            },
            Action::Remove => MutationEntry::Remove {
                id: domain.as_str(),
            },
        })
        .collect()
}

/// Extracts the entry keys of a read response.
///
/// Keys that are not usable domain names are dropped.
pub fn into_domain_set(envelope: DenylistEnvelope) -> DomainSet {
    envelope
        .data
        .into_iter()
        .filter_map(|entry| {
            let parsed = DomainName::parse(&entry.id);
            if parsed.is_none() {
                debug!(id = %entry.id, "Ignoring unusable denylist entry");
            }
            parsed
        })
        .collect()
}
