use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Addresses that hosts-format lists use to null-route a name.
const NULL_ROUTES: [&str; 2] = ["0.0.0.0", "127.0.0.1"];

/// A single denylist entry key.
///
/// Guaranteed non-empty, free of whitespace, and never a null-route address.
/// Case is kept exactly as received: `Ads.Example.com` and `ads.example.com`
/// are distinct entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DomainName(String);

impl DomainName {
    /// Validates a candidate token.
    ///
    /// # Examples
    ///
    /// ```
    /// use denysync_core::DomainName;
    ///
    /// assert!(DomainName::parse("ads.example.com").is_some());
    /// assert!(DomainName::parse("0.0.0.0").is_none());
    /// assert!(DomainName::parse("two words").is_none());
    /// assert!(DomainName::parse("").is_none());
    /// ```
    pub fn parse(candidate: &str) -> Option<Self> {
        if candidate.is_empty()
            || candidate.chars().any(char::is_whitespace)
            || NULL_ROUTES.contains(&candidate)
        {
            return None;
        }
        Some(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A set of domains: the desired set, the current set, or one side of a delta.
pub type DomainSet = BTreeSet<DomainName>;
