//! Blocklist and source-registry parsing.
//!
//! Two list formats are accepted, mixed freely within one file:
//!
//! ```text
//! # plain domain list
//! ads.example.com
//!
//! # hosts file
//! 0.0.0.0 tracker.example.net
//! 127.0.0.1 telemetry.example.org  # trailing comment
//! ```

use crate::models::{DomainName, DomainSet};

const COMMENT_MARKER: char = '#';

/// Extracts the candidate domain from one list line.
///
/// Hosts records (`<address> <name...>`) yield their last token; single-token
/// lines yield the token itself. A bare address therefore comes back as a
/// domain unless it is one of the null-route sentinels.
///
/// # Examples
///
/// ```
/// use denysync_core::parse_line;
///
/// assert_eq!(parse_line("0.0.0.0 ads.example.com").unwrap().as_str(), "ads.example.com");
/// assert_eq!(parse_line("plain.example.com").unwrap().as_str(), "plain.example.com");
/// assert!(parse_line("# comment").is_none());
/// ```
pub fn parse_line(line: &str) -> Option<DomainName> {
    let line = line.trim();
    let content = match line.find(COMMENT_MARKER) {
        Some(idx) => line[..idx].trim(),
        None => line,
    };
    if content.is_empty() {
        return None;
    }

    let candidate = content.split_whitespace().last()?;
    DomainName::parse(candidate)
}

/// Parses the raw text of one blocklist source into a set of domains.
pub fn parse_source(text: &str) -> DomainSet {
    text.lines().filter_map(parse_line).collect()
}

/// Parses the source registry: one URL per line, blanks and `#` lines ignored.
///
/// Order is preserved and repeated URLs are dropped after their first occurrence.
pub fn parse_registry(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }
        if !urls.iter().any(|u| u == line) {
            urls.push(line.to_string());
        }
    }
    urls
}
