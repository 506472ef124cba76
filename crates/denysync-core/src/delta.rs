//! Set difference between the desired and current denylist.

use crate::models::DomainSet;

/// Changes needed to turn the current set into the desired set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    /// Desired but not present remotely.
    pub to_add: DomainSet,
    /// Present remotely but no longer desired.
    pub to_remove: DomainSet,
}

impl Delta {
    /// Returns true if nothing needs to change.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes `(desired \ current, current \ desired)`.
///
/// # Examples
///
/// ```
/// use denysync_core::{diff, parse_source};
///
/// let desired = parse_source("a.com\nb.com");
/// let current = parse_source("b.com\nc.com");
/// let delta = diff(&desired, &current);
///
/// assert_eq!(delta.to_add, parse_source("a.com"));
/// assert_eq!(delta.to_remove, parse_source("c.com"));
/// ```
pub fn diff(desired: &DomainSet, current: &DomainSet) -> Delta {
    Delta {
        to_add: desired.difference(current).cloned().collect(),
        to_remove: current.difference(desired).cloned().collect(),
    }
}
