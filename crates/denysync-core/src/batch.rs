//! Chunked application of denylist mutations.
//!
//! Chunks are submitted one after another with a pause in between. The pause
//! also separates the last chunk of one `apply` call from the first chunk of
//! the next on the same applier. A failed chunk is recorded and skipped; it
//! never stops the chunks after it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::models::{DomainName, DomainSet};
use crate::store::DenylistStore;

/// Kind of mutation applied to a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Put the domains on the denylist, marked active.
    Add,
    /// Take the domains off the denylist.
    Remove,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Add => f.pad("add"),
            Action::Remove => f.pad("remove"),
        }
    }
}

/// Splits a set into ordered chunks of at most `size` domains.
///
/// A `size` of zero is treated as one.
///
/// # Examples
///
/// ```
/// use denysync_core::{chunk, parse_source};
///
/// let set = parse_source("a.com\nb.com\nc.com");
/// let chunks = chunk(&set, 2);
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[1].len(), 1);
/// ```
pub fn chunk(set: &DomainSet, size: usize) -> Vec<Vec<DomainName>> {
    let all: Vec<DomainName> = set.iter().cloned().collect();
    all.chunks(size.max(1)).map(<[DomainName]>::to_vec).collect()
}

/// Result of submitting a single chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    Succeeded {
        index: usize,
        domains: usize,
    },
    Failed {
        index: usize,
        domains: usize,
        /// HTTP status, when the service answered at all.
        status: Option<u16>,
        message: String,
    },
}

impl ChunkOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ChunkOutcome::Succeeded { .. })
    }

    pub fn domains(&self) -> usize {
        match self {
            ChunkOutcome::Succeeded { domains, .. } | ChunkOutcome::Failed { domains, .. } => {
                *domains
            }
        }
    }
}

/// Aggregated outcomes of one `apply` call.
#[derive(Debug, Clone)]
pub struct ApplySummary {
    pub action: Action,
    pub outcomes: Vec<ChunkOutcome>,
}

impl ApplySummary {
    /// Creates a new empty summary.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ChunkOutcome) {
        self.outcomes.push(outcome);
    }

    /// Returns the total number of submitted chunks.
    pub fn total_chunks(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded_chunks(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_chunks(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    /// Returns the number of domains in chunks that succeeded.
    pub fn applied_domains(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(ChunkOutcome::domains)
            .sum()
    }

    /// Returns the number of domains in chunks that failed.
    pub fn failed_domains(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(ChunkOutcome::domains)
            .sum()
    }

    /// Returns true if every chunk succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed_chunks() == 0
    }
}

/// Submits domain sets to a [`DenylistStore`] in bounded chunks.
///
/// Every submission after the applier's first is preceded by the pause.
pub struct BatchApplier<'a> {
    store: &'a dyn DenylistStore,
    chunk_size: usize,
    pause: Duration,
    submitted: AtomicBool,
}

impl<'a> BatchApplier<'a> {
    pub fn new(store: &'a dyn DenylistStore, config: &SyncConfig) -> Self {
        Self {
            store,
            chunk_size: config.chunk_size,
            pause: config.chunk_pause,
            submitted: AtomicBool::new(false),
        }
    }

    /// Applies `action` to every domain in `set`.
    ///
    /// An empty set makes no calls and returns an empty summary.
    pub async fn apply(&self, set: &DomainSet, action: Action) -> ApplySummary {
        let mut summary = ApplySummary::new(action);
        if set.is_empty() {
            return summary;
        }

        let chunks = chunk(set, self.chunk_size);
        let total = chunks.len();
        info!(
            "Applying {} to {} domains in {} chunk(s)",
            action,
            set.len(),
            total
        );

        for (i, batch) in chunks.iter().enumerate() {
            if self.submitted.swap(true, Ordering::Relaxed) && !self.pause.is_zero() {
                sleep(self.pause).await;
            }

            let outcome = match self.store.submit(action, batch).await {
                Ok(()) => {
                    info!("[{}/{}] {} ok: {} domains", i + 1, total, action, batch.len());
                    ChunkOutcome::Succeeded {
                        index: i,
                        domains: batch.len(),
                    }
                }
                Err(e) => {
                    warn!(
                        chunk = i + 1,
                        total,
                        status = ?e.status_code(),
                        "{} failed for {} domains: {}",
                        action,
                        batch.len(),
                        e
                    );
                    ChunkOutcome::Failed {
                        index: i,
                        domains: batch.len(),
                        status: e.status_code(),
                        message: e.to_string(),
                    }
                }
            };
            summary.record(outcome);
        }

        if summary.is_clean() {
            info!(
                "{} complete: {} chunk(s), {} domains applied",
                action,
                summary.total_chunks(),
                summary.applied_domains()
            );
        } else {
            warn!(
                "{} complete: {} chunk(s) succeeded, {} failed ({} domains applied, {} not applied)",
                action,
                summary.succeeded_chunks(),
                summary.failed_chunks(),
                summary.applied_domains(),
                summary.failed_domains()
            );
        }

        summary
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory store that records every submission.
    #[derive(Default)]
    pub(crate) struct RecordingStore {
        pub entries: DomainSet,
        pub fail_read: bool,
        /// Zero-based submission numbers that should be rejected with HTTP 500.
        pub failing_calls: HashSet<usize>,
        pub calls: Mutex<Vec<(Action, Vec<DomainName>)>>,
    }

    impl RecordingStore {
        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DenylistStore for RecordingStore {
        async fn fetch_entries(&self) -> Result<DomainSet, AppError> {
            if self.fail_read {
                return Err(AppError::NetworkError("connection refused".to_string()));
            }
            Ok(self.entries.clone())
        }

        async fn submit(&self, action: Action, chunk: &[DomainName]) -> Result<(), AppError> {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.len();
            calls.push((action, chunk.to_vec()));
            if self.failing_calls.contains(&n) {
                return Err(AppError::MutationRejected {
                    status: 500,
                    body: "internal error".to_string(),
                });
            }
            Ok(())
        }
    }

    pub(crate) fn domains(n: usize) -> DomainSet {
        (0..n)
            .filter_map(|i| DomainName::parse(&format!("d{:03}.example.com", i)))
            .collect()
    }

    fn config(chunk_size: usize) -> SyncConfig {
        SyncConfig {
            chunk_size,
            chunk_pause: Duration::ZERO,
            source_concurrency: 1,
        }
    }

    #[test]
    fn test_chunk_partitions_set() {
        for (n, size) in [(0, 3), (1, 3), (3, 3), (7, 3), (10, 1), (5, 50)] {
            let set = domains(n);
            let chunks = chunk(&set, size);
            assert_eq!(chunks.len(), n.div_ceil(size), "n={} size={}", n, size);
            assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= size));

            let flattened: DomainSet = chunks.iter().flatten().cloned().collect();
            let count: usize = chunks.iter().map(Vec::len).sum();
            assert_eq!(flattened, set);
            assert_eq!(count, n);
        }
    }

    #[test]
    fn test_chunk_zero_size_is_one() {
        let chunks = chunk(&domains(2), 0);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_apply_summary_counts() {
        let mut summary = ApplySummary::new(Action::Add);
        summary.record(ChunkOutcome::Succeeded {
            index: 0,
            domains: 3,
        });
        summary.record(ChunkOutcome::Failed {
            index: 1,
            domains: 2,
            status: Some(500),
            message: "boom".into(),
        });

        assert_eq!(summary.total_chunks(), 2);
        assert_eq!(summary.succeeded_chunks(), 1);
        assert_eq!(summary.failed_chunks(), 1);
        assert_eq!(summary.applied_domains(), 3);
        assert_eq!(summary.failed_domains(), 2);
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn test_apply_empty_set_is_noop() {
        let store = RecordingStore::default();
        let applier = BatchApplier::new(&store, &config(2));

        let summary = applier.apply(&DomainSet::new(), Action::Remove).await;

        assert_eq!(summary.total_chunks(), 0);
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_apply_submits_every_chunk() {
        let store = RecordingStore::default();
        let applier = BatchApplier::new(&store, &config(2));

        let summary = applier.apply(&domains(5), Action::Add).await;

        assert_eq!(summary.total_chunks(), 3);
        assert!(summary.is_clean());
        assert_eq!(summary.applied_domains(), 5);

        let calls = store.calls.lock().unwrap();
        assert!(calls.iter().all(|(a, _)| *a == Action::Add));
        assert_eq!(
            calls.iter().map(|(_, c)| c.len()).collect::<Vec<_>>(),
            vec![2, 2, 1]
        );
    }

    #[tokio::test]
    async fn test_apply_isolates_failed_chunk() {
        let store = RecordingStore {
            failing_calls: HashSet::from([1]),
            ..Default::default()
        };
        let applier = BatchApplier::new(&store, &config(2));

        let summary = applier.apply(&domains(6), Action::Remove).await;

        assert_eq!(store.call_count(), 3);
        assert_eq!(summary.succeeded_chunks(), 2);
        assert_eq!(summary.failed_chunks(), 1);
        assert_eq!(
            summary.outcomes[1],
            ChunkOutcome::Failed {
                index: 1,
                domains: 2,
                status: Some(500),
                message: "Mutation rejected with HTTP 500: internal error".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_pauses_between_chunks() {
        let store = RecordingStore::default();
        let config = SyncConfig {
            chunk_size: 1,
            chunk_pause: Duration::from_secs(2),
            source_concurrency: 1,
        };
        let applier = BatchApplier::new(&store, &config);

        let started = tokio::time::Instant::now();
        applier.apply(&domains(3), Action::Add).await;

        // Two gaps between three chunks, none after the last.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_pauses_across_calls() {
        let store = RecordingStore::default();
        let config = SyncConfig {
            chunk_size: 1,
            chunk_pause: Duration::from_millis(800),
            source_concurrency: 1,
        };
        let applier = BatchApplier::new(&store, &config);

        let started = tokio::time::Instant::now();
        applier.apply(&domains(1), Action::Add).await;
        let after_add = started.elapsed();
        applier.apply(&domains(1), Action::Remove).await;
        let gap = started.elapsed() - after_add;

        assert_eq!(after_add, Duration::ZERO);
        assert!(gap >= Duration::from_millis(800));
        assert_eq!(store.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_empty_set_does_not_consume_first_slot() {
        let store = RecordingStore::default();
        let config = SyncConfig {
            chunk_size: 1,
            chunk_pause: Duration::from_secs(1),
            source_concurrency: 1,
        };
        let applier = BatchApplier::new(&store, &config);

        let started = tokio::time::Instant::now();
        applier.apply(&DomainSet::new(), Action::Add).await;
        applier.apply(&domains(1), Action::Remove).await;

        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
