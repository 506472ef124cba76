//! Reconciliation driver.
//!
//! A run moves through a fixed sequence of phases:
//!
//! 1. collect the desired set (abort if it is empty)
//! 2. read the current denylist (abort on failure)
//! 3. compute the delta
//! 4. stop early if there is nothing to do
//! 5. apply additions, then removals
//!
//! The two abort paths surface as [`AppError::EmptyDesiredSet`] and
//! [`AppError::BaselineRead`]. Chunk failures during step 5 do not fail the run.

use tracing::{error, info};

use crate::batch::{Action, ApplySummary, BatchApplier};
use crate::config::SyncConfig;
use crate::delta::{diff, Delta};
use crate::error::AppError;
use crate::models::DomainSet;
use crate::sources::collect_desired;
use crate::store::{DenylistStore, SourceFetcher};

/// Successful end state of a reconciliation run.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// Desired and current sets already matched; nothing was submitted.
    UpToDate,
    /// Every chunk was attempted. Some may have failed.
    Completed {
        added: ApplySummary,
        removed: ApplySummary,
    },
}

impl ReconcileOutcome {
    /// Returns the number of chunks that failed across both phases.
    pub fn failed_chunks(&self) -> usize {
        match self {
            ReconcileOutcome::UpToDate => 0,
            ReconcileOutcome::Completed { added, removed } => {
                added.failed_chunks() + removed.failed_chunks()
            }
        }
    }
}

/// Drives a single stateless reconciliation.
pub struct Reconciler<'a> {
    store: &'a dyn DenylistStore,
    fetcher: &'a dyn SourceFetcher,
    config: &'a SyncConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        store: &'a dyn DenylistStore,
        fetcher: &'a dyn SourceFetcher,
        config: &'a SyncConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            config,
        }
    }

    /// Builds the desired set, refusing to continue if it is empty.
    pub async fn collect(&self, sources: &[String]) -> Result<DomainSet, AppError> {
        let summary = collect_desired(self.fetcher, sources, self.config.source_concurrency).await;
        if summary.desired.is_empty() {
            error!(
                "No domains collected from {} source(s); aborting before any change",
                sources.len()
            );
            return Err(AppError::EmptyDesiredSet);
        }
        Ok(summary.desired)
    }

    async fn read_current(&self) -> Result<DomainSet, AppError> {
        info!("Fetching current denylist...");
        match self.store.fetch_entries().await {
            Ok(current) => {
                info!("Found {} domains on the denylist", current.len());
                Ok(current)
            }
            Err(e) => {
                error!("Failed to read current denylist: {}", e);
                Err(match e {
                    AppError::BaselineRead { .. } => e,
                    other => AppError::BaselineRead {
                        status: other.status_code(),
                        reason: other.to_string(),
                    },
                })
            }
        }
    }

    /// Computes the delta without applying it.
    pub async fn plan(&self, sources: &[String]) -> Result<Delta, AppError> {
        let desired = self.collect(sources).await?;
        let current = self.read_current().await?;
        let delta = diff(&desired, &current);
        info!(
            "Plan: {} to add, {} to remove",
            delta.to_add.len(),
            delta.to_remove.len()
        );
        Ok(delta)
    }

    /// Runs a full reconciliation.
    pub async fn run(&self, sources: &[String]) -> Result<ReconcileOutcome, AppError> {
        let delta = self.plan(sources).await?;
        if delta.is_empty() {
            info!("Denylist is up to date; no changes needed");
            return Ok(ReconcileOutcome::UpToDate);
        }

        let applier = BatchApplier::new(self.store, self.config);
        let added = applier.apply(&delta.to_add, Action::Add).await;
        let removed = applier.apply(&delta.to_remove, Action::Remove).await;

        info!(
            "Reconciliation complete: {} added, {} removed, {} chunk(s) failed",
            added.applied_domains(),
            removed.applied_domains(),
            added.failed_chunks() + removed.failed_chunks()
        );

        Ok(ReconcileOutcome::Completed { added, removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::tests::{domains, RecordingStore};
    use crate::models::DomainName;
    use crate::sources::tests::StaticFetcher;
    use std::collections::HashSet;
    use std::time::Duration;

    fn set(names: &[&str]) -> DomainSet {
        names.iter().filter_map(|n| DomainName::parse(n)).collect()
    }

    fn config(chunk_size: usize) -> SyncConfig {
        SyncConfig {
            chunk_size,
            chunk_pause: Duration::ZERO,
            source_concurrency: 2,
        }
    }

    fn sources() -> Vec<String> {
        vec!["https://lists/a".to_string(), "https://lists/b".to_string()]
    }

    #[tokio::test]
    async fn test_run_adds_and_removes() {
        let store = RecordingStore {
            entries: set(&["b.com", "c.com"]),
            ..Default::default()
        };
        let fetcher = StaticFetcher::with(&[
            ("https://lists/a", "0.0.0.0 a.com\n"),
            ("https://lists/b", "b.com\n"),
        ]);
        let config = config(10);

        let outcome = Reconciler::new(&store, &fetcher, &config)
            .run(&sources())
            .await
            .unwrap();

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        let a = DomainName::parse("a.com").unwrap();
        let c = DomainName::parse("c.com").unwrap();
        assert_eq!(calls[0], (Action::Add, vec![a]));
        assert_eq!(calls[1], (Action::Remove, vec![c]));
        assert!(matches!(outcome, ReconcileOutcome::Completed { .. }));
        assert_eq!(outcome.failed_chunks(), 0);
    }

    #[tokio::test]
    async fn test_run_up_to_date() {
        let store = RecordingStore {
            entries: set(&["a.com", "b.com"]),
            ..Default::default()
        };
        let fetcher = StaticFetcher::with(&[
            ("https://lists/a", "a.com\n"),
            ("https://lists/b", "b.com\n"),
        ]);
        let config = config(10);

        let outcome = Reconciler::new(&store, &fetcher, &config)
            .run(&sources())
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::UpToDate));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_aborts_on_empty_desired() {
        let store = RecordingStore {
            entries: set(&["a.com", "b.com"]),
            ..Default::default()
        };
        // Every source fails.
        let fetcher = StaticFetcher::default();
        let config = config(10);

        let result = Reconciler::new(&store, &fetcher, &config)
            .run(&sources())
            .await;

        assert!(matches!(result, Err(AppError::EmptyDesiredSet)));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_aborts_on_baseline_failure() {
        let store = RecordingStore {
            fail_read: true,
            ..Default::default()
        };
        let fetcher = StaticFetcher::with(&[("https://lists/a", "a.com\n")]);
        let config = config(10);

        let result = Reconciler::new(&store, &fetcher, &config)
            .run(&sources())
            .await;

        match result {
            Err(AppError::BaselineRead { status, reason }) => {
                assert_eq!(status, None);
                assert!(reason.contains("connection refused"));
            }
            other => panic!("Expected BaselineRead, got {:?}", other),
        }
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_completes_despite_failed_chunk() {
        let store = RecordingStore {
            failing_calls: HashSet::from([1]),
            ..Default::default()
        };
        let desired: String = domains(6)
            .iter()
            .map(|d| format!("0.0.0.0 {}\n", d))
            .collect();
        let fetcher = StaticFetcher::with(&[("https://lists/a", desired.as_str())]);
        let config = config(2);

        let outcome = Reconciler::new(&store, &fetcher, &config)
            .run(&sources())
            .await
            .unwrap();

        assert_eq!(store.call_count(), 3);
        match &outcome {
            ReconcileOutcome::Completed { added, removed } => {
                assert_eq!(added.succeeded_chunks(), 2);
                assert_eq!(added.failed_chunks(), 1);
                assert_eq!(removed.total_chunks(), 0);
            }
            ReconcileOutcome::UpToDate => panic!("Expected Completed"),
        }
        assert_eq!(outcome.failed_chunks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_pauses_between_add_and_remove_phases() {
        let store = RecordingStore {
            entries: set(&["b.com"]),
            ..Default::default()
        };
        let fetcher = StaticFetcher::with(&[("https://lists/a", "a.com\n")]);
        let config = SyncConfig {
            chunk_size: 1,
            chunk_pause: Duration::from_millis(800),
            source_concurrency: 1,
        };

        let started = tokio::time::Instant::now();
        Reconciler::new(&store, &fetcher, &config)
            .run(&sources())
            .await
            .unwrap();

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, Action::Add);
        assert_eq!(calls[1].0, Action::Remove);
        assert!(started.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_plan_does_not_mutate() {
        let store = RecordingStore {
            entries: set(&["b.com", "c.com"]),
            ..Default::default()
        };
        let fetcher = StaticFetcher::with(&[("https://lists/a", "a.com\nb.com\n")]);
        let config = config(10);

        let delta = Reconciler::new(&store, &fetcher, &config)
            .plan(&sources())
            .await
            .unwrap();

        assert_eq!(delta.to_add, set(&["a.com"]));
        assert_eq!(delta.to_remove, set(&["c.com"]));
        assert_eq!(store.call_count(), 0);
    }
}
