//! denysync Core - Domain types, reconciliation logic, error handling, and configuration.

pub mod batch;
pub mod config;
pub mod delta;
pub mod error;
pub mod models;
pub mod parser;
pub mod sources;
pub mod store;
pub mod sync;

pub use batch::{chunk, Action, ApplySummary, BatchApplier, ChunkOutcome};
pub use config::{
    default_config_path, load_settings, HttpConfig, HttpSettings, RemoteConfig, Settings,
    SyncConfig, SyncSettings, DEFAULT_API_URL,
};
pub use delta::{diff, Delta};
pub use error::AppError;
pub use models::{DomainName, DomainSet};
pub use parser::{parse_line, parse_registry, parse_source};
pub use sources::{collect_desired, CollectSummary, SourceReport};
pub use store::{DenylistStore, SourceFetcher};
pub use sync::{ReconcileOutcome, Reconciler};
