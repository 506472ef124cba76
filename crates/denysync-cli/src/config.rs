use clap::{Parser, Subcommand};
use denysync_core::config::{HttpSettings, SyncSettings, DEFAULT_API_URL};
use std::path::PathBuf;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "denysync")]
#[command(
    author,
    version,
    about = "Keep a NextDNS denylist in sync with public blocklists"
)]
#[command(after_help = "Examples:
  denysync sync
  denysync --sources lists.txt sync --dry-run
  denysync plan
  denysync export > desired.txt")]
pub struct Config {
    /// NextDNS API key
    #[arg(long, env = "NEXTDNS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// NextDNS profile whose denylist is managed
    #[arg(long, env = "NEXTDNS_PROFILE_ID")]
    pub profile_id: Option<String>,

    /// Base URL of the NextDNS API
    #[arg(long, env = "NEXTDNS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// File listing blocklist URLs, one per line
    #[arg(short, long, env = "DENYSYNC_SOURCES", default_value = "blocklists.txt")]
    pub sources: PathBuf,

    /// Custom path to the settings file (config.toml)
    #[arg(long, env = "DENYSYNC_SETTINGS", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Maximum domains per add/remove request
    #[arg(long, env = "DENYSYNC_CHUNK_SIZE")]
    pub chunk_size: Option<usize>,

    /// Pause between add/remove requests, in milliseconds
    #[arg(long, env = "DENYSYNC_CHUNK_PAUSE_MS")]
    pub chunk_pause_ms: Option<u64>,

    /// Number of blocklists downloaded in parallel
    #[arg(long, env = "DENYSYNC_SOURCE_CONCURRENCY")]
    pub source_concurrency: Option<usize>,

    /// Timeout for every HTTP request, in seconds
    #[arg(long, env = "DENYSYNC_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Sync tuning given on the command line or in the environment.
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            chunk_size: self.chunk_size,
            chunk_pause_ms: self.chunk_pause_ms,
            source_concurrency: self.source_concurrency,
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout_secs: self.timeout_secs,
            ..Default::default()
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile the denylist with the configured blocklists
    #[command(after_help = "Example: denysync sync --dry-run")]
    Sync {
        /// Compute and print the changes without applying them
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the domains that would be added (+) and removed (-)
    Plan,
    /// Print the desired set, one domain per line (no credentials needed)
    Export,
}
