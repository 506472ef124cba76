//! Configuration types for denysync components.
//!
//! Every component receives its configuration explicitly. Values are layered
//! in `main` as: CLI args / environment -> settings file -> defaults.
//!
//! The optional settings file lives at `<config dir>/denysync/config.toml`:
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//! max_retries = 3
//! retry_base_delay_ms = 500
//!
//! [sync]
//! chunk_size = 50
//! chunk_pause_ms = 1000
//! source_concurrency = 4
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

/// Base URL of the denylist API.
pub const DEFAULT_API_URL: &str = "https://api.nextdns.io";

/// Upper bound on read attempts; keeps the exponential backoff finite.
pub const MAX_RETRIES: u32 = 10;

/// Credentials and target resource for the remote denylist.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub api_key: String,
    pub profile_id: String,
    pub api_url: String,
}

impl RemoteConfig {
    /// Builds the remote configuration, failing if a required value is absent.
    ///
    /// Blank values count as absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use denysync_core::config::{RemoteConfig, DEFAULT_API_URL};
    /// use denysync_core::AppError;
    ///
    /// let err = RemoteConfig::new(Some("key".into()), None, DEFAULT_API_URL).unwrap_err();
    /// assert!(matches!(err, AppError::MissingConfig("NEXTDNS_PROFILE_ID")));
    /// ```
    pub fn new(
        api_key: Option<String>,
        profile_id: Option<String>,
        api_url: &str,
    ) -> Result<Self, AppError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AppError::MissingConfig("NEXTDNS_API_KEY"))?;
        let profile_id = profile_id
            .filter(|p| !p.trim().is_empty())
            .ok_or(AppError::MissingConfig("NEXTDNS_PROFILE_ID"))?;

        Ok(Self {
            api_key,
            profile_id,
            api_url: api_url.to_string(),
        })
    }
}

/// HTTP client configuration for external API calls.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl HttpConfig {
    pub fn from_settings(settings: &HttpSettings) -> Self {
        let defaults = Self::default();
        Self {
            timeout: settings
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: settings
                .max_retries
                .unwrap_or(defaults.max_retries)
                .clamp(1, MAX_RETRIES),
            retry_base_delay: settings
                .retry_base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
        }
    }
}

/// Reconciliation tuning.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum number of domains per mutation call.
    pub chunk_size: usize,
    /// Pause between consecutive mutation calls.
    pub chunk_pause: Duration,
    /// Number of blocklist sources fetched at the same time.
    pub source_concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50,
            chunk_pause: Duration::from_millis(1000),
            source_concurrency: 4,
        }
    }
}

impl SyncConfig {
    pub fn from_settings(settings: &SyncSettings) -> Result<Self, AppError> {
        let defaults = Self::default();
        let chunk_size = settings.chunk_size.unwrap_or(defaults.chunk_size);
        if chunk_size == 0 {
            return Err(AppError::ConfigError(
                "chunk_size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            chunk_size,
            chunk_pause: settings
                .chunk_pause_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.chunk_pause),
            source_concurrency: settings
                .source_concurrency
                .unwrap_or(defaults.source_concurrency)
                .max(1),
        })
    }
}

/// Contents of the optional settings file.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
}

impl HttpSettings {
    /// Fills unset fields from `lower`.
    pub fn or(self, lower: HttpSettings) -> Self {
        Self {
            timeout_secs: self.timeout_secs.or(lower.timeout_secs),
            max_retries: self.max_retries.or(lower.max_retries),
            retry_base_delay_ms: self.retry_base_delay_ms.or(lower.retry_base_delay_ms),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SyncSettings {
    pub chunk_size: Option<usize>,
    pub chunk_pause_ms: Option<u64>,
    pub source_concurrency: Option<usize>,
}

impl SyncSettings {
    /// Fills unset fields from `lower`.
    pub fn or(self, lower: SyncSettings) -> Self {
        Self {
            chunk_size: self.chunk_size.or(lower.chunk_size),
            chunk_pause_ms: self.chunk_pause_ms.or(lower.chunk_pause_ms),
            source_concurrency: self.source_concurrency.or(lower.source_concurrency),
        }
    }
}

/// Returns the default settings file location, if a config directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("denysync").join("config.toml"))
}

/// Loads the settings file.
///
/// An explicit `path` must exist. Without one, the default location is tried
/// and a missing file yields default settings.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, AppError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Settings::default()),
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = toml::from_str(&content).map_err(|e| {
        AppError::ConfigError(format!("failed to parse {}: {}", path.display(), e))
    })?;

    tracing::debug!(path = %path.display(), "Loaded settings file");
    Ok(settings)
}
