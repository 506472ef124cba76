use std::time::Duration;

use thiserror::Error;

/// Application-wide error types.
///
/// This enum represents all possible errors that can occur during a denylist
/// reconciliation run. It uses the `thiserror` crate for ergonomic error handling
/// and automatic conversion from underlying library errors.
///
/// # Fatal vs. recoverable
///
/// Some variants abort the whole run (`MissingConfig`, `ConfigError`,
/// `BaselineRead`, `EmptyDesiredSet`), while others are recorded and the run
/// continues (`SourceFetch` for a single list, `MutationRejected` for a single
/// chunk). The distinction is made by the caller, not by the error itself.
///
/// # Error Conversion
///
/// - `serde_json::Error` → `AppError::SerializationError`
/// - `std::io::Error` → `AppError::Io`
///
/// # Examples
///
/// ```no_run
/// use denysync_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::MissingConfig("NEXTDNS_API_KEY"))
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// A required configuration value was not provided.
    ///
    /// Raised before any network activity takes place.
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Configuration was provided but is invalid (bad settings file, zero chunk size, ...).
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// HTTP client request failed.
    ///
    /// This error occurs when HTTP requests fail for reasons other than
    /// connectivity or timeouts, or when the client cannot be built.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// A single blocklist source could not be fetched.
    #[error("Failed to fetch source {url}: {reason}")]
    SourceFetch { url: String, reason: String },

    /// The current denylist could not be read.
    ///
    /// Always fatal: removals computed against an unknown baseline are unsafe.
    /// `status` is set when the service answered with an HTTP error.
    #[error("Failed to read current denylist: {reason}")]
    BaselineRead { status: Option<u16>, reason: String },

    /// Every configured source yielded nothing.
    #[error("Desired set is empty; refusing to reconcile")]
    EmptyDesiredSet,

    /// The remote service answered a mutation with a non-success status.
    #[error("Mutation rejected with HTTP {status}: {body}")]
    MutationRejected { status: u16, body: String },

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Reading a local file (sources registry, settings) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote service answered with an unexpected HTTP status.
    #[error("HTTP {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network or connection error.
    ///
    /// This error occurs when a network request fails due to connectivity issues,
    /// DNS resolution failures, or the remote server being unreachable.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimitExceeded,
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::MissingConfig(name) => {
                format!(
                    "Missing required setting {}.\n   Set it in the environment, a .env file, or pass it as a flag.",
                    name
                )
            }
            AppError::BaselineRead {
                status: Some(401 | 403),
                ..
            } => {
                "The denylist API rejected the credentials.\n   Check NEXTDNS_API_KEY and NEXTDNS_PROFILE_ID.".to_string()
            }
            AppError::BaselineRead { reason, .. } => {
                format!(
                    "Could not read the current denylist: {}\n   Nothing was changed. Try again later.",
                    reason
                )
            }
            AppError::EmptyDesiredSet => {
                "No domains were collected from any source.\n   Refusing to run, as this would empty the denylist. Check the sources file and your connection.".to_string()
            }
            AppError::ClientError(msg) => {
                if msg.contains("timeout") || msg.contains("timed out") {
                    "Request timed out. The service may be slow or unreachable.".to_string()
                } else if msg.contains("connect") {
                    format!(
                        "Cannot connect: {}\n   Check your internet connection.",
                        msg
                    )
                } else {
                    format!("API error: {}", msg)
                }
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(after) => {
                format!("Request timed out after {:?}.\n   The server may be overloaded. Try again later.", after)
            }
            AppError::RateLimitExceeded => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use denysync_core::error::AppError;
    ///
    /// let err = AppError::NetworkError("connection reset".to_string());
    /// assert!(err.is_retryable());
    ///
    /// let err = AppError::RateLimitExceeded;
    /// assert!(err.is_retryable());
    ///
    /// let err = AppError::MissingConfig("NEXTDNS_API_KEY");
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::RateLimitExceeded
                | AppError::ClientError(_)
        )
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::MutationRejected { status, .. }
            | AppError::UnexpectedStatus { status, .. } => Some(*status),
            AppError::BaselineRead { status, .. } => *status,
            AppError::RateLimitExceeded => Some(429),
            _ => None,
        }
    }
}
