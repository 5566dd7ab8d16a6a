use std::time::Duration;
use thiserror::Error;

use crate::config::AuthMode;

/// Why an extraction produced no [`VideoInfo`](crate::VideoInfo).
///
/// The `Display` text is what API clients see, so engine messages are kept
/// verbatim instead of being wrapped.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// yt-dlp ran and reported a failure (bad URL, unavailable video, auth, network)
    #[error("{0}")]
    Engine(String),

    /// The yt-dlp binary could not be started
    #[error("Failed to run {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    /// yt-dlp exited successfully but stdout was not metadata JSON
    #[error("Could not parse yt-dlp output: {0}")]
    InvalidOutput(#[from] serde_json::Error),

    /// The engine did not answer within the configured timeout
    #[error("yt-dlp timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// A credential artifact required by the auth mode is missing or unreadable
    #[error("{0}")]
    CredentialUnavailable(String),
}

impl ExtractionError {
    /// Returns the outcome label used for metrics and logs
    pub fn outcome(&self) -> &'static str {
        match self {
            ExtractionError::Engine(_) => "engine_error",
            ExtractionError::Spawn { .. } => "spawn_error",
            ExtractionError::InvalidOutput(_) => "invalid_output",
            ExtractionError::Timeout(_) => "timeout",
            ExtractionError::CredentialUnavailable(_) => "credential_error",
        }
    }
}

/// Invalid startup configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{var} must be set when YTDL_AUTH_MODE={mode}")]
    Missing { var: &'static str, mode: AuthMode },
}
