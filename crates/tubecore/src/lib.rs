//! tubecore - extraction and normalization core for the tubeinfo service
//!
//! Resolves a media URL into its downloadable stream formats by delegating to
//! `yt-dlp`, then projects the engine output into a compact public shape.
//!
//! # Module Structure
//!
//! - `config`: startup configuration (server address, engine settings, auth mode)
//! - `credentials`: how the engine authenticates (none, headers, OAuth2 token, cookies)
//! - `engine`: the `ExtractionEngine` seam and its yt-dlp implementation
//! - `normalizer`: format projection, filtering and the bounded extraction entry point
//! - `metrics`: prometheus registry for extraction outcomes

pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod normalizer;
pub mod types;

pub use config::{AppConfig, AuthConfig, AuthMode, EngineConfig, ServerConfig};
pub use credentials::CredentialProvider;
pub use engine::{ExtractionEngine, YtDlpEngine};
pub use error::{ConfigError, ExtractionError};
pub use metrics::Metrics;
pub use normalizer::{normalize_info, FormatNormalizer};
pub use types::{MediaType, NormalizedFormat, RawVideoInfo, StreamFormat, VideoInfo};
