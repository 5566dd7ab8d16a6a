//! Logging initialization and startup diagnostics
//!
//! Call sites use the `log` macros; records are forwarded into a
//! `tracing-subscriber` fmt subscriber so they share one filter and format
//! with the `tower-http` request spans.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tubecore::{AppConfig, AuthConfig};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Initialize the global logger.
///
/// Output goes to stderr so `tubeinfo info` can print JSON on stdout.
pub fn init_logger() -> Result<()> {
    tracing_log::LogTracer::init().map_err(|e| anyhow::anyhow!("Failed to bridge log records: {}", e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at startup.
///
/// Credential material is checked for presence only; contents are never logged.
pub fn log_configuration(config: &AppConfig, engine_version: Option<&str>) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("tubeinfo configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let engine = &config.engine;
    match engine_version {
        Some(version) => log::info!("✅ {} version {}", engine.ytdl_bin, version),
        None => log::warn!("⚠️  {} is not runnable; extractions will fail", engine.ytdl_bin),
    }
    log::info!("   Format selector: {}", engine.format_selector);
    log::info!(
        "   Timeout: {}s, max concurrent extractions: {}",
        engine.timeout.as_secs(),
        engine.max_concurrent_extractions
    );

    match &engine.auth {
        AuthConfig::None => log::info!("   Auth mode: none"),
        AuthConfig::Headers(headers) => {
            let names: Vec<&str> = headers.iter().map(|(name, _)| name.as_str()).collect();
            log::info!("   Auth mode: headers ({})", names.join(", "));
        }
        AuthConfig::OAuth2Token(path) | AuthConfig::Cookies(path) => {
            if path.exists() {
                log::info!("   Auth mode: {} ({})", engine.auth.mode(), path.display());
            } else {
                log::error!(
                    "❌ Auth mode: {} ({}) FILE NOT FOUND, extractions will fail until it appears",
                    engine.auth.mode(),
                    path.display()
                );
            }
        }
    }
}
