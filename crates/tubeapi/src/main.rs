use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;

use tubeapi::cli::{Cli, Commands};
use tubeapi::logging::{init_logger, log_configuration};
use tubeapi::{serve, AppState};
use tubecore::credentials::provider_for;
use tubecore::{AppConfig, FormatNormalizer, YtDlpEngine};

/// Entry point for the tubeinfo service
///
/// Parses CLI arguments and dispatches to the selected subcommand; without one
/// the HTTP API is started.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    init_logger()?;

    let config = AppConfig::from_env()?;

    match cli.command {
        Some(Commands::Serve { bind }) => run_server(config, bind).await,
        Some(Commands::Info { url, pretty }) => run_cli_info(config, &url, pretty).await,
        Some(Commands::Check) => run_check(config).await,
        None => run_server(config, None).await,
    }
}

async fn run_server(mut config: AppConfig, bind: Option<std::net::SocketAddr>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let engine = YtDlpEngine::new(&config.engine);
    let version = match engine.probe_version().await {
        Ok(version) => Some(version),
        Err(e) => {
            log::error!("yt-dlp version check failed: {}", e);
            None
        }
    };
    log_configuration(&config, version.as_deref());

    let state = AppState::new(Arc::new(engine), &config.engine)?;
    serve(config.server.bind, state).await
}

/// Resolve a single URL from the command line and print the response body.
async fn run_cli_info(config: AppConfig, url: &str, pretty: bool) -> Result<()> {
    let engine = Arc::new(YtDlpEngine::new(&config.engine));
    let normalizer = FormatNormalizer::new(engine, 1, config.engine.timeout);

    let info = normalizer
        .normalize(url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to get info: {}", e))?;

    let json = if pretty {
        serde_json::to_string_pretty(&info)?
    } else {
        serde_json::to_string(&info)?
    };
    println!("{}", json);

    Ok(())
}

/// Verify yt-dlp runs and the configured credentials are usable.
async fn run_check(config: AppConfig) -> Result<()> {
    let engine = YtDlpEngine::new(&config.engine);
    let version = engine
        .probe_version()
        .await
        .map_err(|e| anyhow::anyhow!("yt-dlp check failed: {}", e))?;
    println!("{}: {}", config.engine.ytdl_bin, version);

    let credentials = provider_for(&config.engine.auth);
    credentials
        .engine_args()
        .map_err(|e| anyhow::anyhow!("Credential check failed ({}): {}", credentials.name(), e))?;
    println!("credentials: {} (ok)", credentials.name());

    Ok(())
}
