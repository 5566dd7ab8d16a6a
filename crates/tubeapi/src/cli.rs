use std::net::SocketAddr;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tubeinfo")]
#[command(author, version, about = "Resolve media URLs into downloadable formats via yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Listen address, overrides TUBEINFO_BIND
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Resolve one URL and print the normalized formats as JSON
    Info {
        /// Media URL
        url: String,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Check the yt-dlp binary and the configured credentials
    Check,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
