use std::path::PathBuf;

use clap::Parser;

/// Natural-language chat over the geospatial metadata catalogue
#[derive(Debug, Parser)]
#[command(name = "geochat", about = "Chat backend that answers catalogue questions with tool-calling LLMs")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "geochat.toml", env = "GEOCHAT_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "GEOCHAT_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, default_value = "info", env = "GEOCHAT_LOG")]
    pub log_filter: String,
}
