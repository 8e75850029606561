//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "peerban.toml";

/// Bans leeching and progress-faking peers from a qBittorrent instance.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file. Created with defaults if missing.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Logging configuration.
    #[command(flatten)]
    pub logs: LogArgs,

    /// Managed client overrides.
    #[command(flatten)]
    pub client: ClientArgs,
}

/// Logging configuration.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Logging")]
pub struct LogArgs {
    /// Silence all output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv, etc.).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Log filter directive (e.g., "peerban_scanner=debug,reqwest=warn").
    #[arg(long = "log.filter", value_name = "DIRECTIVE")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json")]
    pub json: bool,
}

/// Overrides for the `[client]` section of the configuration file.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Client")]
pub struct ClientArgs {
    /// qBittorrent WebUI root URL.
    #[arg(long = "client.url", value_name = "URL")]
    pub url: Option<String>,

    /// WebUI username.
    #[arg(long = "client.username", value_name = "NAME")]
    pub username: Option<String>,

    /// WebUI password.
    #[arg(long = "client.password", env = "PEERBAN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}
