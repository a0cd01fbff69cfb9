//! Command-line flags, each with an environment variable fallback.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use vscale_autoscale::DEFAULT_DRAIN_MESSAGE;
use vscale_core::SizeName;

#[derive(Parser)]
#[command(name = "vscaled", about = "Vertical autoscaler for a single game server", version)]
pub struct Args {
    /// Log level, overridden by RUST_LOG.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Interval between rule evaluations.
    #[arg(long, env = "INTERVAL", default_value = "1m", value_parser = humantime::parse_duration)]
    pub interval: Duration,

    /// Minimum time between two successful scales.
    #[arg(
        long,
        env = "MIN_TIME_BETWEEN_SCALE",
        default_value = "1h",
        value_parser = humantime::parse_duration
    )]
    pub min_time_between_scale: Duration,

    /// TOML file with `[[rules]]` and `[[schedule]]` entries.
    #[arg(long, env = "RULES_FILE")]
    pub rules_file: PathBuf,

    /// Server types the autoscaler may use, comma separated.
    #[arg(long, env = "ALLOWED_SIZES", value_delimiter = ',', required = true)]
    pub allowed_sizes: Vec<String>,

    #[arg(long, env = "HETZNER_API_KEY", hide_env_values = true)]
    pub hetzner_api_key: String,

    /// Name of the managed server.
    #[arg(long, env = "HETZNER_SERVER_NAME")]
    pub hetzner_server_name: String,

    /// How long the server type list is cached.
    #[arg(
        long,
        env = "HETZNER_SERVER_TYPES_CACHE_TIME",
        default_value = "10m",
        value_parser = humantime::parse_duration
    )]
    pub hetzner_server_types_cache_time: Duration,

    /// Prometheus base URL.
    #[arg(long, env = "METRICS_ADDRESS")]
    pub metrics_address: String,

    #[arg(long, env = "METRICS_USERNAME", default_value = "")]
    pub metrics_username: String,

    #[arg(long, env = "METRICS_PASSWORD", default_value = "", hide_env_values = true)]
    pub metrics_password: String,

    /// RCON `host:port` of the game server.
    #[arg(long, env = "RCON_ADDRESS")]
    pub rcon_address: String,

    #[arg(long, env = "RCON_PASSWORD", hide_env_values = true)]
    pub rcon_password: String,

    /// I/O timeout for each RCON operation.
    #[arg(long, env = "RCON_TIMEOUT", default_value = "10s", value_parser = humantime::parse_duration)]
    pub rcon_timeout: Duration,

    /// Broadcast before draining. Starting with `{` sends it as JSON text.
    #[arg(long, env = "DRAIN_MESSAGE", default_value = DEFAULT_DRAIN_MESSAGE)]
    pub drain_message: String,
}

/// Load `KEY=value` lines from `path` into the environment. Variables that
/// are already set keep their value. A missing file is not an error.
pub fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

impl Args {
    pub fn allowed_sizes(&self) -> Vec<SizeName> {
        self.allowed_sizes
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(SizeName::from)
            .collect()
    }
}
