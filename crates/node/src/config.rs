//! Configuration file handling.
//!
//! The file is TOML with four sections:
//! - `[client]` - qBittorrent WebUI location and credentials
//! - `[rules]` - identity patterns and progress thresholds
//! - `[blocklist]` - external blocklist source
//! - `[scan]` - pass cadence, concurrency and ban lifetime
//!
//! Durations are written as humantime strings ("10s", "12h").

use std::fs;
use std::path::Path;
use std::time::Duration;

use eyre::{Result, WrapErr};
use peerban_blocklist::DEFAULT_REFRESH_INTERVAL;
use peerban_ledger::DEFAULT_BAN_TTL;
use peerban_qbittorrent::DEFAULT_REQUEST_TIMEOUT;
use peerban_rules::RulesConfig;
use peerban_scanner::{DEFAULT_MAX_CONCURRENT_FETCHES, DEFAULT_PASS_TIMEOUT, DEFAULT_SCAN_INTERVAL};
use serde::{Deserialize, Serialize};

use crate::args::ClientArgs;

/// Default WebUI root.
pub const DEFAULT_CLIENT_URL: &str = "http://127.0.0.1:8080/";

/// Default WebUI username.
pub const DEFAULT_CLIENT_USERNAME: &str = "admin";

/// Default number of attempts per blocklist refresh.
pub const DEFAULT_BLOCKLIST_RETRY_ATTEMPTS: usize = 5;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerbanConfig {
    pub client: ClientConfig,
    pub rules: RulesConfig,
    pub blocklist: BlocklistConfig,
    pub scan: ScanConfig,
}

/// Managed client connection.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CLIENT_URL.to_string(),
            username: DEFAULT_CLIENT_USERNAME.to_string(),
            password: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// External blocklist source. No URL means no external list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocklistConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,
    /// Attempts per refresh, including the first.
    pub retry_attempts: usize,
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        Self {
            url: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            retry_attempts: DEFAULT_BLOCKLIST_RETRY_ATTEMPTS,
        }
    }
}

/// Scan loop tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    #[serde(with = "humantime_serde")]
    pub pass_timeout: Duration,
    pub max_concurrent_fetches: usize,
    #[serde(with = "humantime_serde")]
    pub ban_ttl: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SCAN_INTERVAL,
            pass_timeout: DEFAULT_PASS_TIMEOUT,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            ban_ttl: DEFAULT_BAN_TTL,
        }
    }
}

impl PeerbanConfig {
    /// Load the configuration from the given path, or create a default one if it doesn't exist.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            let config: Self = toml::from_str(&content)
                .wrap_err_with(|| format!("failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Save the configuration to the given path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;

        Ok(())
    }

    /// Apply command line arguments to override the configuration.
    pub fn apply_cli_args(&mut self, client: &ClientArgs) {
        if let Some(url) = &client.url {
            self.client.url = url.clone();
        }
        if let Some(username) = &client.username {
            self.client.username = username.clone();
        }
        if let Some(password) = &client.password {
            self.client.password = password.clone();
        }
    }
}

/// `Duration` as a humantime string.
mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(super) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(D::Error::custom)
    }
}
