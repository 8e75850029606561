//! Rule configuration (TOML-serializable).

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default banned peer-id pattern: Xunlei/Thunder and other leech clients.
pub const DEFAULT_BANNED_PEER_ID: &str = r"(?i)^-(XL|SD|XF|QD|BN|DL|TS|FG|TT|NX)";

/// Default banned client-name pattern.
pub const DEFAULT_BANNED_CLIENT: &str =
    r"(?i)(xunlei|thunder|gt0002|gt0003|taipei-torrent|anacrolix|dt/torrent|go\.torrent|offline-download)";

#[derive(Debug, thiserror::Error)]
pub enum RuleConfigError {
    #[error("invalid {field} pattern: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Thresholds for the progress-falsification check, in bytes.
///
/// `floor = max(min(floor_cap, total * floor_ratio), floor_min)` is the upload
/// volume below which nothing is judged. Past it, a peer is flagged if we sent
/// more than `total + size_slack`, or more than
/// `progress * total + min(ceiling_slack_cap, total * ceiling_slack_ratio)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressThresholds {
    pub floor_cap: u64,
    pub floor_ratio: f64,
    pub floor_min: u64,
    pub size_slack: u64,
    pub ceiling_slack_cap: u64,
    pub ceiling_slack_ratio: f64,
}

impl Default for ProgressThresholds {
    fn default() -> Self {
        Self {
            floor_cap: 100_000_000,
            floor_ratio: 0.1,
            floor_min: 20_000_000,
            size_slack: 50_000_000,
            ceiling_slack_cap: 300_000_000,
            ceiling_slack_ratio: 0.1,
        }
    }
}

impl ProgressThresholds {
    /// Minimum upload before the check judges anything.
    pub fn floor(&self, total_size: u64) -> u64 {
        let scaled = (total_size as f64 * self.floor_ratio) as u64;
        self.floor_cap.min(scaled).max(self.floor_min)
    }

    /// Largest upload still consistent with the reported progress.
    pub fn ceiling(&self, total_size: u64, progress: f64) -> f64 {
        let total = total_size as f64;
        let slack = (self.ceiling_slack_cap as f64).min(total * self.ceiling_slack_ratio);
        progress * total + slack
    }
}

/// Rule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Regex matched against the peer-id client string. Empty disables it.
    pub banned_peer_id: String,
    /// Regex matched against the announced client name. Empty disables it.
    pub banned_client: String,
    pub progress: ProgressThresholds,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            banned_peer_id: DEFAULT_BANNED_PEER_ID.to_string(),
            banned_client: DEFAULT_BANNED_CLIENT.to_string(),
            progress: ProgressThresholds::default(),
        }
    }
}

impl RulesConfig {
    pub(crate) fn peer_id_regex(&self) -> Result<Option<Regex>, RuleConfigError> {
        compile("banned_peer_id", &self.banned_peer_id)
    }

    pub(crate) fn client_regex(&self) -> Result<Option<Regex>, RuleConfigError> {
        compile("banned_client", &self.banned_client)
    }
}

fn compile(field: &'static str, pattern: &str) -> Result<Option<Regex>, RuleConfigError> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(pattern)
        .map(Some)
        .map_err(|source| RuleConfigError::InvalidPattern { field, source })
}
