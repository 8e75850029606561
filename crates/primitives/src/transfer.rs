//! Transfer summary as listed by the managed client.

use serde::{Deserialize, Deserializer, Serialize};

/// One active torrent, refreshed every pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Info-hash, used to address the transfer in peer queries.
    pub hash: String,
    pub name: String,
    /// Lifecycle state as reported by the client (e.g. `uploading`, `stalledUP`).
    #[serde(default)]
    pub state: String,
    /// Current upload rate in bytes per second.
    #[serde(rename = "upspeed", default, deserialize_with = "non_negative")]
    pub up_speed: u64,
    /// Total payload size in bytes. Unknown sizes (no metadata yet) read as 0.
    #[serde(default, deserialize_with = "non_negative")]
    pub total_size: u64,
}

impl Transfer {
    pub fn new(hash: impl Into<String>, name: impl Into<String>, total_size: u64) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            state: String::new(),
            up_speed: 0,
            total_size,
        }
    }

    pub fn with_up_speed(mut self, up_speed: u64) -> Self {
        self.up_speed = up_speed;
        self
    }

    /// Idle transfers carry no upload signal worth a peer fetch.
    pub fn is_uploading(&self) -> bool {
        self.up_speed > 0
    }
}

/// The client reports `-1` for sizes it doesn't know yet.
fn non_negative<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = i64::deserialize(deserializer)?;
    Ok(u64::try_from(value).unwrap_or(0))
}
