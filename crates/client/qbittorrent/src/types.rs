//! Wire types for the endpoints we use.

use std::collections::HashMap;

use peerban_primitives::Peer;
use serde::Deserialize;

/// Response of `/api/v2/sync/torrentPeers`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TorrentPeers {
    /// Keyed by `ip:port`.
    #[serde(default)]
    pub(crate) peers: HashMap<String, Peer>,
}

impl TorrentPeers {
    pub(crate) fn into_peers(self) -> Vec<Peer> {
        self.peers.into_values().collect()
    }
}

/// Body of `/api/v2/app/setPreferences`, sent as the `json` form field.
pub(crate) fn banned_ips_preferences(addresses: &[String]) -> serde_json::Value {
    serde_json::json!({ "banned_IPs": addresses.join("\n") })
}
