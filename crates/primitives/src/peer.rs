//! Peer snapshot as reported by the managed client.

use serde::{Deserialize, Serialize};

/// A remote endpoint in a transfer's swarm, captured at fetch time.
///
/// Produced fresh on every fetch and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// Remote address as reported by the client (not guaranteed to parse).
    #[serde(rename = "ip")]
    pub address: String,
    #[serde(default)]
    pub port: u16,
    /// Client identifier decoded from the peer id (e.g. `-XL0012-`).
    #[serde(rename = "peer_id_client", default)]
    pub peer_id: String,
    /// Client name announced in the extension handshake.
    #[serde(default)]
    pub client: String,
    /// Bytes we have uploaded to this peer.
    #[serde(default)]
    pub uploaded: u64,
    /// Completion reported by the peer, 0.0 to 1.0.
    #[serde(default)]
    pub progress: f64,
}

impl Peer {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: 0,
            peer_id: String::new(),
            client: String::new(),
            uploaded: 0,
            progress: 0.0,
        }
    }

    pub fn with_peer_id(mut self, peer_id: impl Into<String>) -> Self {
        self.peer_id = peer_id.into();
        self
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    pub fn with_uploaded(mut self, uploaded: u64) -> Self {
        self.uploaded = uploaded;
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    /// Whether the peer reported no protocol identifier at all.
    pub fn has_peer_id(&self) -> bool {
        !self.peer_id.is_empty()
    }
}
