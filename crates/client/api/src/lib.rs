//! The managed client as seen by the scanner.
//!
//! Implementations own session handling; callers only need to tell an
//! authorization failure apart from everything else so they can ask the
//! client to log in again.

use async_trait::async_trait;
use peerban_primitives::{Peer, Transfer};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The session is missing or expired.
    #[error("forbidden: session rejected by client")]
    Forbidden,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("login rejected: {0}")]
    LoginRejected(String),
}

impl ClientError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden)
    }
}

/// Operations the scanner needs from the managed client.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// (Re-)establish the authenticated session.
    async fn login(&self) -> Result<(), ClientError>;

    /// All transfers the client currently knows about.
    async fn list_transfers(&self) -> Result<Vec<Transfer>, ClientError>;

    /// Current peers of one transfer.
    async fn list_peers(&self, hash: &str) -> Result<Vec<Peer>, ClientError>;

    /// Replace the client's banned-address list wholesale.
    async fn push_ban_list(&self, addresses: &[String]) -> Result<(), ClientError>;
}
