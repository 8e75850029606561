use std::time::Duration;

use peerban_client_api::ClientError;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("listing transfers failed: {0}")]
    ListTransfers(#[source] ClientError),
    #[error("fetching peers of {name:?} failed: {source}")]
    ListPeers {
        name: String,
        #[source]
        source: ClientError,
    },
}

impl ScanError {
    pub fn client_error(&self) -> &ClientError {
        match self {
            Self::ListTransfers(err) => err,
            Self::ListPeers { source, .. } => source,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        self.client_error().is_forbidden()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("pass exceeded its {0:?} budget")]
    Timeout(Duration),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("pushing ban list failed: {0}")]
    Sync(#[source] ClientError),
}

impl ServiceError {
    /// Whether the managed client rejected our session.
    pub fn is_forbidden(&self) -> bool {
        match self {
            Self::Timeout(_) => false,
            Self::Scan(err) => err.is_forbidden(),
            Self::Sync(err) => err.is_forbidden(),
        }
    }
}
