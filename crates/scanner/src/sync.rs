//! Change-detecting ban-list push.

use std::sync::Arc;

use peerban_client_api::{ClientError, TorrentClient};
use peerban_ledger::BanLedger;
use tracing::{info, trace};

/// What a sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing changed since the last push; no request was made.
    Unchanged,
    /// The full address set was pushed.
    Pushed { addresses: usize },
}

/// Pushes the ledger's address set to the client only when it changed.
pub struct BanSync<C> {
    client: Arc<C>,
    ledger: Arc<BanLedger>,
}

impl<C: TorrentClient> BanSync<C> {
    pub fn new(client: Arc<C>, ledger: Arc<BanLedger>) -> Self {
        Self { client, ledger }
    }

    /// Push if dirty. The dirty flag is restored if the push fails or is
    /// cancelled, so the change is retried on the next call.
    pub async fn sync(&self) -> Result<SyncOutcome, ClientError> {
        if !self.ledger.take_dirty() {
            trace!("ban list unchanged, skipping push");
            return Ok(SyncOutcome::Unchanged);
        }
        let mut guard = RestoreDirty {
            ledger: &self.ledger,
            armed: true,
        };

        let addresses = self.ledger.snapshot_addresses();
        self.client.push_ban_list(&addresses).await?;
        guard.armed = false;

        info!(count = addresses.len(), "pushed ban list");
        Ok(SyncOutcome::Pushed {
            addresses: addresses.len(),
        })
    }
}

/// Re-marks the ledger dirty unless disarmed.
struct RestoreDirty<'a> {
    ledger: &'a BanLedger,
    armed: bool,
}

impl Drop for RestoreDirty<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.ledger.mark_dirty();
        }
    }
}
