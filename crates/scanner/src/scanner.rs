//! A single evaluation pass.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::{TryStreamExt, stream};
use peerban_blocklist::{BlocklistCache, BlocklistSnapshot};
use peerban_client_api::TorrentClient;
use peerban_ledger::BanLedger;
use peerban_primitives::{Peer, Transfer};
use peerban_rules::{PeerContext, RuleEngine, Verdict};
use tracing::{debug, info, trace};

use crate::error::ScanError;

/// Default ceiling on simultaneous peer-list fetches.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 5;

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Peer-list fetches allowed in flight at once.
    pub max_concurrent_fetches: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

/// Counts from one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Transfers listed by the client.
    pub transfers: usize,
    /// Transfers whose peers were fetched (non-idle).
    pub scanned: usize,
    pub peers: usize,
    pub banned: usize,
}

/// Walks every uploading transfer, classifies its peers and records bans.
pub struct Scanner<C> {
    client: Arc<C>,
    engine: Arc<RuleEngine>,
    ledger: Arc<BanLedger>,
    blocklist: Arc<BlocklistCache>,
    config: ScannerConfig,
}

impl<C: TorrentClient> Scanner<C> {
    pub fn new(
        client: Arc<C>,
        engine: Arc<RuleEngine>,
        ledger: Arc<BanLedger>,
        blocklist: Arc<BlocklistCache>,
    ) -> Self {
        Self {
            client,
            engine,
            ledger,
            blocklist,
            config: ScannerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn ledger(&self) -> &Arc<BanLedger> {
        &self.ledger
    }

    /// Run one pass.
    ///
    /// Peer lists are fetched concurrently up to the configured ceiling. The
    /// first failed fetch ends the pass: the remaining in-flight fetches are
    /// dropped and the error is returned. Bans recorded before that stay in
    /// the ledger.
    pub async fn scan(&self) -> Result<PassReport, ScanError> {
        let transfers = self
            .client
            .list_transfers()
            .await
            .map_err(ScanError::ListTransfers)?;
        let blocklist = self.blocklist.snapshot();

        let active: Vec<&Transfer> = transfers.iter().filter(|t| t.is_uploading()).collect();
        trace!(
            listed = transfers.len(),
            active = active.len(),
            "starting pass"
        );

        let peers_seen = AtomicUsize::new(0);
        let banned = AtomicUsize::new(0);
        let limit = self.config.max_concurrent_fetches.max(1);

        let this = self;
        let snapshot: &BlocklistSnapshot = &blocklist;
        let (peers_ref, banned_ref) = (&peers_seen, &banned);

        stream::iter(active.iter().copied().map(Ok::<_, ScanError>))
            .try_for_each_concurrent(limit, move |transfer| async move {
                let peers = this
                    .client
                    .list_peers(&transfer.hash)
                    .await
                    .map_err(|source| ScanError::ListPeers {
                        name: transfer.name.clone(),
                        source,
                    })?;
                peers_ref.fetch_add(peers.len(), Ordering::Relaxed);
                let hits = this.evaluate_transfer(transfer, &peers, snapshot);
                banned_ref.fetch_add(hits, Ordering::Relaxed);
                Ok(())
            })
            .await?;

        let report = PassReport {
            transfers: transfers.len(),
            scanned: active.len(),
            peers: peers_seen.into_inner(),
            banned: banned.into_inner(),
        };
        debug!(?report, "pass complete");
        Ok(report)
    }

    /// Classify every peer of one transfer, returning how many were banned.
    fn evaluate_transfer(
        &self,
        transfer: &Transfer,
        peers: &[Peer],
        blocklist: &BlocklistSnapshot,
    ) -> usize {
        let mut hits = 0;
        for peer in peers {
            let ctx = PeerContext {
                peer,
                transfer,
                ledger: &self.ledger,
                blocklist,
            };
            if let Some(verdict) = self.engine.evaluate(&ctx) {
                self.record_ban(peer, transfer, verdict);
                hits += 1;
            }
        }
        hits
    }

    fn record_ban(&self, peer: &Peer, transfer: &Transfer, verdict: Verdict) {
        self.ledger.insert(&peer.address);
        info!(
            ip = %peer.address,
            peer_id = %peer.peer_id,
            client = %peer.client,
            torrent = %transfer.name,
            reason = %verdict.reason,
            rule = verdict.rule,
            uploaded = peer.uploaded,
            progress = peer.progress,
            total_size = transfer.total_size,
            "banned peer"
        );
    }
}
