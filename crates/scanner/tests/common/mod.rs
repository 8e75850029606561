//! Scriptable in-memory torrent client.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use peerban_blocklist::BlocklistCache;
use peerban_client_api::{ClientError, TorrentClient};
use peerban_ledger::BanLedger;
use peerban_primitives::{Peer, Transfer};
use peerban_rules::{RuleEngine, RulesConfig};
use peerban_scanner::{BanService, Scanner, ScannerConfig, ServiceConfig};

pub const GB: u64 = 1_000_000_000;

/// How `list_peers` answers for one transfer.
#[derive(Debug, Clone)]
pub enum PeerResponse {
    Peers(Vec<Peer>),
    /// Sleep, then answer.
    Delayed(Duration, Vec<Peer>),
    /// Never answer.
    Hang,
    /// Wait until this many fetches have started, then fail with a 500.
    FailAfterStarted(usize),
    Forbidden,
}

#[derive(Default)]
pub struct MockClient {
    pub transfers: Mutex<Vec<Transfer>>,
    pub peers: Mutex<HashMap<String, PeerResponse>>,
    pub transfers_forbidden: Mutex<bool>,
    pub hang_on_list: Mutex<bool>,
    pub fail_push: Mutex<bool>,

    pub pushes: Mutex<Vec<Vec<String>>>,
    pub logins: AtomicUsize,
    pub fetches: Mutex<Vec<String>>,
    pub started: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub cancelled: AtomicUsize,
}

impl MockClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_transfer(&self, transfer: Transfer, response: PeerResponse) {
        self.peers.lock().insert(transfer.hash.clone(), response);
        self.transfers.lock().push(transfer);
    }

    pub fn push_count(&self) -> usize {
        self.pushes.lock().len()
    }

    pub fn last_push(&self) -> Option<Vec<String>> {
        self.pushes.lock().last().cloned()
    }
}

/// Tracks in-flight fetches; counts a cancellation if dropped before finishing.
struct FetchGuard<'a> {
    client: &'a MockClient,
    finished: bool,
}

impl<'a> FetchGuard<'a> {
    fn enter(client: &'a MockClient) -> Self {
        client.started.fetch_add(1, Ordering::SeqCst);
        let now = client.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        client.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self {
            client,
            finished: false,
        }
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.client.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.finished {
            self.client.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl TorrentClient for MockClient {
    async fn login(&self) -> Result<(), ClientError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        *self.transfers_forbidden.lock() = false;
        Ok(())
    }

    async fn list_transfers(&self) -> Result<Vec<Transfer>, ClientError> {
        if *self.hang_on_list.lock() {
            std::future::pending::<()>().await;
        }
        if *self.transfers_forbidden.lock() {
            return Err(ClientError::Forbidden);
        }
        Ok(self.transfers.lock().clone())
    }

    async fn list_peers(&self, hash: &str) -> Result<Vec<Peer>, ClientError> {
        self.fetches.lock().push(hash.to_string());
        let response = self
            .peers
            .lock()
            .get(hash)
            .cloned()
            .unwrap_or(PeerResponse::Peers(Vec::new()));

        let mut guard = FetchGuard::enter(self);
        let result = match response {
            PeerResponse::Peers(peers) => Ok(peers),
            PeerResponse::Delayed(delay, peers) => {
                tokio::time::sleep(delay).await;
                Ok(peers)
            }
            PeerResponse::Hang => std::future::pending().await,
            PeerResponse::FailAfterStarted(n) => {
                while self.started.load(Ordering::SeqCst) < n {
                    tokio::task::yield_now().await;
                }
                Err(ClientError::Status(500))
            }
            PeerResponse::Forbidden => Err(ClientError::Forbidden),
        };
        guard.finished = true;
        result
    }

    async fn push_ban_list(&self, addresses: &[String]) -> Result<(), ClientError> {
        if *self.fail_push.lock() {
            return Err(ClientError::Transport("connection reset".to_string()));
        }
        self.pushes.lock().push(addresses.to_vec());
        Ok(())
    }
}

pub struct Harness {
    pub client: Arc<MockClient>,
    pub ledger: Arc<BanLedger>,
    pub blocklist: Arc<BlocklistCache>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            client: MockClient::new(),
            ledger: Arc::new(BanLedger::default()),
            blocklist: Arc::new(BlocklistCache::new()),
        }
    }

    pub fn scanner(&self) -> Scanner<MockClient> {
        let engine = RuleEngine::from_config(&RulesConfig::default()).unwrap();
        Scanner::new(
            Arc::clone(&self.client),
            Arc::new(engine),
            Arc::clone(&self.ledger),
            Arc::clone(&self.blocklist),
        )
        .with_config(ScannerConfig::default())
    }

    pub fn service(&self) -> BanService<MockClient> {
        self.service_with(ServiceConfig::default())
    }

    pub fn service_with(&self, config: ServiceConfig) -> BanService<MockClient> {
        BanService::new(self.scanner(), Arc::clone(&self.client), config)
    }
}

/// An uploading transfer of the given size.
pub fn transfer(hash: &str, total_size: u64) -> Transfer {
    Transfer::new(hash, format!("torrent-{hash}"), total_size).with_up_speed(1024)
}

/// A well-behaved peer.
pub fn honest(address: &str) -> Peer {
    Peer::new(address)
        .with_peer_id("qBittorrent 4.6.2")
        .with_client("qBittorrent/4.6.2")
        .with_uploaded(5_000_000)
        .with_progress(0.3)
}

/// A Xunlei peer, caught by the identity rule.
pub fn xunlei(address: &str) -> Peer {
    Peer::new(address)
        .with_peer_id("-XL0012-")
        .with_client("Xunlei 0.0.1.2")
}

/// A peer faking low progress while pulling 400 MB of a 1 GB transfer.
pub fn faker(address: &str) -> Peer {
    Peer::new(address)
        .with_peer_id("Unknown")
        .with_uploaded(400_000_000)
        .with_progress(0.05)
}
