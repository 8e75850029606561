//! The driver loop: scan, sweep, sync, sleep, repeat.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use peerban_client_api::TorrentClient;
use peerban_ledger::{BanLedger, SweepStats};
use peerban_primitives::unix_now;
use tracing::{debug, error, info, warn};

use crate::error::ServiceError;
use crate::scanner::{PassReport, Scanner};
use crate::sync::{BanSync, SyncOutcome};

/// Default delay between the end of one tick and the start of the next.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(10);

/// Default time budget for one tick.
pub const DEFAULT_PASS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Pause after each tick.
    pub interval: Duration,
    /// Budget for scan + sweep + sync of a single tick.
    pub pass_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SCAN_INTERVAL,
            pass_timeout: DEFAULT_PASS_TIMEOUT,
        }
    }
}

/// Result of a successful tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub pass: PassReport,
    pub sweep: SweepStats,
    pub sync: SyncOutcome,
}

/// Drives [`Scanner`] and [`BanSync`] on a fixed cadence.
pub struct BanService<C> {
    client: Arc<C>,
    ledger: Arc<BanLedger>,
    scanner: Scanner<C>,
    sync: BanSync<C>,
    config: ServiceConfig,
}

impl<C: TorrentClient> BanService<C> {
    pub fn new(scanner: Scanner<C>, client: Arc<C>, config: ServiceConfig) -> Self {
        let ledger = Arc::clone(scanner.ledger());
        Self {
            sync: BanSync::new(Arc::clone(&client), Arc::clone(&ledger)),
            client,
            ledger,
            scanner,
            config,
        }
    }

    /// One tick, bounded by the pass timeout. A failed scan skips the sweep
    /// and the push for this tick.
    pub async fn tick(&self) -> Result<TickReport, ServiceError> {
        let budget = self.config.pass_timeout;
        tokio::time::timeout(budget, self.pass())
            .await
            .map_err(|_| ServiceError::Timeout(budget))?
    }

    async fn pass(&self) -> Result<TickReport, ServiceError> {
        let pass = self.scanner.scan().await?;

        let sweep = self.ledger.sweep(unix_now());
        if sweep != SweepStats::default() {
            debug!(?sweep, "expired bans swept");
        }

        let sync = self.sync.sync().await.map_err(ServiceError::Sync)?;
        Ok(TickReport { pass, sweep, sync })
    }

    /// React to a failed tick. Authorization failures trigger a fresh login
    /// so the next tick can proceed; anything else just waits for the next tick.
    pub async fn recover(&self, err: &ServiceError) {
        warn!(%err, "tick failed");
        if !err.is_forbidden() {
            return;
        }
        info!("session rejected, logging in again");
        if let Err(err) = self.client.login().await {
            error!(%err, "re-authentication failed, retrying next tick");
        }
    }

    /// Tick until `shutdown` resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        info!(
            interval = ?self.config.interval,
            pass_timeout = ?self.config.pass_timeout,
            "ban service started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                result = self.tick() => {
                    if let Err(err) = result {
                        self.recover(&err).await;
                    }
                }
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!(banned = self.ledger.address_count(), "ban service stopped");
    }
}
