//! Wires the configured components together and runs them until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use eyre::{Result, WrapErr};
use peerban_backoff::Backoff;
use peerban_blocklist::{BlocklistCache, BlocklistRefresher, HttpBlocklistSource};
use peerban_client_api::TorrentClient;
use peerban_ledger::BanLedger;
use peerban_qbittorrent::{QbitClient, QbitCredentials};
use peerban_rules::RuleEngine;
use peerban_scanner::{BanService, Scanner, ScannerConfig, ServiceConfig};
use tokio::sync::oneshot;
use tracing::{info, warn};
use url::Url;

use crate::config::{BlocklistConfig, ClientConfig, PeerbanConfig};

/// Attempts for the startup login.
const LOGIN_ATTEMPTS: usize = 5;

/// Delay between startup login attempts.
const LOGIN_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Log in, load the external blocklist, then scan until Ctrl-C.
pub async fn launch(config: PeerbanConfig) -> Result<()> {
    let client = Arc::new(connect(&config.client).await?);

    let engine = RuleEngine::from_config(&config.rules).wrap_err("invalid [rules] section")?;
    info!(rules = ?engine.rule_names(), "rule engine ready");

    let ledger = Arc::new(BanLedger::new(config.scan.ban_ttl));
    let blocklist = Arc::new(BlocklistCache::new());

    let (stop_refresher, refresher_stopped) = oneshot::channel::<()>();
    let refresher = match blocklist_refresher(
        &config.blocklist,
        Arc::clone(&blocklist),
        config.client.request_timeout,
    )? {
        Some(refresher) => {
            match refresher.refresh().await {
                Ok(count) => info!(count, "external blocklist loaded"),
                Err(err) => warn!(%err, "initial blocklist load failed, starting without it"),
            }
            Some(tokio::spawn(refresher.run(async move {
                let _ = refresher_stopped.await;
            })))
        }
        None => {
            info!("no external blocklist configured");
            None
        }
    };

    let scanner = Scanner::new(Arc::clone(&client), Arc::new(engine), ledger, blocklist)
        .with_config(ScannerConfig {
            max_concurrent_fetches: config.scan.max_concurrent_fetches,
        });
    let service = BanService::new(
        scanner,
        client,
        ServiceConfig {
            interval: config.scan.interval,
            pass_timeout: config.scan.pass_timeout,
        },
    );

    service
        .run(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(%err, "failed to listen for Ctrl-C, shutting down");
            }
            info!("shutdown requested");
        })
        .await;

    let _ = stop_refresher.send(());
    if let Some(handle) = refresher {
        handle.await.wrap_err("blocklist refresher panicked")?;
    }

    Ok(())
}

/// Build the WebUI client and log in, retrying briefly.
async fn connect(config: &ClientConfig) -> Result<QbitClient> {
    let base = Url::parse(&config.url)
        .wrap_err_with(|| format!("invalid client url {:?}", config.url))?;
    let client = QbitClient::new(
        base,
        QbitCredentials {
            username: config.username.clone(),
            password: config.password.clone(),
        },
        config.request_timeout,
    )?;

    Backoff::fixed(LOGIN_RETRY_DELAY, LOGIN_ATTEMPTS)
        .retry("login", |_| client.login())
        .await
        .wrap_err_with(|| format!("login to {} failed", client.base()))?;
    info!(url = %client.base(), user = %config.username, "logged in");

    Ok(client)
}

/// A refresher for the configured source, or `None` when no URL is set.
fn blocklist_refresher(
    config: &BlocklistConfig,
    cache: Arc<BlocklistCache>,
    timeout: Duration,
) -> Result<Option<BlocklistRefresher<HttpBlocklistSource>>> {
    let Some(raw) = config.url.as_deref().filter(|url| !url.trim().is_empty()) else {
        return Ok(None);
    };
    let url = Url::parse(raw.trim()).wrap_err_with(|| format!("invalid blocklist url {raw:?}"))?;
    let source = HttpBlocklistSource::new(url, timeout)?;

    Ok(Some(
        BlocklistRefresher::new(cache, source)
            .with_interval(config.refresh_interval)
            .with_backoff(Backoff::default().with_max_attempts(config.retry_attempts)),
    ))
}
