//! Background refresh of the blocklist cache.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use peerban_backoff::Backoff;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::BlocklistCache;
use crate::parse::parse_blocklist;
use crate::source::{BlocklistError, BlocklistSource};

/// Default interval between refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Keeps a [`BlocklistCache`] in step with its source, independently of the scan loop.
pub struct BlocklistRefresher<S> {
    cache: Arc<BlocklistCache>,
    source: S,
    interval: Duration,
    backoff: Backoff,
}

impl<S: BlocklistSource> BlocklistRefresher<S> {
    pub fn new(cache: Arc<BlocklistCache>, source: S) -> Self {
        Self {
            cache,
            source,
            interval: DEFAULT_REFRESH_INTERVAL,
            backoff: Backoff::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn cache(&self) -> &Arc<BlocklistCache> {
        &self.cache
    }

    /// Fetch, parse and publish the list, retrying per the backoff policy.
    ///
    /// On failure the previous snapshot stays in effect. Returns the number of
    /// prefixes published.
    pub async fn refresh(&self) -> Result<usize, BlocklistError> {
        let text = self
            .backoff
            .retry("blocklist fetch", |_| self.source.fetch())
            .await?;
        let prefixes = parse_blocklist(&text);
        let count = prefixes.len();
        self.cache.replace(prefixes);
        Ok(count)
    }

    /// Refresh every `interval` until `shutdown` resolves. The first refresh
    /// happens one interval from now; callers do the initial load themselves.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("blocklist refresher stopping");
                    return;
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = &mut shutdown => {
                            debug!("blocklist refresher stopping mid-refresh");
                            return;
                        }
                        result = self.refresh() => self.log_refresh(result),
                    }
                }
            }
        }
    }

    fn log_refresh(&self, result: Result<usize, BlocklistError>) {
        let source = self.source.describe();
        match result {
            Ok(count) => info!(%source, count, "external blocklist updated"),
            Err(err) => warn!(
                %source,
                %err,
                "external blocklist refresh failed, keeping previous list"
            ),
        }
    }
}
