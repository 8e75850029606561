//! In-memory ban ledger (does not persist across restarts).
//!
//! Holds two TTL maps: individual addresses, which are the only thing ever
//! pushed to the managed client, and their derived network prefixes, which
//! let later peers from the same range be recognised. Mutation happens under
//! a single lock; the dirty flag is a lock-free monotonic OR cleared only by
//! whoever pushes the address set downstream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ipnet::IpNet;
use parking_lot::RwLock;
use peerban_primitives::{network_prefix_of, parse_addr, truncate_to_hour, unix_now};
use tracing::{trace, warn};

/// Default lifetime of a ban entry.
pub const DEFAULT_BAN_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Outcome of an expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub expired_addresses: usize,
    pub expired_prefixes: usize,
}

#[derive(Debug, Default)]
struct Entries {
    /// Address -> expiry (unix seconds).
    addresses: HashMap<String, u64>,
    /// Derived prefix -> expiry (unix seconds).
    prefixes: HashMap<IpNet, u64>,
}

/// TTL ban store shared by all evaluation tasks of a pass.
#[derive(Debug)]
pub struct BanLedger {
    ttl: Duration,
    entries: RwLock<Entries>,
    dirty: AtomicBool,
}

impl Default for BanLedger {
    fn default() -> Self {
        Self::new(DEFAULT_BAN_TTL)
    }
}

impl BanLedger {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(Entries::default()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Ban `address` for the configured TTL from now.
    pub fn insert(&self, address: &str) {
        self.insert_at(address, unix_now());
    }

    /// Ban `address` and its derived prefix until `now + ttl`.
    ///
    /// Re-inserting an existing key only ever extends its expiry. Addresses
    /// are keyed by their canonical form; ones that don't parse are still
    /// recorded verbatim but contribute no prefix.
    pub fn insert_at(&self, address: &str, now: u64) {
        let expiry = now.saturating_add(self.ttl.as_secs().max(1));
        let ip = parse_addr(address);
        let prefix = ip.map(network_prefix_of);
        let key = ip.map_or_else(|| address.to_owned(), |ip| ip.to_string());
        {
            let mut entries = self.entries.write();
            let slot = entries.addresses.entry(key).or_insert(expiry);
            *slot = (*slot).max(expiry);
            if let Some(prefix) = prefix {
                let slot = entries.prefixes.entry(prefix).or_insert(expiry);
                *slot = (*slot).max(expiry);
            }
        }
        if prefix.is_none() {
            warn!(%address, "banned address does not parse, no prefix recorded");
        }
        self.dirty.store(true, Ordering::Release);
        trace!(%address, expiry, "ban recorded");
    }

    /// Drop every entry whose expiry is at or before `now` truncated to the hour.
    ///
    /// Expired addresses mark the ledger dirty; expired prefixes don't, since
    /// prefixes are never pushed downstream.
    pub fn sweep(&self, now: u64) -> SweepStats {
        let cutoff = truncate_to_hour(now);
        let mut entries = self.entries.write();

        let before = entries.addresses.len();
        entries.addresses.retain(|_, expiry| *expiry > cutoff);
        let expired_addresses = before - entries.addresses.len();

        let before = entries.prefixes.len();
        entries.prefixes.retain(|_, expiry| *expiry > cutoff);
        let expired_prefixes = before - entries.prefixes.len();

        if expired_addresses > 0 {
            self.dirty.store(true, Ordering::Release);
        }

        SweepStats {
            expired_addresses,
            expired_prefixes,
        }
    }

    /// Whether the derived prefix is currently banned.
    pub fn contains_prefix(&self, prefix: &IpNet) -> bool {
        self.entries.read().prefixes.contains_key(prefix)
    }

    pub fn contains_address(&self, address: &str) -> bool {
        self.entries.read().addresses.contains_key(&address_key(address))
    }

    /// Expiry of a banned address, if present.
    pub fn address_expiry(&self, address: &str) -> Option<u64> {
        self.entries.read().addresses.get(&address_key(address)).copied()
    }

    pub fn prefix_expiry(&self, prefix: &IpNet) -> Option<u64> {
        self.entries.read().prefixes.get(prefix).copied()
    }

    /// Current set of banned addresses, sorted for stable output.
    pub fn snapshot_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.entries.read().addresses.keys().cloned().collect();
        addresses.sort_unstable();
        addresses
    }

    pub fn address_count(&self) -> usize {
        self.entries.read().addresses.len()
    }

    pub fn prefix_count(&self) -> usize {
        self.entries.read().prefixes.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Clear the dirty flag, returning whether it was set.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}

/// Ledger key of an address: its canonical text, or the input if it doesn't parse.
fn address_key(address: &str) -> String {
    parse_addr(address).map_or_else(|| address.to_owned(), |ip| ip.to_string())
}
