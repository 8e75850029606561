//! Snapshot-swapping cache.

use std::sync::Arc;

use ipnet::IpNet;
use parking_lot::RwLock;
use peerban_primitives::parse_addr;

/// An immutable list of banned prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlocklistSnapshot {
    prefixes: Vec<IpNet>,
}

impl BlocklistSnapshot {
    pub fn new(prefixes: Vec<IpNet>) -> Self {
        Self { prefixes }
    }

    pub fn prefixes(&self) -> &[IpNet] {
        &self.prefixes
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Containment test by prefix. An address that doesn't parse counts as
    /// contained.
    pub fn contains(&self, address: &str) -> bool {
        match parse_addr(address) {
            Some(ip) => self.prefixes.iter().any(|net| net.contains(&ip)),
            None => true,
        }
    }
}

/// Holds the current [`BlocklistSnapshot`].
///
/// Readers take an `Arc` to the current snapshot under a momentary read lock
/// and then test against it lock-free for as long as they like. The refresher
/// publishes a fully built replacement in one pointer swap, so no reader ever
/// observes a partially updated list.
#[derive(Debug, Default)]
pub struct BlocklistCache {
    current: RwLock<Arc<BlocklistSnapshot>>,
}

impl BlocklistCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot in effect right now.
    pub fn snapshot(&self) -> Arc<BlocklistSnapshot> {
        self.current.read().clone()
    }

    /// Atomically replace the whole list.
    pub fn replace(&self, prefixes: Vec<IpNet>) {
        let next = Arc::new(BlocklistSnapshot::new(prefixes));
        *self.current.write() = next;
    }

    pub fn contains(&self, address: &str) -> bool {
        self.snapshot().contains(address)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
