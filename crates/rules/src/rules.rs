//! The built-in rules.

use peerban_primitives::network_prefix;
use regex::Regex;

use crate::config::ProgressThresholds;
use crate::engine::{PeerContext, Rule};
use crate::reason::BanReason;

/// Bans peers whose peer-id client string or client name matches a banned pattern.
#[derive(Debug, Clone)]
pub struct IdentityRule {
    peer_id: Option<Regex>,
    client: Option<Regex>,
}

impl IdentityRule {
    pub fn new(peer_id: Option<Regex>, client: Option<Regex>) -> Self {
        Self { peer_id, client }
    }
}

impl Rule for IdentityRule {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn check(&self, ctx: &PeerContext<'_>) -> Option<BanReason> {
        let peer = ctx.peer;
        let hit = self.peer_id.as_ref().is_some_and(|re| re.is_match(&peer.peer_id))
            || self.client.as_ref().is_some_and(|re| re.is_match(&peer.client));
        hit.then_some(BanReason::PeerIdentity)
    }
}

/// Bans peers whose aggregation prefix already has a ban in the ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownRangeRule;

impl Rule for KnownRangeRule {
    fn name(&self) -> &'static str {
        "known-range"
    }

    fn check(&self, ctx: &PeerContext<'_>) -> Option<BanReason> {
        let prefix = network_prefix(&ctx.peer.address)?;
        ctx.ledger
            .contains_prefix(&prefix)
            .then_some(BanReason::KnownBadRange)
    }
}

/// Bans peers covered by the external blocklist. Unparseable addresses match.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalBlocklistRule;

impl Rule for ExternalBlocklistRule {
    fn name(&self) -> &'static str {
        "external-blocklist"
    }

    fn check(&self, ctx: &PeerContext<'_>) -> Option<BanReason> {
        ctx.blocklist
            .contains(&ctx.peer.address)
            .then_some(BanReason::ExternalBlocklist)
    }
}

/// Flags peers that keep downloading far beyond what their reported progress
/// allows, the signature of clients faking progress to dodge share ratios.
#[derive(Debug, Clone, Default)]
pub struct ProgressRule {
    thresholds: ProgressThresholds,
}

impl ProgressRule {
    pub fn new(thresholds: ProgressThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ProgressThresholds {
        &self.thresholds
    }
}

impl Rule for ProgressRule {
    fn name(&self) -> &'static str {
        "progress"
    }

    fn check(&self, ctx: &PeerContext<'_>) -> Option<BanReason> {
        let peer = ctx.peer;
        let total = ctx.transfer.total_size;

        // No peer id: not enough signal to judge.
        if !peer.has_peer_id() {
            return None;
        }
        if peer.uploaded < self.thresholds.floor(total) {
            return None;
        }
        if peer.uploaded > total.saturating_add(self.thresholds.size_slack) {
            return Some(BanReason::UploadExceedsSize);
        }
        if peer.uploaded as f64 > self.thresholds.ceiling(total, peer.progress) {
            return Some(BanReason::ProgressMismatch);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerban_blocklist::{BlocklistSnapshot, parse_blocklist};
    use peerban_ledger::BanLedger;
    use peerban_primitives::{Peer, Transfer};
    use proptest::prelude::*;

    const GB: u64 = 1_000_000_000;

    fn check(rule: &dyn Rule, peer: &Peer, total_size: u64) -> Option<BanReason> {
        check_with(rule, peer, total_size, &BanLedger::default(), &BlocklistSnapshot::default())
    }

    fn check_with(
        rule: &dyn Rule,
        peer: &Peer,
        total_size: u64,
        ledger: &BanLedger,
        blocklist: &BlocklistSnapshot,
    ) -> Option<BanReason> {
        let transfer = Transfer::new("hash", "name", total_size);
        rule.check(&PeerContext {
            peer,
            transfer: &transfer,
            ledger,
            blocklist,
        })
    }

    fn identity(peer_id: &str, client: &str) -> IdentityRule {
        let compile = |p: &str| (!p.is_empty()).then(|| Regex::new(p).unwrap());
        IdentityRule::new(compile(peer_id), compile(client))
    }

    #[test]
    fn test_identity_matches_peer_id() {
        let rule = identity("^-XL", "");
        let peer = Peer::new("192.0.2.1").with_peer_id("-XL0012-");
        assert_eq!(check(&rule, &peer, GB), Some(BanReason::PeerIdentity));
    }

    #[test]
    fn test_identity_matches_client() {
        let rule = identity("^-XL", "(?i)xunlei");
        let peer = Peer::new("192.0.2.1")
            .with_peer_id("-UT355W-")
            .with_client("Xunlei 0.0.1.2");
        assert_eq!(check(&rule, &peer, GB), Some(BanReason::PeerIdentity));
    }

    #[test]
    fn test_identity_disabled_patterns_never_match() {
        let rule = identity("", "");
        let peer = Peer::new("192.0.2.1");
        assert_eq!(check(&rule, &peer, GB), None);
    }

    #[test]
    fn test_known_range() {
        let ledger = BanLedger::default();
        ledger.insert("198.51.100.4");

        let neighbour = Peer::new("198.51.100.250");
        let stranger = Peer::new("198.51.101.1");
        let garbage = Peer::new("???");
        let empty = BlocklistSnapshot::default();

        assert_eq!(
            check_with(&KnownRangeRule, &neighbour, GB, &ledger, &empty),
            Some(BanReason::KnownBadRange)
        );
        assert_eq!(check_with(&KnownRangeRule, &stranger, GB, &ledger, &empty), None);
        assert_eq!(check_with(&KnownRangeRule, &garbage, GB, &ledger, &empty), None);
    }

    #[test]
    fn test_external_blocklist() {
        let list = BlocklistSnapshot::new(parse_blocklist("203.0.113.0/24"));
        let ledger = BanLedger::default();

        assert_eq!(
            check_with(&ExternalBlocklistRule, &Peer::new("203.0.113.77"), GB, &ledger, &list),
            Some(BanReason::ExternalBlocklist)
        );
        assert_eq!(
            check_with(&ExternalBlocklistRule, &Peer::new("192.0.2.1"), GB, &ledger, &list),
            None
        );
        assert_eq!(
            check_with(&ExternalBlocklistRule, &Peer::new("bogus"), GB, &ledger, &list),
            Some(BanReason::ExternalBlocklist)
        );
    }

    #[test]
    fn test_progress_mismatch_scenario() {
        let peer = Peer::new("192.0.2.1")
            .with_peer_id("-XF0001-")
            .with_uploaded(400_000_000)
            .with_progress(0.05);
        assert_eq!(
            check(&ProgressRule::default(), &peer, GB),
            Some(BanReason::ProgressMismatch)
        );
    }

    #[test]
    fn test_below_floor_scenario() {
        let peer = Peer::new("192.0.2.1")
            .with_peer_id("-XF0001-")
            .with_uploaded(60_000_000)
            .with_progress(0.9);
        assert_eq!(check(&ProgressRule::default(), &peer, GB), None);

        let peer = peer.with_progress(0.0);
        assert_eq!(check(&ProgressRule::default(), &peer, GB), None);
    }

    #[test]
    fn test_upload_exceeds_size() {
        let peer = Peer::new("192.0.2.1")
            .with_peer_id("-XF0001-")
            .with_uploaded(GB + 50_000_001)
            .with_progress(1.0);
        assert_eq!(
            check(&ProgressRule::default(), &peer, GB),
            Some(BanReason::UploadExceedsSize)
        );

        let peer = peer.with_uploaded(GB + 50_000_000);
        assert_eq!(check(&ProgressRule::default(), &peer, GB), None);
    }

    #[test]
    fn test_consistent_progress_not_flagged() {
        let peer = Peer::new("192.0.2.1")
            .with_peer_id("-qB4620-")
            .with_uploaded(500_000_000)
            .with_progress(0.45);
        // ceiling = 450 MB + 100 MB
        assert_eq!(check(&ProgressRule::default(), &peer, GB), None);
    }

    #[test]
    fn test_custom_thresholds() {
        let rule = ProgressRule::new(ProgressThresholds {
            floor_cap: 30_000_000,
            floor_ratio: 1.0,
            floor_min: 30_000_000,
            ..Default::default()
        });
        let peer = Peer::new("192.0.2.1")
            .with_peer_id("-XF0001-")
            .with_uploaded(200_000_000)
            .with_progress(0.0);
        assert_eq!(rule.thresholds().floor(GB), 30_000_000);
        assert_eq!(check(&rule, &peer, GB), Some(BanReason::ProgressMismatch));
    }

    proptest! {
        #[test]
        fn prop_below_floor_never_matches(
            total in 0u64..100 * GB,
            progress in 0.0f64..=1.0,
            frac in 0.0f64..1.0,
        ) {
            let rule = ProgressRule::default();
            let floor = rule.thresholds().floor(total);
            let uploaded = (floor as f64 * frac) as u64;
            prop_assume!(uploaded < floor);
            let peer = Peer::new("192.0.2.1")
                .with_peer_id("-XL0012-")
                .with_uploaded(uploaded)
                .with_progress(progress);
            prop_assert_eq!(check(&rule, &peer, total), None);
        }

        #[test]
        fn prop_empty_peer_id_never_matches(
            total in 0u64..100 * GB,
            uploaded in any::<u64>(),
            progress in 0.0f64..=1.0,
        ) {
            let peer = Peer::new("192.0.2.1")
                .with_client("anything")
                .with_uploaded(uploaded)
                .with_progress(progress);
            prop_assert_eq!(check(&ProgressRule::default(), &peer, total), None);
        }
    }
}
