//! Ordered rule evaluation.

use std::fmt::Debug;

use peerban_blocklist::BlocklistSnapshot;
use peerban_ledger::BanLedger;
use peerban_primitives::{Peer, Transfer};

use crate::config::{RuleConfigError, RulesConfig};
use crate::reason::BanReason;
use crate::rules::{ExternalBlocklistRule, IdentityRule, KnownRangeRule, ProgressRule};

/// Everything a rule may look at for one peer.
#[derive(Debug, Clone, Copy)]
pub struct PeerContext<'a> {
    pub peer: &'a Peer,
    pub transfer: &'a Transfer,
    pub ledger: &'a BanLedger,
    pub blocklist: &'a BlocklistSnapshot,
}

/// A single ban predicate. Returns the reason if the peer should be banned.
pub trait Rule: Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &PeerContext<'_>) -> Option<BanReason>;
}

/// The rule that fired for a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub rule: &'static str,
    pub reason: BanReason,
}

/// First-match-wins rule list.
#[derive(Debug)]
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    /// Standard rule order: identity, self-learned range, external blocklist, progress.
    pub fn from_config(config: &RulesConfig) -> Result<Self, RuleConfigError> {
        Ok(Self::with_rules(vec![
            Box::new(IdentityRule::new(
                config.peer_id_regex()?,
                config.client_regex()?,
            )),
            Box::new(KnownRangeRule),
            Box::new(ExternalBlocklistRule),
            Box::new(ProgressRule::new(config.progress.clone())),
        ]))
    }

    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Run the peer through each rule in order, stopping at the first match.
    pub fn evaluate(&self, ctx: &PeerContext<'_>) -> Option<Verdict> {
        self.rules.iter().find_map(|rule| {
            rule.check(ctx).map(|reason| Verdict {
                rule: rule.name(),
                reason,
            })
        })
    }
}
