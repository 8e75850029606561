//! Peer classification.
//!
//! A [`RuleEngine`] holds an ordered list of [`Rule`]s. Each peer is run
//! through them in order and the first rule that fires decides the ban and
//! its [`BanReason`]. Classification never fails: inputs that can't be
//! interpreted resolve to whatever the individual rule defines for them.

mod config;
mod engine;
mod reason;
pub mod rules;

pub use config::{ProgressThresholds, RuleConfigError, RulesConfig};
pub use engine::{PeerContext, Rule, RuleEngine, Verdict};
pub use reason::BanReason;
