//! Node wiring for peerban.
//!
//! - [`args`] - command-line interface
//! - [`config`] - TOML configuration file
//! - [`logging`] - tracing subscriber setup
//! - [`launch`] - builds the client, ledger, rules and loops and runs them

pub mod args;
pub mod config;
pub mod launch;
pub mod logging;

pub use args::{Cli, ClientArgs, LogArgs};
pub use config::PeerbanConfig;
pub use launch::launch;
