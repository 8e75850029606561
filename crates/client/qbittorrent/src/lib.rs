//! qBittorrent WebUI (API v2) client.

mod client;
mod types;

pub use client::{DEFAULT_REQUEST_TIMEOUT, QbitClient, QbitCredentials};
