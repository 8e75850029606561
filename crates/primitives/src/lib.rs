//! Common types for peer evaluation: peers, transfers, and network prefixes.

mod peer;
mod prefix;
mod time;
mod transfer;

pub use peer::Peer;
pub use prefix::{
    IPV4_PREFIX_LEN, IPV6_PREFIX_LEN, network_prefix, network_prefix_of, parse_addr,
};
pub use time::{HOUR_SECS, truncate_to_hour, unix_now};
pub use transfer::Transfer;
