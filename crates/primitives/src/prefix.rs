//! Fixed-width network prefix derivation.
//!
//! Every address maps to exactly one aggregation prefix: its /24 for IPv4 and
//! its /48 for IPv6. IPv4-mapped IPv6 addresses are treated as IPv4.

use std::net::IpAddr;

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

/// Aggregation width for IPv4 addresses.
pub const IPV4_PREFIX_LEN: u8 = 24;

/// Aggregation width for IPv6 addresses.
pub const IPV6_PREFIX_LEN: u8 = 48;

/// Parse a textual address into its canonical form.
pub fn parse_addr(s: &str) -> Option<IpAddr> {
    s.trim().parse::<IpAddr>().ok().map(|ip| ip.to_canonical())
}

/// Derive the aggregation prefix of an already-parsed address.
pub fn network_prefix_of(ip: IpAddr) -> IpNet {
    match ip.to_canonical() {
        IpAddr::V4(v4) => IpNet::V4(Ipv4Net::new_assert(v4, IPV4_PREFIX_LEN).trunc()),
        IpAddr::V6(v6) => IpNet::V6(Ipv6Net::new_assert(v6, IPV6_PREFIX_LEN).trunc()),
    }
}

/// Derive the aggregation prefix of a textual address, `None` if it doesn't parse.
pub fn network_prefix(s: &str) -> Option<IpNet> {
    parse_addr(s).map(network_prefix_of)
}
