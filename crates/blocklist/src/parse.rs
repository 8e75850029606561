//! Blocklist line parsing.

use ipnet::IpNet;
use peerban_primitives::{network_prefix_of, parse_addr};

/// Parse one line as explicit prefix notation, falling back to a bare address
/// widened to its aggregation prefix. Returns `None` for anything else.
pub fn parse_line(line: &str) -> Option<IpNet> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Ok(net) = line.parse::<IpNet>() {
        return Some(net.trunc());
    }
    parse_addr(line).map(network_prefix_of)
}

/// Parse a whole list, silently skipping lines that are neither prefixes nor addresses.
pub fn parse_blocklist(text: &str) -> Vec<IpNet> {
    text.lines().filter_map(parse_line).collect()
}
