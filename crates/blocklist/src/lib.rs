//! External blocklist: newline-delimited prefixes fetched from a remote source
//! and published as an immutable snapshot that evaluation tasks read without
//! contending with the refresher.

mod cache;
mod parse;
mod refresher;
mod source;

pub use cache::{BlocklistCache, BlocklistSnapshot};
pub use parse::{parse_blocklist, parse_line};
pub use refresher::{BlocklistRefresher, DEFAULT_REFRESH_INTERVAL};
pub use source::{BlocklistError, BlocklistSource, HttpBlocklistSource};
