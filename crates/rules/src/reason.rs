use std::fmt;

/// Why a peer was banned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BanReason {
    /// Peer id or client name matched a banned pattern.
    PeerIdentity,
    /// Peer sits in a range another banned peer already contaminated.
    KnownBadRange,
    /// Peer is covered by the external blocklist.
    ExternalBlocklist,
    /// We uploaded more than the whole transfer plus slack.
    UploadExceedsSize,
    /// We uploaded far more than the peer's reported progress accounts for.
    ProgressMismatch,
}

impl BanReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PeerIdentity => "peer identity",
            Self::KnownBadRange => "known bad range",
            Self::ExternalBlocklist => "external blocklist",
            Self::UploadExceedsSize => "upload exceeds total size",
            Self::ProgressMismatch => "progress mismatch",
        }
    }
}

impl fmt::Display for BanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
