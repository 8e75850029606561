//! One evaluation pass over the managed client's swarm, the change-detecting
//! push of the resulting ban list, and the loop that drives both on a tick.

mod error;
mod scanner;
mod service;
mod sync;

pub use error::{ScanError, ServiceError};
pub use scanner::{DEFAULT_MAX_CONCURRENT_FETCHES, PassReport, Scanner, ScannerConfig};
pub use service::{
    BanService, DEFAULT_PASS_TIMEOUT, DEFAULT_SCAN_INTERVAL, ServiceConfig, TickReport,
};
pub use sync::{BanSync, SyncOutcome};
