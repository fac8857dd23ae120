mod driver;
mod engine;
mod resolver;
mod snapshot;

pub use driver::{Control, DriverConfig, SessionDriver};
pub use engine::{
    SessionEngine, SessionProgress, SessionState, SessionSummary, DEFAULT_TARGET_CYCLES,
};
pub use resolver::{SavedSessionResolver, FRESHNESS_WINDOW_HOURS};
pub use snapshot::{SessionSnapshot, SnapshotProgress};
