//! # Breathwork Core Library
//!
//! This library provides the core logic for guided breathing sessions.
//! All operations are available through the standalone `breathwork` CLI,
//! which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Pattern**: Breathing patterns (inhale, hold, exhale, pause), built-in
//!   presets and the user's saved custom patterns
//! - **Session Engine**: A delta-driven state machine; the caller reports how
//!   much time passed and gets back the events that happened
//! - **Session Driver**: The single tick source that feeds real elapsed time
//!   into the engine and snapshots progress for later resumption
//! - **Storage**: A key-value store (SQLite or in-memory) and TOML configuration
//! - **History**: Completed sessions and streak statistics
//! - **Reminders**: An owned scheduler for periodic breathing notifications
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: Phase/cycle state machine
//! - [`SessionDriver`]: Tick source and snapshot persistence
//! - [`SavedSessionResolver`]: Decides whether a saved session can be resumed
//! - [`Database`]: Persistent key-value store
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod history;
pub mod pattern;
pub mod reminders;
pub mod session;
pub mod storage;

pub use error::{
    ConfigError, CoreError, DatabaseError, LibraryError, NotifyError, PatternError,
    SessionError, SnapshotError, StorageError,
};
pub use events::Event;
pub use history::{HistoryEntry, HistoryStats, SessionHistory};
pub use pattern::{Pattern, PatternEntry, PatternLibrary, Phase};
pub use reminders::{Notifier, ReminderScheduler, ReminderSettings};
pub use session::{
    Control, DriverConfig, SavedSessionResolver, SessionDriver, SessionEngine, SessionProgress,
    SessionSnapshot, SessionState, SessionSummary,
};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
