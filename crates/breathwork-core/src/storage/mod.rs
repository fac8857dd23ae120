mod config;
pub mod database;
mod memory;
mod migrations;

pub use config::{Config, LoggingConfig, SessionConfig};
pub use database::Database;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::{ConfigError, StorageError};

/// Keys owned by breathwork inside a shared key-value store.
pub mod keys {
    /// Resumable session snapshot (JSON object).
    pub const SAVED_SESSION: &str = "breathwork.saved_session";
    /// Name of the selected pattern (JSON string).
    pub const ACTIVE_PATTERN: &str = "breathwork.active_pattern";
    /// User-defined patterns (JSON array).
    pub const CUSTOM_PATTERNS: &str = "breathwork.custom_patterns";
    /// Completed session log (JSON array).
    pub const SESSION_HISTORY: &str = "breathwork.session_history";
}

/// String-keyed store holding JSON-encoded values.
///
/// Writes are last-writer-wins per key. Implementations take `&self` so a
/// single store can be shared by the session driver, the resolver and the
/// history and pattern collaborators at the same time.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value. A missing key yields `Ok(None)`.
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Returns the breathwork data directory, creating it if needed.
///
/// `BREATHWORK_DATA_DIR` overrides the location outright. Otherwise the
/// directory is `~/.config/breathwork/`, or `~/.config/breathwork-dev/` when
/// `BREATHWORK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("BREATHWORK_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("BREATHWORK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("breathwork-dev")
            } else {
                base_dir.join("breathwork")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
