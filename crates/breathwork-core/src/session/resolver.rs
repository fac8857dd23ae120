//! Start-up check for an interrupted session.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::engine::SessionEngine;
use super::snapshot::SessionSnapshot;
use crate::error::SnapshotError;
use crate::storage::{keys, KeyValueStore};

/// Snapshots this old or older are never offered for resume.
pub const FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Decides whether a saved session should be offered for resume.
pub struct SavedSessionResolver<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
    window: Duration,
}

impl<'a, S: KeyValueStore + ?Sized> SavedSessionResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_window(store, Duration::hours(FRESHNESS_WINDOW_HOURS))
    }

    pub fn with_window(store: &'a S, window: Duration) -> Self {
        Self { store, window }
    }

    /// Return the saved snapshot if one exists and is still fresh.
    ///
    /// Stale, malformed or inconsistent snapshots are deleted. Store failures
    /// are logged and read as "nothing to resume".
    pub fn check_for_resumable(&self, now: DateTime<Utc>) -> Option<SessionSnapshot> {
        let raw = match self.store.get(keys::SAVED_SESSION) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "could not read saved session");
                return None;
            }
        };

        let snapshot = match SessionSnapshot::from_json(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "discarding unusable saved session");
                self.remove();
                return None;
            }
        };

        if !snapshot.is_fresh(now, self.window) {
            let age_hours = snapshot.age(now).num_milliseconds() as f64 / 3_600_000.0;
            info!(age_hours, "discarding stale saved session");
            self.remove();
            return None;
        }

        Some(snapshot)
    }

    /// Build an engine that continues exactly where the snapshot stopped.
    ///
    /// The stored snapshot is left in place; the new session's driver
    /// overwrites it on its first save.
    pub fn resume(&self, snapshot: &SessionSnapshot) -> Result<SessionEngine, SnapshotError> {
        SessionEngine::from_snapshot(snapshot)
    }

    /// Drop the offer: delete the stored snapshot.
    pub fn discard(&self, snapshot: &SessionSnapshot) {
        info!(
            saved_at = %snapshot.timestamp,
            cycles_completed = snapshot.progress.cycles_completed,
            "discarding saved session"
        );
        self.remove();
    }

    fn remove(&self) {
        if let Err(e) = self.store.remove(keys::SAVED_SESSION) {
            warn!(error = %e, "could not delete saved session");
        }
    }
}
