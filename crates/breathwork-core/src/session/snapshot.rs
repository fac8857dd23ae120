//! Persisted, resumable session state.
//!
//! Stored as JSON under [`crate::storage::keys::SAVED_SESSION`]:
//!
//! ```json
//! {
//!   "timestamp": 1760000000000,
//!   "pattern": { "inhale": 4.0, "hold": 4.0, "exhale": 4.0, "pause": 4.0 },
//!   "patternName": "box",
//!   "progress": {
//!     "cyclesCompleted": 2, "totalCycles": 10, "timeElapsed": 37,
//!     "currentPhase": "exhale", "phaseTimeRemaining": 2.7, "isPaused": false
//!   },
//!   "duration": 37
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::pattern::{secs_to_us, Pattern, Phase};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotProgress {
    pub cycles_completed: u32,
    pub total_cycles: u32,
    /// Whole seconds of running time.
    pub time_elapsed: u64,
    pub current_phase: Phase,
    pub phase_time_remaining: f64,
    #[serde(default)]
    pub is_paused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// When the snapshot was taken. Only used for freshness checks.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub pattern: Pattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_name: Option<String>,
    pub progress: SnapshotProgress,
    /// Total elapsed seconds at save time.
    pub duration: u64,
}

impl SessionSnapshot {
    /// Parse and check a stored snapshot.
    ///
    /// # Errors
    /// [`SnapshotError::Malformed`] for bad JSON or missing fields; the
    /// other variants when the content cannot seed an engine.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(raw)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Check that the progress fits the pattern.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.pattern.validate()?;
        let p = &self.progress;
        if p.total_cycles == 0 {
            return Err(SnapshotError::Inconsistent(
                "total cycles is zero".to_string(),
            ));
        }
        if p.cycles_completed >= p.total_cycles {
            return Err(SnapshotError::Inconsistent(format!(
                "{} of {} cycles already completed",
                p.cycles_completed, p.total_cycles
            )));
        }
        let phase_us = self.pattern.duration_us(p.current_phase);
        if phase_us == 0 {
            return Err(SnapshotError::Inconsistent(format!(
                "current phase {} has zero duration",
                p.current_phase
            )));
        }
        if !p.phase_time_remaining.is_finite() || p.phase_time_remaining < 0.0 {
            return Err(SnapshotError::Inconsistent(format!(
                "invalid phase time remaining {}",
                p.phase_time_remaining
            )));
        }
        if secs_to_us(p.phase_time_remaining) > phase_us {
            return Err(SnapshotError::Inconsistent(format!(
                "{}s remaining exceeds {} duration",
                p.phase_time_remaining, p.current_phase
            )));
        }
        Ok(())
    }

    /// Time since the snapshot was taken. Negative if the clock went back.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.timestamp)
    }

    /// `true` while the snapshot is younger than `window`.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now) < window
    }
}
