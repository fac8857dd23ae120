//! Breath-phase session engine.
//!
//! The engine is a pure state machine over accumulated delta time. It never
//! reads a clock: the caller measures real elapsed time and passes it to
//! `tick()`, so throttled or late ticks cannot make the countdown drift.
//!
//! ## State Transitions
//!
//! ```text
//! Running <-> Paused
//! Running -> Completed        (target cycles reached)
//! Running | Paused -> Exited  (user exit)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::start(pattern, 10)?;
//! // In a loop, with the real time since the previous tick:
//! for event in engine.tick(delta) { render(event) }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::snapshot::{SessionSnapshot, SnapshotProgress};
use crate::error::{SessionError, SnapshotError};
use crate::events::Event;
use crate::pattern::{secs_to_us, us_to_secs, Pattern, Phase};

/// Cycle target used when the caller does not pick one.
pub const DEFAULT_TARGET_CYCLES: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Running,
    Paused,
    Completed,
    Exited,
}

/// Point-in-time view of a session, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProgress {
    pub current_phase: Phase,
    /// Seconds left in the current phase.
    pub phase_time_remaining: f64,
    pub cycles_completed: u32,
    /// Whole seconds of running time; paused time is excluded.
    pub time_elapsed_seconds: u64,
    pub is_paused: bool,
}

/// Final result of a session, handed to history once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub duration_seconds: u64,
    pub cycles_completed: u32,
    pub pattern: Pattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_name: Option<String>,
}

/// Drives one breathing session from start to completion or exit.
#[derive(Debug, Clone)]
pub struct SessionEngine {
    pattern: Pattern,
    pattern_name: Option<String>,
    target_cycles: u32,
    state: SessionState,
    phase: Phase,
    /// Microseconds left in the current phase.
    remaining_us: u64,
    cycles_completed: u32,
    /// Running time in microseconds.
    elapsed_us: u64,
    /// Rebuilt from a snapshot rather than started fresh.
    resumed: bool,
}

impl SessionEngine {
    /// Start a session at the first non-zero phase of the first cycle.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidPattern`] for a pattern that fails
    /// validation and [`SessionError::ZeroTargetCycles`] for a zero target.
    /// No session exists after an error.
    pub fn start(pattern: Pattern, target_cycles: u32) -> Result<Self, SessionError> {
        pattern.validate()?;
        if target_cycles == 0 {
            return Err(SessionError::ZeroTargetCycles);
        }

        let mut engine = Self {
            pattern,
            pattern_name: None,
            target_cycles,
            state: SessionState::Running,
            phase: Phase::Inhale,
            remaining_us: pattern.duration_us(Phase::Inhale),
            cycles_completed: 0,
            elapsed_us: 0,
            resumed: false,
        };
        if engine.remaining_us == 0 {
            // No wrap can happen here: validation guarantees a later phase is non-zero.
            engine.advance_phase(&mut Vec::new());
        }
        info!(%pattern, target_cycles, "session started");
        Ok(engine)
    }

    /// Attach a display name for the pattern.
    pub fn with_pattern_name(mut self, name: impl Into<String>) -> Self {
        self.pattern_name = Some(name.into());
        self
    }

    /// Rebuild a session exactly where a snapshot left it.
    ///
    /// # Errors
    /// Returns [`SnapshotError`] if the snapshot's pattern is invalid or its
    /// progress does not fit the pattern.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Result<Self, SnapshotError> {
        snapshot.validate()?;
        let progress = &snapshot.progress;
        let engine = Self {
            pattern: snapshot.pattern,
            pattern_name: snapshot.pattern_name.clone(),
            target_cycles: progress.total_cycles,
            state: if progress.is_paused {
                SessionState::Paused
            } else {
                SessionState::Running
            },
            phase: progress.current_phase,
            remaining_us: secs_to_us(progress.phase_time_remaining),
            cycles_completed: progress.cycles_completed,
            elapsed_us: progress.time_elapsed.saturating_mul(1_000_000),
            resumed: true,
        };
        info!(
            phase = %engine.phase,
            cycles_completed = engine.cycles_completed,
            elapsed_secs = progress.time_elapsed,
            "session resumed from snapshot"
        );
        Ok(engine)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn pattern_name(&self) -> Option<&str> {
        self.pattern_name.as_deref()
    }

    pub fn target_cycles(&self) -> u32 {
        self.target_cycles
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    /// Seconds left in the current phase.
    pub fn phase_time_remaining(&self) -> f64 {
        us_to_secs(self.remaining_us)
    }

    pub fn time_elapsed_seconds(&self) -> u64 {
        self.elapsed_us / 1_000_000
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    /// `true` once the session is completed or exited.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, SessionState::Completed | SessionState::Exited)
    }

    /// 0.0 .. 1.0 progress within the current phase, for animating the orb.
    pub fn phase_progress(&self) -> f64 {
        let total = self.pattern.duration_us(self.phase);
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_us as f64 / total as f64)
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            current_phase: self.phase,
            phase_time_remaining: self.phase_time_remaining(),
            cycles_completed: self.cycles_completed,
            time_elapsed_seconds: self.time_elapsed_seconds(),
            is_paused: self.is_paused(),
        }
    }

    /// Summary of the session so far.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            duration_seconds: self.time_elapsed_seconds(),
            cycles_completed: self.cycles_completed,
            pattern: self.pattern,
            pattern_name: self.pattern_name.clone(),
        }
    }

    /// The event announcing where this session begins: `SessionStarted` for
    /// a fresh session, `SessionResumed` for one rebuilt from a snapshot.
    pub fn opening_event(&self) -> Event {
        if self.resumed {
            Event::SessionResumed {
                phase: self.phase,
                remaining_secs: self.phase_time_remaining(),
                cycles_completed: self.cycles_completed,
            }
        } else {
            Event::SessionStarted {
                phase: self.phase,
                phase_secs: self.phase_time_remaining(),
                target_cycles: self.target_cycles,
            }
        }
    }

    /// Capture a resumable copy of the current progress. Pure; the caller
    /// decides where to persist it.
    pub fn snapshot(&self, taken_at: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            timestamp: taken_at,
            pattern: self.pattern,
            pattern_name: self.pattern_name.clone(),
            progress: SnapshotProgress {
                cycles_completed: self.cycles_completed,
                total_cycles: self.target_cycles,
                time_elapsed: self.time_elapsed_seconds(),
                current_phase: self.phase,
                phase_time_remaining: self.phase_time_remaining(),
                is_paused: self.is_paused(),
            },
            duration: self.time_elapsed_seconds(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Advance by `delta` of real time. No-op unless running.
    ///
    /// A delta longer than the current phase carries over into the following
    /// phases, so one late tick still lands on the right phase.
    pub fn tick(&mut self, delta: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        if self.state != SessionState::Running {
            return events;
        }

        let mut left = u64::try_from(delta.as_micros()).unwrap_or(u64::MAX);
        while left > 0 && self.state == SessionState::Running {
            let step = left.min(self.remaining_us);
            self.remaining_us -= step;
            self.elapsed_us = self.elapsed_us.saturating_add(step);
            left -= step;
            if self.remaining_us == 0 {
                self.advance_phase(&mut events);
            }
        }
        events
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != SessionState::Running {
            return None;
        }
        self.state = SessionState::Paused;
        debug!(phase = %self.phase, remaining_us = self.remaining_us, "session paused");
        Some(Event::Paused {
            phase: self.phase,
            remaining_secs: self.phase_time_remaining(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != SessionState::Paused {
            return None;
        }
        self.state = SessionState::Running;
        debug!(phase = %self.phase, remaining_us = self.remaining_us, "session resumed");
        Some(Event::Resumed {
            phase: self.phase,
            remaining_secs: self.phase_time_remaining(),
        })
    }

    pub fn toggle_pause(&mut self) -> Option<Event> {
        match self.state {
            SessionState::Running => self.pause(),
            SessionState::Paused => self.resume(),
            _ => None,
        }
    }

    /// End the session early. Returns the summary of what was done.
    ///
    /// On an already completed session this only returns its summary.
    pub fn exit(&mut self) -> SessionSummary {
        if matches!(self.state, SessionState::Running | SessionState::Paused) {
            self.state = SessionState::Exited;
            info!(
                cycles_completed = self.cycles_completed,
                elapsed_secs = self.time_elapsed_seconds(),
                "session exited"
            );
        }
        self.summary()
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Move to the next phase with a non-zero duration, counting a cycle at
    /// each pause -> inhale wrap.
    fn advance_phase(&mut self, events: &mut Vec<Event>) {
        loop {
            let next = self.phase.next();
            if next == Phase::Inhale {
                self.cycles_completed += 1;
                events.push(Event::CycleCompleted {
                    cycles_completed: self.cycles_completed,
                });
                if self.cycles_completed >= self.target_cycles {
                    self.remaining_us = 0;
                    self.state = SessionState::Completed;
                    info!(
                        cycles_completed = self.cycles_completed,
                        elapsed_secs = self.time_elapsed_seconds(),
                        "session completed"
                    );
                    events.push(Event::SessionCompleted {
                        summary: self.summary(),
                    });
                    return;
                }
            }

            self.phase = next;
            self.remaining_us = self.pattern.duration_us(next);
            if self.remaining_us > 0 {
                debug!(phase = %next, cycles_completed = self.cycles_completed, "phase changed");
                events.push(Event::PhaseChanged {
                    phase: next,
                    duration_secs: us_to_secs(self.remaining_us),
                    cycles_completed: self.cycles_completed,
                });
                return;
            }
        }
    }
}
