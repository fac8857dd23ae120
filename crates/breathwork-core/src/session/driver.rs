//! Single tick source for an active session.
//!
//! The driver owns the engine for the lifetime of a session. Each call to
//! [`SessionDriver::advance`] feeds the real time since the previous call to
//! the engine, then saves a snapshot whenever enough running time has
//! accumulated. Ticking and saving happen in one place, so a snapshot
//! always reflects the last completed tick.

use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::engine::{SessionEngine, SessionState, SessionSummary};
use crate::events::Event;
use crate::storage::{keys, KeyValueStore};

/// Requests from the UI to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Pause,
    Resume,
    TogglePause,
    /// The app lost visibility or is about to unload.
    Background,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// How often `run` ticks the engine.
    pub tick_interval: Duration,
    /// Running time between snapshot saves.
    pub snapshot_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            snapshot_interval: Duration::from_secs(5),
        }
    }
}

pub struct SessionDriver<'a, S: KeyValueStore + ?Sized> {
    engine: SessionEngine,
    store: &'a S,
    config: DriverConfig,
    last_instant: Option<Instant>,
    /// Nanoseconds below the engine's microsecond resolution not yet fed in.
    carry_ns: u32,
    since_snapshot: Duration,
}

impl<'a, S: KeyValueStore + ?Sized> SessionDriver<'a, S> {
    /// Take ownership of a started (or resumed) engine and save its initial
    /// snapshot.
    pub fn new(engine: SessionEngine, store: &'a S, config: DriverConfig) -> Self {
        let mut driver = Self {
            engine,
            store,
            config,
            last_instant: None,
            carry_ns: 0,
            since_snapshot: Duration::ZERO,
        };
        driver.persist();
        driver
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Tick the engine up to `now`.
    ///
    /// The first call only sets the baseline. Instants earlier than the
    /// previous one count as zero elapsed time. Sub-microsecond remainders
    /// carry over to the next call.
    pub fn advance(&mut self, now: Instant) -> Vec<Event> {
        let delta = match self.last_instant.replace(now) {
            Some(prev) => now.saturating_duration_since(prev),
            None => Duration::ZERO,
        };

        let was_running = self.engine.state() == SessionState::Running;
        if !was_running {
            self.carry_ns = 0;
            return Vec::new();
        }

        let delta = delta + Duration::from_nanos(u64::from(self.carry_ns));
        self.carry_ns = delta.subsec_nanos() % 1_000;
        let whole = delta - Duration::from_nanos(u64::from(self.carry_ns));
        let events = self.engine.tick(whole);

        self.since_snapshot += whole;
        match self.engine.state() {
            SessionState::Completed => self.clear_snapshot(),
            SessionState::Running if self.since_snapshot >= self.config.snapshot_interval => {
                self.persist();
            }
            _ => {}
        }
        events
    }

    /// Catch up to `now`, then apply `change` and save if it did anything.
    fn change_state(
        &mut self,
        now: Instant,
        change: fn(&mut SessionEngine) -> Option<Event>,
    ) -> Vec<Event> {
        let mut events = self.advance(now);
        if let Some(event) = change(&mut self.engine) {
            self.persist();
            events.push(event);
        }
        events
    }

    pub fn pause(&mut self, now: Instant) -> Vec<Event> {
        self.change_state(now, SessionEngine::pause)
    }

    pub fn resume(&mut self, now: Instant) -> Vec<Event> {
        self.change_state(now, SessionEngine::resume)
    }

    pub fn toggle_pause(&mut self, now: Instant) -> Vec<Event> {
        self.change_state(now, SessionEngine::toggle_pause)
    }

    /// Visibility lost or unload imminent: catch up and save now.
    pub fn on_background(&mut self, now: Instant) -> Vec<Event> {
        let events = self.advance(now);
        self.persist();
        events
    }

    /// Count running time up to `now`, end the session, clear the saved
    /// snapshot and return the summary.
    pub fn exit(&mut self, now: Instant) -> SessionSummary {
        self.advance(now);
        let summary = self.engine.exit();
        self.clear_snapshot();
        summary
    }

    /// Apply a UI request received at `now`. Returns every event it caused,
    /// including phase changes from the time since the last tick.
    pub fn apply(&mut self, control: Control, now: Instant) -> Vec<Event> {
        match control {
            Control::Pause => self.pause(now),
            Control::Resume => self.resume(now),
            Control::TogglePause => self.toggle_pause(now),
            Control::Background => self.on_background(now),
            Control::Exit => {
                let mut events = self.advance(now);
                if !self.engine.is_finished() {
                    let summary = self.engine.exit();
                    self.clear_snapshot();
                    events.push(Event::SessionExited { summary });
                }
                events
            }
        }
    }

    /// Save a snapshot of an unfinished session. Failures are logged and
    /// reported as `false`; they never stop the session.
    pub fn persist(&mut self) -> bool {
        if self.engine.is_finished() {
            return false;
        }
        self.since_snapshot = Duration::ZERO;

        let snapshot = self.engine.snapshot(Utc::now());
        let raw = match snapshot.to_json() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "could not encode session snapshot");
                return false;
            }
        };
        match self.store.set(keys::SAVED_SESSION, &raw) {
            Ok(()) => {
                debug!(
                    phase = %snapshot.progress.current_phase,
                    cycles_completed = snapshot.progress.cycles_completed,
                    "session snapshot saved"
                );
                true
            }
            Err(e) => {
                warn!(error = %e, "could not save session snapshot");
                false
            }
        }
    }

    fn clear_snapshot(&self) {
        if let Err(e) = self.store.remove(keys::SAVED_SESSION) {
            warn!(error = %e, "could not clear session snapshot");
        }
    }

    /// Drive the session on a Tokio interval until it completes or is exited.
    ///
    /// `on_event` sees the engine after every tick (even tickless ones, so a
    /// countdown can redraw) along with the events that tick produced.
    /// Requests arrive on `controls`; a closed channel is ignored.
    pub async fn run<F>(
        &mut self,
        controls: &mut UnboundedReceiver<Control>,
        mut on_event: F,
    ) -> SessionSummary
    where
        F: FnMut(&SessionEngine, &[Event]),
    {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut controls_open = true;
        self.advance(tokio::time::Instant::now().into_std());

        loop {
            tokio::select! {
                control = controls.recv(), if controls_open => {
                    match control {
                        Some(control) => {
                            let events = self.apply(control, tokio::time::Instant::now().into_std());
                            on_event(&self.engine, &events);
                        }
                        None => controls_open = false,
                    }
                }
                _ = ticker.tick() => {
                    let events = self.advance(tokio::time::Instant::now().into_std());
                    on_event(&self.engine, &events);
                }
            }

            if self.engine.is_finished() {
                return self.engine.summary();
            }
        }
    }
}
