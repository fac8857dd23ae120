//! Integration tests for the session lifecycle.
//!
//! Tests the full workflow from starting a session through periodic
//! snapshots, an interrupted process, resumption and history recording,
//! against a real SQLite file.

use std::time::{Duration, Instant};

use breathwork_core::session::SessionSnapshot;
use breathwork_core::storage::keys;
use breathwork_core::{
    Database, DriverConfig, Event, KeyValueStore, Pattern, Phase, SavedSessionResolver,
    SessionDriver, SessionEngine, SessionHistory, SessionState,
};
use chrono::Utc;
use proptest::prelude::*;

fn box_pattern() -> Pattern {
    Pattern::new(4.0, 4.0, 4.0, 4.0).unwrap()
}

#[test]
fn test_interrupted_session_resumes_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("breathwork.db");
    let base = Instant::now();

    {
        let db = Database::open_at(&path).unwrap();
        let engine = SessionEngine::start(box_pattern(), 10)
            .unwrap()
            .with_pattern_name("box");
        let mut driver = SessionDriver::new(engine, &db, DriverConfig::default());
        driver.advance(base);
        driver.advance(base + Duration::from_secs(7));
        // Process dies here without exiting the session.
    }

    let db = Database::open_at(&path).unwrap();
    let resolver = SavedSessionResolver::new(&db);
    let snapshot = resolver
        .check_for_resumable(Utc::now())
        .expect("fresh snapshot");
    assert_eq!(snapshot.progress.time_elapsed, 7);
    assert_eq!(snapshot.progress.current_phase, Phase::Hold);

    let engine = resolver.resume(&snapshot).unwrap();
    assert_eq!(engine.phase(), Phase::Hold);
    assert_eq!(engine.phase_time_remaining(), 1.0);
    assert_eq!(engine.cycles_completed(), 0);
    assert_eq!(engine.pattern_name(), Some("box"));
    assert!(matches!(engine.opening_event(), Event::SessionResumed { .. }));

    // Finish the resumed session and record it.
    let mut driver = SessionDriver::new(engine, &db, DriverConfig::default());
    driver.advance(base);
    let events = driver.advance(base + Duration::from_secs(9 + 16 * 9));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::SessionCompleted { .. })));
    assert_eq!(driver.engine().state(), SessionState::Completed);
    assert_eq!(db.get(keys::SAVED_SESSION).unwrap(), None);

    let summary = driver.engine().summary();
    assert_eq!(summary.cycles_completed, 10);
    assert_eq!(summary.duration_seconds, 160);

    let history = SessionHistory::new(&db);
    history.record(&summary, Utc::now()).unwrap();
    drop(db);

    let db = Database::open_at(&path).unwrap();
    let entries = SessionHistory::new(&db).entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].exercise, "box");
    assert_eq!(entries[0].duration, 160);
}

#[test]
fn test_stale_snapshot_is_deleted() {
    let db = Database::open_memory().unwrap();
    let engine = SessionEngine::start(box_pattern(), 10).unwrap();
    let old = engine.snapshot(Utc::now() - chrono::Duration::hours(25));
    db.set(keys::SAVED_SESSION, &old.to_json().unwrap()).unwrap();

    let resolver = SavedSessionResolver::new(&db);
    assert!(resolver.check_for_resumable(Utc::now()).is_none());
    assert_eq!(db.get(keys::SAVED_SESSION).unwrap(), None);
}

#[test]
fn test_explicit_exit_clears_snapshot_and_reports_partial_progress() {
    let db = Database::open_memory().unwrap();
    let engine = SessionEngine::start(box_pattern(), 10).unwrap();
    let mut driver = SessionDriver::new(engine, &db, DriverConfig::default());
    assert!(db.get(keys::SAVED_SESSION).unwrap().is_some());

    let base = Instant::now();
    driver.advance(base);
    driver.advance(base + Duration::from_secs(5));
    // Time since the last tick still counts toward the summary.
    let summary = driver.exit(base + Duration::from_millis(6_200));
    assert_eq!(summary.duration_seconds, 6);
    assert_eq!(summary.cycles_completed, 0);
    assert_eq!(db.get(keys::SAVED_SESSION).unwrap(), None);
}

#[test]
fn test_snapshot_wire_format() {
    let mut engine = SessionEngine::start(Pattern::new(4.0, 7.0, 8.0, 0.0).unwrap(), 4).unwrap();
    engine.tick(Duration::from_secs(6));
    let raw = engine.snapshot(Utc::now()).to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert!(value["timestamp"].is_i64());
    assert_eq!(value["pattern"]["hold"], 7.0);
    assert_eq!(value["progress"]["cyclesCompleted"], 0);
    assert_eq!(value["progress"]["totalCycles"], 4);
    assert_eq!(value["progress"]["timeElapsed"], 6);
    assert_eq!(value["progress"]["currentPhase"], "hold");
    assert_eq!(value["progress"]["phaseTimeRemaining"], 5.0);
    assert_eq!(value["duration"], 6);

    let parsed = SessionSnapshot::from_json(&raw).unwrap();
    assert_eq!(parsed.progress.current_phase, Phase::Hold);
}

/// Split `total_ms` into consecutive chunks taken from `sizes`, cycling
/// through them and trimming the last chunk so the sum is exact.
fn chunk(total_ms: u64, sizes: &[u64]) -> Vec<Duration> {
    let mut out = Vec::new();
    let mut left = total_ms;
    let mut i = 0;
    while left > 0 {
        let step = sizes[i % sizes.len()].min(left);
        out.push(Duration::from_millis(step));
        left -= step;
        i += 1;
    }
    out
}

proptest! {
    #[test]
    fn one_cycle_of_ticks_completes_one_cycle(
        inhale in 1u64..=50,
        hold in 0u64..=50,
        exhale in 1u64..=50,
        pause in 0u64..=50,
        sizes in prop::collection::vec(1u64..=700, 1..20),
    ) {
        let tenths = |n: u64| n as f64 / 10.0;
        let pattern = Pattern::new(tenths(inhale), tenths(hold), tenths(exhale), tenths(pause)).unwrap();
        let mut engine = SessionEngine::start(pattern, 3).unwrap();

        let cycle_ms = (inhale + hold + exhale + pause) * 100;
        for delta in chunk(cycle_ms, &sizes) {
            engine.tick(delta);
        }

        prop_assert_eq!(engine.cycles_completed(), 1);
        prop_assert_eq!(engine.phase(), Phase::Inhale);
        prop_assert_eq!(engine.phase_time_remaining(), tenths(inhale));
        prop_assert_eq!(engine.state(), SessionState::Running);
    }

    #[test]
    fn ticks_never_run_past_the_target(
        target in 1u32..=4,
        sizes in prop::collection::vec(1u64..=3_000, 1..10),
        extra_ms in 0u64..=10_000,
    ) {
        let mut engine = SessionEngine::start(Pattern::new(1.0, 0.5, 1.0, 0.5).unwrap(), target).unwrap();
        let total = u64::from(target) * 3_000 + extra_ms;
        let mut completions = 0;
        for delta in chunk(total, &sizes) {
            completions += engine
                .tick(delta)
                .iter()
                .filter(|e| matches!(e, Event::SessionCompleted { .. }))
                .count();
        }

        prop_assert_eq!(completions, 1);
        prop_assert_eq!(engine.state(), SessionState::Completed);
        prop_assert_eq!(engine.cycles_completed(), target);
        prop_assert_eq!(engine.time_elapsed_seconds(), u64::from(target) * 3);
    }
}
