//! Session history and streak statistics.
//!
//! Completed (or exited) sessions are appended to a JSON array under
//! [`keys::SESSION_HISTORY`]. Days are UTC calendar days.

use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::pattern::Pattern;
use crate::session::SessionSummary;
use crate::storage::{keys, load_json, save_json, KeyValueStore};

/// Sessions shorter than this are not worth recording.
pub const MIN_RECORDED_SECONDS: u64 = 1;

/// Oldest entries are dropped beyond this many.
pub const MAX_HISTORY_ENTRIES: usize = 1000;

/// Label used for sessions run with an unnamed pattern.
const CUSTOM_EXERCISE: &str = "Custom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    /// Seconds of breathing, paused time excluded.
    pub duration: u64,
    /// Pattern name the session ran with.
    pub exercise: String,
    pub cycles: u32,
    pub pattern: Pattern,
}

impl HistoryEntry {
    pub fn from_summary(summary: &SessionSummary, at: DateTime<Utc>) -> Self {
        Self {
            date: at,
            duration: summary.duration_seconds,
            exercise: summary
                .pattern_name
                .clone()
                .unwrap_or_else(|| CUSTOM_EXERCISE.to_string()),
            cycles: summary.cycles_completed,
            pattern: summary.pattern,
        }
    }
}

pub struct SessionHistory<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> SessionHistory<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All entries, oldest first. Unreadable history reads as empty.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        match load_json::<Vec<HistoryEntry>, _>(self.store, keys::SESSION_HISTORY) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable session history");
                Vec::new()
            }
        }
    }

    /// Append a finished session. Returns the entry, or `None` when the
    /// session was too short to record.
    ///
    /// # Errors
    /// Fails without writing if the stored history cannot be read, so a
    /// corrupt array is never replaced by a shorter one.
    pub fn record(
        &self,
        summary: &SessionSummary,
        at: DateTime<Utc>,
    ) -> Result<Option<HistoryEntry>, StorageError> {
        if summary.duration_seconds < MIN_RECORDED_SECONDS {
            debug!("session too short to record");
            return Ok(None);
        }
        let entry = HistoryEntry::from_summary(summary, at);
        let mut entries: Vec<HistoryEntry> =
            load_json(self.store, keys::SESSION_HISTORY)?.unwrap_or_default();
        entries.push(entry.clone());
        if entries.len() > MAX_HISTORY_ENTRIES {
            let excess = entries.len() - MAX_HISTORY_ENTRIES;
            entries.drain(..excess);
        }
        save_json(self.store, keys::SESSION_HISTORY, &entries)?;
        Ok(Some(entry))
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(keys::SESSION_HISTORY)
    }

    pub fn stats(&self, today: NaiveDate) -> HistoryStats {
        HistoryStats::compute(&self.entries(), today)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HistoryStats {
    pub total_sessions: u64,
    pub total_seconds: u64,
    pub total_cycles: u64,
    pub sessions_today: u64,
    /// Consecutive days with a session, ending today or yesterday.
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub last_session: Option<DateTime<Utc>>,
}

impl HistoryStats {
    pub fn compute(entries: &[HistoryEntry], today: NaiveDate) -> Self {
        let mut stats = Self::default();
        let mut days = BTreeSet::new();
        for entry in entries {
            let day = entry.date.date_naive();
            stats.total_sessions += 1;
            stats.total_seconds += entry.duration;
            stats.total_cycles += u64::from(entry.cycles);
            if day == today {
                stats.sessions_today += 1;
            }
            if stats.last_session.map_or(true, |last| entry.date > last) {
                stats.last_session = Some(entry.date);
            }
            days.insert(day);
        }

        stats.longest_streak_days = longest_run(&days);
        stats.current_streak_days = current_run(&days, today);
        stats
    }
}

fn longest_run(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for &day in days {
        run = match prev.and_then(|p| p.checked_add_days(Days::new(1))) {
            Some(expected) if expected == day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }
    longest
}

fn current_run(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let yesterday = today.checked_sub_days(Days::new(1));
    let mut cursor = if days.contains(&today) {
        Some(today)
    } else if yesterday.is_some_and(|y| days.contains(&y)) {
        yesterday
    } else {
        return 0;
    };

    let mut run = 0;
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        run += 1;
        cursor = day.checked_sub_days(Days::new(1));
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn summary(secs: u64, cycles: u32) -> SessionSummary {
        SessionSummary {
            duration_seconds: secs,
            cycles_completed: cycles,
            pattern: Pattern::new(4.0, 4.0, 4.0, 4.0).unwrap(),
            pattern_name: Some("box".into()),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn records_summary_fields() {
        let store = MemoryStore::new();
        let history = SessionHistory::new(&store);
        let entry = history
            .record(&summary(160, 10), day(2026, 3, 1))
            .unwrap()
            .unwrap();
        assert_eq!(entry.exercise, "box");
        assert_eq!(entry.duration, 160);
        assert_eq!(entry.cycles, 10);
        assert_eq!(history.entries(), vec![entry]);
    }

    #[test]
    fn skips_sub_second_sessions() {
        let store = MemoryStore::new();
        let history = SessionHistory::new(&store);
        assert!(history.record(&summary(0, 0), day(2026, 3, 1)).unwrap().is_none());
        assert!(history.entries().is_empty());
    }

    #[test]
    fn unnamed_pattern_is_custom() {
        let mut s = summary(30, 2);
        s.pattern_name = None;
        assert_eq!(HistoryEntry::from_summary(&s, day(2026, 3, 1)).exercise, "Custom");
    }

    #[test]
    fn streaks() {
        let entries: Vec<HistoryEntry> = [
            day(2026, 2, 20),
            day(2026, 2, 21),
            day(2026, 2, 22),
            day(2026, 2, 25),
            day(2026, 2, 26),
            day(2026, 2, 26),
        ]
        .into_iter()
        .map(|d| HistoryEntry::from_summary(&summary(60, 4), d))
        .collect();

        let stats = HistoryStats::compute(&entries, date(2026, 2, 26));
        assert_eq!(stats.total_sessions, 6);
        assert_eq!(stats.total_seconds, 360);
        assert_eq!(stats.total_cycles, 24);
        assert_eq!(stats.sessions_today, 2);
        assert_eq!(stats.current_streak_days, 2);
        assert_eq!(stats.longest_streak_days, 3);
        assert_eq!(stats.last_session, Some(day(2026, 2, 26)));

        // Yesterday still counts; two days ago breaks the streak.
        assert_eq!(
            HistoryStats::compute(&entries, date(2026, 2, 27)).current_streak_days,
            2
        );
        assert_eq!(
            HistoryStats::compute(&entries, date(2026, 2, 28)).current_streak_days,
            0
        );
    }

    #[test]
    fn empty_history_stats() {
        let stats = HistoryStats::compute(&[], date(2026, 1, 1));
        assert_eq!(stats, HistoryStats::default());
    }

    #[test]
    fn unreadable_history_is_not_overwritten() {
        let store = MemoryStore::new();
        let history = SessionHistory::new(&store);
        history.record(&summary(60, 4), day(2026, 3, 1)).unwrap();
        history.record(&summary(90, 6), day(2026, 3, 2)).unwrap();

        // One entry with a string duration makes the whole array unreadable.
        let raw = store.get(keys::SESSION_HISTORY).unwrap().unwrap();
        let corrupt = raw.replacen("\"duration\":60", "\"duration\":\"60\"", 1);
        assert_ne!(corrupt, raw);
        store.set(keys::SESSION_HISTORY, &corrupt).unwrap();

        assert!(matches!(
            history.record(&summary(120, 8), day(2026, 3, 3)),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(store.get(keys::SESSION_HISTORY).unwrap(), Some(corrupt));
        assert!(history.entries().is_empty());
    }

    #[test]
    fn clear_removes_everything() {
        let store = MemoryStore::new();
        let history = SessionHistory::new(&store);
        history.record(&summary(60, 4), day(2026, 3, 1)).unwrap();
        history.clear().unwrap();
        assert!(history.entries().is_empty());
    }
}
