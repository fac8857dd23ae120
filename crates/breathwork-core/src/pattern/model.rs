use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PatternError;

/// One of the four sub-states of a breath cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    Hold,
    Exhale,
    Pause,
}

impl Phase {
    /// Phases in cycle order.
    pub const ALL: [Phase; 4] = [Phase::Inhale, Phase::Hold, Phase::Exhale, Phase::Pause];

    /// The phase that follows this one. `Pause` wraps to `Inhale`.
    pub fn next(self) -> Phase {
        match self {
            Phase::Inhale => Phase::Hold,
            Phase::Hold => Phase::Exhale,
            Phase::Exhale => Phase::Pause,
            Phase::Pause => Phase::Inhale,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Inhale => "inhale",
            Phase::Hold => "hold",
            Phase::Exhale => "exhale",
            Phase::Pause => "pause",
        }
    }

    /// Prompt shown to the user while the phase is active.
    pub fn prompt(self) -> &'static str {
        match self {
            Phase::Inhale => "Breathe in",
            Phase::Hold => "Hold",
            Phase::Exhale => "Breathe out",
            Phase::Pause => "Rest",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Four-phase breath rhythm, durations in seconds.
///
/// A pattern is plain data. Use [`Pattern::validate`] (or [`Pattern::new`])
/// before handing it to a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub inhale: f64,
    #[serde(default)]
    pub hold: f64,
    pub exhale: f64,
    #[serde(default)]
    pub pause: f64,
}

impl Pattern {
    /// Build a validated pattern.
    ///
    /// # Errors
    /// Returns [`PatternError`] when a duration is negative or not finite, or
    /// when the whole cycle is zero length.
    pub fn new(inhale: f64, hold: f64, exhale: f64, pause: f64) -> Result<Self, PatternError> {
        let pattern = Self {
            inhale,
            hold,
            exhale,
            pause,
        };
        pattern.validate()?;
        Ok(pattern)
    }

    /// Check that this pattern can drive a session.
    ///
    /// Durations are compared at microsecond resolution, so a cycle made only
    /// of sub-microsecond phases counts as all-zero.
    pub fn validate(&self) -> Result<(), PatternError> {
        for phase in Phase::ALL {
            let value = self.duration(phase);
            if !value.is_finite() {
                return Err(PatternError::NotFinite { phase });
            }
            if value < 0.0 {
                return Err(PatternError::Negative { phase, value });
            }
        }
        if self.cycle_us() == 0 {
            return Err(PatternError::AllZero);
        }
        Ok(())
    }

    /// Configured duration of `phase` in seconds.
    pub fn duration(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Inhale => self.inhale,
            Phase::Hold => self.hold,
            Phase::Exhale => self.exhale,
            Phase::Pause => self.pause,
        }
    }

    /// Duration of `phase` in whole microseconds.
    ///
    /// Negative and non-finite values map to zero.
    pub fn duration_us(&self, phase: Phase) -> u64 {
        secs_to_us(self.duration(phase))
    }

    /// Length of one full cycle in seconds.
    pub fn cycle_secs(&self) -> f64 {
        Phase::ALL.iter().map(|p| self.duration(*p)).sum()
    }

    pub(crate) fn cycle_us(&self) -> u64 {
        Phase::ALL
            .iter()
            .map(|p| self.duration_us(*p))
            .fold(0u64, u64::saturating_add)
    }

    /// Phases with a non-zero duration, in cycle order.
    pub fn active_phases(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|p| self.duration_us(*p) > 0)
            .collect()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.inhale, self.hold, self.exhale, self.pause
        )
    }
}

pub(crate) fn secs_to_us(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    let us = (secs * 1_000_000.0).round();
    if us >= u64::MAX as f64 {
        u64::MAX
    } else {
        us as u64
    }
}

pub(crate) fn us_to_secs(us: u64) -> f64 {
    us as f64 / 1_000_000.0
}
