//! Built-in breathing patterns.

use super::model::Pattern;

/// Name of the preset used when nothing else is selected.
pub const DEFAULT_PRESET: &str = "box";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub pattern: Pattern,
    pub recommended_cycles: u32,
}

const PRESETS: [Preset; 5] = [
    Preset {
        id: "box",
        label: "Box Breathing",
        description: "Equal counts on every side. Steadies focus under pressure.",
        pattern: Pattern {
            inhale: 4.0,
            hold: 4.0,
            exhale: 4.0,
            pause: 4.0,
        },
        recommended_cycles: 10,
    },
    Preset {
        id: "relax",
        label: "4-7-8 Relaxing Breath",
        description: "Long hold and longer exhale. Winds down before sleep.",
        pattern: Pattern {
            inhale: 4.0,
            hold: 7.0,
            exhale: 8.0,
            pause: 0.0,
        },
        recommended_cycles: 4,
    },
    Preset {
        id: "coherence",
        label: "Coherent Breathing",
        description: "Even five-second breaths, about six per minute.",
        pattern: Pattern {
            inhale: 5.0,
            hold: 0.0,
            exhale: 5.0,
            pause: 0.0,
        },
        recommended_cycles: 18,
    },
    Preset {
        id: "calm",
        label: "Calming Breath",
        description: "Exhale longer than you inhale to settle the nervous system.",
        pattern: Pattern {
            inhale: 4.0,
            hold: 0.0,
            exhale: 6.0,
            pause: 0.0,
        },
        recommended_cycles: 12,
    },
    Preset {
        id: "energize",
        label: "Energizing Breath",
        description: "Short, brisk breaths for a quick lift.",
        pattern: Pattern {
            inhale: 2.0,
            hold: 0.0,
            exhale: 2.0,
            pause: 0.0,
        },
        recommended_cycles: 15,
    },
];

pub fn presets() -> &'static [Preset] {
    &PRESETS
}

/// Look up a preset by id, ignoring ASCII case.
pub fn preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_is_valid() {
        for p in presets() {
            assert!(p.pattern.validate().is_ok(), "{} is invalid", p.id);
            assert!(p.recommended_cycles > 0);
        }
    }

    #[test]
    fn default_preset_exists() {
        assert!(preset(DEFAULT_PRESET).is_some());
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(preset("RELAX").map(|p| p.pattern.hold), Some(7.0));
        assert!(preset("missing").is_none());
    }
}
