//! Saved and selected patterns.
//!
//! Built-in presets are always available. User patterns live in the
//! key-value store under [`keys::CUSTOM_PATTERNS`]; the selected pattern's
//! name lives under [`keys::ACTIVE_PATTERN`].

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::model::Pattern;
use super::presets::{preset, presets, DEFAULT_PRESET};
use crate::error::LibraryError;
use crate::storage::{keys, load_json, save_json, KeyValueStore};

/// A user-defined pattern as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPattern {
    pub name: String,
    #[serde(flatten)]
    pub pattern: Pattern,
}

/// A pattern as offered to the user, built-in or custom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternEntry {
    pub name: String,
    pub label: String,
    pub pattern: Pattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_cycles: Option<u32>,
    pub builtin: bool,
}

impl PatternEntry {
    fn from_preset(id: &str) -> Option<Self> {
        preset(id).map(|p| Self {
            name: p.id.to_string(),
            label: p.label.to_string(),
            pattern: p.pattern,
            description: Some(p.description.to_string()),
            recommended_cycles: Some(p.recommended_cycles),
            builtin: true,
        })
    }

    fn from_custom(custom: NamedPattern) -> Self {
        Self {
            label: custom.name.clone(),
            name: custom.name,
            pattern: custom.pattern,
            description: None,
            recommended_cycles: None,
            builtin: false,
        }
    }
}

pub struct PatternLibrary<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KeyValueStore + ?Sized> PatternLibrary<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// User patterns. Unreadable or malformed data reads as empty.
    pub fn custom_patterns(&self) -> Vec<NamedPattern> {
        match load_json::<Vec<NamedPattern>, _>(self.store, keys::CUSTOM_PATTERNS) {
            Ok(Some(list)) => list,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable custom patterns");
                Vec::new()
            }
        }
    }

    /// User patterns for a read-modify-write. Unlike [`Self::custom_patterns`]
    /// an unreadable list is an error, so it is never overwritten.
    fn stored_custom_patterns(&self) -> Result<Vec<NamedPattern>, LibraryError> {
        Ok(load_json::<Vec<NamedPattern>, _>(self.store, keys::CUSTOM_PATTERNS)?.unwrap_or_default())
    }

    /// Presets first, then custom patterns in insertion order.
    pub fn list(&self) -> Vec<PatternEntry> {
        let mut entries: Vec<PatternEntry> = presets()
            .iter()
            .filter_map(|p| PatternEntry::from_preset(p.id))
            .collect();
        entries.extend(
            self.custom_patterns()
                .into_iter()
                .map(PatternEntry::from_custom),
        );
        entries
    }

    /// Find a pattern by name, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<PatternEntry> {
        let name = name.trim();
        PatternEntry::from_preset(name).or_else(|| {
            self.custom_patterns()
                .into_iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .map(PatternEntry::from_custom)
        })
    }

    /// Save or replace a custom pattern.
    ///
    /// # Errors
    /// Fails if the pattern is invalid, the name is empty or belongs to a
    /// preset, the stored list is unreadable, or the store rejects the write.
    pub fn save_custom(&self, name: &str, pattern: Pattern) -> Result<(), LibraryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryError::EmptyName);
        }
        if preset(name).is_some() {
            return Err(LibraryError::ReservedName(name.to_string()));
        }
        pattern.validate()?;

        let mut list = self.stored_custom_patterns()?;
        let entry = NamedPattern {
            name: name.to_string(),
            pattern,
        };
        match list.iter_mut().find(|c| c.name.eq_ignore_ascii_case(name)) {
            Some(existing) => *existing = entry,
            None => list.push(entry),
        }
        save_json(self.store, keys::CUSTOM_PATTERNS, &list)?;
        info!(pattern_name = name, %pattern, "saved custom pattern");
        Ok(())
    }

    /// Delete a custom pattern. Returns `false` if no such pattern existed.
    ///
    /// If the removed pattern was active, the selection reverts to the default.
    pub fn remove_custom(&self, name: &str) -> Result<bool, LibraryError> {
        let name = name.trim();
        let mut list = self.stored_custom_patterns()?;
        let before = list.len();
        list.retain(|c| !c.name.eq_ignore_ascii_case(name));
        if list.len() == before {
            return Ok(false);
        }
        save_json(self.store, keys::CUSTOM_PATTERNS, &list)?;

        if self
            .active_name()
            .is_some_and(|active| active.eq_ignore_ascii_case(name))
        {
            self.store.remove(keys::ACTIVE_PATTERN)?;
        }
        Ok(true)
    }

    /// Select the pattern used when a session starts without an explicit one.
    pub fn set_active(&self, name: &str) -> Result<PatternEntry, LibraryError> {
        let entry = self
            .find(name)
            .ok_or_else(|| LibraryError::UnknownPattern(name.to_string()))?;
        save_json(self.store, keys::ACTIVE_PATTERN, &entry.name)?;
        Ok(entry)
    }

    fn active_name(&self) -> Option<String> {
        match load_json::<String, _>(self.store, keys::ACTIVE_PATTERN) {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable active pattern");
                None
            }
        }
    }

    /// The selected pattern, or `fallback` when nothing valid is selected.
    ///
    /// An unknown `fallback` resolves to the built-in default.
    pub fn active_or(&self, fallback: &str) -> PatternEntry {
        self.active_name()
            .and_then(|name| self.find(&name))
            .or_else(|| self.find(fallback))
            .or_else(|| PatternEntry::from_preset(DEFAULT_PRESET))
            .unwrap_or_else(|| PatternEntry {
                name: DEFAULT_PRESET.to_string(),
                label: DEFAULT_PRESET.to_string(),
                pattern: Pattern {
                    inhale: 4.0,
                    hold: 4.0,
                    exhale: 4.0,
                    pause: 4.0,
                },
                description: None,
                recommended_cycles: None,
                builtin: true,
            })
    }

    pub fn active(&self) -> PatternEntry {
        self.active_or(DEFAULT_PRESET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;

    fn pattern(i: f64, h: f64, e: f64, p: f64) -> Pattern {
        Pattern::new(i, h, e, p).unwrap()
    }

    #[test]
    fn lists_presets_then_custom() {
        let store = MemoryStore::new();
        let lib = PatternLibrary::new(&store);
        lib.save_custom("Evening", pattern(3.0, 0.0, 6.0, 1.0)).unwrap();
        let names: Vec<String> = lib.list().into_iter().map(|e| e.name).collect();
        assert_eq!(names.first().map(String::as_str), Some("box"));
        assert_eq!(names.last().map(String::as_str), Some("Evening"));
    }

    #[test]
    fn save_replaces_same_name() {
        let store = MemoryStore::new();
        let lib = PatternLibrary::new(&store);
        lib.save_custom("mine", pattern(3.0, 0.0, 3.0, 0.0)).unwrap();
        lib.save_custom("MINE", pattern(5.0, 0.0, 5.0, 0.0)).unwrap();
        let custom = lib.custom_patterns();
        assert_eq!(custom.len(), 1);
        assert_eq!(custom[0].pattern.inhale, 5.0);
    }

    #[test]
    fn rejects_invalid_and_reserved() {
        let store = MemoryStore::new();
        let lib = PatternLibrary::new(&store);
        let zero = Pattern {
            inhale: 0.0,
            hold: 0.0,
            exhale: 0.0,
            pause: 0.0,
        };
        assert!(matches!(
            lib.save_custom("zero", zero),
            Err(LibraryError::InvalidPattern(_))
        ));
        assert!(matches!(
            lib.save_custom("Box", pattern(1.0, 1.0, 1.0, 1.0)),
            Err(LibraryError::ReservedName(_))
        ));
        assert!(matches!(
            lib.save_custom("  ", pattern(1.0, 1.0, 1.0, 1.0)),
            Err(LibraryError::EmptyName)
        ));
    }

    #[test]
    fn active_falls_back_to_default() {
        let store = MemoryStore::new();
        let lib = PatternLibrary::new(&store);
        assert_eq!(lib.active().name, DEFAULT_PRESET);

        lib.set_active("relax").unwrap();
        assert_eq!(lib.active().name, "relax");
        assert_eq!(lib.active_or("calm").name, "relax");
    }

    #[test]
    fn removing_active_custom_resets_selection() {
        let store = MemoryStore::new();
        let lib = PatternLibrary::new(&store);
        lib.save_custom("mine", pattern(3.0, 0.0, 3.0, 0.0)).unwrap();
        lib.set_active("mine").unwrap();
        assert!(lib.remove_custom("mine").unwrap());
        assert!(!lib.remove_custom("mine").unwrap());
        assert_eq!(lib.active_or("calm").name, "calm");
    }

    #[test]
    fn malformed_custom_patterns_read_as_empty() {
        let store = MemoryStore::new();
        store.set(keys::CUSTOM_PATTERNS, "[{\"name\": 3}]").unwrap();
        let lib = PatternLibrary::new(&store);
        assert!(lib.custom_patterns().is_empty());
        assert_eq!(lib.list().len(), presets().len());
    }

    #[test]
    fn unreadable_custom_patterns_are_not_overwritten() {
        let store = MemoryStore::new();
        let corrupt = r#"[{"name":"a","inhale":4.0,"hold":0.0,"exhale":4.0,"pause":0.0},{"name":"b","inhale":"4","hold":0.0,"exhale":4.0,"pause":0.0}]"#;
        store.set(keys::CUSTOM_PATTERNS, corrupt).unwrap();
        let lib = PatternLibrary::new(&store);

        assert!(matches!(
            lib.save_custom("c", pattern(3.0, 0.0, 3.0, 0.0)),
            Err(LibraryError::Storage(StorageError::Serialization(_)))
        ));
        assert!(matches!(
            lib.remove_custom("a"),
            Err(LibraryError::Storage(StorageError::Serialization(_)))
        ));
        assert_eq!(
            store.get(keys::CUSTOM_PATTERNS).unwrap().as_deref(),
            Some(corrupt)
        );
    }

    #[test]
    fn unknown_active_is_an_error() {
        let store = MemoryStore::new();
        let lib = PatternLibrary::new(&store);
        assert!(matches!(
            lib.set_active("nope"),
            Err(LibraryError::UnknownPattern(_))
        ));
    }
}
