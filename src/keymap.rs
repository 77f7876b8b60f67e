//! Binding table - note names to key labels, with octave transposition
//!
//! Built from a [`KeymapConfig`] document. Individually malformed
//! entries are skipped and reported in an explicit error list rather
//! than aborting the whole load, so a half-edited key map still
//! plays.

use std::collections::HashMap;

use thiserror::Error;
use tracing::trace;

use crate::config::KeymapConfig;
use crate::keys;
use crate::note::NoteIdentity;

/// Note-name prefixes, two-character spellings first so `C#4` is not
/// read as `C` + `#4`. Flats are not produced by [`NoteIdentity`], so
/// a binding spelled with one could never be resolved; they are
/// recognized here only to reject them with a pointed diagnostic.
const NOTE_PREFIXES: [&str; 17] = [
    "C#", "D#", "F#", "G#", "A#", "Db", "Eb", "Gb", "Ab", "Bb",
    "C", "D", "E", "F", "G", "A", "B",
];

/// A key-map entry that could not be used
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("'{0}' is not a note name (expected pitch class + octave, e.g. C4 or A#3)")]
    BadNoteName(String),

    #[error("note {0} is spelled with a flat; use the sharp equivalent (e.g. A#3 for Bb3)")]
    FlatSpelling(String),

    #[error("'{1}' (bound to {0}) is not a supported key label")]
    UnsupportedLabel(String, String),
}

/// Mapping from note identity to output key label, plus the current
/// octave shift applied before lookup
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    bindings: HashMap<String, String>,
    octave_shift: i32,
}

impl KeyMap {
    /// Build a table from a parsed key-map document.
    ///
    /// Returns the usable table together with the list of skipped
    /// entries; an empty table is a valid (if silent) outcome.
    pub fn from_config(config: &KeymapConfig) -> (Self, Vec<BindingError>) {
        let mut bindings = HashMap::new();
        let mut errors = Vec::new();

        for (note_name, label) in &config.midi_key_map {
            match validate_note_name(note_name) {
                Ok(()) => {}
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            }
            if !keys::is_supported_label(label) {
                errors.push(BindingError::UnsupportedLabel(
                    note_name.clone(),
                    label.clone(),
                ));
                continue;
            }
            bindings.insert(note_name.clone(), label.clone());
        }

        (
            Self {
                bindings,
                octave_shift: config.octave_shift,
            },
            errors,
        )
    }

    /// Resolve a MIDI note to its bound key label, applying the
    /// current octave shift first. A shift that pushes the note out of
    /// the 0-127 MIDI range yields no binding.
    pub fn resolve(&self, midi_note: u8) -> Option<&str> {
        let shifted = midi_note as i32 + self.octave_shift * 12;
        if !(0..=127).contains(&shifted) {
            trace!("Note {} shifted to {} is outside MIDI range", midi_note, shifted);
            return None;
        }

        let name = NoteIdentity::from_midi(shifted).to_string();
        self.bindings.get(&name).map(String::as_str)
    }

    /// Octave shift currently applied before lookup
    pub fn octave_shift(&self) -> i32 {
        self.octave_shift
    }

    /// Change the octave shift. Takes effect on the next resolve;
    /// already-held keys are not re-pressed.
    pub fn set_octave_shift(&mut self, shift: i32) {
        self.octave_shift = shift;
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Check that a string is a pitch class plus a signed octave suffix
fn validate_note_name(s: &str) -> Result<(), BindingError> {
    for prefix in NOTE_PREFIXES {
        if let Some(rest) = s.strip_prefix(prefix) {
            if !is_canonical_octave(rest) {
                return Err(BindingError::BadNoteName(s.to_string()));
            }
            if prefix.len() == 2 && prefix.ends_with('b') {
                return Err(BindingError::FlatSpelling(s.to_string()));
            }
            return Ok(());
        }
    }
    Err(BindingError::BadNoteName(s.to_string()))
}

/// The octave suffix must be spelled exactly as [`NoteIdentity`]
/// prints it: an optional minus, digits, no leading zero, no `-0`.
/// Anything looser (`C+4`, `C04`) would be installed but could never
/// match a resolved note, sitting dead in the table.
fn is_canonical_octave(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return false;
    }
    // "-0" is not an octave
    !(s.starts_with('-') && digits == "0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(entries: &[(&str, &str)], octave_shift: i32) -> KeymapConfig {
        KeymapConfig {
            midi_key_map: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            octave_shift,
        }
    }

    #[test]
    fn test_resolve_bound_note() {
        let (map, errors) = KeyMap::from_config(&config(&[("C4", "a"), ("A#3", ";")], 0));
        assert!(errors.is_empty());
        assert_eq!(map.resolve(60), Some("a")); // C4
        assert_eq!(map.resolve(58), Some(";")); // A#3
        assert_eq!(map.resolve(61), None); // C#4 unbound
    }

    #[test]
    fn test_octave_shift_is_applied_before_lookup() {
        let (mut map, _) = KeyMap::from_config(&config(&[("C4", "a")], 1));
        // C3 played, shifted up one octave to C4
        assert_eq!(map.resolve(48), Some("a"));
        assert_eq!(map.resolve(60), None);

        map.set_octave_shift(0);
        assert_eq!(map.resolve(60), Some("a"));
        assert_eq!(map.octave_shift(), 0);
    }

    #[test]
    fn test_shift_equivalence_over_midi_range() {
        let (unshifted, _) = KeyMap::from_config(&config(&[("C4", "a"), ("G9", "g")], 0));
        let (shifted, _) = KeyMap::from_config(&config(&[("C4", "a"), ("G9", "g")], 2));

        for n in 0u8..=127 {
            let reference = match n as i32 + 24 {
                m @ 0..=127 => unshifted.resolve(m as u8),
                _ => None,
            };
            assert_eq!(shifted.resolve(n), reference, "note {}", n);
        }
    }

    #[test]
    fn test_shifted_out_of_range_yields_none() {
        let (map, _) = KeyMap::from_config(&config(&[("G9", "g")], 1));
        // G9 is MIDI 127; playing it with +1 shift lands at 139
        assert_eq!(map.resolve(127), None);

        let (map, _) = KeyMap::from_config(&config(&[("C-1", "c")], -1));
        // C-1 is MIDI 0; playing it with -1 shift lands at -12
        assert_eq!(map.resolve(0), None);
    }

    #[test]
    fn test_malformed_note_name_skipped_with_diagnostic() {
        let (map, errors) = KeyMap::from_config(&config(&[("Z9", "a")], 0));
        assert!(map.is_empty());
        assert_eq!(errors, vec![BindingError::BadNoteName("Z9".to_string())]);
    }

    #[test]
    fn test_unsupported_label_skipped_with_diagnostic() {
        let (map, errors) = KeyMap::from_config(&config(&[("C4", "F13"), ("D4", "s")], 0));
        assert_eq!(map.len(), 1);
        assert_eq!(
            errors,
            vec![BindingError::UnsupportedLabel("C4".to_string(), "F13".to_string())]
        );
    }

    #[test]
    fn test_flat_spelling_rejected() {
        let (map, errors) = KeyMap::from_config(&config(&[("Bb3", "a")], 0));
        assert!(map.is_empty());
        assert_eq!(errors, vec![BindingError::FlatSpelling("Bb3".to_string())]);
    }

    #[test]
    fn test_note_name_needs_octave_suffix() {
        let (_, errors) = KeyMap::from_config(&config(&[("C#", "a")], 0));
        assert_eq!(errors, vec![BindingError::BadNoteName("C#".to_string())]);
    }

    #[test]
    fn test_non_canonical_octave_spellings_rejected() {
        // These parse as integers but are never produced when naming a
        // note, so an entry using one could never resolve
        for name in ["C+4", "C04", "C-0", "C 4", "C4.0"] {
            let (map, errors) = KeyMap::from_config(&config(&[(name, "a")], 0));
            assert!(map.is_empty(), "{} should be rejected", name);
            assert_eq!(errors, vec![BindingError::BadNoteName(name.to_string())]);
        }
    }

    #[test]
    fn test_canonical_octave_spellings_accepted() {
        let (map, errors) =
            KeyMap::from_config(&config(&[("C0", "a"), ("C-1", "s"), ("A#10", "d")], 0));
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_empty_document_yields_empty_table() {
        let cfg = KeymapConfig {
            midi_key_map: HashMap::new(),
            octave_shift: 0,
        };
        let (map, errors) = KeyMap::from_config(&cfg);
        assert!(map.is_empty());
        assert!(errors.is_empty());
    }
}
