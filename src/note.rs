//! Note naming - MIDI note numbers to scientific pitch notation

use std::fmt;

/// Chromatic scale starting at C
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A pitch class plus octave, e.g. C4 (MIDI note 60) or A#3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteIdentity {
    pub name: &'static str,
    pub octave: i32,
}

impl NoteIdentity {
    /// Derive the identity of a MIDI note number.
    ///
    /// Total over all of `i32`, not just 0-127: octave-shifted notes
    /// can leave the MIDI range (or go negative) before the range
    /// check happens at lookup time, and euclidean division keeps the
    /// pitch class and octave consistent there too.
    pub fn from_midi(note: i32) -> Self {
        Self {
            name: NOTE_NAMES[note.rem_euclid(12) as usize],
            octave: note.div_euclid(12) - 1,
        }
    }
}

impl fmt::Display for NoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_note_names() {
        assert_eq!(NoteIdentity::from_midi(60).to_string(), "C4");
        assert_eq!(NoteIdentity::from_midi(69).to_string(), "A4");
        assert_eq!(NoteIdentity::from_midi(0).to_string(), "C-1");
        assert_eq!(NoteIdentity::from_midi(127).to_string(), "G9");
        assert_eq!(NoteIdentity::from_midi(58).to_string(), "A#3");
    }

    #[test]
    fn test_full_midi_range_is_named() {
        for n in 0..=127 {
            let id = NoteIdentity::from_midi(n);
            assert!(NOTE_NAMES.contains(&id.name));
            assert_eq!(id.octave, n / 12 - 1);
        }
    }

    #[test]
    fn test_negative_notes_use_floor_division() {
        // -1 is one semitone below C-1, i.e. B-2
        assert_eq!(NoteIdentity::from_midi(-1).to_string(), "B-2");
        assert_eq!(NoteIdentity::from_midi(-12).to_string(), "C-2");
    }

    #[test]
    fn test_octave_shift_moves_exactly_one_octave() {
        let c4 = NoteIdentity::from_midi(60);
        let c5 = NoteIdentity::from_midi(72);
        assert_eq!(c4.name, c5.name);
        assert_eq!(c4.octave + 1, c5.octave);
    }
}
