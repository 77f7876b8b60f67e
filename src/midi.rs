//! MIDI message classification
//!
//! Parses raw input bytes into the small set of message shapes the
//! translation engine cares about. Note-on with velocity 0 is folded
//! into note-off here, per the MIDI running-status convention, so the
//! dispatcher only ever sees one "release" shape.

use std::fmt;

/// Classified MIDI message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },

    /// Pitch Bend: channel (0-15), value (0-16383, 14-bit)
    PitchBend { channel: u8, value: u16 },

    /// Any other status we receive but do not act on
    Other { status: u8 },
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes.
    ///
    /// Returns `None` for empty input, running-status fragments (data
    /// byte first), and messages shorter than their status requires.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let status = *data.first()?;

        // Running status (data byte first) would need carried state;
        // hardware keyboards we target always resend the status byte.
        if status < 0x80 {
            return None;
        }

        // System messages (0xF0-0xFF): clock, sysex, active sensing...
        if status >= 0xF0 {
            return Some(MidiMessage::Other { status });
        }

        let channel = status & 0x0F;
        match status & 0xF0 {
            0x80 => {
                if data.len() < 3 {
                    return None;
                }
                Some(MidiMessage::NoteOff {
                    channel,
                    note: data[1] & 0x7F,
                    velocity: data[2] & 0x7F,
                })
            }
            0x90 => {
                if data.len() < 3 {
                    return None;
                }
                let note = data[1] & 0x7F;
                let velocity = data[2] & 0x7F;

                // Note On with velocity 0 is the conventional Note Off
                if velocity == 0 {
                    Some(MidiMessage::NoteOff { channel, note, velocity: 0 })
                } else {
                    Some(MidiMessage::NoteOn { channel, note, velocity })
                }
            }
            0xB0 => {
                if data.len() < 3 {
                    return None;
                }
                Some(MidiMessage::ControlChange {
                    channel,
                    cc: data[1] & 0x7F,
                    value: data[2] & 0x7F,
                })
            }
            0xE0 => {
                if data.len() < 3 {
                    return None;
                }
                let lsb = (data[1] & 0x7F) as u16;
                let msb = (data[2] & 0x7F) as u16;
                Some(MidiMessage::PitchBend { channel, value: (msb << 7) | lsb })
            }
            _ => Some(MidiMessage::Other { status }),
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
            MidiMessage::PitchBend { channel, value } => {
                write!(f, "PitchBend ch:{} v:{}", channel + 1, value)
            }
            MidiMessage::Other { status } => write!(f, "Other status:0x{:02X}", status),
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_parsing() {
        let data = vec![0x90, 60, 100]; // Note On, ch 1, Middle C, velocity 100
        let msg = MidiMessage::parse(&data).unwrap();

        assert_eq!(msg, MidiMessage::NoteOn { channel: 0, note: 60, velocity: 100 });
    }

    #[test]
    fn test_note_on_velocity_zero() {
        let data = vec![0x90, 60, 0]; // Note On with velocity 0 = Note Off
        let msg = MidiMessage::parse(&data).unwrap();

        assert_eq!(msg, MidiMessage::NoteOff { channel: 0, note: 60, velocity: 0 });
    }

    #[test]
    fn test_note_off_parsing() {
        let data = vec![0x83, 64, 40]; // Note Off, ch 4
        let msg = MidiMessage::parse(&data).unwrap();

        assert_eq!(msg, MidiMessage::NoteOff { channel: 3, note: 64, velocity: 40 });
    }

    #[test]
    fn test_control_change_is_classified() {
        let data = vec![0xB2, 7, 100]; // CC ch 3, volume
        let msg = MidiMessage::parse(&data).unwrap();

        assert_eq!(msg, MidiMessage::ControlChange { channel: 2, cc: 7, value: 100 });
    }

    #[test]
    fn test_truncated_note_on_rejected() {
        assert_eq!(MidiMessage::parse(&[0x90, 60]), None);
        assert_eq!(MidiMessage::parse(&[0x90]), None);
        assert_eq!(MidiMessage::parse(&[]), None);
    }

    #[test]
    fn test_running_status_fragment_rejected() {
        // Data byte first, no status
        assert_eq!(MidiMessage::parse(&[60, 100]), None);
    }

    #[test]
    fn test_system_realtime_classified_as_other() {
        assert_eq!(
            MidiMessage::parse(&[0xF8]),
            Some(MidiMessage::Other { status: 0xF8 })
        );
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0x90, 60, 100]), "90 3C 64");
    }
}
