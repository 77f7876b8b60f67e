//! midi2key - drive keyboard-only applications from a MIDI controller
//!
//! Translates incoming MIDI note events into synthetic keyboard
//! press/release actions. The translation engine guarantees
//! exactly-once key-down/key-up pairing per key regardless of how
//! noisy the incoming MIDI stream is: no stuck keys, no duplicate
//! presses, no missed releases.

pub mod config;
pub mod device;
pub mod dispatcher;
pub mod keymap;
pub mod keys;
pub mod midi;
pub mod note;
pub mod press;

pub use config::{ConfigWatcher, KeymapConfig};
pub use dispatcher::Dispatcher;
pub use keymap::{BindingError, KeyMap};
pub use keys::KeyActuator;
pub use midi::MidiMessage;
pub use note::NoteIdentity;
pub use press::PressTracker;
