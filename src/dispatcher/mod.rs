//! Event dispatcher - the core MIDI-to-key translation engine
//!
//! Classifies each raw MIDI message, resolves the target key through
//! the binding table, consults the press tracker so every key sees
//! exactly one down/up pair, and drives the actuator. Everything here
//! is a synchronous, bounded transformation: the dispatcher runs once
//! per delivered message on the event-consumer task and never blocks.


use tracing::{debug, info, trace};

use crate::keymap::KeyMap;
use crate::keys::KeyActuator;
use crate::midi::{format_hex, MidiMessage};
use crate::note::NoteIdentity;
use crate::press::PressTracker;

/// Translates MIDI note events into actuator press/release calls
pub struct Dispatcher<A: KeyActuator> {
    keymap: KeyMap,
    tracker: PressTracker,
    actuator: A,
}

impl<A: KeyActuator> Dispatcher<A> {
    pub fn new(keymap: KeyMap, actuator: A) -> Self {
        Self {
            keymap,
            tracker: PressTracker::new(),
            actuator,
        }
    }

    /// Handle one raw MIDI message from the input port.
    ///
    /// Incomplete messages, notes with no binding, and statuses other
    /// than note-on/note-off are discarded without error. Note-on with
    /// velocity 0 takes the release path, identical to note-off.
    pub fn handle(&mut self, data: &[u8]) {
        // Note messages need status + note + velocity
        if data.len() < 3 {
            return;
        }

        match MidiMessage::parse(data) {
            Some(MidiMessage::NoteOn { note, velocity, .. }) => {
                self.on_note_down(note, velocity)
            }
            Some(MidiMessage::NoteOff { note, .. }) => self.on_note_up(note),
            Some(other) => trace!("Ignoring {}", other),
            None => debug!("Unparseable MIDI message: {}", format_hex(data)),
        }
    }

    fn on_note_down(&mut self, note: u8, velocity: u8) {
        let Some(label) = self.keymap.resolve(note) else {
            trace!("Note {} has no binding", NoteIdentity::from_midi(note as i32));
            return;
        };

        // Duplicate note-ons (retriggers, MIDI-thru loops) must not
        // repeat the key-down.
        if !self.tracker.try_press(label) {
            trace!("Key '{}' already held, ignoring repeat note-on", label);
            return;
        }

        info!(
            "Note down: {} (vel {}) -> key '{}'",
            NoteIdentity::from_midi(note as i32),
            velocity,
            label
        );

        if !self.actuator.press(label) {
            // Actuator rejected the label; undo the edge so a later
            // note-on can retry.
            debug!("Actuator rejected press of '{}'", label);
            self.tracker.revert_press(label);
        }
    }

    fn on_note_up(&mut self, note: u8) {
        let Some(label) = self.keymap.resolve(note) else {
            return;
        };

        if !self.tracker.try_release(label) {
            trace!("Key '{}' not held, ignoring note-off", label);
            return;
        }

        info!(
            "Note up: {} -> key '{}'",
            NoteIdentity::from_midi(note as i32),
            label
        );

        if !self.actuator.release(label) {
            // The label stays released in the tracker either way, so
            // the next note-on can re-sync rather than wedge.
            debug!("Actuator rejected release of '{}'", label);
        }
    }

    /// Replace the binding table wholesale (hot reload). Held keys are
    /// not re-pressed; they release through the new table on their
    /// note-off.
    pub fn replace_keymap(&mut self, keymap: KeyMap) {
        info!(
            "Key map replaced: {} bindings, octave shift {}",
            keymap.len(),
            keymap.octave_shift()
        );
        self.keymap = keymap;
    }

    /// Octave shift currently applied before lookup
    pub fn octave_shift(&self) -> i32 {
        self.keymap.octave_shift()
    }

    /// Change the octave shift; affects the next resolve only
    pub fn set_octave_shift(&mut self, shift: i32) {
        self.keymap.set_octave_shift(shift);
    }

    /// Release every key with an outstanding press. Called on
    /// shutdown so no key is left stuck down.
    pub fn release_all(&mut self) {
        for label in self.tracker.held_labels() {
            if self.tracker.try_release(&label) {
                info!("Releasing held key '{}' on shutdown", label);
                self.actuator.release(&label);
            }
        }
    }

    #[cfg(test)]
    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}
