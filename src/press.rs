//! Press state tracking
//!
//! A boolean edge detector keyed by label. This is what makes the
//! engine idempotent against redundant note-on/note-off traffic:
//! only a false→true transition produces a press action, only a
//! true→false transition produces a release. It carries no MIDI
//! semantics at all and would work for any binary on/off signal.

use std::collections::HashSet;

/// Tracks which key labels currently have an outstanding press
#[derive(Debug, Default)]
pub struct PressTracker {
    held: HashSet<String>,
}

impl PressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press edge. Returns true if the caller should emit a
    /// press action, false if the label was already held.
    pub fn try_press(&mut self, label: &str) -> bool {
        self.held.insert(label.to_string())
    }

    /// Record a release edge. Returns true if the caller should emit
    /// a release action, false if the label was not held.
    pub fn try_release(&mut self, label: &str) -> bool {
        self.held.remove(label)
    }

    /// Undo a press edge that the actuator rejected, so a later
    /// note-on can retry.
    pub fn revert_press(&mut self, label: &str) {
        self.held.remove(label);
    }

    pub fn is_held(&self, label: &str) -> bool {
        self.held.contains(label)
    }

    /// Labels with an outstanding press, for shutdown cleanup
    pub fn held_labels(&self) -> Vec<String> {
        self.held.iter().cloned().collect()
    }
}
