//! Synthetic keyboard output
//!
//! The [`KeyActuator`] trait is the seam between the translation
//! engine and the OS: the engine only ever asks for a labelled key to
//! go down or up. On Windows the [`SendInputActuator`] injects
//! hardware scan codes; everywhere else (and for dry runs) the
//! [`ConsoleActuator`] just logs what would have been sent.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::{info, warn};

/// Performs the OS-level press/release of a labelled key.
///
/// Both calls return false when the label is outside the supported
/// set or the OS rejects the injection; callers treat that as
/// non-fatal.
pub trait KeyActuator: Send {
    fn press(&mut self, label: &str) -> bool;
    fn release(&mut self, label: &str) -> bool;
}

impl KeyActuator for Box<dyn KeyActuator> {
    fn press(&mut self, label: &str) -> bool {
        (**self).press(label)
    }

    fn release(&mut self, label: &str) -> bool {
        (**self).release(label)
    }
}

/// Keyboard scan codes (set 1) for every label the actuator accepts.
/// Letters map case-insensitively to the same physical key.
static SCAN_CODES: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Letter row codes, a-z
    let letters: [(&str, u16); 26] = [
        ("a", 0x1E), ("b", 0x30), ("c", 0x2E), ("d", 0x20), ("e", 0x12),
        ("f", 0x21), ("g", 0x22), ("h", 0x23), ("i", 0x17), ("j", 0x24),
        ("k", 0x25), ("l", 0x26), ("m", 0x32), ("n", 0x31), ("o", 0x18),
        ("p", 0x19), ("q", 0x10), ("r", 0x13), ("s", 0x1F), ("t", 0x14),
        ("u", 0x16), ("v", 0x2F), ("w", 0x11), ("x", 0x2D), ("y", 0x15),
        ("z", 0x2C),
    ];
    for (label, code) in letters {
        m.insert(label, code);
    }

    // Digits
    let digits: [(&str, u16); 10] = [
        ("1", 0x02), ("2", 0x03), ("3", 0x04), ("4", 0x05), ("5", 0x06),
        ("6", 0x07), ("7", 0x08), ("8", 0x09), ("9", 0x0A), ("0", 0x0B),
    ];
    for (label, code) in digits {
        m.insert(label, code);
    }

    // Symbols
    let symbols: [(&str, u16); 11] = [
        (",", 0x33), (".", 0x34), (";", 0x27), ("/", 0x35), ("-", 0x0C),
        ("[", 0x1A), ("=", 0x0D), ("]", 0x1B), ("`", 0x29), ("\\", 0x2B),
        ("'", 0x28),
    ];
    for (label, code) in symbols {
        m.insert(label, code);
    }

    m
});

/// Look up the scan code for a key label, case-insensitively for
/// single letters.
pub fn scan_code(label: &str) -> Option<u16> {
    if let Some(&code) = SCAN_CODES.get(label) {
        return Some(code);
    }
    // Uppercase letters share the lowercase key's scan code
    let lowered = label.to_lowercase();
    SCAN_CODES.get(lowered.as_str()).copied()
}

/// Whether a label names a key this actuator family can emit
pub fn is_supported_label(label: &str) -> bool {
    scan_code(label).is_some()
}

/// Windows actuator injecting scan-code keyboard events via SendInput
#[cfg(windows)]
pub struct SendInputActuator;

#[cfg(windows)]
impl SendInputActuator {
    pub fn new() -> Self {
        Self
    }

    fn send(&self, label: &str, is_press: bool) -> bool {
        use windows::Win32::UI::Input::KeyboardAndMouse::{
            SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
            KEYEVENTF_KEYUP, KEYEVENTF_SCANCODE, VIRTUAL_KEY,
        };

        let Some(code) = scan_code(label) else {
            warn!("No scan code for key label '{}'", label);
            return false;
        };

        let mut flags: KEYBD_EVENT_FLAGS = KEYEVENTF_SCANCODE;
        if !is_press {
            flags |= KEYEVENTF_KEYUP;
        }

        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(0),
                    wScan: code,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };

        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        sent == 1
    }
}

#[cfg(windows)]
impl Default for SendInputActuator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
impl KeyActuator for SendInputActuator {
    fn press(&mut self, label: &str) -> bool {
        self.send(label, true)
    }

    fn release(&mut self, label: &str) -> bool {
        self.send(label, false)
    }
}

/// Logging actuator for non-Windows hosts and `--dry-run`
#[derive(Debug, Default)]
pub struct ConsoleActuator;

impl ConsoleActuator {
    pub fn new() -> Self {
        Self
    }
}

impl KeyActuator for ConsoleActuator {
    fn press(&mut self, label: &str) -> bool {
        if !is_supported_label(label) {
            warn!("No scan code for key label '{}'", label);
            return false;
        }
        info!("[dry-run] key down: {}", label);
        true
    }

    fn release(&mut self, label: &str) -> bool {
        if !is_supported_label(label) {
            warn!("No scan code for key label '{}'", label);
            return false;
        }
        info!("[dry-run] key up: {}", label);
        true
    }
}

/// Recording actuator used by dispatcher tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockActuator {
    pub calls: Vec<(String, bool)>,
    pub fail_labels: Vec<String>,
}

#[cfg(test)]
impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presses(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|(_, down)| *down)
            .map(|(label, _)| label.as_str())
            .collect()
    }

    pub fn releases(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|(_, down)| !*down)
            .map(|(label, _)| label.as_str())
            .collect()
    }
}

#[cfg(test)]
impl KeyActuator for MockActuator {
    fn press(&mut self, label: &str) -> bool {
        self.calls.push((label.to_string(), true));
        !self.fail_labels.iter().any(|l| l == label)
    }

    fn release(&mut self, label: &str) -> bool {
        self.calls.push((label.to_string(), false));
        !self.fail_labels.iter().any(|l| l == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_map_case_insensitively() {
        assert_eq!(scan_code("a"), Some(0x1E));
        assert_eq!(scan_code("A"), Some(0x1E));
        assert_eq!(scan_code("z"), Some(0x2C));
    }

    #[test]
    fn test_digits_and_symbols_supported() {
        assert_eq!(scan_code("1"), Some(0x02));
        assert_eq!(scan_code("0"), Some(0x0B));
        assert_eq!(scan_code(";"), Some(0x27));
        assert_eq!(scan_code("\\"), Some(0x2B));
        assert_eq!(scan_code("'"), Some(0x28));
    }

    #[test]
    fn test_unknown_labels_rejected() {
        assert_eq!(scan_code("F13"), None);
        assert_eq!(scan_code(""), None);
        assert!(!is_supported_label("space bar"));
    }

    #[test]
    fn test_console_actuator_rejects_unknown_label() {
        let mut actuator = ConsoleActuator::new();
        assert!(actuator.press("a"));
        assert!(actuator.release("a"));
        assert!(!actuator.press("nope"));
    }
}
