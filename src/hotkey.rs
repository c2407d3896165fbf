//! Maintenance hotkey recognition.
//!
//! Tracks the set of currently-held keys and recognizes ALT+F4 as the
//! emergency-stop chord, regardless of press order.

use std::collections::HashSet;

use evdev::KeyCode;

/// Key completing the maintenance chord.
pub const STOP_KEY: KeyCode = KeyCode::KEY_F4;

/// Modifiers, either of which arms the chord.
pub const STOP_MODIFIERS: [KeyCode; 2] = [KeyCode::KEY_LEFTALT, KeyCode::KEY_RIGHTALT];

const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;

/// Tracks held keys across all monitored devices.
#[derive(Debug, Default)]
pub struct HotkeyDetector {
    pressed: HashSet<KeyCode>,
}

impl HotkeyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one key event. Returns true when the chord is concurrently
    /// held at the moment of this press. Autorepeat (value 2) is
    /// neither a press nor a release; a release for a key never
    /// recorded is a no-op.
    pub fn on_key(&mut self, code: KeyCode, value: i32) -> bool {
        match value {
            KEY_PRESS => {
                self.pressed.insert(code);
                self.chord_held()
            }
            KEY_RELEASE => {
                self.pressed.remove(&code);
                false
            }
            _ => false,
        }
    }

    fn chord_held(&self) -> bool {
        self.pressed.contains(&STOP_KEY)
            && STOP_MODIFIERS.iter().any(|m| self.pressed.contains(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALT: KeyCode = KeyCode::KEY_LEFTALT;
    const RALT: KeyCode = KeyCode::KEY_RIGHTALT;
    const F4: KeyCode = KeyCode::KEY_F4;
    const SPACE: KeyCode = KeyCode::KEY_SPACE;

    #[test]
    fn test_modifier_then_f4_fires() {
        let mut detector = HotkeyDetector::new();
        assert!(!detector.on_key(ALT, 1));
        assert!(detector.on_key(F4, 1));
    }

    #[test]
    fn test_f4_then_modifier_fires() {
        let mut detector = HotkeyDetector::new();
        assert!(!detector.on_key(F4, 1));
        assert!(detector.on_key(ALT, 1));
    }

    #[test]
    fn test_right_alt_also_arms_chord() {
        let mut detector = HotkeyDetector::new();
        assert!(!detector.on_key(RALT, 1));
        assert!(detector.on_key(F4, 1));
    }

    #[test]
    fn test_release_breaks_chord() {
        let mut detector = HotkeyDetector::new();
        assert!(!detector.on_key(ALT, 1));
        assert!(!detector.on_key(ALT, 0));
        assert!(!detector.on_key(F4, 1));
        assert!(!detector.on_key(F4, 0));
        // Modifier alone after the chord was broken: nothing.
        assert!(!detector.on_key(ALT, 1));
    }

    #[test]
    fn test_unrelated_keys_never_fire() {
        let mut detector = HotkeyDetector::new();
        assert!(!detector.on_key(SPACE, 1));
        assert!(!detector.on_key(ALT, 1));
        assert!(!detector.on_key(SPACE, 1));
        assert!(!detector.on_key(SPACE, 0));
    }

    #[test]
    fn test_autorepeat_is_ignored() {
        let mut detector = HotkeyDetector::new();
        assert!(!detector.on_key(ALT, 1));
        assert!(!detector.on_key(ALT, 2));
        // The repeat did not fire, the real F4 press does.
        assert!(detector.on_key(F4, 1));
    }

    #[test]
    fn test_pressed_set_is_idempotent() {
        let mut detector = HotkeyDetector::new();
        for _ in 0..5 {
            detector.on_key(SPACE, 1);
        }
        detector.on_key(SPACE, 0);
        assert!(!detector.pressed.contains(&SPACE));

        // Release for a key never pressed is a no-op.
        detector.on_key(F4, 0);
        assert!(detector.pressed.is_empty());
    }
}
