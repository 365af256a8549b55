//=========================================================================
// Keyboard
//=========================================================================
//
// Edge-detected keyboard state.
//
// Architecture:
//   InputEvent → key_down()/key_up() → HashMap<KeyCode, ButtonState> → query
//
// Frame lifecycle: poll (key_down/key_up) → update (query) → commit()
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::trace;

//=== Internal Dependencies ===============================================

use super::button_state::{Button, ButtonState};
use super::event::KeyCode;

//=== Keyboard ============================================================

/// Per-key `(raw, prev_raw)` table.
///
/// Keys that were never reported read as released with released history.
#[derive(Debug, Default)]
pub struct Keyboard {
    keys: HashMap<KeyCode, ButtonState>,
}

impl Keyboard {
    /// Creates a keyboard with every key released.
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    //--- Device Updates ---------------------------------------------------

    pub(crate) fn key_down(&mut self, key: KeyCode) {
        trace!(target: "input", "Key down: {:?}", key);
        self.keys.entry(key).or_default().set_raw(true);
    }

    pub(crate) fn key_up(&mut self, key: KeyCode) {
        trace!(target: "input", "Key up: {:?}", key);
        self.keys.entry(key).or_default().set_raw(false);
    }

    /// Advances every key's history by one frame.
    pub(crate) fn commit(&mut self) {
        for state in self.keys.values_mut() {
            state.commit();
        }
    }

    //=====================================================================
    // Query API
    //=====================================================================

    /// Returns the raw history record for a key.
    pub fn state(&self, key: KeyCode) -> ButtonState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    /// Key held continuously across the last frame boundary.
    pub fn is_pressed(&self, key: impl Into<Button<KeyCode>>) -> bool {
        self.query(key.into(), ButtonState::is_pressed)
    }

    /// First frame of a press.
    pub fn was_pressed(&self, key: impl Into<Button<KeyCode>>) -> bool {
        self.query(key.into(), ButtonState::was_pressed)
    }

    /// Key not held this frame nor the previous one.
    ///
    /// `Button::Any` holds while any key is idle, including keys that were
    /// never reported.
    pub fn is_released(&self, key: impl Into<Button<KeyCode>>) -> bool {
        self.query(key.into(), ButtonState::is_released)
    }

    /// First frame after a release.
    pub fn was_released(&self, key: impl Into<Button<KeyCode>>) -> bool {
        self.query(key.into(), ButtonState::was_released)
    }

    /// Keys whose raw state is currently down.
    pub fn held_keys(&self) -> impl Iterator<Item = KeyCode> + '_ {
        self.keys
            .iter()
            .filter(|(_, state)| state.raw())
            .map(|(key, _)| *key)
    }

    //--- Internal Helpers -------------------------------------------------

    fn query(&self, key: Button<KeyCode>, predicate: fn(&ButtonState) -> bool) -> bool {
        match key {
            Button::Any => {
                self.keys.values().any(predicate)
                    || (self.keys.len() < KeyCode::COUNT && predicate(&ButtonState::default()))
            }
            Button::Code(code) => predicate(&self.state(code)),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
