//=========================================================================
// Button State
//=========================================================================
//
// Two-slot frame history for a single key or mouse button.
//
// Frame lifecycle:
//   poll (set raw) → scene update (query) → commit (prev_raw ← raw)
//
// Predicates are evaluated against the pre-commit snapshot:
//
// ```text
//   raw  prev_raw   predicate
//   ───  ────────   ────────────
//    1      1       is_pressed    (held across the frame boundary)
//    1      0       was_pressed   (first frame of the press)
//    0      0       is_released   (not held)
//    0      1       was_released  (first frame after release)
// ```
//
//=========================================================================

//=== Button Selector =====================================================

/// Selects which slot(s) an edge query looks at.
///
/// Any concrete key or button converts into `Button::Code`, so queries
/// accept either `KeyCode::Space` or `Button::Any`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button<K> {
    /// Satisfied if the predicate holds for at least one slot.
    Any,

    /// A single slot.
    Code(K),
}

impl<K> From<K> for Button<K> {
    fn from(code: K) -> Self {
        Self::Code(code)
    }
}

//=== ButtonState =========================================================

/// Raw state of one key or button plus its value at the previous commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    raw: bool,
    prev_raw: bool,
}

impl ButtonState {
    /// Creates a released button with released history.
    pub const fn new() -> Self {
        Self {
            raw: false,
            prev_raw: false,
        }
    }

    //--- Mutation ---------------------------------------------------------

    /// Records the physical state reported by a device event.
    pub(crate) fn set_raw(&mut self, down: bool) {
        self.raw = down;
    }

    /// Advances the one-frame history.
    pub(crate) fn commit(&mut self) {
        self.prev_raw = self.raw;
    }

    //--- Queries ----------------------------------------------------------

    /// Physical state as of the last poll.
    pub fn raw(&self) -> bool {
        self.raw
    }

    /// Physical state captured at the previous commit.
    pub fn prev_raw(&self) -> bool {
        self.prev_raw
    }

    pub fn is_pressed(&self) -> bool {
        self.raw && self.prev_raw
    }

    pub fn was_pressed(&self) -> bool {
        self.raw && !self.prev_raw
    }

    pub fn is_released(&self) -> bool {
        !self.raw && !self.prev_raw
    }

    pub fn was_released(&self) -> bool {
        !self.raw && self.prev_raw
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state(raw: bool, prev_raw: bool) -> ButtonState {
        ButtonState { raw, prev_raw }
    }

    #[test]
    fn truth_table() {
        let held = state(true, true);
        assert!(held.is_pressed() && !held.was_pressed());
        assert!(!held.is_released() && !held.was_released());

        let rising = state(true, false);
        assert!(rising.was_pressed() && !rising.is_pressed());

        let idle = state(false, false);
        assert!(idle.is_released() && !idle.was_released());

        let falling = state(false, true);
        assert!(falling.was_released() && !falling.is_released());
    }

    #[test]
    fn exactly_one_predicate_per_raw_value() {
        for raw in [false, true] {
            for prev_raw in [false, true] {
                let s = state(raw, prev_raw);
                if raw {
                    assert!(s.is_pressed() ^ s.was_pressed());
                    assert!(!s.is_released() && !s.was_released());
                } else {
                    assert!(s.is_released() ^ s.was_released());
                    assert!(!s.is_pressed() && !s.was_pressed());
                }
            }
        }
    }

    #[test]
    fn commit_copies_raw_into_history() {
        let mut s = ButtonState::new();
        s.set_raw(true);
        assert!(s.was_pressed());

        s.commit();
        assert!(s.is_pressed());
        assert!(s.prev_raw());

        s.set_raw(false);
        assert!(s.was_released());

        s.commit();
        assert!(s.is_released());
    }

    #[test]
    fn selector_from_code() {
        let sel: Button<u8> = 3.into();
        assert_eq!(sel, Button::Code(3));
    }
}
