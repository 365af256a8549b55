//=========================================================================
// Mouse
//=========================================================================
//
// Edge-detected mouse buttons, drag tracking, cursor and scroll samples.
//
// Frame lifecycle:
//   poll (button/move/scroll) → update (query) → commit()
//
// Deltas are `current − last committed sample`, in device units. The
// scroll position is the running sum of wheel offsets.
//
//=========================================================================

//=== External Dependencies ===============================================

use glam::DVec2;
use log::trace;

//=== Internal Dependencies ===============================================

use super::button_state::{Button, ButtonState};
use super::event::MouseButton;

//=== Mouse ===============================================================

/// Fixed-slot mouse state, one entry per [`MouseButton`].
#[derive(Debug, Default)]
pub struct Mouse {
    //--- Buttons ----------------------------------------------------------
    buttons: [ButtonState; MouseButton::COUNT],
    dragging: [bool; MouseButton::COUNT],

    //--- Continuous Samples -----------------------------------------------
    position: DVec2,
    last_position: DVec2,
    scroll: DVec2,
    last_scroll: DVec2,
}

impl Mouse {
    /// Creates a mouse at the origin with every button released.
    pub fn new() -> Self {
        Self::default()
    }

    //--- Device Updates ---------------------------------------------------

    pub(crate) fn button_down(&mut self, button: MouseButton) {
        trace!(target: "input", "Mouse down: {:?}", button);
        self.buttons[button.index()].set_raw(true);
    }

    pub(crate) fn button_up(&mut self, button: MouseButton) {
        trace!(target: "input", "Mouse up: {:?}", button);
        let index = button.index();
        self.buttons[index].set_raw(false);
        self.dragging[index] = false;
    }

    pub(crate) fn cursor_moved(&mut self, x: f64, y: f64) {
        self.position = DVec2::new(x, y);
        for (state, dragging) in self.buttons.iter().zip(self.dragging.iter_mut()) {
            if state.raw() {
                *dragging = true;
            }
        }
    }

    pub(crate) fn scrolled(&mut self, dx: f64, dy: f64) {
        self.scroll += DVec2::new(dx, dy);
    }

    /// Advances button history and snapshots continuous samples.
    pub(crate) fn commit(&mut self) {
        for state in &mut self.buttons {
            state.commit();
        }
        self.last_position = self.position;
        self.last_scroll = self.scroll;
    }

    //=====================================================================
    // Query API - Buttons
    //=====================================================================

    /// Returns the raw history record for a button.
    pub fn state(&self, button: MouseButton) -> ButtonState {
        self.buttons[button.index()]
    }

    /// Button held continuously across the last frame boundary.
    pub fn is_pressed(&self, button: impl Into<Button<MouseButton>>) -> bool {
        self.query(button.into(), ButtonState::is_pressed)
    }

    /// First frame of a press.
    pub fn was_pressed(&self, button: impl Into<Button<MouseButton>>) -> bool {
        self.query(button.into(), ButtonState::was_pressed)
    }

    /// Button not held this frame nor the previous one.
    pub fn is_released(&self, button: impl Into<Button<MouseButton>>) -> bool {
        self.query(button.into(), ButtonState::is_released)
    }

    /// First frame after a release.
    pub fn was_released(&self, button: impl Into<Button<MouseButton>>) -> bool {
        self.query(button.into(), ButtonState::was_released)
    }

    /// Cursor moved while the button was down and it has not been released since.
    pub fn is_dragging(&self, button: impl Into<Button<MouseButton>>) -> bool {
        match button.into() {
            Button::Any => self.dragging.iter().any(|d| *d),
            Button::Code(code) => self.dragging[code.index()],
        }
    }

    //=====================================================================
    // Query API - Position & Scroll
    //=====================================================================

    /// Cursor position in pixels, top-left origin.
    pub fn position(&self) -> DVec2 {
        self.position
    }

    /// Cursor movement since the last commit.
    pub fn position_delta(&self) -> DVec2 {
        self.position - self.last_position
    }

    /// Accumulated wheel offsets.
    pub fn scroll(&self) -> DVec2 {
        self.scroll
    }

    /// Wheel movement since the last commit.
    pub fn scroll_delta(&self) -> DVec2 {
        self.scroll - self.last_scroll
    }

    //--- Internal Helpers -------------------------------------------------

    fn query(&self, button: Button<MouseButton>, predicate: fn(&ButtonState) -> bool) -> bool {
        match button {
            Button::Any => self.buttons.iter().any(predicate),
            Button::Code(code) => predicate(&self.buttons[code.index()]),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
