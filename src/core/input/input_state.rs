//=========================================================================
// Input State
//=========================================================================
//
// Routes device events to the keyboard and mouse and commits both once
// per frame.
//
// Single writer per frame phase:
//   poll   → apply()   (raw state)
//   update → queries only
//   commit → commit()  (history)
//
//=========================================================================

//=== External Dependencies ===============================================

use log::trace;

//=== Internal Dependencies ===============================================

use super::event::InputEvent;
use super::keyboard::Keyboard;
use super::mouse::Mouse;

//=== InputState ==========================================================

/// Keyboard and mouse state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    keyboard: Keyboard,
    mouse: Mouse,
    commits: u64,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Frame Processing -------------------------------------------------

    /// Applies one device event to the raw state.
    pub(crate) fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(key) => self.keyboard.key_down(key),
            InputEvent::KeyUp(key) => self.keyboard.key_up(key),
            InputEvent::MouseButtonDown(button) => self.mouse.button_down(button),
            InputEvent::MouseButtonUp(button) => self.mouse.button_up(button),
            InputEvent::CursorMoved { x, y } => self.mouse.cursor_moved(x, y),
            InputEvent::Scrolled { dx, dy } => self.mouse.scrolled(dx, dy),
        }
    }

    /// Copies raw state into history for every slot.
    pub(crate) fn commit(&mut self) {
        self.keyboard.commit();
        self.mouse.commit();
        self.commits += 1;
        trace!(target: "input", "Input committed (frame {})", self.commits);
    }

    //--- Accessors --------------------------------------------------------

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn mouse(&self) -> &Mouse {
        &self.mouse
    }

    /// Number of commits performed since construction.
    pub fn commits(&self) -> u64 {
        self.commits
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
