//=========================================================================
// Input Event Types
//
// Defines the internal representation of low-level device events.
//
// This module abstracts away platform-specific input (e.g. Winit) into
// a unified, engine-friendly format consumed by `Keyboard` and `Mouse`.
//
// Responsibilities:
// - Represent keyboard and mouse inputs in a stable, portable way
// - Identify mouse buttons by index (Button1..Button8)
// - Carry cursor positions and wheel offsets in device units
//
// Event Flow:
// ```text
// Platform Layer (Winit)
//         ↓
//    InputEvent (this module)
//         ↓
//    Input::apply() during the poll step
//         ↓
//    Keyboard / Mouse edge predicates
// ```
//
//=========================================================================

//=== MouseButton =========================================================

/// Physical mouse button identifier.
///
/// Buttons are addressed by index, the way most windowing layers report
/// them. The first three have the conventional aliases
/// [`MouseButton::LEFT`], [`MouseButton::RIGHT`] and [`MouseButton::MIDDLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MouseButton {
    Button1,
    Button2,
    Button3,
    Button4,
    Button5,
    Button6,
    Button7,
    Button8,
}

impl MouseButton {
    /// Primary button. Same slot as [`MouseButton::Button1`].
    pub const LEFT: Self = Self::Button1;

    /// Secondary button. Same slot as [`MouseButton::Button2`].
    pub const RIGHT: Self = Self::Button2;

    /// Wheel button. Same slot as [`MouseButton::Button3`].
    pub const MIDDLE: Self = Self::Button3;

    /// Number of tracked mouse button slots.
    pub const COUNT: usize = 8;

    /// All buttons in slot order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Button1,
        Self::Button2,
        Self::Button3,
        Self::Button4,
        Self::Button5,
        Self::Button6,
        Self::Button7,
        Self::Button8,
    ];

    /// Slot index of this button (0-based).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the button for a 0-based slot index, if one exists.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

//=== KeyCode =============================================================

/// Physical keyboard key identifier.
///
/// Represents the physical key location, not the character produced.
/// `KeyA` is always the same physical key regardless of layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyCode {
    //--- Numeric Keys -----------------------------------------------------
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    //--- Alphabetic Keys --------------------------------------------------
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI,
    KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO, KeyP, KeyQ, KeyR,
    KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,

    //--- Arrow Keys -------------------------------------------------------
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,

    //--- Function Keys ----------------------------------------------------
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    //--- Special Keys -----------------------------------------------------
    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
}

impl KeyCode {
    /// Number of distinct keys. `AltRight` stays the last variant.
    pub const COUNT: usize = KeyCode::AltRight as usize + 1;
}

//=== InputEvent ==========================================================

/// Low-level input event produced by the platform layer.
///
/// Key and button events are discrete; cursor and wheel events are
/// continuous samples. Wheel offsets are deltas for this event and are
/// accumulated by [`Mouse`](super::Mouse) into a scroll position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Key went down.
    KeyDown(KeyCode),

    /// Key went up.
    KeyUp(KeyCode),

    /// Mouse button went down.
    MouseButtonDown(MouseButton),

    /// Mouse button went up.
    MouseButtonUp(MouseButton),

    /// Cursor moved to a new position (pixels, top-left origin).
    CursorMoved { x: f64, y: f64 },

    /// Wheel or touchpad scrolled by the given offsets.
    Scrolled { dx: f64, dy: f64 },
}

impl InputEvent {
    /// Returns `true` for key and button transitions.
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            Self::KeyDown(_) | Self::KeyUp(_) | Self::MouseButtonDown(_) | Self::MouseButtonUp(_)
        )
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
