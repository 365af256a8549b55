//=========================================================================
// Platform Event Mapper
//
// Converts Winit window events to engine-level `PlatformEvent` types.
// Provides a clean separation between OS-specific input and the
// engine's internal event representation.
//
// Responsibilities:
// - Translate keyboard, mouse button, cursor and wheel events
// - Forward resize and close requests
// - Drop keys and buttons the engine has no slot for
//
//=========================================================================

use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::core::input::{InputEvent, KeyCode, MouseButton};
use crate::core::platform_bridge::PlatformEvent;

//=== Key Conversion ======================================================
//
// Maps `WinitKeyCode` values to the engine's `KeyCode` enum. Only a
// subset of codes is tracked; the rest yield `None`.
//

pub(crate) fn map_key(code: WinitKeyCode) -> Option<KeyCode> {
    use WinitKeyCode::*;
    let key = match code {
        //--- Numeric keys -----------------------------------------------------
        Digit0 => KeyCode::Digit0, Digit1 => KeyCode::Digit1,
        Digit2 => KeyCode::Digit2, Digit3 => KeyCode::Digit3,
        Digit4 => KeyCode::Digit4, Digit5 => KeyCode::Digit5,
        Digit6 => KeyCode::Digit6, Digit7 => KeyCode::Digit7,
        Digit8 => KeyCode::Digit8, Digit9 => KeyCode::Digit9,

        //--- Alphabetic keys --------------------------------------------------
        KeyA => KeyCode::KeyA, KeyB => KeyCode::KeyB, KeyC => KeyCode::KeyC,
        KeyD => KeyCode::KeyD, KeyE => KeyCode::KeyE, KeyF => KeyCode::KeyF,
        KeyG => KeyCode::KeyG, KeyH => KeyCode::KeyH, KeyI => KeyCode::KeyI,
        KeyJ => KeyCode::KeyJ, KeyK => KeyCode::KeyK, KeyL => KeyCode::KeyL,
        KeyM => KeyCode::KeyM, KeyN => KeyCode::KeyN, KeyO => KeyCode::KeyO,
        KeyP => KeyCode::KeyP, KeyQ => KeyCode::KeyQ, KeyR => KeyCode::KeyR,
        KeyS => KeyCode::KeyS, KeyT => KeyCode::KeyT, KeyU => KeyCode::KeyU,
        KeyV => KeyCode::KeyV, KeyW => KeyCode::KeyW, KeyX => KeyCode::KeyX,
        KeyY => KeyCode::KeyY, KeyZ => KeyCode::KeyZ,

        //--- Arrow keys -------------------------------------------------------
        ArrowDown => KeyCode::ArrowDown, ArrowLeft => KeyCode::ArrowLeft,
        ArrowRight => KeyCode::ArrowRight, ArrowUp => KeyCode::ArrowUp,

        //--- Function keys ----------------------------------------------------
        F1 => KeyCode::F1, F2 => KeyCode::F2, F3 => KeyCode::F3,
        F4 => KeyCode::F4, F5 => KeyCode::F5, F6 => KeyCode::F6,
        F7 => KeyCode::F7, F8 => KeyCode::F8, F9 => KeyCode::F9,
        F10 => KeyCode::F10, F11 => KeyCode::F11, F12 => KeyCode::F12,

        //--- Special keys -----------------------------------------------------
        Space => KeyCode::Space,
        Enter => KeyCode::Enter,
        Escape => KeyCode::Escape,
        Tab => KeyCode::Tab,
        Backspace => KeyCode::Backspace,
        Delete => KeyCode::Delete,
        ShiftLeft => KeyCode::ShiftLeft,
        ShiftRight => KeyCode::ShiftRight,
        ControlLeft => KeyCode::ControlLeft,
        ControlRight => KeyCode::ControlRight,
        AltLeft => KeyCode::AltLeft,
        AltRight => KeyCode::AltRight,

        _ => return None,
    };
    Some(key)
}

//=== Mouse Conversion ====================================================
//
// Winit names the first five buttons; `Other(n)` carries a raw index.
//

pub(crate) fn map_mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::LEFT),
        WinitMouseButton::Right => Some(MouseButton::RIGHT),
        WinitMouseButton::Middle => Some(MouseButton::MIDDLE),
        WinitMouseButton::Back => Some(MouseButton::Button4),
        WinitMouseButton::Forward => Some(MouseButton::Button5),
        WinitMouseButton::Other(index) => MouseButton::from_index(index as usize),
    }
}

/// Wheel offsets in lines or pixels, whichever the device reports.
pub(crate) fn scroll_offsets(delta: MouseScrollDelta) -> (f64, f64) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (x as f64, y as f64),
        MouseScrollDelta::PixelDelta(position) => (position.x, position.y),
    }
}

//=== Full Event Conversion ===============================================
//
// Notes:
// - `KeyboardInput` becomes `KeyDown`/`KeyUp`; OS key repeats are dropped.
// - `MouseInput` becomes `MouseButtonDown`/`MouseButtonUp`.
// - Other Winit events are ignored.
//

pub(crate) fn map_window_event(event: &WindowEvent) -> Option<PlatformEvent> {
    let input = match event {
        //--- Window --------------------------------------------------------
        WindowEvent::CloseRequested => return Some(PlatformEvent::CloseRequested),
        WindowEvent::Resized(size) => {
            return Some(PlatformEvent::Resized {
                width: size.width,
                height: size.height,
            })
        }

        //--- Keyboard Input ------------------------------------------------
        WindowEvent::KeyboardInput { event, .. } => {
            if event.repeat {
                return None;
            }
            let PhysicalKey::Code(code) = event.physical_key else {
                return None;
            };
            let key = map_key(code)?;
            match event.state {
                ElementState::Pressed => InputEvent::KeyDown(key),
                ElementState::Released => InputEvent::KeyUp(key),
            }
        }

        //--- Mouse Button Input --------------------------------------------
        WindowEvent::MouseInput { state, button, .. } => {
            let button = map_mouse_button(*button)?;
            match state {
                ElementState::Pressed => InputEvent::MouseButtonDown(button),
                ElementState::Released => InputEvent::MouseButtonUp(button),
            }
        }

        //--- Mouse Movement ------------------------------------------------
        WindowEvent::CursorMoved { position, .. } => InputEvent::CursorMoved {
            x: position.x,
            y: position.y,
        },

        WindowEvent::MouseWheel { delta, .. } => {
            let (dx, dy) = scroll_offsets(*delta);
            InputEvent::Scrolled { dx, dy }
        }

        //--- Unhandled Events ----------------------------------------------
        _ => return None,
    };
    Some(PlatformEvent::Input(input))
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::{PhysicalPosition, PhysicalSize};

    #[test]
    fn tracked_keys_map() {
        assert_eq!(map_key(WinitKeyCode::KeyW), Some(KeyCode::KeyW));
        assert_eq!(map_key(WinitKeyCode::Space), Some(KeyCode::Space));
        assert_eq!(map_key(WinitKeyCode::F12), Some(KeyCode::F12));
        assert_eq!(map_key(WinitKeyCode::ShiftRight), Some(KeyCode::ShiftRight));
    }

    #[test]
    fn untracked_keys_are_dropped() {
        assert_eq!(map_key(WinitKeyCode::NumLock), None);
        assert_eq!(map_key(WinitKeyCode::MediaPlayPause), None);
    }

    #[test]
    fn mouse_buttons_map_to_slots() {
        assert_eq!(map_mouse_button(WinitMouseButton::Left), Some(MouseButton::Button1));
        assert_eq!(map_mouse_button(WinitMouseButton::Right), Some(MouseButton::Button2));
        assert_eq!(map_mouse_button(WinitMouseButton::Middle), Some(MouseButton::Button3));
        assert_eq!(map_mouse_button(WinitMouseButton::Forward), Some(MouseButton::Button5));
        assert_eq!(map_mouse_button(WinitMouseButton::Other(7)), Some(MouseButton::Button8));
        assert_eq!(map_mouse_button(WinitMouseButton::Other(8)), None);
    }

    #[test]
    fn scroll_offsets_use_reported_units() {
        assert_eq!(scroll_offsets(MouseScrollDelta::LineDelta(0.0, -1.0)), (0.0, -1.0));
        assert_eq!(
            scroll_offsets(MouseScrollDelta::PixelDelta(PhysicalPosition::new(3.0, 4.5))),
            (3.0, 4.5)
        );
    }

    #[test]
    fn window_events_map() {
        assert_eq!(
            map_window_event(&WindowEvent::CloseRequested),
            Some(PlatformEvent::CloseRequested)
        );
        assert_eq!(
            map_window_event(&WindowEvent::Resized(PhysicalSize::new(640, 480))),
            Some(PlatformEvent::Resized { width: 640, height: 480 })
        );
        assert_eq!(map_window_event(&WindowEvent::Focused(true)), None);
    }
}
