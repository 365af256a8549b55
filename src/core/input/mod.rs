//=========================================================================
// Input System
//=========================================================================
//
// Frame-accurate edge detection for keyboard and mouse.
//
// Architecture:
// ```text
//   PlatformEvent::Input(InputEvent)
//         ↓  (drained during the poll step)
//   InputState::apply()
//     ├─► Keyboard: HashMap<KeyCode, ButtonState>
//     └─► Mouse:    [ButtonState; 8] + drag + cursor/scroll samples
//         ↓  (after scene update, before present)
//   InputState::commit()   prev_raw ← raw
// ```
//
//=========================================================================

//=== Module Declarations =================================================

mod button_state;
pub mod event;
mod input_state;
mod keyboard;
mod mouse;

//=== Public API ==========================================================

pub use button_state::{Button, ButtonState};
pub use event::{InputEvent, KeyCode, MouseButton};
pub use input_state::InputState;
pub use keyboard::Keyboard;
pub use mouse::Mouse;
