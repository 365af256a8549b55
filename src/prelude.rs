//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use ember_engine::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Window and frame loop
pub use crate::config::{ClearColor, WindowConfig};
pub use crate::window::{Window, WindowBuilder};

// Errors
pub use crate::error::{EngineError, ResourceError, ShaderSourceError};

// Input system
pub use crate::core::input::{Button, ButtonState, KeyCode, Keyboard, Mouse, MouseButton};

// Scene system
pub use crate::core::scene::{Scene, SceneContext, SceneState};

// GPU resources
pub use crate::gpu::{Camera, Gfx, GpuResource, Mesh, Shader, Texture};

// Native backend
pub use crate::platform::WinitBackend;
