//=========================================================================
// Platform Bridge Interface
//=========================================================================
//
// Contract between the frame loop and the native windowing layer.
//
// ```text
//   SurfaceBackend ──create_surface(config)──► Box<dyn Surface>
//                                                 │
//   Window::init ──register_callbacks(sender)─────┤
//   Window::run_loop ─┬─ poll_events()  (pushes PlatformEvent)
//                     └─ present()
//   Window::free ──unregister_callbacks() then drop
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;

use crossbeam_channel::Sender;
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::config::WindowConfig;
use crate::core::input::InputEvent;
use crate::gpu::GraphicsDevice;

//=== PlatformEvent =======================================================

/// Events a surface pushes into the engine's queue while polling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlatformEvent {
    /// Keyboard, mouse button, cursor or wheel event.
    Input(InputEvent),

    /// Drawable area changed size (physical pixels).
    Resized { width: u32, height: u32 },

    /// User or OS asked the window to close.
    CloseRequested,
}

impl From<InputEvent> for PlatformEvent {
    fn from(event: InputEvent) -> Self {
        Self::Input(event)
    }
}

//=== PlatformError =======================================================

/// Windowing-layer failures. Fatal during startup.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The native event loop could not be created.
    #[error("event loop creation failed: {0}")]
    EventLoopCreation(String),

    /// The native window/context could not be created.
    #[error("window creation failed: {0}")]
    WindowCreation(String),

    /// The windowing layer never produced a surface.
    #[error("no surface has been created")]
    NoSurface,

    /// No graphics adapter or device could be opened for the surface.
    #[error("graphics device creation failed: {0}")]
    DeviceCreation(String),
}

//=== Surface =============================================================

/// A native window plus its drawing context.
///
/// Device events are only ever dispatched from inside [`Surface::poll_events`],
/// and only to the sender registered through [`Surface::register_callbacks`].
pub trait Surface {
    /// Routes subsequent device events into `sender`.
    fn register_callbacks(&mut self, sender: Sender<PlatformEvent>);

    /// Stops routing device events.
    fn unregister_callbacks(&mut self);

    /// Dispatches every queued device event. Never blocks.
    fn poll_events(&mut self);

    /// Presents the frame buffer. May wait for vertical sync.
    fn present(&mut self);

    /// Whether the native layer flagged the window for closing.
    fn should_close(&self) -> bool;

    /// Drawable size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Graphics device bound to this surface's context, if any.
    fn device(&self) -> Option<Rc<dyn GraphicsDevice>>;
}

//=== SurfaceBackend ======================================================

/// Creates surfaces. One backend per windowing layer.
pub trait SurfaceBackend {
    fn create_surface(&mut self, config: &WindowConfig) -> Result<Box<dyn Surface>, PlatformError>;
}

//=========================================================================
// Unit Tests
//=========================================================================
