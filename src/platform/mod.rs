//=========================================================================
// Platform Subsystem
//
// Winit implementation of the platform bridge contract.
//
// Architecture:
// ```text
//  Window::run_loop (main thread)
//  ┌───────────────────────────────────────────┐
//  │  WinitSurface::poll_events()              │
//  │   ↓ pump_app_events(timeout = 0)          │
//  │  SurfaceApp (ApplicationHandler)          │
//  │   ├─ resumed: create the OS window        │
//  │   └─ window_event → event_mapper          │
//  │        ↓                                  │
//  │  Sender<PlatformEvent> ───────────────────┼──► EventCollector
//  │                                           │     (same thread)
//  │  WinitSurface::present()                  │
//  │   └─ WgpuDevice::present_frame()          │
//  └───────────────────────────────────────────┘
// ```
//
// Key Design Decisions:
// - **Pumped, not run**: the frame loop owns control flow, so the event
//   loop is pumped once per frame and never blocks
// - **Graceful channel disconnect**: a dropped receiver only loses
//   events, the surface keeps running so the window can still close
// - **Main thread requirement**: Winit mandates main thread on macOS,
//   so surfaces must be created on the thread that runs the loop
//
// Responsibilities:
// - Create and manage the OS window and its wgpu device
// - Convert Winit types → engine PlatformEvents
// - Report close requests and the drawable size
//
//=========================================================================

//=== Submodules ==========================================================

mod event_mapper;
mod wgpu_device;

//=== External Crates =====================================================

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowAttributes, WindowId},
};

//=== Internal Imports ====================================================

use crate::config::WindowConfig;
use crate::core::platform_bridge::{PlatformError, PlatformEvent, Surface, SurfaceBackend};
use crate::gpu::GraphicsDevice;
use wgpu_device::WgpuDevice;

//=== WinitBackend ========================================================

/// Creates native windows through Winit.
///
/// Winit allows a single event loop per process, so a backend creates at
/// most one live surface.
#[derive(Debug, Default)]
pub struct WinitBackend {
    _private: (),
}

impl WinitBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SurfaceBackend for WinitBackend {
    fn create_surface(&mut self, config: &WindowConfig) -> Result<Box<dyn Surface>, PlatformError> {
        debug!(target: "platform", "Creating Winit event loop (vsync: {})", config.vsync);

        let mut event_loop =
            EventLoop::new().map_err(|e| PlatformError::EventLoopCreation(e.to_string()))?;

        let attributes = WindowAttributes::default()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width, config.height));

        let mut app = SurfaceApp::new(attributes, (config.width, config.height));

        // The window only exists once the loop has delivered `resumed`
        pump(&mut event_loop, &mut app);

        if let Some(reason) = app.creation_error.take() {
            return Err(PlatformError::WindowCreation(reason));
        }
        let window = app.window.clone().ok_or(PlatformError::NoSurface)?;

        let device = WgpuDevice::new(window, config.vsync).map_err(|reason| {
            error!(target: "gpu", "Graphics device creation failed: {}", reason);
            PlatformError::DeviceCreation(reason)
        })?;

        Ok(Box::new(WinitSurface {
            device: Rc::new(device),
            app,
            event_loop,
        }))
    }
}

//=== WinitSurface ========================================================

/// An OS window driven by a pumped Winit event loop.
///
/// Field order is drop order: the device releases its surface before the
/// window and the event loop go away.
pub(crate) struct WinitSurface {
    device: Rc<WgpuDevice>,
    app: SurfaceApp,
    event_loop: EventLoop<()>,
}

/// Dispatches queued Winit events to `app` without blocking.
fn pump(event_loop: &mut EventLoop<()>, app: &mut SurfaceApp) {
    if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), app) {
        debug!(target: "platform", "Winit event loop exited with code {}", code);
        app.close_requested = true;
    }
}

impl Surface for WinitSurface {
    fn register_callbacks(&mut self, sender: Sender<PlatformEvent>) {
        debug!(target: "platform", "Device callbacks registered");
        self.app.sender = Some(sender);
    }

    fn unregister_callbacks(&mut self) {
        debug!(target: "platform", "Device callbacks unregistered");
        self.app.sender = None;
    }

    fn poll_events(&mut self) {
        pump(&mut self.event_loop, &mut self.app);
    }

    fn present(&mut self) {
        let Some(window) = &self.app.window else {
            return;
        };

        window.pre_present_notify();
        let size = window.inner_size();
        self.device.resize(size.width, size.height);
        self.device.present_frame();
        window.request_redraw();
    }

    fn should_close(&self) -> bool {
        self.app.close_requested
    }

    fn size(&self) -> (u32, u32) {
        self.app
            .window
            .as_ref()
            .map(|window| {
                let size = window.inner_size();
                (size.width, size.height)
            })
            .unwrap_or(self.app.fallback_size)
    }

    fn device(&self) -> Option<Rc<dyn GraphicsDevice>> {
        let device: Rc<dyn GraphicsDevice> = self.device.clone();
        Some(device)
    }
}

//=== SurfaceApp ==========================================================

/// Winit callback target for one surface.
///
/// # Fields
///
/// - `window`: Created lazily in `resumed()`, shared with the device's surface
/// - `sender`: Set between `register_callbacks` and `unregister_callbacks`
/// - `creation_error`: Reason the window could not be created, if any
struct SurfaceApp {
    window: Option<Arc<Window>>,
    attributes: WindowAttributes,
    sender: Option<Sender<PlatformEvent>>,
    close_requested: bool,
    creation_error: Option<String>,
    fallback_size: (u32, u32),
}

impl SurfaceApp {
    fn new(attributes: WindowAttributes, fallback_size: (u32, u32)) -> Self {
        Self {
            window: None,
            attributes,
            sender: None,
            close_requested: false,
            creation_error: None,
            fallback_size,
        }
    }

    fn forward(&self, event: PlatformEvent) {
        let Some(sender) = &self.sender else {
            trace!(target: "platform::input", "No callbacks registered, dropping {:?}", event);
            return;
        };
        if sender.send(event).is_err() {
            warn!(target: "platform::input", "Channel disconnected, dropping {:?}", event);
        }
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler for SurfaceApp {
    /// Called when app becomes active (startup or mobile resume).
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }

        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                window.request_redraw();
                self.window = Some(Arc::new(window));
            }
            Err(e) => {
                error!(target: "platform", "Window creation failed: {}", e);
                self.creation_error = Some(e.to_string());
                event_loop.exit();
            }
        }
    }

    /// Handles per-window events.
    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if matches!(event, WindowEvent::CloseRequested) {
            info!(target: "platform", "Window close requested");
            self.close_requested = true;
        }

        match event_mapper::map_window_event(&event) {
            Some(mapped) => self.forward(mapped),
            None => trace!(target: "platform::input", "Unmapped window event ignored"),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn app() -> SurfaceApp {
        SurfaceApp::new(WindowAttributes::default(), (320, 200))
    }

    #[test]
    fn forward_without_callbacks_is_noop() {
        let app = app();
        app.forward(PlatformEvent::CloseRequested);
    }

    #[test]
    fn forward_sends_to_registered_sender() {
        let (tx, rx) = unbounded();
        let mut app = app();
        app.sender = Some(tx);

        app.forward(PlatformEvent::Resized { width: 1, height: 2 });
        assert_eq!(rx.try_recv().ok(), Some(PlatformEvent::Resized { width: 1, height: 2 }));
    }

    #[test]
    fn forward_handles_disconnected_channel() {
        let (tx, rx) = unbounded();
        let mut app = app();
        app.sender = Some(tx);
        drop(rx);

        // Should not panic, just log warning
        app.forward(PlatformEvent::CloseRequested);
    }

    #[test]
    fn new_app_has_no_window() {
        let app = app();
        assert!(app.window.is_none(), "Window should be created lazily");
        assert!(!app.close_requested);
        assert_eq!(app.fallback_size, (320, 200));
    }
}
