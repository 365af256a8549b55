//=========================================================================
// Ember Window
//
// Engine context owning the native surface, input, the active scene and
// the frame loop.
//
// Architecture:
// ```text
//     WindowBuilder  ──build()──>  Window  ──init(backend, scene)──>  [Initialized]
//         │                          │
//         ├─ with_title()            ├─ run_loop()  blocks until close
//         ├─ with_size()             └─ free()      idempotent teardown
//         ├─ with_clear_color()
//         └─ with_vsync()
// ```
//
// Frame order:
//   poll → drain events → clear → update (skipped on the first frame)
//   → commit input → present → measure dt → apply scene transition
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::Instant;

use log::{debug, error, info, trace, warn};

//=== Internal Dependencies ===============================================

use crate::config::{ClearColor, WindowConfig};
use crate::core::input::InputState;
use crate::core::platform_bridge::{EventCollector, Surface, SurfaceBackend, TickControl};
use crate::core::scene::{FrameState, Scene, SceneContext, SceneManager, SceneState};
use crate::core::Clock;
use crate::error::EngineError;
use crate::gpu::Gfx;

//=== WindowBuilder =======================================================

/// Builder for configuring and constructing a [`Window`].
///
/// # Default Values
///
/// - **Title**: "Ember"
/// - **Size**: 1920 x 1080
/// - **Clear color**: white
/// - **VSync**: on
///
/// # Examples
///
/// ```no_run
/// use ember_engine::prelude::*;
///
/// struct Blank;
/// impl Scene for Blank {
///     fn on_update(&mut self, _ctx: &mut SceneContext<'_>, _dt: f32) {}
/// }
///
/// WindowBuilder::new()
///     .with_title("Editor")
///     .with_size(1280, 720)
///     .with_clear_color(ClearColor::BLACK)
///     .build()
///     .run(&mut WinitBackend::new(), Blank)
///     .expect("window failed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct WindowBuilder {
    config: WindowConfig,
}

impl WindowBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Sets the surface size in physical pixels.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "Window size must be positive, got {}x{}", width, height);
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Sets the color each frame is cleared to.
    ///
    /// # Panics
    ///
    /// Panics if a channel lies outside `[0, 1]`.
    pub fn with_clear_color(mut self, color: impl Into<ClearColor>) -> Self {
        let color = color.into();
        assert!(color.is_normalized(), "Clear color channels must be in [0, 1], got {:?}", color);
        self.config.clear_color = color;
        self
    }

    /// Whether present waits for vertical sync.
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.config.vsync = vsync;
        self
    }

    pub fn build(self) -> Window {
        info!(
            target: "window",
            "Building window '{}' ({}x{}, vsync: {})",
            self.config.title, self.config.width, self.config.height, self.config.vsync
        );
        Window::new(self.config)
    }
}

//=== Lifecycle ===========================================================

/// Window lifecycle. Strictly `Created → Initialized → Freed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Initialized,
    Freed,
}

//=== Window ==============================================================

/// Engine context and frame loop.
///
/// Passed around by `&mut`. Scenes never see the window itself, only a
/// [`SceneContext`] lent for the duration of a hook.
pub struct Window {
    config: WindowConfig,
    lifecycle: Lifecycle,
    surface: Option<Box<dyn Surface>>,
    events: EventCollector,
    frame: FrameState,
    scenes: SceneManager,
    clock: Clock,
    close_requested: bool,
}

impl Window {
    //--- Construction -----------------------------------------------------

    pub fn new(config: WindowConfig) -> Self {
        let clock = Clock::start();
        let frame = FrameState::new(
            Gfx::detached(clock),
            config.clear_color,
            (config.width, config.height),
        );

        Self {
            config,
            lifecycle: Lifecycle::Created,
            surface: None,
            events: EventCollector::new(),
            frame,
            scenes: SceneManager::new(),
            clock,
            close_requested: false,
        }
    }

    //--- Lifecycle --------------------------------------------------------

    /// Creates the surface, routes its device events into the window and
    /// starts `scene`.
    ///
    /// A backend failure leaves the window in the `Created` state with
    /// nothing allocated.
    pub fn init(
        &mut self,
        backend: &mut dyn SurfaceBackend,
        scene: impl Scene + 'static,
    ) -> Result<(), EngineError> {
        if self.lifecycle != Lifecycle::Created {
            warn!(target: "window", "init called on a window in state {:?}", self.lifecycle);
            return Err(EngineError::AlreadyInitialized);
        }

        info!(target: "window", "Initializing window '{}'", self.config.title);

        let mut surface = backend.create_surface(&self.config).map_err(|e| {
            error!(target: "platform", "Surface creation failed: {}", e);
            EngineError::Platform(e)
        })?;

        surface.register_callbacks(self.events.sender());
        self.frame.size = surface.size();

        match surface.device() {
            Some(device) => self.frame.gfx.attach(device),
            None => warn!(target: "gpu", "Surface has no graphics device, resources stay unallocated"),
        }

        self.surface = Some(surface);
        self.lifecycle = Lifecycle::Initialized;
        info!(target: "window", "Window initialized ({}x{})", self.frame.size.0, self.frame.size.1);

        self.start_scene(Box::new(scene));
        Ok(())
    }

    /// Runs frames until a quit request or a close signal is observed.
    pub fn run_loop(&mut self) -> Result<(), EngineError> {
        if self.lifecycle != Lifecycle::Initialized {
            return Err(EngineError::NotInitialized);
        }
        let mut surface = self.surface.take().ok_or(EngineError::NotInitialized)?;

        info!(target: "window", "Entering frame loop");
        let mut last = Instant::now();
        let mut dt: Option<f32> = None;

        while !self.should_close(surface.as_ref()) {
            self.run_frame(surface.as_mut(), dt);

            let now = Instant::now();
            dt = Some(now.duration_since(last).as_secs_f32());
            last = now;

            if let Some(next) = self.frame.transitions.take() {
                self.start_scene(next);
            }
            if self.frame.quit_requested {
                self.close_requested = true;
            }
        }

        info!(target: "window", "Frame loop exited after {} frames", self.frame.frame);
        self.surface = Some(surface);
        Ok(())
    }

    /// `init`, `run_loop` and `free` in sequence.
    ///
    /// The window is freed even if initialization or the loop fails.
    pub fn run(
        &mut self,
        backend: &mut dyn SurfaceBackend,
        scene: impl Scene + 'static,
    ) -> Result<(), EngineError> {
        let result = self.init(backend, scene).and_then(|()| self.run_loop());
        self.free();
        result
    }

    /// Ends the active scene, unregisters device callbacks and releases
    /// the surface. Safe to call at any point, any number of times.
    pub fn free(&mut self) {
        if self.lifecycle == Lifecycle::Freed {
            debug!(target: "window", "free called on an already freed window");
            return;
        }

        {
            let mut ctx = SceneContext::new(&mut self.frame);
            if let Some(name) = self.scenes.end_active(&mut ctx) {
                debug!(target: "scene", "Ended scene {}", name);
            }
        }

        // Releases the default camera's program, then silences every
        // resource the scenes still hold
        self.frame.camera = None;
        if self.frame.gfx.detach() {
            debug!(target: "gpu", "Graphics device detached");
        }

        if let Some(mut surface) = self.surface.take() {
            surface.unregister_callbacks();
            let dropped = self.events.discard_pending();
            if dropped > 0 {
                trace!(target: "window", "Discarded {} undelivered events", dropped);
            }
        }
        self.lifecycle = Lifecycle::Freed;
        info!(target: "window", "Window freed");
    }

    //--- Control ----------------------------------------------------------

    /// Replaces the active scene immediately.
    ///
    /// From inside a frame, use [`SceneContext::go_to`] instead.
    pub fn go_to(&mut self, scene: impl Scene + 'static) -> Result<(), EngineError> {
        if self.lifecycle != Lifecycle::Initialized {
            return Err(EngineError::NotInitialized);
        }
        self.start_scene(Box::new(scene));
        Ok(())
    }

    /// Stops the loop after the current frame has been presented.
    pub fn quit(&mut self) {
        self.frame.quit_requested = true;
    }

    //--- Accessors --------------------------------------------------------

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Graphics handle, attached between `init` and `free`.
    pub fn gfx(&self) -> &Gfx {
        &self.frame.gfx
    }

    pub fn input(&self) -> &InputState {
        &self.frame.input
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn clear_color(&self) -> ClearColor {
        self.frame.clear_color
    }

    pub fn set_clear_color(&mut self, color: impl Into<ClearColor>) {
        self.frame.clear_color = color.into().clamped();
    }

    /// Drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.frame.size
    }

    /// Frames presented so far.
    pub fn frame_count(&self) -> u64 {
        self.frame.frame
    }

    pub fn active_scene(&self) -> Option<&'static str> {
        self.scenes.active_name()
    }

    pub fn scene_state(&self) -> Option<SceneState> {
        self.scenes.state()
    }

    //--- Internal Helpers -------------------------------------------------

    fn should_close(&self, surface: &dyn Surface) -> bool {
        self.close_requested || self.frame.quit_requested || surface.should_close()
    }

    fn run_frame(&mut self, surface: &mut dyn Surface, dt: Option<f32>) {
        //--- 1. Poll and drain device events -----------------------------
        surface.poll_events();
        if self.events.collect_frame(&mut self.frame.input) == TickControl::Exit {
            self.close_requested = true;
        }
        self.frame.size = surface.size();

        //--- 2. Clear -----------------------------------------------------
        if let Some(device) = self.frame.gfx.device() {
            device.clear(self.frame.clear_color.to_array());
        }

        //--- 3. Update (no delta exists on the first frame) ---------------
        if let Some(dt) = dt {
            let mut ctx = SceneContext::new(&mut self.frame);
            self.scenes.update(&mut ctx, dt);
        }

        //--- 4. Commit input history --------------------------------------
        self.frame.input.commit();

        //--- 5. Present ---------------------------------------------------
        surface.present();
        self.frame.frame += 1;
        trace!(target: "window", "Presented frame {}", self.frame.frame);
    }

    fn start_scene(&mut self, scene: Box<dyn Scene>) {
        let mut ctx = SceneContext::new(&mut self.frame);
        self.scenes.go_to(scene, &mut ctx);
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.lifecycle == Lifecycle::Initialized {
            self.free();
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
