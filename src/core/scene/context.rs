//=========================================================================
// Scene Context
//=========================================================================
//
// What a scene can see and request during its lifecycle hooks.
//
// The window owns a `FrameState` and lends it to the active scene through
// `SceneContext` for the duration of a single hook call.
//
// Each scene gets a fresh default camera: it is rebuilt right before every
// `on_start` and dropped when the window frees its device.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::transition_queue::TransitionQueue;
use super::Scene;
use crate::config::ClearColor;
use crate::core::input::{InputState, Keyboard, Mouse};
use crate::gpu::{Camera, Gfx};

//=== FrameState ==========================================================

/// Window state shared with scenes.
pub(crate) struct FrameState {
    pub(crate) input: InputState,
    pub(crate) gfx: Gfx,
    pub(crate) clear_color: ClearColor,
    pub(crate) transitions: TransitionQueue,
    pub(crate) quit_requested: bool,
    pub(crate) size: (u32, u32),
    pub(crate) frame: u64,
    pub(crate) camera: Option<Camera>,
}

impl FrameState {
    pub(crate) fn new(gfx: Gfx, clear_color: ClearColor, size: (u32, u32)) -> Self {
        Self {
            input: InputState::new(),
            gfx,
            clear_color,
            transitions: TransitionQueue::new(),
            quit_requested: false,
            size,
            frame: 0,
            camera: None,
        }
    }

    /// Replaces the default camera with one at the origin.
    pub(crate) fn reset_camera(&mut self) {
        self.camera = Some(Camera::new(&self.gfx));
    }
}

//=== SceneContext ========================================================

/// Access to input, time, the graphics device and window requests.
pub struct SceneContext<'a> {
    state: &'a mut FrameState,
}

impl<'a> SceneContext<'a> {
    pub(crate) fn new(state: &'a mut FrameState) -> Self {
        Self { state }
    }

    //--- Input ------------------------------------------------------------

    pub fn keyboard(&self) -> &Keyboard {
        self.state.input.keyboard()
    }

    pub fn mouse(&self) -> &Mouse {
        self.state.input.mouse()
    }

    pub fn input(&self) -> &InputState {
        &self.state.input
    }

    //--- Time & Graphics --------------------------------------------------

    /// Seconds since the window's clock started.
    pub fn time(&self) -> f32 {
        self.state.gfx.seconds()
    }

    /// Number of frames presented so far.
    pub fn frame(&self) -> u64 {
        self.state.frame
    }

    /// Graphics handle for constructing resources.
    pub fn gfx(&self) -> &Gfx {
        &self.state.gfx
    }

    /// The scene's default camera, at the origin when the scene starts.
    pub fn camera(&mut self) -> &mut Camera {
        let gfx = &self.state.gfx;
        self.state.camera.get_or_insert_with(|| Camera::new(gfx))
    }

    /// Drawable size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.state.size
    }

    pub fn clear_color(&self) -> ClearColor {
        self.state.clear_color
    }

    /// Sets the color the next frame is cleared to. Channels are clamped to `[0, 1]`.
    pub fn set_clear_color(&mut self, color: impl Into<ClearColor>) {
        self.state.clear_color = color.into().clamped();
    }

    //--- Requests ---------------------------------------------------------

    /// Replaces the active scene at the end of this frame.
    ///
    /// The current hook runs to completion first. If several requests are
    /// made in the same frame, the last one is applied.
    pub fn go_to(&mut self, next: impl Scene + 'static) {
        self.state.transitions.push(Box::new(next));
    }

    /// Stops the frame loop once the current frame has been presented.
    pub fn quit(&mut self) {
        self.state.quit_requested = true;
    }

    pub fn is_quitting(&self) -> bool {
        self.state.quit_requested
    }

    pub fn has_pending_transition(&self) -> bool {
        self.state.transitions.is_pending()
    }

    pub(crate) fn reset_camera(&mut self) {
        self.state.reset_camera();
    }

    pub(crate) fn discard_pending_transition(&mut self) -> bool {
        self.state.transitions.clear()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{InputEvent, KeyCode};
    use crate::core::Clock;

    struct Idle;

    impl Scene for Idle {
        fn on_update(&mut self, _ctx: &mut SceneContext<'_>, _dt: f32) {}
    }

    fn state() -> FrameState {
        FrameState::new(Gfx::detached(Clock::start()), ClearColor::WHITE, (800, 600))
    }

    #[test]
    fn reads_input_snapshot() {
        let mut state = state();
        state.input.apply(InputEvent::KeyDown(KeyCode::Space));

        let ctx = SceneContext::new(&mut state);
        assert!(ctx.keyboard().was_pressed(KeyCode::Space));
        assert!(!ctx.mouse().is_pressed(crate::core::input::Button::Any));
        assert_eq!(ctx.size(), (800, 600));
    }

    #[test]
    fn clear_color_is_clamped() {
        let mut state = state();
        let mut ctx = SceneContext::new(&mut state);
        ctx.set_clear_color([2.0, 0.5, -1.0, 1.0]);
        assert_eq!(ctx.clear_color(), ClearColor::rgba(1.0, 0.5, 0.0, 1.0));
    }

    #[test]
    fn camera_is_created_on_demand_and_reset() {
        let mut state = state();
        assert!(state.camera.is_none());

        SceneContext::new(&mut state).camera().translate(5.0, 0.0);
        assert_eq!(SceneContext::new(&mut state).camera().position().x, 5.0);

        state.reset_camera();
        assert_eq!(SceneContext::new(&mut state).camera().position().x, 0.0);
    }

    #[test]
    fn requests_are_recorded() {
        let mut state = state();
        {
            let mut ctx = SceneContext::new(&mut state);
            ctx.go_to(Idle);
            ctx.quit();
            assert!(ctx.has_pending_transition());
            assert!(ctx.is_quitting());
        }
        assert!(state.quit_requested);
        assert!(state.transitions.is_pending());
    }
}
