//=========================================================================
// Scene Manager
//=========================================================================
//
// Owns the active scene and enforces its lifecycle.
//
// Replacement takes the outgoing slot out before calling `on_end`, so no
// scene is active while the old one tears down. Every start hands the new
// scene a fresh default camera.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{Scene, SceneContext};

//=== SceneState ==========================================================

/// Lifecycle position of a scene instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Uninitialized,
    Started,
    Ended,
}

//=== SceneSlot ===========================================================

struct SceneSlot {
    scene: Box<dyn Scene>,
    state: SceneState,
}

impl SceneSlot {
    fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            state: SceneState::Uninitialized,
        }
    }

    fn start(&mut self, ctx: &mut SceneContext<'_>) {
        if self.state != SceneState::Uninitialized {
            warn!(target: "scene", "Scene {} cannot be started twice", self.scene.name());
            return;
        }
        ctx.reset_camera();
        self.scene.on_start(ctx);
        self.state = SceneState::Started;
    }

    fn end(&mut self, ctx: &mut SceneContext<'_>) {
        if self.state != SceneState::Started {
            return;
        }
        self.scene.on_end(ctx);
        self.state = SceneState::Ended;
    }
}

//=== Scene Manager =======================================================

/// Holds at most one active scene.
pub(crate) struct SceneManager {
    active: Option<SceneSlot>,
    transitions: u64,
}

impl SceneManager {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new() -> Self {
        Self {
            active: None,
            transitions: 0,
        }
    }

    //--- Transitions ------------------------------------------------------

    /// Ends the active scene, if any, then starts `next`.
    ///
    /// Requests queued by the outgoing scene's `on_end` are discarded.
    pub(crate) fn go_to(&mut self, next: Box<dyn Scene>, ctx: &mut SceneContext<'_>) {
        match self.end_active(ctx) {
            Some(previous) => debug!(target: "scene", "Transition {} -> {}", previous, next.name()),
            None => debug!(target: "scene", "Starting scene {}", next.name()),
        }

        let mut slot = SceneSlot::new(next);
        slot.start(ctx);
        self.active = Some(slot);
        self.transitions += 1;
    }

    /// Ends and drops the active scene. Returns its name.
    pub(crate) fn end_active(&mut self, ctx: &mut SceneContext<'_>) -> Option<&'static str> {
        let mut slot = self.active.take()?;
        slot.end(ctx);
        if ctx.discard_pending_transition() {
            warn!(
                target: "scene",
                "Ignoring transition requested while {} was ending",
                slot.scene.name()
            );
        }
        Some(slot.scene.name())
    }

    //--- Update Loop ------------------------------------------------------

    /// Updates the active scene. Returns `false` if nothing was updated.
    pub(crate) fn update(&mut self, ctx: &mut SceneContext<'_>, dt: f32) -> bool {
        match self.active.as_mut() {
            Some(slot) if slot.state == SceneState::Started => {
                slot.scene.on_update(ctx, dt);
                true
            }
            _ => false,
        }
    }

    //--- Accessors --------------------------------------------------------

    pub(crate) fn active_name(&self) -> Option<&'static str> {
        self.active.as_ref().map(|slot| slot.scene.name())
    }

    pub(crate) fn state(&self) -> Option<SceneState> {
        self.active.as_ref().map(|slot| slot.state)
    }

    pub(crate) fn transitions(&self) -> u64 {
        self.transitions
    }
}

//=== Tests ===============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClearColor;
    use crate::core::scene::FrameState;
    use crate::core::Clock;
    use crate::gpu::{DeviceCall, Gfx, GpuResource, HeadlessDevice};
    use crate::testing::{EventLog, RecordingScene};
    use std::rc::Rc;

    fn state() -> FrameState {
        FrameState::new(Gfx::detached(Clock::start()), ClearColor::WHITE, (64, 64))
    }

    #[test]
    fn empty_manager_does_not_update() {
        let mut manager = SceneManager::new();
        let mut state = state();
        let mut ctx = SceneContext::new(&mut state);

        assert!(!manager.update(&mut ctx, 0.016));
        assert!(manager.state().is_none());
        assert!(manager.end_active(&mut ctx).is_none());
    }

    #[test]
    fn go_to_starts_scene() {
        let log = EventLog::default();
        let mut manager = SceneManager::new();
        let mut state = state();
        let mut ctx = SceneContext::new(&mut state);

        manager.go_to(Box::new(RecordingScene::new("a", &log)), &mut ctx);

        assert_eq!(manager.state(), Some(SceneState::Started));
        assert_eq!(manager.active_name(), Some("a"));
        assert_eq!(log.entries(), ["a:start"]);
    }

    #[test]
    fn replacement_ends_before_start() {
        let log = EventLog::default();
        let mut manager = SceneManager::new();
        let mut state = state();
        let mut ctx = SceneContext::new(&mut state);

        manager.go_to(Box::new(RecordingScene::new("a", &log)), &mut ctx);
        manager.update(&mut ctx, 0.5);
        manager.go_to(Box::new(RecordingScene::new("b", &log)), &mut ctx);
        manager.update(&mut ctx, 0.25);

        assert_eq!(log.entries(), ["a:start", "a:update", "a:end", "b:start", "b:update"]);
        assert_eq!(log.deltas(), [0.5, 0.25]);
        assert_eq!(manager.transitions(), 2);
    }

    #[test]
    fn end_active_leaves_no_scene() {
        let log = EventLog::default();
        let mut manager = SceneManager::new();
        let mut state = state();
        let mut ctx = SceneContext::new(&mut state);

        manager.go_to(Box::new(RecordingScene::new("a", &log)), &mut ctx);
        assert_eq!(manager.end_active(&mut ctx), Some("a"));
        assert!(!manager.update(&mut ctx, 0.1));
        assert_eq!(log.entries(), ["a:start", "a:end"]);
    }

    #[test]
    fn request_from_on_end_is_discarded() {
        let log = EventLog::default();
        let mut manager = SceneManager::new();
        let mut state = state();
        let mut ctx = SceneContext::new(&mut state);

        let inner = log.clone();
        let a = RecordingScene::new("a", &log)
            .on_end_do(move |ctx| ctx.go_to(RecordingScene::new("c", &inner)));
        manager.go_to(Box::new(a), &mut ctx);
        manager.go_to(Box::new(RecordingScene::new("b", &log)), &mut ctx);

        assert!(!ctx.has_pending_transition());
        assert_eq!(manager.active_name(), Some("b"));
    }

    #[test]
    fn each_start_gets_a_fresh_camera() {
        let log = EventLog::default();
        let mut manager = SceneManager::new();
        let mut state = state();
        let mut ctx = SceneContext::new(&mut state);

        let mover = |name: &'static str, log: &EventLog| {
            let inner = log.clone();
            RecordingScene::new(name, log).on_start_do(move |ctx| {
                let camera = ctx.camera();
                inner.push(format!("x={}", camera.position().x));
                camera.translate(10.0, 0.0);
            })
        };

        manager.go_to(Box::new(mover("a", &log)), &mut ctx);
        manager.go_to(Box::new(mover("b", &log)), &mut ctx);

        assert_eq!(log.entries(), ["a:start", "x=0", "a:end", "b:start", "x=0"]);
        assert_eq!(ctx.camera().position().x, 10.0);
    }

    #[test]
    fn restart_rebuilds_camera_program() {
        let device = Rc::new(HeadlessDevice::new());
        let mut state = FrameState::new(
            Gfx::attached(device.clone(), Clock::start()),
            ClearColor::WHITE,
            (64, 64),
        );
        let log = EventLog::default();
        let mut manager = SceneManager::new();
        let mut ctx = SceneContext::new(&mut state);

        manager.go_to(Box::new(RecordingScene::new("a", &log)), &mut ctx);
        let first = ctx.camera().handle();
        manager.go_to(Box::new(RecordingScene::new("b", &log)), &mut ctx);
        let second = ctx.camera().handle();

        assert_ne!(first, second);
        assert_eq!(device.count(|c| matches!(c, DeviceCall::CreateProgram(_))), 2);
        assert!(device.calls().contains(&DeviceCall::DeleteProgram(first)));
        assert_eq!(device.live_programs(), 1);
    }
}
