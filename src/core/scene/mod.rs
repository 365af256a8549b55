//=========================================================================
// Scene System
//=========================================================================
//
// Manages the lifecycle of the single active scene.
//
// Architecture:
//   SceneManager
//     └─ active: Option<SceneSlot { scene: Box<dyn Scene>, state }>
//
// Lifecycle:
//   Uninitialized ──on_start──► Started ──on_end──► Ended
//
// Flow:
//   frame → SceneManager::update() → Scene::on_update()
//         → (boundary) TransitionQueue::take() → SceneManager::go_to()
//
//=========================================================================

//=== Module Declarations =================================================

mod context;
mod scene_manager;
mod transition_queue;

//=== Public API ==========================================================

pub use context::SceneContext;
pub use scene_manager::SceneState;

pub(crate) use context::FrameState;
pub(crate) use scene_manager::SceneManager;

//=== Scene Trait =========================================================

/// Defines scene behavior with lifecycle hooks and update logic.
///
/// Exactly one scene is active at a time. A scene instance is started at
/// most once and never updated after it has ended.
///
/// # Minimal Implementation
///
/// Only `on_update()` is required:
///
/// ```rust
/// # use ember_engine::prelude::*;
/// struct Blank;
///
/// impl Scene for Blank {
///     fn on_update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) {
///         if ctx.keyboard().was_pressed(KeyCode::Escape) {
///             ctx.quit();
///         }
///     }
/// }
/// ```
pub trait Scene {
    /// Called once when the scene becomes active.
    ///
    /// Default implementation does nothing. Override to create GPU
    /// resources through `ctx.gfx()`.
    fn on_start(&mut self, _ctx: &mut SceneContext<'_>) {}

    /// Called every frame after the first while the scene is active.
    ///
    /// `dt` is the duration of the previous frame in seconds.
    fn on_update(&mut self, ctx: &mut SceneContext<'_>, dt: f32);

    /// Called once when the scene is replaced or the window is freed.
    fn on_end(&mut self, _ctx: &mut SceneContext<'_>) {}

    /// Name used in log output.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
