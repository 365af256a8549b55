//=========================================================================
// Ember Engine — Library Root
//
// This crate defines the public API surface of the Ember engine.
//
// Responsibilities:
// - Expose the window/frame-loop facade (`Window`, `WindowBuilder`)
// - Expose scenes, input queries and GPU resources to applications
// - Keep the winit integration behind the `SurfaceBackend` contract
//
// Typical usage:
// ```no_run
// use ember_engine::prelude::*;
//
// struct Blank;
// impl Scene for Blank {
//     fn on_update(&mut self, _ctx: &mut SceneContext<'_>, _dt: f32) {}
// }
//
// fn main() -> Result<(), EngineError> {
//     WindowBuilder::new().build().run(&mut WinitBackend::new(), Blank)
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the platform-independent state: input, scenes, clock and
// the platform bridge contract.
//
// `gpu` holds the graphics device abstraction and the bindable resources.
//
pub mod config;
pub mod core;
pub mod error;
pub mod gpu;
pub mod platform;
pub mod prelude;
pub mod window;

//--- Internal Modules ----------------------------------------------------
//
// Scripted surfaces and recording scenes used by the unit tests.
//
#[cfg(test)]
mod testing;

//--- Public Exports ------------------------------------------------------

pub use config::{ClearColor, WindowConfig};
pub use error::EngineError;
pub use window::{Lifecycle, Window, WindowBuilder};
