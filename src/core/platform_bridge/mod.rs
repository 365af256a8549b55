//=========================================================================
// Platform Bridge
//=========================================================================
//
// Bridges the native windowing layer with the frame loop.
//
// This module defines the contract between platform implementations and
// core logic, so the winit backend can be swapped for a scripted one in
// tests without touching the loop.
//
// Components:
// - `interface`: Surface/backend traits, events and errors (the contract)
// - `event_collector`: Per-frame draining of the device event queue
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod event_collector;
pub mod interface;

//=== Public API ==========================================================

pub(crate) use event_collector::{EventCollector, TickControl};
pub use interface::{PlatformError, PlatformEvent, Surface, SurfaceBackend};
