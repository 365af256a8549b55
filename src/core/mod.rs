//=========================================================================
// Core Systems
//
// Platform-independent engine state driven by the frame loop.
//
// Responsibilities:
// - Track keyboard and mouse state with per-frame edge detection
// - Own the active scene and its lifecycle
// - Define the contract the native windowing layer implements
// - Provide the engine clock
//
// Notes:
// Nothing in here touches the native window directly. Device events
// arrive through the platform bridge queue and are applied to input
// state once per frame, right after the surface has been polled.
//
//=========================================================================

//=== Module Declarations =================================================

mod clock;
pub mod input;
pub mod platform_bridge;
pub mod scene;

//=== Public API ==========================================================

pub use clock::Clock;
