//=========================================================================
// Event Collector
//=========================================================================
//
// Device event queue drained exactly once per frame, right after the
// surface has been polled.
//
// Architecture:
//   Surface::poll_events() → Sender<PlatformEvent> → collect_frame()
//     ├─ Input     → InputState::apply()
//     ├─ Resized   → logged
//     └─ CloseRequested → TickControl::Exit
//
// Bounded draining prevents a runaway producer from stalling the frame.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::PlatformEvent;
use crate::core::input::InputState;

//=== TickControl =========================================================

/// Frame loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== EventCollector ======================================================

/// Owns both ends of the device event queue.
pub(crate) struct EventCollector {
    sender: Sender<PlatformEvent>,
    receiver: Receiver<PlatformEvent>,
}

impl EventCollector {
    const MAX_EVENTS_PER_FRAME: usize = 1024;

    pub(crate) fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Producer end handed to the surface.
    pub(crate) fn sender(&self) -> Sender<PlatformEvent> {
        self.sender.clone()
    }

    /// Applies every queued event to `input`.
    pub(crate) fn collect_frame(&mut self, input: &mut InputState) -> TickControl {
        let mut control = TickControl::Continue;
        let mut drained = 0;

        while drained < Self::MAX_EVENTS_PER_FRAME {
            match self.receiver.try_recv() {
                Ok(event) => {
                    drained += 1;
                    if Self::handle_event(event, input) == TickControl::Exit {
                        control = TickControl::Exit;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if drained >= Self::MAX_EVENTS_PER_FRAME {
            warn!(target: "input", "Event queue backlog: drained {} events this frame", drained);
        }

        control
    }

    /// Drops everything still queued.
    pub(crate) fn discard_pending(&mut self) -> usize {
        self.receiver.try_iter().count()
    }

    fn handle_event(event: PlatformEvent, input: &mut InputState) -> TickControl {
        match event {
            PlatformEvent::Input(event) => {
                input.apply(event);
                TickControl::Continue
            }
            PlatformEvent::Resized { width, height } => {
                debug!(target: "window", "Surface resized to {}x{}", width, height);
                TickControl::Continue
            }
            PlatformEvent::CloseRequested => {
                info!(target: "window", "Window close requested");
                TickControl::Exit
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
