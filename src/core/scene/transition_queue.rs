//=========================================================================
// Transition Queue
//=========================================================================
//
// Holds the scene replacement requested during a frame.
//
// Scenes queue transitions here from `on_update`. The window applies the
// request at the iteration boundary, after present. Only one request is
// kept per frame: a later request replaces an earlier one.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::warn;

//=== Internal Dependencies ===============================================

use super::Scene;

//=== Transition Queue ====================================================

/// Pending scene replacement for the current frame.
#[derive(Default)]
pub(crate) struct TransitionQueue {
    pending: Option<Box<dyn Scene>>,
}

impl TransitionQueue {
    pub(crate) fn new() -> Self {
        Self { pending: None }
    }

    /// Queues `next`, replacing any request made earlier in the frame.
    pub(crate) fn push(&mut self, next: Box<dyn Scene>) {
        if let Some(previous) = self.pending.replace(next) {
            warn!(
                target: "scene",
                "Transition to {} superseded by a later request this frame",
                previous.name()
            );
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the queued request, leaving the queue empty.
    pub(crate) fn take(&mut self) -> Option<Box<dyn Scene>> {
        self.pending.take()
    }

    /// Drops the queued request. Returns whether one existed.
    pub(crate) fn clear(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
