//=========================================================================
// Clock
//=========================================================================
//
// Monotonic engine time. All reported times are seconds since the clock
// was started.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::{Duration, Instant};

//=== Clock ===============================================================

/// Monotonic timer anchored at engine start.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    started: Instant,
}

impl Clock {
    /// Starts a clock at the current instant.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Instant the clock was started.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Time since start.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Seconds since start.
    pub fn seconds(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_are_monotonic() {
        let clock = Clock::start();
        let a = clock.seconds();
        std::thread::sleep(Duration::from_millis(2));
        let b = clock.seconds();
        assert!(a >= 0.0);
        assert!(b > a);
    }

    #[test]
    fn copies_share_the_anchor() {
        let clock = Clock::start();
        let copy = clock;
        assert_eq!(clock.started(), copy.started());
    }
}
