//! Periodic tick source.
//!
//! The board's timer interrupt increments a counter at a fixed rate; the
//! session reads it to bound the handshake and to report uptime.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

pub trait TickSource {
    /// Ticks since start. Wraps on overflow.
    fn now(&self) -> u32;
}

/// Tick counter shared between the timer interrupt and the main loop.
#[derive(Debug, Clone, Default)]
pub struct TickCounter {
    ticks: Arc<AtomicU32>,
}

impl TickCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called from the timer interrupt.
    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

impl TickSource for TickCounter {
    fn now(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }
}

/// Ticks elapsed from `since` to `now`, tolerant of wraparound.
#[must_use]
pub const fn elapsed(since: u32, now: u32) -> u32 {
    now.wrapping_sub(since)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_shared_between_clones() {
        let isr = TickCounter::new();
        let main = isr.clone();
        for _ in 0..3 {
            isr.tick();
        }
        assert_eq!(main.now(), 3);
    }

    #[test]
    fn elapsed_survives_wraparound() {
        assert_eq!(elapsed(u32::MAX - 1, 3), 5);
        assert_eq!(elapsed(10, 10), 0);
    }
}
