//! Receive-side flow control for the console link.
//!
//! The console ring asserts RTS when it is nearly full and releases it once
//! the main loop has drained it well below that point. The gap between the
//! two thresholds keeps RTS from chattering while the ring hovers around a
//! single level.

use crate::hardware::Level;

/// Transition of the pause gate, reported by the ring half that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowSignal {
    Pause,
    Resume,
}

impl FlowSignal {
    /// RTS level that communicates this signal to the host.
    #[must_use]
    pub const fn rts_level(self) -> Level {
        match self {
            Self::Pause => Level::High,
            Self::Resume => Level::Low,
        }
    }
}

/// Free-slot thresholds for pausing and resuming the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermarks {
    /// Pause once fewer than this many slots are free.
    pub pause_below: usize,
    /// Resume once more than this many slots are free.
    pub resume_above: usize,
}

impl Watermarks {
    /// Pause below a quarter free, resume above half free.
    #[must_use]
    pub const fn for_capacity(capacity: usize) -> Self {
        Self {
            pause_below: capacity / 4,
            resume_above: capacity / 2,
        }
    }

    /// Decision after the producer stored a unit.
    #[must_use]
    pub const fn on_produce(self, paused: bool, free: usize) -> Option<FlowSignal> {
        if !paused && free < self.pause_below {
            Some(FlowSignal::Pause)
        } else {
            None
        }
    }

    /// Decision after the consumer removed a unit.
    #[must_use]
    pub const fn on_consume(self, paused: bool, free: usize) -> Option<FlowSignal> {
        if paused && free > self.resume_above {
            Some(FlowSignal::Resume)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_for_console_ring() {
        let marks = Watermarks::for_capacity(256);
        assert_eq!(marks.pause_below, 64);
        assert_eq!(marks.resume_above, 128);
    }

    #[test]
    fn pause_only_below_quarter() {
        let marks = Watermarks::for_capacity(256);
        assert_eq!(marks.on_produce(false, 64), None);
        assert_eq!(marks.on_produce(false, 63), Some(FlowSignal::Pause));
        assert_eq!(marks.on_produce(true, 10), None);
    }

    #[test]
    fn resume_only_above_half() {
        let marks = Watermarks::for_capacity(256);
        assert_eq!(marks.on_consume(true, 100), None);
        assert_eq!(marks.on_consume(true, 128), None);
        assert_eq!(marks.on_consume(true, 129), Some(FlowSignal::Resume));
        assert_eq!(marks.on_consume(false, 200), None);
    }

    #[test]
    fn rts_levels() {
        assert_eq!(FlowSignal::Pause.rts_level(), Level::High);
        assert_eq!(FlowSignal::Resume.rts_level(), Level::Low);
    }
}
