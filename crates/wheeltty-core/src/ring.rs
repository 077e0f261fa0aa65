//! Single-producer / single-consumer receive ring.
//!
//! The [`Producer`] half belongs to the receive interrupt, the [`Consumer`]
//! half to the main loop. Indices are free-running counters; a slot is
//! `index & mask`. The producer never blocks: when the ring is full it
//! overwrites the oldest unit, counts an overrun, and the consumer skips
//! forward to the oldest unit that is still intact.
//!
//! When built with [`Watermarks`], the ring also owns the pause gate and
//! reports [`FlowSignal`] transitions from whichever half crossed a
//! threshold.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicUsize, Ordering};

use crate::flow_control::{FlowSignal, Watermarks};

pub const MIN_CAPACITY: usize = 4;
pub const MAX_CAPACITY: usize = 1024;

/// A validated ring capacity: a power of two in
/// `MIN_CAPACITY..=MAX_CAPACITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capacity(usize);

impl Capacity {
    #[must_use]
    pub const fn new(slots: usize) -> Option<Self> {
        if slots.is_power_of_two() && slots >= MIN_CAPACITY && slots <= MAX_CAPACITY {
            Some(Self(slots))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Shared {
    slots: Box<[AtomicU16]>,
    mask: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
    overruns: AtomicU32,
    paused: AtomicBool,
    watermarks: Option<Watermarks>,
}

impl Shared {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn len_between(&self, head: usize, tail: usize) -> usize {
        head.wrapping_sub(tail).min(self.capacity())
    }

    fn free_between(&self, head: usize, tail: usize) -> usize {
        self.capacity() - self.len_between(head, tail)
    }

    fn set_paused(&self, from: bool, to: bool) -> bool {
        self.paused
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Create a ring and split it into its two halves.
#[must_use]
pub fn ring(capacity: Capacity, watermarks: Option<Watermarks>) -> (Producer, Consumer) {
    let slots: Box<[AtomicU16]> = (0..capacity.get()).map(|_| AtomicU16::new(0)).collect();
    let shared = Arc::new(Shared {
        mask: capacity.get() - 1,
        slots,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
        overruns: AtomicU32::new(0),
        paused: AtomicBool::new(false),
        watermarks,
    });
    (
        Producer {
            shared: Arc::clone(&shared),
        },
        Consumer { shared },
    )
}

/// Interrupt-side half.
#[derive(Debug)]
pub struct Producer {
    shared: Arc<Shared>,
}

impl Producer {
    /// Store one received unit. Returns [`FlowSignal::Pause`] when this push
    /// crossed the pause threshold.
    pub fn push(&self, unit: u16) -> Option<FlowSignal> {
        let s = &*self.shared;
        let head = s.head.load(Ordering::Relaxed);
        let tail = s.tail.load(Ordering::Acquire);
        if head.wrapping_sub(tail) >= s.capacity() {
            s.overruns.fetch_add(1, Ordering::Relaxed);
        }
        s.slots[head & s.mask].store(unit, Ordering::Relaxed);
        let head = head.wrapping_add(1);
        s.head.store(head, Ordering::Release);

        let marks = s.watermarks?;
        let free = s.free_between(head, tail);
        match marks.on_produce(s.paused.load(Ordering::Acquire), free) {
            Some(FlowSignal::Pause) if s.set_paused(false, true) => Some(FlowSignal::Pause),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn free(&self) -> usize {
        let s = &*self.shared;
        s.free_between(s.head.load(Ordering::Relaxed), s.tail.load(Ordering::Acquire))
    }
}

/// One unit taken from the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    pub unit: u16,
    /// [`FlowSignal::Resume`] when this pop released the pause gate.
    pub flow: Option<FlowSignal>,
}

/// Main-loop half.
#[derive(Debug)]
pub struct Consumer {
    shared: Arc<Shared>,
}

impl Consumer {
    #[must_use]
    pub fn available(&self) -> bool {
        let s = &*self.shared;
        s.head.load(Ordering::Acquire) != s.tail.load(Ordering::Relaxed)
    }

    pub fn pop(&self) -> Option<Received> {
        let s = &*self.shared;
        let head = s.head.load(Ordering::Acquire);
        let mut tail = s.tail.load(Ordering::Relaxed);
        if head == tail {
            return None;
        }
        if head.wrapping_sub(tail) > s.capacity() {
            tail = head.wrapping_sub(s.capacity());
        }
        let unit = s.slots[tail & s.mask].load(Ordering::Relaxed);
        let tail = tail.wrapping_add(1);
        s.tail.store(tail, Ordering::Release);

        let flow = s.watermarks.and_then(|marks| {
            let free = s.free_between(s.head.load(Ordering::Acquire), tail);
            match marks.on_consume(s.paused.load(Ordering::Acquire), free) {
                Some(FlowSignal::Resume) if s.set_paused(true, false) => Some(FlowSignal::Resume),
                _ => None,
            }
        });
        Some(Received { unit, flow })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let s = &*self.shared;
        s.len_between(s.head.load(Ordering::Acquire), s.tail.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.available()
    }

    #[must_use]
    pub fn free(&self) -> usize {
        self.capacity() - self.len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Units overwritten before the consumer reached them.
    #[must_use]
    pub fn overruns(&self) -> u32 {
        self.shared.overruns.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }
}
