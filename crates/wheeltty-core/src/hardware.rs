//! Hardware seam.
//!
//! The session never touches registers directly. It talks to three UART
//! peripherals through [`UartPort`] and to the rest of the board (reset
//! lines, indicators, the DIP switch ports, the watchdog) through
//! [`HardwareIo`]. Every wait on a hardware condition goes through
//! [`wait_until`] so that a stuck peer costs a bounded number of polls.
//!
//! [`loopback`] provides in-memory implementations used by the tests and the
//! host simulator.

use crate::error::WaitTimeout;

/// Logic level of a pin or the sampled bus line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    Low,
    #[default]
    High,
}

impl Level {
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    #[must_use]
    pub const fn from_bool(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// Discrete output lines driven by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    /// Reset input of the typewriter's Printer Board.
    PrinterReset,
    /// Reset input of the typewriter's Function Board.
    FunctionReset,
    /// Soft error indicator (red LED).
    ErrorIndicator,
    /// Lit while words are going out to the printer (amber LED).
    BusyIndicator,
}

/// One frame handed to a UART transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    pub data: u8,
    /// Ninth bit for bus links, `None` on 8-bit links.
    pub ninth: Option<bool>,
}

impl Frame {
    #[must_use]
    pub const fn byte(data: u8) -> Self {
        Self { data, ninth: None }
    }

    #[must_use]
    pub const fn word(unit: u16) -> Self {
        Self {
            data: (unit & 0xFF) as u8,
            ninth: Some(unit & 0x100 != 0),
        }
    }

    /// The unit this frame carries, ninth bit included.
    #[must_use]
    pub const fn unit(self) -> u16 {
        match self.ninth {
            Some(true) => 0x100 | self.data as u16,
            _ => self.data as u16,
        }
    }
}

/// Transmit side and line sensing of one UART.
///
/// The receive side is not part of this trait: received units are pushed
/// into a [`Producer`](crate::ring::Producer) by whatever plays the role of
/// the receive interrupt.
pub trait UartPort {
    /// The previous frame has left the shift register.
    fn tx_complete(&self) -> bool;

    /// Begin transmitting one frame.
    fn start_tx(&mut self, frame: Frame);

    /// Sampled level of the shared bus line. 8-bit ports may leave this at
    /// the default.
    fn rx_level(&self) -> Level {
        Level::High
    }

    /// Gate the receiver. Bus links disable it while they transmit on the
    /// shared line so they do not hear their own words.
    fn set_receiver(&mut self, _enabled: bool) {}

    /// Drive the request-to-send output. `High` asks the peer to pause.
    fn set_rts(&mut self, _level: Level) {}
}

/// Board-level I/O outside the UARTs.
pub trait HardwareIo {
    /// Read one of the general-purpose input ports.
    fn read_port(&self, port: u8) -> u8;

    fn set_line(&mut self, line: Line, level: Level);

    /// Ask the platform for a full restart.
    fn request_reset(&mut self);

    /// Number of restarts caused by the watchdog since power-on.
    fn watchdog_resets(&self) -> u8 {
        0
    }

    /// Called once per main-loop pass.
    fn feed_watchdog(&mut self) {}
}

/// Poll `cond` up to `limit` times, yielding the core between polls.
pub fn wait_until(
    what: &'static str,
    limit: u32,
    mut cond: impl FnMut() -> bool,
) -> Result<(), WaitTimeout> {
    for _ in 0..limit {
        if cond() {
            return Ok(());
        }
        std::hint::spin_loop();
    }
    if cond() {
        Ok(())
    } else {
        Err(WaitTimeout { what, spins: limit })
    }
}

pub mod loopback {
    //! In-memory hardware.

    use std::cell::Cell;
    use std::collections::HashMap;

    use super::{Frame, HardwareIo, Level, Line, UartPort};
    use crate::clock::TickSource;

    type TransmitHook = Box<dyn FnMut(u16)>;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    enum Pulse {
        #[default]
        Idle,
        Settle,
        Low,
        Release,
    }

    /// A UART that records its transmissions and optionally hands each one
    /// to a hook.
    ///
    /// With acknowledge pulses enabled, every transmitted frame is followed
    /// by one high-low-high excursion of the sampled bus line, which is what
    /// a live board produces when it accepts a word.
    pub struct LoopbackPort {
        sent: Vec<u16>,
        on_transmit: Option<TransmitHook>,
        acknowledges: bool,
        pulse: Cell<Pulse>,
        receiver_enabled: bool,
        rts: Level,
        rts_changes: usize,
    }

    impl std::fmt::Debug for LoopbackPort {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("LoopbackPort")
                .field("sent", &self.sent.len())
                .field("hooked", &self.on_transmit.is_some())
                .field("acknowledges", &self.acknowledges)
                .field("receiver_enabled", &self.receiver_enabled)
                .field("rts", &self.rts)
                .finish()
        }
    }

    impl Default for LoopbackPort {
        fn default() -> Self {
            Self::new()
        }
    }

    impl LoopbackPort {
        #[must_use]
        pub fn new() -> Self {
            Self {
                sent: Vec::new(),
                on_transmit: None,
                acknowledges: true,
                pulse: Cell::new(Pulse::Idle),
                receiver_enabled: true,
                rts: Level::Low,
                rts_changes: 0,
            }
        }

        /// A port whose peer never pulls the line low.
        #[must_use]
        pub fn silent() -> Self {
            Self {
                acknowledges: false,
                ..Self::new()
            }
        }

        /// Also hand every transmitted unit to `hook`.
        #[must_use]
        pub fn with_hook(mut self, hook: impl FnMut(u16) + 'static) -> Self {
            self.on_transmit = Some(Box::new(hook));
            self
        }

        #[must_use]
        pub fn sent(&self) -> &[u16] {
            &self.sent
        }

        pub fn take_sent(&mut self) -> Vec<u16> {
            std::mem::take(&mut self.sent)
        }

        #[must_use]
        pub fn receiver_enabled(&self) -> bool {
            self.receiver_enabled
        }

        #[must_use]
        pub fn rts(&self) -> Level {
            self.rts
        }

        /// How many times RTS actually changed level.
        #[must_use]
        pub fn rts_changes(&self) -> usize {
            self.rts_changes
        }
    }

    impl UartPort for LoopbackPort {
        fn tx_complete(&self) -> bool {
            true
        }

        fn start_tx(&mut self, frame: Frame) {
            if self.acknowledges {
                self.pulse.set(Pulse::Settle);
            }
            self.sent.push(frame.unit());
            if let Some(hook) = self.on_transmit.as_mut() {
                hook(frame.unit());
            }
        }

        fn rx_level(&self) -> Level {
            let (level, next) = match self.pulse.get() {
                Pulse::Idle => (Level::High, Pulse::Idle),
                Pulse::Settle => (Level::High, Pulse::Low),
                Pulse::Low => (Level::Low, Pulse::Release),
                Pulse::Release => (Level::High, Pulse::Idle),
            };
            self.pulse.set(next);
            level
        }

        fn set_receiver(&mut self, enabled: bool) {
            self.receiver_enabled = enabled;
        }

        fn set_rts(&mut self, level: Level) {
            if self.rts != level {
                self.rts_changes += 1;
            }
            self.rts = level;
        }
    }

    /// Board I/O backed by plain fields.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryIo {
        pub ports: [u8; 6],
        pub watchdog_resets: u8,
        lines: HashMap<Line, Level>,
        history: Vec<(Line, Level)>,
        resets_requested: usize,
        watchdog_feeds: usize,
    }

    impl MemoryIo {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        #[must_use]
        pub fn line(&self, line: Line) -> Option<Level> {
            self.lines.get(&line).copied()
        }

        /// Every `set_line` call in order.
        #[must_use]
        pub fn history(&self) -> &[(Line, Level)] {
            &self.history
        }

        #[must_use]
        pub fn resets_requested(&self) -> usize {
            self.resets_requested
        }

        #[must_use]
        pub fn watchdog_feeds(&self) -> usize {
            self.watchdog_feeds
        }
    }

    impl HardwareIo for MemoryIo {
        fn read_port(&self, port: u8) -> u8 {
            self.ports.get(usize::from(port)).copied().unwrap_or(0)
        }

        fn set_line(&mut self, line: Line, level: Level) {
            self.lines.insert(line, level);
            self.history.push((line, level));
        }

        fn request_reset(&mut self) {
            self.resets_requested += 1;
        }

        fn watchdog_resets(&self) -> u8 {
            self.watchdog_resets
        }

        fn feed_watchdog(&mut self) {
            self.watchdog_feeds += 1;
        }
    }

    /// A clock that advances by a fixed step every time it is read.
    #[derive(Debug, Clone, Default)]
    pub struct StepClock {
        now: Cell<u32>,
        step: u32,
    }

    impl StepClock {
        #[must_use]
        pub fn new(step: u32) -> Self {
            Self {
                now: Cell::new(0),
                step,
            }
        }

        pub fn set(&self, ticks: u32) {
            self.now.set(ticks);
        }
    }

    impl TickSource for StepClock {
        fn now(&self) -> u32 {
            let now = self.now.get();
            self.now.set(now.wrapping_add(self.step));
            now
        }
    }
}
