//! Session controller.
//!
//! Owns the three channels, the print engine and the key decoder, and runs
//! the interface through its two phases:
//!
//! 1. **Handshake.** Both boards are reset and everything the Function
//!    Board says is relayed to the Printer Board unchanged, until the
//!    Function Board's reset announcement (`0x121, 0x001`) has gone by. The
//!    printer's next reply names the mounted printwheel, which fixes the
//!    pitch. Relaying continues for a short settle period.
//! 2. **Steady state.** Function Board words are acknowledged and decoded
//!    into keystrokes. In local mode keystrokes print; in line mode they go
//!    to the host. Printer replies are relayed upstream and console bytes
//!    drive the print engine.
//!
//! Echo, help pages and debug console replies go to a separate debug
//! stream, collected with [`Session::take_debug_output`].

use std::sync::atomic::{AtomicBool, Ordering};

use crate::bus::command::{self, Words};
use crate::bus::{BusWord, KeyDecoder, KeyEvent};
use crate::channel::{Link, SerialChannel};
use crate::clock::{TickSource, elapsed};
use crate::config::SessionConfig;
use crate::diagnostics::{
    DebugConsole, DebugRequest, DiagEvent, Diagnostics, LogDiagnostics, Snapshot, Uptime,
    help_text,
};
use crate::engine::{Emission, PrintEngine};
use crate::error::{ConfigError, SessionError};
use crate::flow_control::Watermarks;
use crate::hardware::{HardwareIo, Level, Line, UartPort};
use crate::pitch::{Pitch, Printwheel};
use crate::ring::{Producer, ring};

const CR: u8 = 0x0D;

/// What keystrokes do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Keystrokes print on the typewriter.
    Local,
    /// Keystrokes go to the host; only host output prints.
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Initializing,
    Ready,
}

/// One transmitter per link.
#[derive(Debug)]
pub struct Ports<P> {
    pub console: P,
    pub function_board: P,
    pub printer_board: P,
}

/// Producer halves of the receive rings, for the receive interrupts.
#[derive(Debug)]
pub struct Interrupts {
    pub console: Producer,
    pub function_board: Producer,
    pub printer_board: Producer,
}

/// Tracks the Function Board's reset announcement during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ResetWatch {
    #[default]
    Waiting,
    Sentinel,
    Announced,
}

impl ResetWatch {
    fn observe(self, word: BusWord) -> Self {
        match (self, word.raw()) {
            (Self::Announced, _) => Self::Announced,
            (Self::Sentinel, 0x001) => Self::Announced,
            (_, 0x121) => Self::Sentinel,
            _ => Self::Waiting,
        }
    }
}

pub struct Session<P, H, T> {
    config: SessionConfig,
    console: SerialChannel<P>,
    function: SerialChannel<P>,
    printer: SerialChannel<P>,
    io: H,
    clock: T,
    engine: PrintEngine,
    keys: KeyDecoder,
    debug: DebugConsole,
    diagnostics: Box<dyn Diagnostics>,
    debug_output: Vec<u8>,
    mode: Mode,
    phase: Phase,
    printwheel: Option<Printwheel>,
    error_indicator: bool,
    monitor: bool,
    started_at: u32,
    overruns_seen: [u32; 3],
    desyncs_seen: u32,
}

impl<P, H, T> std::fmt::Debug for Session<P, H, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("phase", &self.phase)
            .field("printwheel", &self.printwheel)
            .field("engine", &self.engine)
            .field("error_indicator", &self.error_indicator)
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

impl<P: UartPort, H: HardwareIo, T: TickSource> Session<P, H, T> {
    /// Allocate the rings and wire the channels. The returned
    /// [`Interrupts`] feed received units into the session.
    pub fn new(
        config: SessionConfig,
        ports: Ports<P>,
        io: H,
        clock: T,
    ) -> Result<(Self, Interrupts), ConfigError> {
        let (console_slots, bus_slots) = config.validate()?;
        let marks = Watermarks::for_capacity(console_slots.get());
        let (console_tx, console_rx) = ring(console_slots, Some(marks));
        let (function_tx, function_rx) = ring(bus_slots, None);
        let (printer_tx, printer_rx) = ring(bus_slots, None);
        let spins = config.spin_limit;
        let started_at = clock.now();
        let mode = if config.local_mode {
            Mode::Local
        } else {
            Mode::Line
        };
        let session = Self {
            console: SerialChannel::new(Link::Console, console_rx, ports.console, spins),
            function: SerialChannel::new(
                Link::FunctionBoard,
                function_rx,
                ports.function_board,
                spins,
            ),
            printer: SerialChannel::new(
                Link::PrinterBoard,
                printer_rx,
                ports.printer_board,
                spins,
            ),
            io,
            clock,
            engine: PrintEngine::new(Pitch::default()),
            keys: KeyDecoder::new(),
            debug: DebugConsole::new(),
            diagnostics: Box::new(LogDiagnostics),
            debug_output: Vec::new(),
            mode,
            phase: Phase::Initializing,
            printwheel: None,
            error_indicator: false,
            monitor: false,
            started_at,
            overruns_seen: [0; 3],
            desyncs_seen: 0,
            config,
        };
        let interrupts = Interrupts {
            console: console_tx,
            function_board: function_tx,
            printer_board: printer_tx,
        };
        Ok((session, interrupts))
    }

    /// Replace the diagnostics hook.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    /// Pulse both boards' reset lines.
    pub fn reset_boards(&mut self) {
        for line in [Line::PrinterReset, Line::FunctionReset] {
            self.io.set_line(line, Level::High);
        }
        for line in [Line::PrinterReset, Line::FunctionReset] {
            self.io.set_line(line, Level::Low);
        }
        tracing::info!("wheelwriter boards reset");
    }

    /// Reset the boards, identify the printwheel and settle. Returns the
    /// wheel the printer reported, or `None` if it never answered.
    pub fn handshake(&mut self) -> Result<Option<Printwheel>, SessionError> {
        self.phase = Phase::Initializing;
        self.reset_boards();

        let start = self.clock.now();
        let deadline = self.config.ticks(self.config.handshake_timeout);
        let mut watch = ResetWatch::default();
        let reply = loop {
            if let Some(unit) = self.function.try_read() {
                tracing::trace!(word = %BusWord::new(unit), "relay to printer");
                self.printer.write(unit)?;
                watch = watch.observe(BusWord::new(unit));
            }
            if let Some(unit) = self.printer.try_read() {
                self.function.write(unit)?;
                if watch == ResetWatch::Announced {
                    break Some(BusWord::new(unit));
                }
            }
            if elapsed(start, self.clock.now()) >= deadline {
                break None;
            }
        };

        let wheel = reply.map(Printwheel::from_reply);
        match wheel {
            Some(wheel) if wheel.is_known() => {
                self.diagnostics.record(&DiagEvent::PrintwheelIdentified(wheel));
            }
            Some(wheel) => {
                self.diagnostics
                    .record(&DiagEvent::UnknownPrintwheel(wheel.reply()));
                self.set_error_indicator(true);
            }
            None => {
                self.diagnostics.record(&DiagEvent::HandshakeTimeout);
                self.set_error_indicator(true);
            }
        }
        self.printwheel = wheel;
        self.engine
            .set_pitch(wheel.map_or(Pitch::default(), Printwheel::pitch));

        self.settle()?;
        self.phase = Phase::Ready;
        tracing::info!(pitch = ?self.engine.pitch(), mode = ?self.mode, "session ready");
        Ok(wheel)
    }

    fn settle(&mut self) -> Result<(), SessionError> {
        let start = self.clock.now();
        let settle = self.config.ticks(self.config.settle_time);
        while elapsed(start, self.clock.now()) < settle {
            if let Some(unit) = self.function.try_read() {
                self.printer.write(unit)?;
            }
            if let Some(unit) = self.printer.try_read() {
                self.function.write(unit)?;
            }
        }
        Ok(())
    }

    /// One pass of the steady-state loop. Returns whether any unit was
    /// handled.
    pub fn poll(&mut self) -> Result<bool, SessionError> {
        self.io.feed_watchdog();
        let mut busy = false;
        if let Some(unit) = self.function.try_read() {
            busy = true;
            self.on_function_word(BusWord::new(unit))?;
        }
        if let Some(unit) = self.printer.try_read() {
            busy = true;
            self.function.write(unit)?;
        }
        if let Some(unit) = self.console.try_read() {
            busy = true;
            self.print_byte((unit & 0xFF) as u8)?;
        }
        self.report_overruns();
        Ok(busy)
    }

    /// Poll until nothing is left to do.
    pub fn drain(&mut self) -> Result<(), SessionError> {
        while self.poll()? {}
        Ok(())
    }

    /// Handshake, then poll until `stop` is set.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), SessionError> {
        self.handshake()?;
        while !stop.load(Ordering::Relaxed) {
            if !self.poll()? {
                std::thread::yield_now();
            }
        }
        Ok(())
    }

    fn on_function_word(&mut self, word: BusWord) -> Result<(), SessionError> {
        self.function.write(BusWord::ACK.raw())?;
        if self.monitor {
            self.diagnostics.record(&DiagEvent::Monitor(word));
            self.debug_output
                .extend_from_slice(format!("{word}\n").as_bytes());
        }
        let event = self.keys.decode(word, self.engine.pitch());
        let desyncs = self.keys.desyncs();
        if desyncs != self.desyncs_seen {
            self.desyncs_seen = desyncs;
            self.diagnostics.record(&DiagEvent::ProtocolDesync {
                link: Link::FunctionBoard,
                count: desyncs,
            });
        }
        match event {
            Some(event) => self.on_key(event),
            None => Ok(()),
        }
    }

    fn on_key(&mut self, event: KeyEvent) -> Result<(), SessionError> {
        match (event, self.mode) {
            (KeyEvent::ModeToggle, _) => self.toggle_mode(),
            (KeyEvent::Return(operand), Mode::Local) => {
                let mut words = Words::new();
                command::vertical_raw(&mut words, operand);
                self.send_to_printer(&words)?;
                self.print_byte(CR)
            }
            (KeyEvent::PaperMotion(operand), Mode::Local) => {
                let mut words = Words::new();
                command::vertical_raw(&mut words, operand);
                self.send_to_printer(&words)
            }
            (KeyEvent::PaperMotion(_), Mode::Line) => Ok(()),
            (KeyEvent::Char(c), Mode::Local) => self.print_byte(c),
            (event, Mode::Line) => match event.ascii() {
                Some(c) => Ok(self.console.write(u16::from(c))?),
                None => Ok(()),
            },
        }
    }

    fn toggle_mode(&mut self) -> Result<(), SessionError> {
        let column = self.engine.column();
        if column != 1 {
            self.diagnostics
                .record(&DiagEvent::ModeToggleRefused { column });
            return Ok(());
        }
        self.mode = match self.mode {
            Mode::Local => Mode::Line,
            Mode::Line => Mode::Local,
        };
        let mut cue = Emission::default();
        self.engine.mode_cue(&mut cue);
        self.send_to_printer(&cue.words)?;
        self.diagnostics.record(&DiagEvent::ModeChanged {
            local: self.mode == Mode::Local,
        });
        Ok(())
    }

    /// Run one byte through the print engine and carry out the result.
    pub fn print_byte(&mut self, byte: u8) -> Result<(), SessionError> {
        let mut emission = Emission::default();
        self.engine.advance(byte, &mut emission);
        self.send_to_printer(&emission.words)?;
        self.debug_output.extend_from_slice(&emission.echo);
        if let Some(page) = emission.help {
            self.debug_output
                .extend_from_slice(help_text(page).as_bytes());
        }
        for _ in 0..emission.margin_returns {
            self.diagnostics.record(&DiagEvent::MarginReturn);
        }
        Ok(())
    }

    fn send_to_printer(&mut self, words: &[BusWord]) -> Result<(), SessionError> {
        if words.is_empty() {
            return Ok(());
        }
        self.io.set_line(Line::BusyIndicator, Level::High);
        let sent = words
            .iter()
            .try_for_each(|w| self.printer.write_acked(w.raw()));
        self.io.set_line(Line::BusyIndicator, Level::Low);
        Ok(sent?)
    }

    fn report_overruns(&mut self) {
        let channels = [&self.console, &self.function, &self.printer];
        for (seen, channel) in self.overruns_seen.iter_mut().zip(channels) {
            let now = channel.overruns();
            if now != *seen {
                let lost = now.wrapping_sub(*seen);
                *seen = now;
                self.diagnostics.record(&DiagEvent::Overrun {
                    link: channel.link(),
                    lost,
                });
            }
        }
    }

    /// Feed one byte from the debug port.
    pub fn debug_input(&mut self, byte: u8) {
        let snapshot = self.snapshot();
        let Some(reply) = self.debug.feed(byte, &snapshot, &self.io) else {
            return;
        };
        self.debug_output.extend_from_slice(reply.text.as_bytes());
        match reply.request {
            Some(DebugRequest::ToggleMonitor) => {
                self.monitor = !self.monitor;
                tracing::info!(monitor = self.monitor, "bus monitor toggled");
            }
            Some(DebugRequest::ErrorIndicator(on)) => self.set_error_indicator(on),
            Some(DebugRequest::Reset) => self.reset(),
            None => {}
        }
    }

    /// Full restart: boards, platform and every state machine.
    pub fn reset(&mut self) {
        tracing::info!("session reset requested");
        self.reset_boards();
        self.io.request_reset();
        self.engine.reset();
        self.keys.reset();
        self.debug.reset();
        self.mode = if self.config.local_mode {
            Mode::Local
        } else {
            Mode::Line
        };
        self.phase = Phase::Initializing;
        self.monitor = false;
    }

    fn set_error_indicator(&mut self, on: bool) {
        self.error_indicator = on;
        self.io.set_line(Line::ErrorIndicator, Level::from_bool(on));
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            auto_line_feed: self.engine.auto_line_feed(),
            auto_return: self.engine.auto_return(),
            initializing: self.phase == Phase::Initializing,
            monitor: self.monitor,
            local_mode: self.mode == Mode::Local,
            attributes: self.engine.attributes(),
            column: self.engine.column(),
            micro_spaces: self.engine.carriage().micro_spaces,
            pitch: self.engine.pitch(),
            printwheel: self.printwheel,
            uptime: self.uptime(),
            watchdog_resets: self.io.watchdog_resets(),
        }
    }

    #[must_use]
    pub fn uptime(&self) -> Uptime {
        Uptime::from_ticks(
            elapsed(self.started_at, self.clock.now()),
            self.config.tick_hz,
        )
    }

    /// Echo, help text, monitor lines and debug replies produced so far.
    pub fn take_debug_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.debug_output)
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn printwheel(&self) -> Option<Printwheel> {
        self.printwheel
    }

    #[must_use]
    pub fn error_indicator(&self) -> bool {
        self.error_indicator
    }

    #[must_use]
    pub fn monitor(&self) -> bool {
        self.monitor
    }

    #[must_use]
    pub fn engine(&self) -> &PrintEngine {
        &self.engine
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn io(&self) -> &H {
        &self.io
    }

    #[must_use]
    pub fn channel(&self, link: Link) -> &SerialChannel<P> {
        match link {
            Link::Console => &self.console,
            Link::FunctionBoard => &self.function,
            Link::PrinterBoard => &self.printer,
        }
    }

    pub fn channel_mut(&mut self, link: Link) -> &mut SerialChannel<P> {
        match link {
            Link::Console => &mut self.console,
            Link::FunctionBoard => &mut self.function,
            Link::PrinterBoard => &mut self.printer,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use tracing_test::traced_test;

    use super::*;
    use crate::bus::command::{CommandParser, PrinterCommand};
    use crate::diagnostics::Recorder;
    use crate::hardware::loopback::{LoopbackPort, MemoryIo, StepClock};

    type TestSession = Session<LoopbackPort, MemoryIo, StepClock>;

    fn config() -> SessionConfig {
        SessionConfig::default()
            .with_handshake_timeout(Duration::from_secs(1))
            .with_settle_time(Duration::ZERO)
            .with_spin_limit(64)
    }

    fn ports() -> Ports<LoopbackPort> {
        Ports {
            console: LoopbackPort::new(),
            function_board: LoopbackPort::new(),
            printer_board: LoopbackPort::new(),
        }
    }

    fn ready(config: SessionConfig) -> (TestSession, Interrupts, Rc<RefCell<Recorder>>) {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let (session, irq) =
            Session::new(config, ports(), MemoryIo::new(), StepClock::new(1)).unwrap();
        let mut session = session.with_diagnostics(Rc::clone(&recorder));
        session.handshake().unwrap();
        (session, irq, recorder)
    }

    fn printed(session: &mut TestSession) -> Vec<PrinterCommand> {
        let units = session
            .channel_mut(Link::PrinterBoard)
            .port_mut()
            .take_sent();
        CommandParser::new().feed_units(&units)
    }

    fn type_units(irq: &Interrupts, session: &mut TestSession, units: &[u16]) {
        for &u in units {
            irq.function_board.push(u);
            session.drain().unwrap();
        }
    }

    #[test]
    fn reset_watch_needs_adjacent_words() {
        let mut watch = ResetWatch::default();
        for unit in [0x121, 0x003, 0x001] {
            watch = watch.observe(BusWord::new(unit));
        }
        assert_eq!(watch, ResetWatch::Waiting);
        for unit in [0x121, 0x121, 0x001, 0x000] {
            watch = watch.observe(BusWord::new(unit));
        }
        assert_eq!(watch, ResetWatch::Announced);
    }

    #[traced_test]
    #[test]
    fn handshake_timeout_defaults_and_flags_error() {
        let (session, _irq, recorder) = ready(config());
        assert_eq!(session.printwheel(), None);
        assert_eq!(session.engine().pitch(), Pitch::ELITE);
        assert!(session.error_indicator());
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(
            session.io().line(Line::ErrorIndicator),
            Some(Level::High)
        );
        assert!(
            recorder
                .borrow()
                .events
                .contains(&DiagEvent::HandshakeTimeout)
        );
        assert!(logs_contain("session ready"));
    }

    #[test]
    fn reset_lines_are_pulsed() {
        let (session, _irq, _) = ready(config());
        let history = session.io().history();
        assert_eq!(history[0], (Line::PrinterReset, Level::High));
        assert!(history.contains(&(Line::FunctionReset, Level::Low)));
    }

    #[test]
    fn local_mode_prints_keystrokes() {
        let (mut session, irq, _) = ready(config());
        type_units(&irq, &mut session, &[0x121, 0x003, 0x020, 0x00A]);
        assert_eq!(
            printed(&mut session),
            vec![PrinterCommand::Print {
                wheel: 0x20,
                advance: 10
            }]
        );
        // Every Function Board word was acknowledged.
        let acks = session.channel(Link::FunctionBoard).port().sent();
        assert_eq!(acks, &[0x000; 4]);
        assert_eq!(session.take_debug_output(), b"A");
    }

    #[test]
    fn line_mode_forwards_to_console() {
        let (mut session, irq, _) = ready(config().local_mode(false));
        assert_eq!(session.mode(), Mode::Line);
        type_units(&irq, &mut session, &[0x121, 0x003, 0x020, 0x00A]);
        type_units(&irq, &mut session, &[0x121, 0x005, 0x090]);
        type_units(&irq, &mut session, &[0x121, 0x005, 0x008]);
        assert!(printed(&mut session).is_empty());
        assert_eq!(session.channel(Link::Console).port().sent(), &[0x41, 0x0D]);
    }

    #[test]
    fn return_key_in_local_mode_feeds_and_returns() {
        let (mut session, irq, _) = ready(config());
        let _ = session.print_byte(b'a');
        let _ = printed(&mut session);
        type_units(&irq, &mut session, &[0x121, 0x005, 0x090]);
        assert_eq!(
            printed(&mut session),
            vec![
                PrinterCommand::Vertical {
                    direction: command::Vertical::Up,
                    micro_lines: 16
                },
                PrinterCommand::Horizontal {
                    direction: command::Horizontal::Left,
                    micro_spaces: 10
                },
            ]
        );
        assert_eq!(session.engine().column(), 1);
    }

    #[test]
    fn mode_toggle_only_at_left_margin() {
        let (mut session, irq, recorder) = ready(config());
        session.print_byte(b'x').unwrap();
        let _ = printed(&mut session);

        type_units(&irq, &mut session, &[0x121, 0x00E, 0x04F]);
        assert_eq!(session.mode(), Mode::Local);
        assert!(printed(&mut session).is_empty());
        assert!(
            recorder
                .borrow()
                .events
                .contains(&DiagEvent::ModeToggleRefused { column: 2 })
        );

        session.print_byte(CR).unwrap();
        let _ = printed(&mut session);
        type_units(&irq, &mut session, &[0x121, 0x00E, 0x04F]);
        assert_eq!(session.mode(), Mode::Line);
        assert_eq!(printed(&mut session).first(), Some(&PrinterCommand::Spin));
    }

    #[test]
    fn console_bytes_print() {
        let (mut session, irq, _) = ready(config().local_mode(false));
        for &b in b"ok\r\n" {
            irq.console.push(u16::from(b));
        }
        session.drain().unwrap();
        let commands = printed(&mut session);
        assert_eq!(commands.len(), 4);
        assert_eq!(session.engine().column(), 1);
    }

    #[test]
    fn printer_replies_are_relayed_upstream() {
        let (mut session, irq, _) = ready(config());
        irq.printer_board.push(0x0AA);
        session.drain().unwrap();
        assert_eq!(session.channel(Link::FunctionBoard).port().sent(), &[0x0AA]);
    }

    #[test]
    fn desync_and_overrun_are_reported() {
        let (mut session, irq, recorder) = ready(config());
        type_units(&irq, &mut session, &[0x121, 0x0AB]);
        for unit in 0..20 {
            irq.function_board.push(unit);
        }
        session.drain().unwrap();
        let events = recorder.borrow().events.clone();
        assert!(events.contains(&DiagEvent::ProtocolDesync {
            link: Link::FunctionBoard,
            count: 1
        }));
        assert!(events.contains(&DiagEvent::Overrun {
            link: Link::FunctionBoard,
            lost: 4
        }));
    }

    #[test]
    fn silent_printer_surfaces_link_error() {
        let ports = Ports {
            printer_board: LoopbackPort::silent(),
            ..ports()
        };
        let (mut session, irq) =
            Session::new(config(), ports, MemoryIo::new(), StepClock::new(1)).unwrap();
        session.handshake().unwrap();
        irq.console.push(u16::from(b'a'));
        let err = session.poll().unwrap_err();
        assert!(matches!(
            err,
            SessionError::Link(e) if e.link == Link::PrinterBoard
        ));
        assert_eq!(session.io().line(Line::BusyIndicator), Some(Level::Low));
    }

    #[test]
    fn debug_console_controls_session() {
        let (mut session, irq, recorder) = ready(config());
        for &b in b"\x1b\x1am" {
            session.debug_input(b);
        }
        assert!(session.monitor());
        irq.function_board.push(0x121);
        session.drain().unwrap();
        assert!(recorder.borrow().events.contains(&DiagEvent::Monitor(BusWord::SENTINEL)));
        assert_eq!(session.take_debug_output(), b"121\n");

        for &b in b"\x1b\x1al0" {
            session.debug_input(b);
        }
        assert!(!session.error_indicator());

        for &b in b"\x1b\x1ar" {
            session.debug_input(b);
        }
        assert_eq!(session.io().resets_requested(), 1);
        assert_eq!(session.phase(), Phase::Initializing);
        assert!(!session.monitor());
    }

    #[test]
    fn help_goes_to_debug_output() {
        let (mut session, _irq, _) = ready(config());
        for &b in b"\x1bh " {
            session.print_byte(b).unwrap();
        }
        let text = String::from_utf8(session.take_debug_output()).unwrap();
        assert!(text.contains("Diablo 630 commands emulated"));
        assert!(text.contains("Code+Erase on Wheelwriter"));
    }

    #[test]
    fn uptime_counts_ticks() {
        let (session, _irq, _) = ready(config());
        let uptime = session.uptime();
        assert_eq!(uptime.hours, 0);
        assert_eq!(uptime.minutes, 0);
    }
}
