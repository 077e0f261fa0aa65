//! A session wired to virtual boards.

use wheeltty_core::bus::command;
use wheeltty_core::hardware::loopback::{LoopbackPort, MemoryIo, StepClock};
use wheeltty_core::ring::Producer;
use wheeltty_core::session::{Interrupts, Ports};
use wheeltty_core::{BusWord, Link, Printwheel, Session, SessionConfig, SessionError};

use crate::peers::{VirtualKeyboard, VirtualPrinter};

pub type SimSession = Session<LoopbackPort, MemoryIo, StepClock>;

/// Everything on the desk: the interface, the typewriter's two boards, and
/// the host end of the console line.
///
/// The clock advances one tick per read, so timeouts are measured in loop
/// passes rather than wall time and runs are reproducible.
#[derive(Debug)]
pub struct Rig {
    session: SimSession,
    console: Producer,
    function_board: Producer,
    printer: VirtualPrinter,
    keyboard: VirtualKeyboard,
}

impl Rig {
    /// Build the rig. `wheel` is the printwheel mounted in the virtual
    /// printer; `None` leaves the printer mute.
    pub fn new(config: SessionConfig, wheel: Option<Printwheel>) -> Result<Self, SessionError> {
        let printer = VirtualPrinter::new(wheel);
        let ports = Ports {
            console: LoopbackPort::new(),
            function_board: LoopbackPort::new(),
            printer_board: printer.port(),
        };
        let (session, irq) = Session::new(config, ports, MemoryIo::new(), StepClock::new(1))?;
        let Interrupts {
            console,
            function_board,
            printer_board,
        } = irq;
        printer.attach(printer_board);
        let keyboard = VirtualKeyboard::new(session.engine().pitch());
        Ok(Self {
            session,
            console,
            function_board,
            printer,
            keyboard,
        })
    }

    /// Power up: the Function Board announces a reset and the session
    /// runs its handshake.
    pub fn power_on(&mut self) -> Result<Option<Printwheel>, SessionError> {
        for word in command::reset() {
            self.function_board.push(word.raw());
        }
        let wheel = self.session.handshake()?;
        self.keyboard.set_pitch(self.session.engine().pitch());
        Ok(wheel)
    }

    /// Bytes from the host. Pauses to let the session catch up whenever
    /// the interface raises RTS.
    pub fn host_send(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        for &b in bytes {
            if self.console.is_paused() {
                self.session.drain()?;
            }
            let _ = self.console.push(u16::from(b));
        }
        self.session.drain()
    }

    /// Keystrokes at the typewriter.
    pub fn type_text(&mut self, text: &[u8]) -> Result<(), SessionError> {
        let words = self.keyboard.type_text(text);
        self.key_words(&words)
    }

    /// Code+Erase at the typewriter.
    pub fn toggle_mode(&mut self) -> Result<(), SessionError> {
        let words = self.keyboard.mode_toggle();
        self.key_words(&words)
    }

    fn key_words(&mut self, words: &[BusWord]) -> Result<(), SessionError> {
        for word in words {
            let _ = self.function_board.push(word.raw());
            self.session.drain()?;
        }
        Ok(())
    }

    /// Bytes typed on the debug port.
    pub fn debug_send(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.session.debug_input(b);
        }
    }

    /// What the host has received since the last call.
    pub fn host_received(&mut self) -> Vec<u8> {
        let sent = self
            .session
            .channel_mut(Link::Console)
            .port_mut()
            .take_sent();
        sent.into_iter().map(|u| (u & 0xFF) as u8).collect()
    }

    /// What has appeared on the debug port since the last call.
    pub fn debug_received(&mut self) -> Vec<u8> {
        self.session.take_debug_output()
    }

    #[must_use]
    pub fn paper_text(&self) -> String {
        self.printer.text()
    }

    #[must_use]
    pub fn printer(&self) -> &VirtualPrinter {
        &self.printer
    }

    #[must_use]
    pub fn session(&self) -> &SimSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SimSession {
        &mut self.session
    }
}
