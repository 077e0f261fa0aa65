//! Diagnostics: event hook, state snapshot, help text and the debug console.
//!
//! The session reports noteworthy conditions through a [`Diagnostics`]
//! implementation; the default logs them with `tracing`. The debug console
//! is a second byte interpreter, reachable with `ESC ^Z`, that answers
//! queries about the running session.

use std::fmt;
use std::fmt::Write as _;

use crate::bus::BusWord;
use crate::channel::Link;
use crate::engine::{Attributes, HelpPage};
use crate::hardware::HardwareIo;
use crate::pitch::{Pitch, Printwheel};

/// Something the operator may want to know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagEvent {
    /// Handshake finished, with the wheel the printer reported.
    PrintwheelIdentified(Printwheel),
    /// The printer reported a wheel this firmware does not know.
    UnknownPrintwheel(BusWord),
    /// No printwheel reply arrived before the handshake deadline.
    HandshakeTimeout,
    /// A bus sequence was abandoned mid-way.
    ProtocolDesync { link: Link, count: u32 },
    /// Units were overwritten in a receive ring.
    Overrun { link: Link, lost: u32 },
    /// The carriage reached the right stop and was returned.
    MarginReturn,
    ModeChanged { local: bool },
    /// Code+Erase away from the left margin.
    ModeToggleRefused { column: u16 },
    /// A Function Board word, reported while monitoring is on.
    Monitor(BusWord),
}

pub trait Diagnostics {
    fn record(&mut self, event: &DiagEvent);
}

/// Log every event at a level matching its severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn record(&mut self, event: &DiagEvent) {
        match event {
            DiagEvent::PrintwheelIdentified(wheel) => {
                tracing::info!(printwheel = %wheel, "printwheel identified");
            }
            DiagEvent::UnknownPrintwheel(reply) => {
                tracing::warn!(reply = %reply, "unknown printwheel, using 12 pitch");
            }
            DiagEvent::HandshakeTimeout => {
                tracing::warn!("handshake timed out, using 12 pitch");
            }
            DiagEvent::ProtocolDesync { link, count } => {
                tracing::trace!(%link, count, "bus desync");
            }
            DiagEvent::Overrun { link, lost } => {
                tracing::warn!(%link, lost, "receive overrun");
            }
            DiagEvent::MarginReturn => tracing::debug!("automatic carriage return"),
            DiagEvent::ModeChanged { local } => {
                tracing::info!(mode = if *local { "local" } else { "line" }, "mode changed");
            }
            DiagEvent::ModeToggleRefused { column } => {
                tracing::debug!(column, "mode toggle ignored away from left margin");
            }
            DiagEvent::Monitor(word) => tracing::info!(word = %word, "function board"),
        }
    }
}

/// Keep every event, for tests.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub events: Vec<DiagEvent>,
}

impl Diagnostics for Recorder {
    fn record(&mut self, event: &DiagEvent) {
        self.events.push(event.clone());
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for Box<D> {
    fn record(&mut self, event: &DiagEvent) {
        (**self).record(event);
    }
}

impl<D: Diagnostics + ?Sized> Diagnostics for std::rc::Rc<std::cell::RefCell<D>> {
    fn record(&mut self, event: &DiagEvent) {
        self.borrow_mut().record(event);
    }
}

/// Time since start, split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Uptime {
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
}

impl Uptime {
    #[must_use]
    pub fn from_ticks(ticks: u32, tick_hz: u32) -> Self {
        let total = ticks / tick_hz.max(1);
        Self {
            hours: total / 3600,
            minutes: ((total / 60) % 60) as u8,
            seconds: (total % 60) as u8,
        }
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Point-in-time view of the session for the debug console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub auto_line_feed: bool,
    pub auto_return: bool,
    pub initializing: bool,
    pub monitor: bool,
    pub local_mode: bool,
    pub attributes: Attributes,
    pub column: u16,
    pub micro_spaces: u16,
    pub pitch: Pitch,
    pub printwheel: Option<Printwheel>,
    pub uptime: Uptime,
    pub watchdog_resets: u8,
}

impl Snapshot {
    /// One `name: value` line per variable.
    #[must_use]
    pub fn variables(&self) -> String {
        let printwheel = self.printwheel.map_or(0, |w| w.reply().raw());
        let mut text = String::new();
        let rows: [(&str, String); 12] = [
            ("autoLineFeed", self.auto_line_feed.to_string()),
            ("autoCarriageReturn", self.auto_return.to_string()),
            ("initializing", self.initializing.to_string()),
            ("monitor", self.monitor.to_string()),
            ("localMode", self.local_mode.to_string()),
            ("attribute", format!("{:08b}", self.attributes.bits())),
            ("column", self.column.to_string()),
            ("tabStop", self.pitch.tab_stop.to_string()),
            ("printWheel", format!("0x{printwheel:02X}")),
            ("uSpacesPerChar", self.pitch.micro_spaces_per_char.to_string()),
            ("uLinesPerLine", self.pitch.micro_lines_per_line.to_string()),
            ("uSpaceCount", self.micro_spaces.to_string()),
        ];
        for (name, value) in rows {
            let _ = writeln!(text, "{:<20}{value}", format!("{name}:"));
        }
        text
    }
}

pub const VERSION: &str = concat!("Wheelwriter Teletype ", env!("CARGO_PKG_VERSION"), "\n");

pub const HELP_CONTROLS: &str = "\n\nControl characters:\n\
  BEL 0x07        spins the printwheel\n\
  BS  0x08        non-destructive backspace\n\
  TAB 0x09        horizontal tab\n\
  LF  0x0A        paper up one line\n\
  VT  0x0B        paper up one line\n\
  CR  0x0D        returns carriage to left margin\n\
  ESC 0x1B        see Diablo 630 commands below...\n\
\nDiablo 630 commands emulated:\n\
  <ESC><O>        selects bold printing\n\
  <ESC><&>        cancels bold printing\n\
  <ESC><E>        selects continuous underlining\n\
  <ESC><R>        cancels underlining\n\
  <ESC><X>        cancels both bold and underlining\n\
  <ESC><U>        half line feed\n\
  <ESC><D>        reverse half line feed\n\
  <ESC><BS>       backspace 1/120 inch\n\
  <ESC><LF>       reverse line feed\n\
<Space> for more, <ESC> to exit...";

pub const HELP_EXTENDED: &str = "\n\nPrinter control not part of the Diablo 630 emulation:\n\
  <ESC><u>        selects micro paper up\n\
  <ESC><d>        selects micro paper down\n\
  <ESC><b>        selects broken underlining\n\
  <ESC><l><n>     auto linefeed on or off\n\
  <ESC><c><n>     auto carriage return on or off\n\
  <ESC><p>        selects Pica pitch\n\
  <ESC><e>        selects Elite pitch\n\
  <ESC><m>        selects Micro Elite pitch\n\
\nDiagnostics/debugging:\n\
  <ESC><^Z><a>    show version information\n\
  <ESC><^Z><l><n> turn flashing red error LED on or off\n\
  <ESC><^Z><m>    monitor Function Board commands\n\
  <ESC><^Z><p><n> show value of Port n (0-5)\n\
  <ESC><^Z><r>    reset the Wheelwriter\n\
  <ESC><^Z><u>    show uptime\n\
  <ESC><^Z><v>    show variables\n\
  <ESC><^Z><w>    show number of watchdog resets\n\
\nCode+Erase on Wheelwriter toggles line/local mode\n\n";

#[must_use]
pub const fn help_text(page: HelpPage) -> &'static str {
    match page {
        HelpPage::Controls => HELP_CONTROLS,
        HelpPage::Extended => HELP_EXTENDED,
    }
}

/// Actions the debug console asks the session to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugRequest {
    ToggleMonitor,
    ErrorIndicator(bool),
    Reset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugReply {
    pub text: String,
    pub request: Option<DebugRequest>,
}

impl DebugReply {
    fn text(text: String) -> Self {
        Self {
            text,
            request: None,
        }
    }

    fn request(request: DebugRequest) -> Self {
        Self {
            text: String::new(),
            request: Some(request),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DebugState {
    #[default]
    Idle,
    Escape,
    Command,
    Port,
    ErrorIndicator,
    HelpWait,
}

const ESC: u8 = 0x1B;
const SUB: u8 = 0x1A;

/// `ESC ^Z` command interpreter.
#[derive(Debug, Clone, Default)]
pub struct DebugConsole {
    state: DebugState,
}

impl DebugConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret one byte. Query replies end with enough spaces to put the
    /// host's cursor back at the printer's column.
    pub fn feed(
        &mut self,
        byte: u8,
        snapshot: &Snapshot,
        io: &dyn HardwareIo,
    ) -> Option<DebugReply> {
        let (next, reply) = match self.state {
            DebugState::Idle => match byte {
                ESC => (DebugState::Escape, None),
                _ => (DebugState::Idle, None),
            },
            DebugState::Escape => match byte {
                SUB => (DebugState::Command, None),
                b'h' | b'H' => (
                    DebugState::HelpWait,
                    Some(DebugReply::text(HELP_CONTROLS.to_owned())),
                ),
                _ => (DebugState::Idle, None),
            },
            DebugState::Command => Self::command(byte, snapshot),
            DebugState::Port => {
                let reply = match byte {
                    b'0'..=b'5' => {
                        let port = byte - b'0';
                        let value = io.read_port(port);
                        Some(DebugReply::text(format!("P{port}: 0x{value:02X}\n")))
                    }
                    _ => None,
                };
                (DebugState::Idle, reply)
            }
            DebugState::ErrorIndicator => (
                DebugState::Idle,
                Some(DebugReply::request(DebugRequest::ErrorIndicator(
                    byte & 0x01 != 0,
                ))),
            ),
            DebugState::HelpWait => match byte {
                b' ' => (
                    DebugState::Idle,
                    Some(DebugReply::text(HELP_EXTENDED.to_owned())),
                ),
                ESC => (DebugState::Idle, Some(DebugReply::text("\r".to_owned()))),
                _ => (DebugState::HelpWait, None),
            },
        };
        self.state = next;
        reply
    }

    fn command(byte: u8, snapshot: &Snapshot) -> (DebugState, Option<DebugReply>) {
        let text = match byte.to_ascii_lowercase() {
            b'a' => format!("\n{VERSION}\n"),
            b'l' => return (DebugState::ErrorIndicator, None),
            b'm' => {
                return (
                    DebugState::Idle,
                    Some(DebugReply::request(DebugRequest::ToggleMonitor)),
                );
            }
            b'p' => return (DebugState::Port, None),
            b'r' => {
                return (
                    DebugState::Idle,
                    Some(DebugReply::request(DebugRequest::Reset)),
                );
            }
            b'u' => format!("\nUptime: {}\n", snapshot.uptime),
            b'v' => format!("\n{}", snapshot.variables()),
            b'w' => format!("\nWatch Dog Timer resets: {}\n", snapshot.watchdog_resets),
            _ => return (DebugState::Idle, None),
        };
        let indent = usize::from(snapshot.column.saturating_sub(1));
        let mut text = text;
        text.extend(std::iter::repeat_n(' ', indent));
        (DebugState::Idle, Some(DebugReply::text(text)))
    }

    pub fn reset(&mut self) {
        self.state = DebugState::Idle;
    }
}
