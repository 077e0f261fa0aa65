//! Virtual Function Board and Printer Board.

use std::cell::RefCell;
use std::rc::Rc;

use wheeltty_core::bus::command::{
    self, CommandParser, Horizontal, PrinterCommand, Vertical, Words,
};
use wheeltty_core::bus::keys::{CODE_ERASE, code_key};
use wheeltty_core::bus::printwheel::printwheel_from_ascii;
use wheeltty_core::hardware::loopback::LoopbackPort;
use wheeltty_core::ring::Producer;
use wheeltty_core::{BusWord, KeyEvent, Opcode, Pitch, Printwheel};

use crate::paper::Paper;

#[derive(Debug)]
struct PrinterState {
    wheel: Option<Printwheel>,
    parser: CommandParser,
    paper: Paper,
    replies: Option<Producer>,
    resets: u32,
}

/// A Printer Board with a wheel mounted (or not).
///
/// It answers every reset command with the wheel's identification word,
/// provided a reply path has been attached, and types everything else onto
/// its paper. With no wheel it answers nothing.
#[derive(Debug, Clone)]
pub struct VirtualPrinter {
    state: Rc<RefCell<PrinterState>>,
}

impl VirtualPrinter {
    #[must_use]
    pub fn new(wheel: Option<Printwheel>) -> Self {
        let pitch = wheel.map_or(Pitch::default(), Printwheel::pitch);
        Self {
            state: Rc::new(RefCell::new(PrinterState {
                wheel,
                parser: CommandParser::new(),
                paper: Paper::new(pitch),
                replies: None,
                resets: 0,
            })),
        }
    }

    /// A loopback port whose transmissions land on this printer.
    #[must_use]
    pub fn port(&self) -> LoopbackPort {
        let state = Rc::clone(&self.state);
        LoopbackPort::new().with_hook(move |unit| state.borrow_mut().receive(unit))
    }

    /// Where replies go: the receive side of the session's printer link.
    pub fn attach(&self, replies: Producer) {
        self.state.borrow_mut().replies = Some(replies);
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.state.borrow().paper.text()
    }

    pub fn with_paper<R>(&self, f: impl FnOnce(&Paper) -> R) -> R {
        f(&self.state.borrow().paper)
    }

    #[must_use]
    pub fn resets(&self) -> u32 {
        self.state.borrow().resets
    }

    /// Words that arrived outside any command.
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.state.borrow().parser.dropped()
    }
}

impl PrinterState {
    fn receive(&mut self, unit: u16) {
        let Some(command) = self.parser.advance(BusWord::new(unit)) else {
            return;
        };
        tracing::trace!(?command, "printer command");
        if command == PrinterCommand::Reset {
            self.resets += 1;
            if let (Some(wheel), Some(replies)) = (self.wheel, self.replies.as_ref()) {
                replies.push(wheel.reply().raw());
            }
        }
        self.paper.apply(command);
    }
}

/// Produces the words the Function Board sends for keystrokes.
#[derive(Debug, Clone, Copy)]
pub struct VirtualKeyboard {
    pitch: Pitch,
}

impl VirtualKeyboard {
    #[must_use]
    pub fn new(pitch: Pitch) -> Self {
        Self { pitch }
    }

    #[must_use]
    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    pub fn set_pitch(&mut self, pitch: Pitch) {
        self.pitch = pitch;
    }

    /// Words for one keystroke producing `ascii`, or `None` if no key on
    /// the keyboard types it.
    #[must_use]
    pub fn key(&self, ascii: u8) -> Option<Words> {
        let spc = self.pitch.micro_spaces_per_char;
        let mut out = Words::new();
        match ascii {
            b'\r' => command::vertical(&mut out, Vertical::Up, self.pitch.micro_lines_per_line),
            b' ' => command::horizontal(&mut out, Horizontal::Right, u16::from(spc)),
            0x08 => command::horizontal(&mut out, Horizontal::Left, u16::from(spc)),
            b'\t' => command::horizontal(&mut out, Horizontal::Right, u16::from(spc) * 2),
            0x21..=0x7E => command::print(&mut out, printwheel_from_ascii(ascii)?, spc),
            _ => {
                let key = (0..=0x7F).find(|&k| code_key(k) == Some(KeyEvent::Char(ascii)))?;
                code(&mut out, key);
            }
        }
        Some(out)
    }

    /// Words for a run of keystrokes. Characters no key types are skipped.
    #[must_use]
    pub fn type_text(&self, text: &[u8]) -> Words {
        text.iter()
            .filter_map(|&b| self.key(b))
            .flatten()
            .collect()
    }

    /// The Code+Erase chord.
    #[must_use]
    pub fn mode_toggle(&self) -> Words {
        let mut out = Words::new();
        code(&mut out, CODE_ERASE);
        out
    }
}

fn code(out: &mut Words, key: u8) {
    out.extend([BusWord::SENTINEL, Opcode::Code.word(), BusWord::from(key)]);
}
