//! Printer-bound command encoding and decoding.
//!
//! The encoder functions append complete word sequences to a [`Words`]
//! buffer. [`CommandParser`] is the inverse: a word-at-a-time state machine
//! that turns a stream of printer-bound words back into [`PrinterCommand`]s.
//! The parser is what a Printer Board does; the session uses the encoder,
//! the simulator and the tests use the parser.

use smallvec::SmallVec;

use super::{BusWord, Opcode};

/// Word buffer sized for the longest sequence one console byte can produce.
pub type Words = SmallVec<[BusWord; 16]>;

/// Bit 7 of a motion operand selects the direction.
pub const DIRECTION_BIT: u16 = 0x080;

/// Largest horizontal move expressible in one command.
pub const MAX_HORIZONTAL: u16 = 0x7FF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Horizontal {
    Left,
    Right,
}

/// Paper direction. `Up` feeds paper up, which is a line feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vertical {
    Up,
    Down,
}

/// Strike one printwheel position without moving the carriage.
///
/// Every strike must be followed by exactly one [`advance`].
pub fn strike(out: &mut Words, wheel: u8) {
    out.extend([
        BusWord::SENTINEL,
        Opcode::Print.word(),
        BusWord::from(wheel),
    ]);
}

/// Carriage advance, in micro-spaces, that completes a strike.
pub fn advance(out: &mut Words, micro_spaces: u8) {
    out.push(BusWord::from(micro_spaces));
}

/// Strike and advance.
pub fn print(out: &mut Words, wheel: u8, micro_spaces: u8) {
    strike(out, wheel);
    advance(out, micro_spaces);
}

/// Move the carriage by up to [`MAX_HORIZONTAL`] micro-spaces.
pub fn horizontal(out: &mut Words, direction: Horizontal, micro_spaces: u16) {
    let magnitude = micro_spaces.min(MAX_HORIZONTAL);
    let mut high = (magnitude >> 8) & 0x7;
    if direction == Horizontal::Right {
        high |= DIRECTION_BIT;
    }
    out.extend([
        BusWord::SENTINEL,
        Opcode::Horizontal.word(),
        BusWord::new(high),
        BusWord::new(magnitude & 0xFF),
    ]);
}

/// Move the paper by `micro_lines`.
pub fn vertical(out: &mut Words, direction: Vertical, micro_lines: u8) {
    let mut operand = u16::from(micro_lines) & 0x7F;
    if direction == Vertical::Up {
        operand |= DIRECTION_BIT;
    }
    out.extend([
        BusWord::SENTINEL,
        Opcode::Vertical.word(),
        BusWord::new(operand),
    ]);
}

/// Pass a raw vertical operand through unchanged.
pub fn vertical_raw(out: &mut Words, operand: BusWord) {
    out.extend([BusWord::SENTINEL, Opcode::Vertical.word(), operand]);
}

/// Spin the printwheel, the machine's audible bell.
pub fn spin(out: &mut Words) {
    out.extend([BusWord::SENTINEL, Opcode::Spin.word()]);
}

/// Board reset announcement.
#[must_use]
pub const fn reset() -> [BusWord; 2] {
    [BusWord::SENTINEL, Opcode::Reset.word()]
}

/// A decoded printer-bound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrinterCommand {
    Reset,
    Print { wheel: u8, advance: u8 },
    Erase { wheel: u8, advance: u8 },
    Horizontal { direction: Horizontal, micro_spaces: u16 },
    Vertical { direction: Vertical, micro_lines: u8 },
    Spin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Ground,
    Opcode,
    /// Waiting for the printwheel code of a print or erase.
    Wheel { erase: bool },
    /// Waiting for the advance of a print or erase.
    Advance { erase: bool, wheel: u8 },
    VerticalOperand,
    HorizontalHigh,
    HorizontalLow { high: u16 },
}

/// Incremental decoder for printer-bound word streams.
///
/// Words outside a command and unknown opcodes are dropped; the parser
/// resynchronizes on the next sentinel.
#[derive(Debug, Clone, Default)]
pub struct CommandParser {
    state: State,
    dropped: u32,
}

impl CommandParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a run of words and collect the commands they complete.
    #[must_use]
    pub fn feed(&mut self, words: &[BusWord]) -> Vec<PrinterCommand> {
        words.iter().filter_map(|&w| self.advance(w)).collect()
    }

    /// Feed raw 9-bit units.
    #[must_use]
    pub fn feed_units(&mut self, units: &[u16]) -> Vec<PrinterCommand> {
        units
            .iter()
            .filter_map(|&u| self.advance(BusWord::new(u)))
            .collect()
    }

    /// Advance by one word.
    pub fn advance(&mut self, word: BusWord) -> Option<PrinterCommand> {
        let (next, command) = match self.state {
            State::Ground => {
                if word != BusWord::SENTINEL {
                    self.dropped += 1;
                }
                (Self::after_sentinel(word), None)
            }
            State::Opcode => match Opcode::from_word(word) {
                Some(Opcode::Reset) => (State::Ground, Some(PrinterCommand::Reset)),
                Some(Opcode::Spin) => (State::Ground, Some(PrinterCommand::Spin)),
                Some(Opcode::Print) => (State::Wheel { erase: false }, None),
                Some(Opcode::Erase) => (State::Wheel { erase: true }, None),
                Some(Opcode::Vertical) => (State::VerticalOperand, None),
                Some(Opcode::Horizontal) => (State::HorizontalHigh, None),
                None if word == BusWord::SENTINEL => (State::Opcode, None),
                Some(Opcode::Code) | None => {
                    self.dropped += 1;
                    (Self::after_sentinel(word), None)
                }
            },
            State::Wheel { erase } => (
                State::Advance {
                    erase,
                    wheel: word.low(),
                },
                None,
            ),
            State::Advance { erase, wheel } => {
                let advance = word.low();
                let command = if erase {
                    PrinterCommand::Erase { wheel, advance }
                } else {
                    PrinterCommand::Print { wheel, advance }
                };
                (State::Ground, Some(command))
            }
            State::VerticalOperand => {
                let raw = word.raw();
                let direction = if raw & DIRECTION_BIT != 0 {
                    Vertical::Up
                } else {
                    Vertical::Down
                };
                let command = PrinterCommand::Vertical {
                    direction,
                    micro_lines: (raw & 0x7F) as u8,
                };
                (State::Ground, Some(command))
            }
            State::HorizontalHigh => (State::HorizontalLow { high: word.raw() }, None),
            State::HorizontalLow { high } => {
                let direction = if high & DIRECTION_BIT != 0 {
                    Horizontal::Right
                } else {
                    Horizontal::Left
                };
                let command = PrinterCommand::Horizontal {
                    direction,
                    micro_spaces: ((high & 0x7) << 8) | u16::from(word.low()),
                };
                (State::Ground, Some(command))
            }
        };
        self.state = next;
        command
    }

    /// Words discarded because they did not fit any command.
    #[must_use]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    fn after_sentinel(word: BusWord) -> State {
        if word == BusWord::SENTINEL {
            State::Opcode
        } else {
            State::Ground
        }
    }
}
