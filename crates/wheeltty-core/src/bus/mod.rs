//! Wheelwriter internal bus.
//!
//! The Function Board (keyboard side) and the Printer Board (carriage and
//! printwheel side) exchange 9-bit words. Every command starts with the
//! sentinel `0x121`, followed by an opcode and that opcode's operands. Each
//! word is acknowledged by the receiver pulling the line low briefly.

pub mod command;
pub mod keys;
pub mod printwheel;

use std::fmt;

pub use command::{CommandParser, Horizontal, PrinterCommand, Vertical, Words};
pub use keys::{KeyDecoder, KeyEvent};

/// A 9-bit bus word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BusWord(u16);

impl BusWord {
    pub const MASK: u16 = 0x1FF;
    /// Starts every command.
    pub const SENTINEL: Self = Self(0x121);
    /// Keystroke acknowledge sent back to the Function Board.
    pub const ACK: Self = Self(0x000);

    /// Build a word from a raw unit, discarding bits above the ninth.
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw & Self::MASK)
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// The low eight bits.
    #[must_use]
    pub const fn low(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl From<u8> for BusWord {
    fn from(byte: u8) -> Self {
        Self(u16::from(byte))
    }
}

impl From<BusWord> for u16 {
    fn from(word: BusWord) -> Self {
        word.0
    }
}

impl fmt::Display for BusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X}", self.0)
    }
}

/// Command opcodes, the word after the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    Reset = 0x001,
    Print = 0x003,
    Erase = 0x004,
    Vertical = 0x005,
    Horizontal = 0x006,
    Spin = 0x007,
    /// Code-key chord reported by the Function Board.
    Code = 0x00E,
}

impl Opcode {
    #[must_use]
    pub const fn word(self) -> BusWord {
        BusWord(self as u16)
    }

    #[must_use]
    pub const fn from_word(word: BusWord) -> Option<Self> {
        Some(match word.0 {
            0x001 => Self::Reset,
            0x003 => Self::Print,
            0x004 => Self::Erase,
            0x005 => Self::Vertical,
            0x006 => Self::Horizontal,
            0x007 => Self::Spin,
            0x00E => Self::Code,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_nine_bits() {
        assert_eq!(BusWord::new(0xFFFF).raw(), 0x1FF);
        assert_eq!(BusWord::new(0x121).low(), 0x21);
        assert_eq!(BusWord::SENTINEL.to_string(), "121");
        assert_eq!(BusWord::from(0x0Au8).to_string(), "00A");
    }

    #[test]
    fn opcodes_round_trip() {
        for op in [
            Opcode::Reset,
            Opcode::Print,
            Opcode::Erase,
            Opcode::Vertical,
            Opcode::Horizontal,
            Opcode::Spin,
            Opcode::Code,
        ] {
            assert_eq!(Opcode::from_word(op.word()), Some(op));
        }
        assert_eq!(Opcode::from_word(BusWord::new(0x002)), None);
        assert_eq!(Opcode::from_word(BusWord::SENTINEL), None);
    }
}
