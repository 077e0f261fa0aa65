//! Keystroke decoding.
//!
//! The Function Board does not report key codes. It issues the same print
//! and motion commands it would send to the Printer Board, so a keystroke
//! has to be recovered from the command it produced: a print command names
//! the petal of the struck character, a one-character move right is a
//! space, a full-line paper feed is the Return key. Code-key chords arrive
//! as their own opcode and map to ASCII control characters.

use super::printwheel::ascii_from_printwheel;
use super::{BusWord, Opcode};
use crate::bus::command::DIRECTION_BIT;
use crate::pitch::Pitch;

const BS: u8 = 0x08;
const HT: u8 = 0x09;
const SP: u8 = 0x20;

/// Operand of the Code+Erase chord.
pub const CODE_ERASE: u8 = 0x4F;

/// What a completed bus sequence means to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEvent {
    /// A character or control character typed at the keyboard.
    Char(u8),
    /// The Return key. Carries the vertical operand the Function Board sent
    /// so it can be passed through to the printer in local mode.
    Return(BusWord),
    /// Paper moved by the platen knob or the index keys.
    PaperMotion(BusWord),
    /// Code+Erase: switch between local and line mode.
    ModeToggle,
}

impl KeyEvent {
    /// ASCII the host should receive for this event, if any.
    #[must_use]
    pub const fn ascii(self) -> Option<u8> {
        match self {
            Self::Char(c) => Some(c),
            Self::Return(_) => Some(b'\r'),
            Self::PaperMotion(_) | Self::ModeToggle => None,
        }
    }
}

/// Control character produced by Code plus the key whose operand is `key`.
#[must_use]
pub const fn code_key(key: u8) -> Option<KeyEvent> {
    let c = match key & 0x7F {
        0x02 => 0x11, // Q: DC1
        0x04 => 0x01, // A: SOH
        0x06 => 0x1A, // Z: SUB
        0x0A => 0x17, // W: ETB
        0x0C => 0x13, // S: DC3
        0x0E => 0x18, // X: CAN
        0x12 => 0x05, // E: ENQ
        0x14 => 0x04, // D: EOT
        0x16 => 0x03, // C: ETX
        0x1A => 0x12, // R: DC2
        0x1B => 0x14, // T: DC4
        0x1C => 0x06, // F: ACK
        0x1D => 0x07, // G: BEL
        0x1E => 0x16, // V: SYN
        0x1F => 0x02, // B: STX
        0x22 => 0x15, // U: NAK
        0x23 => 0x19, // Y: EM
        0x24 => 0x0A, // J: LF
        0x25 => 0x08, // H: BS
        0x26 => 0x0D, // M: CR
        0x2A => 0x09, // I: HT
        0x2C => 0x0B, // K: VT
        0x32 => 0x0F, // O: SI
        0x34 => 0x0C, // L: FF
        0x3A => 0x10, // P: DLE
        0x48 => 0x1B, // Mar Rel: ESC
        0x76 => 0x0E, // N: SO
        CODE_ERASE => return Some(KeyEvent::ModeToggle),
        _ => return None,
    };
    Some(KeyEvent::Char(c))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Idle,
    Sentinel,
    Character,
    Vertical,
    Horizontal,
    Right { high: u16 },
    Left { high: u16 },
    Code,
}

/// Word-at-a-time keystroke decoder.
///
/// Any word that does not continue the current sequence drops the sequence
/// and returns to idle. A dropped sequence is not retried; the keystroke is
/// lost, as it is on the typewriter itself when the bus glitches.
#[derive(Debug, Clone, Default)]
pub struct KeyDecoder {
    state: State,
    desyncs: u32,
}

impl KeyDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one word. `pitch` sizes the motion commands that stand for
    /// Space, Backspace, Tab and Return.
    pub fn decode(&mut self, word: BusWord, pitch: Pitch) -> Option<KeyEvent> {
        let raw = word.raw();
        let spc = u16::from(pitch.micro_spaces_per_char);
        let (next, event) = match self.state {
            State::Idle => {
                if word == BusWord::SENTINEL {
                    (State::Sentinel, None)
                } else {
                    (State::Idle, None)
                }
            }
            State::Sentinel => match Opcode::from_word(word) {
                Some(Opcode::Print) => (State::Character, None),
                Some(Opcode::Vertical) => (State::Vertical, None),
                Some(Opcode::Horizontal) => (State::Horizontal, None),
                Some(Opcode::Code) => (State::Code, None),
                Some(Opcode::Reset | Opcode::Erase | Opcode::Spin) => (State::Idle, None),
                None => {
                    self.desyncs += 1;
                    tracing::trace!(word = %word, "key decoder desync");
                    (State::Idle, None)
                }
            },
            State::Character => (
                State::Idle,
                ascii_from_printwheel(word.low()).map(KeyEvent::Char),
            ),
            State::Vertical => {
                let full_line_up = raw & DIRECTION_BIT != 0
                    && raw & 0x1F == u16::from(pitch.micro_lines_per_line);
                let event = if full_line_up {
                    KeyEvent::Return(word)
                } else {
                    KeyEvent::PaperMotion(word)
                };
                (State::Idle, Some(event))
            }
            State::Horizontal => {
                let high = raw & 0x7;
                if raw & DIRECTION_BIT != 0 {
                    (State::Right { high }, None)
                } else {
                    (State::Left { high }, None)
                }
            }
            State::Right { high } => {
                let magnitude = (high << 8) | u16::from(word.low());
                let event = if magnitude == spc {
                    Some(KeyEvent::Char(SP))
                } else if magnitude > spc && magnitude < spc * 10 {
                    Some(KeyEvent::Char(HT))
                } else {
                    None
                };
                (State::Idle, event)
            }
            State::Left { high } => {
                let magnitude = (high << 8) | u16::from(word.low());
                let event = (magnitude == spc).then_some(KeyEvent::Char(BS));
                (State::Idle, event)
            }
            State::Code => (State::Idle, code_key(word.low())),
        };
        self.state = next;
        event
    }

    /// Sentinels followed by an opcode the decoder does not know.
    #[must_use]
    pub fn desyncs(&self) -> u32 {
        self.desyncs
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    pub fn reset(&mut self) {
        self.state = State::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(units: &[u16], pitch: Pitch) -> Vec<KeyEvent> {
        let mut decoder = KeyDecoder::new();
        units
            .iter()
            .filter_map(|&u| decoder.decode(BusWord::new(u), pitch))
            .collect()
    }

    // ── Character keys ────────────────────────────────────────────────

    #[test]
    fn character_key_decodes_on_wheel_code() {
        let mut decoder = KeyDecoder::new();
        let pitch = Pitch::ELITE;
        assert_eq!(decoder.decode(BusWord::SENTINEL, pitch), None);
        assert_eq!(decoder.decode(BusWord::new(0x003), pitch), None);
        assert_eq!(
            decoder.decode(BusWord::new(0x020), pitch),
            Some(KeyEvent::Char(b'A'))
        );
        assert!(decoder.is_idle());
        // Trailing advance word is ignored.
        assert_eq!(decoder.decode(BusWord::new(0x00A), pitch), None);
    }

    #[test]
    fn typed_word() {
        let units = [
            0x121, 0x003, 0x08, 0x0A, // h
            0x121, 0x003, 0x5D, 0x0A, // i
            0x121, 0x003, 0x49, 0x0A, // !
        ];
        let text: Vec<u8> = decode_all(&units, Pitch::ELITE)
            .into_iter()
            .filter_map(KeyEvent::ascii)
            .collect();
        assert_eq!(text, b"hi!");
    }

    #[test]
    fn unassigned_petal_is_no_event() {
        assert!(decode_all(&[0x121, 0x003, 0x045], Pitch::ELITE).is_empty());
    }

    // ── Motion keys ───────────────────────────────────────────────────

    #[test]
    fn space_tab_backspace_follow_pitch() {
        let pitch = Pitch::PICA;
        let events = decode_all(
            &[
                0x121, 0x006, 0x080, 12, // one char right
                0x121, 0x006, 0x080, 36, // three chars right
                0x121, 0x006, 0x000, 12, // one char left
                0x121, 0x006, 0x080, 10, // less than a char
                0x121, 0x006, 0x080, 120, // ten chars is not a tab
            ],
            pitch,
        );
        assert_eq!(
            events,
            vec![
                KeyEvent::Char(b' '),
                KeyEvent::Char(b'\t'),
                KeyEvent::Char(0x08)
            ]
        );
    }

    #[test]
    fn long_tab_uses_high_bits() {
        let pitch = Pitch::MICRO_ELITE;
        // 8 * 9 = 72 fits in the low byte; check the high byte is honored.
        let events = decode_all(&[0x121, 0x006, 0x081, 0x000], pitch);
        assert!(events.is_empty());
        let events = decode_all(&[0x121, 0x006, 0x080, 72], pitch);
        assert_eq!(events, vec![KeyEvent::Char(b'\t')]);
    }

    #[test]
    fn full_line_up_is_return() {
        let events = decode_all(&[0x121, 0x005, 0x090, 0x121, 0x005, 0x088], Pitch::ELITE);
        assert_eq!(
            events,
            vec![
                KeyEvent::Return(BusWord::new(0x090)),
                KeyEvent::PaperMotion(BusWord::new(0x088))
            ]
        );
        assert_eq!(events[0].ascii(), Some(b'\r'));
        assert_eq!(events[1].ascii(), None);
    }

    #[test]
    fn return_matches_current_line_height() {
        // 16 micro-lines is a full line at elite but not at micro elite.
        let events = decode_all(&[0x121, 0x005, 0x090], Pitch::MICRO_ELITE);
        assert_eq!(events, vec![KeyEvent::PaperMotion(BusWord::new(0x090))]);
        let events = decode_all(&[0x121, 0x005, 0x08C], Pitch::MICRO_ELITE);
        assert_eq!(events, vec![KeyEvent::Return(BusWord::new(0x08C))]);
    }

    #[test]
    fn paper_down_is_motion() {
        let events = decode_all(&[0x121, 0x005, 0x010], Pitch::ELITE);
        assert_eq!(events, vec![KeyEvent::PaperMotion(BusWord::new(0x010))]);
    }

    // ── Code key ──────────────────────────────────────────────────────

    #[test]
    fn code_c_is_etx() {
        let events = decode_all(&[0x121, 0x00E, 0x016], Pitch::ELITE);
        assert_eq!(events, vec![KeyEvent::Char(0x03)]);
    }

    #[test]
    fn code_erase_toggles_mode() {
        let events = decode_all(&[0x121, 0x00E, 0x04F], Pitch::ELITE);
        assert_eq!(events, vec![KeyEvent::ModeToggle]);
    }

    #[test]
    fn code_key_ignores_bit_seven() {
        assert_eq!(code_key(0x80 | 0x48), Some(KeyEvent::Char(0x1B)));
        assert_eq!(code_key(0x01), None);
    }

    // ── Desynchronization ─────────────────────────────────────────────

    #[test]
    fn deviation_returns_to_idle() {
        let mut decoder = KeyDecoder::new();
        let pitch = Pitch::ELITE;
        for unit in [0x121, 0x004] {
            assert_eq!(decoder.decode(BusWord::new(unit), pitch), None);
        }
        assert!(decoder.is_idle());
        assert_eq!(decoder.desyncs(), 0);

        for unit in [0x121, 0x0AA] {
            assert_eq!(decoder.decode(BusWord::new(unit), pitch), None);
        }
        assert!(decoder.is_idle());
        assert_eq!(decoder.desyncs(), 1);
    }

    #[test]
    fn stray_words_in_idle_are_ignored() {
        let events = decode_all(&[0x000, 0x020, 0x0FF, 0x121, 0x003, 0x01], Pitch::ELITE);
        assert_eq!(events, vec![KeyEvent::Char(b'a')]);
    }
}
