//! Diablo 630 print engine.
//!
//! Turns a console byte stream into printer-bound bus words. Printable
//! characters are struck with the active attributes, control characters
//! move the carriage or paper, and `ESC` introduces the Diablo-style
//! commands for bold, underline, pitch, half and micro line motion.
//!
//! The engine mirrors the carriage position (column and micro-space count)
//! so that carriage returns, backspaces and tabs can be expressed as the
//! relative moves the Printer Board understands, and so that a line running
//! past the right stop is returned automatically.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::bus::command::{self, Horizontal, Vertical, Words};
use crate::bus::printwheel::{UNDERSCORE, printwheel_from_ascii};
use crate::pitch::Pitch;

/// Micro-space position past which the carriage is returned automatically.
pub const RIGHT_STOP: u16 = 1450;

const NUL: u8 = 0x00;
const BEL: u8 = 0x07;
const BS: u8 = 0x08;
const HT: u8 = 0x09;
const LF: u8 = 0x0A;
const VT: u8 = 0x0B;
const CR: u8 = 0x0D;
const ESC: u8 = 0x1B;
const SP: u8 = 0x20;

bitflags! {
    /// Print attributes applied to each struck character.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u8 {
        const BOLD                 = 1 << 0;
        /// Underline characters and spaces.
        const CONTINUOUS_UNDERLINE = 1 << 1;
        /// Underline characters only.
        const BROKEN_UNDERLINE     = 1 << 2;
    }
}

impl Attributes {
    pub const UNDERLINE: Self = Self::CONTINUOUS_UNDERLINE.union(Self::BROKEN_UNDERLINE);

    /// Whether `ascii` gets an underscore struck over it.
    #[must_use]
    pub fn underlines(self, ascii: u8) -> bool {
        self.intersects(Self::UNDERLINE)
            && (ascii != SP || self.contains(Self::CONTINUOUS_UNDERLINE))
    }
}

/// Escape interpreter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EscapeState {
    #[default]
    Normal,
    /// `ESC` seen, waiting for the command character.
    Escape,
    /// `ESC l` seen, waiting for the auto line feed flag.
    AutoLineFeed,
    /// `ESC c` seen, waiting for the auto carriage return flag.
    AutoReturn,
    /// The control summary was requested. Space asks for the extended page,
    /// `ESC` dismisses.
    HelpWait,
}

/// Help pages the engine can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelpPage {
    Controls,
    Extended,
}

/// Mirror of the carriage position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Carriage {
    /// 1-based column at the current pitch.
    pub column: u16,
    /// Distance from the left margin in micro-spaces.
    pub micro_spaces: u16,
}

impl Default for Carriage {
    fn default() -> Self {
        Self {
            column: 1,
            micro_spaces: 0,
        }
    }
}

/// Everything one or more input bytes produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Emission {
    /// Printer-bound words, in order.
    pub words: Words,
    /// Bytes to echo back to the console.
    pub echo: SmallVec<[u8; 8]>,
    /// A help page to show.
    pub help: Option<HelpPage>,
    /// Number of automatic carriage returns at the right stop.
    pub margin_returns: u32,
}

impl Emission {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
            && self.echo.is_empty()
            && self.help.is_none()
            && self.margin_returns == 0
    }
}

/// Byte-at-a-time Diablo 630 interpreter.
#[derive(Debug, Clone, Default)]
pub struct PrintEngine {
    state: EscapeState,
    attributes: Attributes,
    carriage: Carriage,
    pitch: Pitch,
    auto_line_feed: bool,
    auto_return: bool,
}

impl PrintEngine {
    #[must_use]
    pub fn new(pitch: Pitch) -> Self {
        Self {
            pitch,
            ..Self::default()
        }
    }

    /// Interpret a run of bytes.
    #[must_use]
    pub fn feed(&mut self, bytes: &[u8]) -> Emission {
        let mut out = Emission::default();
        for &b in bytes {
            self.advance(b, &mut out);
        }
        out
    }

    /// Interpret one byte, appending what it produces to `out`.
    pub fn advance(&mut self, byte: u8, out: &mut Emission) {
        match self.state {
            EscapeState::Normal => self.normal(byte, out),
            EscapeState::Escape => {
                self.state = EscapeState::Normal;
                self.escape(byte, out);
            }
            EscapeState::AutoLineFeed => {
                self.auto_line_feed = byte & 0x01 != 0;
                self.state = EscapeState::Normal;
            }
            EscapeState::AutoReturn => {
                self.auto_return = byte & 0x01 != 0;
                self.state = EscapeState::Normal;
            }
            EscapeState::HelpWait => match byte {
                SP => {
                    out.help = Some(HelpPage::Extended);
                    self.state = EscapeState::Normal;
                }
                ESC => {
                    out.echo.push(CR);
                    self.state = EscapeState::Normal;
                }
                _ => {}
            },
        }
    }

    fn normal(&mut self, byte: u8, out: &mut Emission) {
        match byte {
            NUL => {}
            BEL => {
                command::spin(&mut out.words);
                out.echo.push(BEL);
            }
            BS => {
                if self.carriage.column > 1 {
                    self.backspace(out);
                }
            }
            HT => self.tab(out),
            LF => {
                if self.auto_return {
                    self.carriage_return(out);
                }
                self.line_feed(out);
                out.echo.push(LF);
            }
            VT => {
                self.line_feed(out);
                out.echo.push(LF);
            }
            CR => {
                self.carriage_return(out);
                self.attributes = Attributes::empty();
                if self.auto_line_feed {
                    self.line_feed(out);
                }
                out.echo.push(CR);
            }
            ESC => self.state = EscapeState::Escape,
            0x20..=0x7E => {
                self.carriage.column = self.carriage.column.saturating_add(1);
                self.print(byte, out);
                out.echo.push(byte);
            }
            _ => {}
        }
    }

    fn escape(&mut self, byte: u8, out: &mut Emission) {
        tracing::debug!(command = %char::from(byte).escape_default(), "escape command");
        let half = self.pitch.half_line();
        let micro = self.pitch.micro_line();
        match byte {
            b'O' => self.attributes.insert(Attributes::BOLD),
            b'&' => self.attributes.remove(Attributes::BOLD),
            b'E' => self.attributes.insert(Attributes::CONTINUOUS_UNDERLINE),
            b'b' => self.attributes.insert(Attributes::BROKEN_UNDERLINE),
            b'R' => self.attributes.remove(Attributes::UNDERLINE),
            b'X' => self.attributes = Attributes::empty(),
            b'U' => command::vertical(&mut out.words, Vertical::Up, half),
            b'D' => command::vertical(&mut out.words, Vertical::Down, half),
            b'u' => command::vertical(&mut out.words, Vertical::Up, micro),
            b'd' => command::vertical(&mut out.words, Vertical::Down, micro),
            LF => {
                let line = self.pitch.micro_lines_per_line;
                command::vertical(&mut out.words, Vertical::Down, line);
            }
            BS => {
                if self.carriage.micro_spaces > 0 {
                    command::horizontal(&mut out.words, Horizontal::Left, 1);
                    self.carriage.micro_spaces -= 1;
                }
            }
            b'e' => self.pitch = Pitch::ELITE,
            b'p' => self.pitch = Pitch::PICA,
            b'm' => self.pitch = Pitch::MICRO_ELITE,
            b'l' => self.state = EscapeState::AutoLineFeed,
            b'c' => self.state = EscapeState::AutoReturn,
            b'h' | b'H' => {
                out.help = Some(HelpPage::Controls);
                self.state = EscapeState::HelpWait;
            }
            _ => {}
        }
    }

    fn print(&mut self, ascii: u8, out: &mut Emission) {
        let Some(wheel) = printwheel_from_ascii(ascii) else {
            return;
        };
        let spc = self.pitch.micro_spaces_per_char;
        let words = &mut out.words;
        command::strike(words, wheel);
        if self.attributes.underlines(ascii) {
            command::advance(words, 0);
            command::strike(words, UNDERSCORE);
        }
        if self.attributes.contains(Attributes::BOLD) {
            command::advance(words, 1);
            command::strike(words, wheel);
            command::advance(words, spc.saturating_sub(1));
        } else {
            command::advance(words, spc);
        }
        self.carriage.micro_spaces = self.carriage.micro_spaces.saturating_add(u16::from(spc));
        self.check_right_stop(out);
    }

    fn tab(&mut self, out: &mut Emission) {
        let stop = u16::from(self.pitch.tab_stop.max(1));
        let spaces = stop - self.carriage.column % stop;
        let distance = spaces * u16::from(self.pitch.micro_spaces_per_char);
        command::horizontal(&mut out.words, Horizontal::Right, distance);
        self.carriage.micro_spaces = self.carriage.micro_spaces.saturating_add(distance);
        self.carriage.column = self.carriage.column.saturating_add(spaces);
        out.echo.extend(std::iter::repeat_n(SP, usize::from(spaces)));
        self.check_right_stop(out);
    }

    fn backspace(&mut self, out: &mut Emission) {
        // Never travel past the margin, even after micro-backspaces.
        let distance = u16::from(self.pitch.micro_spaces_per_char).min(self.carriage.micro_spaces);
        if distance > 0 {
            command::horizontal(&mut out.words, Horizontal::Left, distance);
        }
        self.carriage.micro_spaces -= distance;
        self.carriage.column -= 1;
    }

    fn carriage_return(&mut self, out: &mut Emission) {
        if self.carriage.micro_spaces > 0 {
            command::horizontal(&mut out.words, Horizontal::Left, self.carriage.micro_spaces);
        }
        self.carriage = Carriage::default();
    }

    fn line_feed(&mut self, out: &mut Emission) {
        command::vertical(&mut out.words, Vertical::Up, self.pitch.micro_lines_per_line);
    }

    fn check_right_stop(&mut self, out: &mut Emission) {
        if self.carriage.micro_spaces > RIGHT_STOP {
            tracing::debug!(
                micro_spaces = self.carriage.micro_spaces,
                "right stop reached, returning carriage"
            );
            self.carriage_return(out);
            out.margin_returns += 1;
        }
    }

    /// Audible and visible cue for a mode change: spin the wheel and nudge
    /// the paper up and back down by half a line.
    pub fn mode_cue(&self, out: &mut Emission) {
        let half = self.pitch.half_line();
        command::spin(&mut out.words);
        command::vertical(&mut out.words, Vertical::Up, half);
        command::vertical(&mut out.words, Vertical::Down, half);
    }

    #[must_use]
    pub fn state(&self) -> EscapeState {
        self.state
    }

    #[must_use]
    pub fn attributes(&self) -> Attributes {
        self.attributes
    }

    #[must_use]
    pub fn carriage(&self) -> Carriage {
        self.carriage
    }

    #[must_use]
    pub fn column(&self) -> u16 {
        self.carriage.column
    }

    #[must_use]
    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// Replace the pitch profile, as the handshake does once the printwheel
    /// is known.
    pub fn set_pitch(&mut self, pitch: Pitch) {
        self.pitch = pitch;
    }

    #[must_use]
    pub fn auto_line_feed(&self) -> bool {
        self.auto_line_feed
    }

    #[must_use]
    pub fn auto_return(&self) -> bool {
        self.auto_return
    }

    /// Back to power-on state, keeping the pitch.
    pub fn reset(&mut self) {
        *self = Self::new(self.pitch);
    }
}
