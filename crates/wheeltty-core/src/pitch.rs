//! Character pitch and printwheel identification.

use std::fmt;

use crate::bus::BusWord;

/// Carriage and paper geometry for the mounted printwheel.
///
/// A micro-space is 1/120 inch, a micro-line 1/96 inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub micro_spaces_per_char: u8,
    pub micro_lines_per_line: u8,
    /// Tab stops fall on every `tab_stop`-th column.
    pub tab_stop: u8,
}

impl Pitch {
    /// 10 characters per inch.
    pub const PICA: Self = Self::new(12, 16, 5);
    /// 12 characters per inch.
    pub const ELITE: Self = Self::new(10, 16, 6);
    /// 15 characters per inch on a tighter line.
    pub const MICRO_ELITE: Self = Self::new(8, 12, 7);
    /// Proportional wheels are driven at elite spacing with pica tabs.
    pub const PROPORTIONAL: Self = Self::new(10, 16, 5);

    #[must_use]
    pub const fn new(micro_spaces_per_char: u8, micro_lines_per_line: u8, tab_stop: u8) -> Self {
        Self {
            micro_spaces_per_char,
            micro_lines_per_line,
            tab_stop,
        }
    }

    #[must_use]
    pub const fn half_line(self) -> u8 {
        self.micro_lines_per_line >> 1
    }

    #[must_use]
    pub const fn micro_line(self) -> u8 {
        self.micro_lines_per_line >> 3
    }
}

impl Default for Pitch {
    fn default() -> Self {
        Self::ELITE
    }
}

/// Printwheel reported by the Printer Board in answer to a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Printwheel {
    Proportional,
    FifteenPitch,
    TwelvePitch,
    /// The carrier is empty.
    Missing,
    TenPitch,
    /// A reply that names no known wheel.
    Unknown(BusWord),
}

impl Printwheel {
    #[must_use]
    pub const fn from_reply(reply: BusWord) -> Self {
        match reply.raw() {
            0x008 => Self::Proportional,
            0x010 => Self::FifteenPitch,
            0x020 => Self::TwelvePitch,
            0x021 => Self::Missing,
            0x040 => Self::TenPitch,
            _ => Self::Unknown(reply),
        }
    }

    /// The reply word the Printer Board sends for this wheel.
    #[must_use]
    pub const fn reply(self) -> BusWord {
        match self {
            Self::Proportional => BusWord::new(0x008),
            Self::FifteenPitch => BusWord::new(0x010),
            Self::TwelvePitch => BusWord::new(0x020),
            Self::Missing => BusWord::new(0x021),
            Self::TenPitch => BusWord::new(0x040),
            Self::Unknown(word) => word,
        }
    }

    /// Geometry to use with this wheel. Anything unrecognized, including an
    /// empty carrier, runs at the 12-pitch default.
    #[must_use]
    pub const fn pitch(self) -> Pitch {
        match self {
            Self::Proportional => Pitch::PROPORTIONAL,
            Self::FifteenPitch => Pitch::MICRO_ELITE,
            Self::TenPitch => Pitch::PICA,
            Self::TwelvePitch | Self::Missing | Self::Unknown(_) => Pitch::ELITE,
        }
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Printwheel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proportional => f.write_str("PS"),
            Self::FifteenPitch => f.write_str("15P"),
            Self::TwelvePitch => f.write_str("12P"),
            Self::Missing => f.write_str("no printwheel"),
            Self::TenPitch => f.write_str("10P"),
            Self::Unknown(word) => write!(f, "unknown ({word})"),
        }
    }
}
