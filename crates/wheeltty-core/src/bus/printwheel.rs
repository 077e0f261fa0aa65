//! Printwheel position tables.
//!
//! A printwheel carries 96 petals. The bus addresses them by position code
//! (`0x01..=0x60`); code `0x00` is the blank used for spaces. The two tables
//! here convert between position codes and the ASCII character engraved on
//! the standard US wheel.
//!
//! Four ASCII characters are not engraved and are approximated: `>` and `<`
//! land on unassigned positions, `[` and `}` are swapped with each other.
//! These are the only positions that do not round-trip, see
//! [`KEYCAP_REMAPS`].

/// Position code of the underscore petal, struck over characters to
/// underline them.
pub const UNDERSCORE: u8 = 0x4F;

/// Highest petal position.
pub const MAX_CODE: u8 = 0x60;

/// Position codes whose character maps to a different position.
pub const KEYCAP_REMAPS: [u8; 4] = [0x25, 0x27, 0x41, 0x47];

/// Position code for each ASCII character `0x20..=0x7F`.
#[rustfmt::skip]
pub const ASCII_TO_PRINTWHEEL: [u8; 96] = [
    0x00, 0x49, 0x4B, 0x38, 0x37, 0x39, 0x3F, 0x4C, 0x23, 0x16, 0x36, 0x3B, 0x0C, 0x0E, 0x57, 0x28,
    0x30, 0x2E, 0x2F, 0x2C, 0x32, 0x31, 0x33, 0x35, 0x34, 0x2A, 0x4E, 0x50, 0x45, 0x4D, 0x46, 0x4A,
    0x3D, 0x20, 0x12, 0x1B, 0x1D, 0x1E, 0x11, 0x0F, 0x14, 0x1F, 0x21, 0x2B, 0x18, 0x24, 0x1A, 0x22,
    0x15, 0x3E, 0x17, 0x19, 0x1C, 0x10, 0x0D, 0x29, 0x2D, 0x26, 0x13, 0x41, 0x42, 0x40, 0x3A, 0x4F,
    0x3C, 0x01, 0x59, 0x05, 0x07, 0x60, 0x0A, 0x5A, 0x08, 0x5D, 0x56, 0x0B, 0x09, 0x04, 0x02, 0x5F,
    0x5C, 0x52, 0x03, 0x06, 0x5E, 0x5B, 0x53, 0x55, 0x51, 0x58, 0x54, 0x48, 0x43, 0x47, 0x44, 0x00,
];

/// ASCII character engraved at each position code; `0` where nothing is.
#[rustfmt::skip]
pub const PRINTWHEEL_TO_ASCII: [u8; 97] = [
    0x20, 0x61, 0x6E, 0x72, 0x6D, 0x63, 0x73, 0x64, 0x68, 0x6C, 0x66, 0x6B, 0x2C, 0x56, 0x2D, 0x47,
    0x55, 0x46, 0x42, 0x5A, 0x48, 0x50, 0x29, 0x52, 0x4C, 0x53, 0x4E, 0x43, 0x54, 0x44, 0x45, 0x49,
    0x41, 0x4A, 0x4F, 0x28, 0x4D, 0x3E, 0x59, 0x3C, 0x2F, 0x57, 0x39, 0x4B, 0x33, 0x58, 0x31, 0x32,
    0x30, 0x35, 0x34, 0x36, 0x38, 0x37, 0x2A, 0x24, 0x23, 0x25, 0x5E, 0x2B, 0x60, 0x40, 0x51, 0x26,
    0x5D, 0x7D, 0x5C, 0x7C, 0x7E, 0x00, 0x00, 0x5B, 0x7B, 0x21, 0x3F, 0x22, 0x27, 0x3D, 0x3A, 0x5F,
    0x3B, 0x78, 0x71, 0x76, 0x7A, 0x77, 0x6A, 0x2E, 0x79, 0x62, 0x67, 0x75, 0x70, 0x69, 0x74, 0x6F,
    0x65,
];

/// Position code for a printable ASCII character. Space maps to the blank
/// position `0x00`; control characters and DEL have no position.
#[must_use]
pub fn printwheel_from_ascii(ascii: u8) -> Option<u8> {
    match ascii {
        0x20..=0x7E => Some(ASCII_TO_PRINTWHEEL[usize::from(ascii - 0x20)]),
        _ => None,
    }
}

/// ASCII character at a position code, `None` for unassigned positions and
/// codes past the last petal.
#[must_use]
pub fn ascii_from_printwheel(code: u8) -> Option<u8> {
    match PRINTWHEEL_TO_ASCII.get(usize::from(code)) {
        Some(0) | None => None,
        Some(&ascii) => Some(ascii),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_space() {
        assert_eq!(printwheel_from_ascii(b' '), Some(0x00));
        assert_eq!(printwheel_from_ascii(b'a'), Some(0x01));
        assert_eq!(printwheel_from_ascii(b'A'), Some(0x20));
        assert_eq!(printwheel_from_ascii(b'_'), Some(UNDERSCORE));
        assert_eq!(ascii_from_printwheel(0x00), Some(b' '));
        assert_eq!(ascii_from_printwheel(0x60), Some(b'e'));
    }

    #[test]
    fn control_characters_have_no_position() {
        assert_eq!(printwheel_from_ascii(b'\r'), None);
        assert_eq!(printwheel_from_ascii(0x7F), None);
        assert_eq!(printwheel_from_ascii(0xC1), None);
    }

    #[test]
    fn unassigned_positions() {
        assert_eq!(ascii_from_printwheel(0x45), None);
        assert_eq!(ascii_from_printwheel(0x46), None);
        assert_eq!(ascii_from_printwheel(0x61), None);
    }

    #[test]
    fn round_trip_except_keycap_remaps() {
        let mut mismatches = Vec::new();
        for code in 0..=MAX_CODE {
            let Some(ascii) = ascii_from_printwheel(code) else {
                continue;
            };
            if printwheel_from_ascii(ascii) != Some(code) {
                mismatches.push(code);
            }
        }
        assert_eq!(mismatches, KEYCAP_REMAPS.to_vec());
    }

    #[test]
    fn every_printable_character_has_a_position() {
        for ascii in 0x20..=0x7Eu8 {
            let code = printwheel_from_ascii(ascii).unwrap();
            assert!(code <= MAX_CODE, "{ascii:#04x} -> {code:#04x}");
        }
    }
}
