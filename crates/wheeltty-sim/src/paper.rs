//! A sheet of paper that printer commands are typed onto.
//!
//! Position is tracked in micro-spaces and micro-lines exactly as the
//! printer moves; cells are the character grid at the wheel's pitch.
//! Overstrikes accumulate in a cell, so bold shows as a strike count and
//! underline as a flag next to the glyph.

use std::collections::BTreeMap;

use wheeltty_core::Pitch;
use wheeltty_core::bus::command::{Horizontal, PrinterCommand, Vertical};
use wheeltty_core::bus::printwheel::ascii_from_printwheel;

/// What has been struck into one character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Impression {
    /// Last non-underscore glyph, or `_` if only underscores were struck.
    pub glyph: char,
    pub strikes: u8,
    pub underlined: bool,
}

impl Impression {
    fn strike(&mut self, glyph: char) {
        self.strikes = self.strikes.saturating_add(1);
        if glyph == '_' {
            self.underlined = true;
            if self.glyph == '\0' {
                self.glyph = '_';
            }
        } else {
            self.glyph = glyph;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Paper {
    pitch: Pitch,
    x: u32,
    y: u32,
    cells: BTreeMap<(u32, u32), Impression>,
}

impl Paper {
    #[must_use]
    pub fn new(pitch: Pitch) -> Self {
        Self {
            pitch,
            x: 0,
            y: 0,
            cells: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn pitch(&self) -> Pitch {
        self.pitch
    }

    /// Carriage position in micro-spaces from the left margin.
    #[must_use]
    pub fn carriage(&self) -> u32 {
        self.x
    }

    /// Paper position in micro-lines from the first line.
    #[must_use]
    pub fn feed(&self) -> u32 {
        self.y
    }

    /// Zero-based `(row, column)` the carriage is over.
    #[must_use]
    pub fn cursor(&self) -> (u32, u32) {
        (self.row(), self.column())
    }

    fn row(&self) -> u32 {
        self.y / u32::from(self.pitch.micro_lines_per_line.max(1))
    }

    fn column(&self) -> u32 {
        self.x / u32::from(self.pitch.micro_spaces_per_char.max(1))
    }

    pub fn apply(&mut self, command: PrinterCommand) {
        match command {
            PrinterCommand::Reset => self.x = 0,
            PrinterCommand::Print { wheel, advance } => {
                if let Some(ascii) = ascii_from_printwheel(wheel)
                    && ascii != b' '
                {
                    let at = (self.row(), self.column());
                    self.cells.entry(at).or_default().strike(char::from(ascii));
                }
                self.x += u32::from(advance);
            }
            PrinterCommand::Erase { advance, .. } => {
                self.cells.remove(&(self.row(), self.column()));
                self.x += u32::from(advance);
            }
            PrinterCommand::Horizontal {
                direction,
                micro_spaces,
            } => {
                let distance = u32::from(micro_spaces);
                self.x = match direction {
                    Horizontal::Right => self.x + distance,
                    Horizontal::Left => self.x.saturating_sub(distance),
                };
            }
            PrinterCommand::Vertical {
                direction,
                micro_lines,
            } => {
                let distance = u32::from(micro_lines);
                self.y = match direction {
                    Vertical::Up => self.y + distance,
                    Vertical::Down => self.y.saturating_sub(distance),
                };
            }
            PrinterCommand::Spin => {}
        }
    }

    #[must_use]
    pub fn impression(&self, row: u32, column: u32) -> Option<Impression> {
        self.cells.get(&(row, column)).copied()
    }

    /// The sheet as text, one line per row, trailing blanks trimmed.
    #[must_use]
    pub fn text(&self) -> String {
        let Some(&(last_row, _)) = self.cells.keys().next_back() else {
            return String::new();
        };
        let mut out = String::new();
        for row in 0..=last_row {
            let mut line = String::new();
            for (&(_, column), cell) in self.cells.range((row, 0)..=(row, u32::MAX)) {
                let column = column as usize;
                let pad = column.saturating_sub(line.chars().count());
                line.extend(std::iter::repeat_n(' ', pad));
                line.push(cell.glyph);
            }
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print(wheel: u8, advance: u8) -> PrinterCommand {
        PrinterCommand::Print { wheel, advance }
    }

    #[test]
    fn prints_advance_the_carriage() {
        let mut paper = Paper::new(Pitch::ELITE);
        paper.apply(print(0x20, 10));
        paper.apply(print(0x12, 10));
        assert_eq!(paper.text(), "AB\n");
        assert_eq!(paper.cursor(), (0, 2));
    }

    #[test]
    fn bold_is_two_strikes_in_one_cell() {
        let mut paper = Paper::new(Pitch::ELITE);
        paper.apply(print(0x20, 1));
        paper.apply(print(0x20, 9));
        let cell = paper.impression(0, 0).unwrap();
        assert_eq!(cell.glyph, 'A');
        assert_eq!(cell.strikes, 2);
        assert_eq!(paper.carriage(), 10);
    }

    #[test]
    fn underscore_marks_underline_but_keeps_glyph() {
        let mut paper = Paper::new(Pitch::ELITE);
        paper.apply(print(0x20, 0));
        paper.apply(print(0x4F, 10));
        let cell = paper.impression(0, 0).unwrap();
        assert_eq!(cell.glyph, 'A');
        assert!(cell.underlined);
    }

    #[test]
    fn line_feed_and_return_start_a_new_row() {
        let mut paper = Paper::new(Pitch::PICA);
        paper.apply(print(0x01, 12));
        paper.apply(PrinterCommand::Horizontal {
            direction: Horizontal::Left,
            micro_spaces: 12,
        });
        paper.apply(PrinterCommand::Vertical {
            direction: Vertical::Up,
            micro_lines: 32,
        });
        paper.apply(print(0x59, 12));
        assert_eq!(paper.text(), "a\n\nb\n");
    }

    #[test]
    fn motion_never_goes_past_the_edges() {
        let mut paper = Paper::new(Pitch::ELITE);
        paper.apply(PrinterCommand::Horizontal {
            direction: Horizontal::Left,
            micro_spaces: 100,
        });
        paper.apply(PrinterCommand::Vertical {
            direction: Vertical::Down,
            micro_lines: 8,
        });
        assert_eq!((paper.carriage(), paper.feed()), (0, 0));
    }

    #[test]
    fn erase_clears_the_cell() {
        let mut paper = Paper::new(Pitch::ELITE);
        paper.apply(print(0x20, 0));
        paper.apply(PrinterCommand::Erase {
            wheel: 0x20,
            advance: 10,
        });
        assert_eq!(paper.impression(0, 0), None);
        assert_eq!(paper.text(), "");
    }
}
