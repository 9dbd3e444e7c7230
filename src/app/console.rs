//! ANSI Terminal Control
//!
//! Escape sequences for the console on stdout. Every helper writes to any
//! `fmt::Write`, normally [`super::stdout`].

use core::fmt::{self, Write};

/// Control Sequence Introducer.
const CSI: &str = "\u{1b}[";

/// A character cell on screen, counted from (0, 0) at the top left.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn origin() -> Self {
        Self { row: 0, col: 0 }
    }
}

/// A Select Graphic Rendition parameter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum SgrParam {
    Reset = 0,
    Bold = 1,
    Reverse = 7,
    NotBold = 22,
    NotReverse = 27,
    FgBlack = 30,
    FgRed = 31,
    FgGreen = 32,
    FgYellow = 33,
    FgBlue = 34,
    FgMagenta = 35,
    FgCyan = 36,
    FgWhite = 37,
    BgBlack = 40,
    BgRed = 41,
    BgGreen = 42,
    BgYellow = 43,
    BgBlue = 44,
    BgMagenta = 45,
    BgCyan = 46,
    BgWhite = 47,
}

/// Erase the whole screen.
pub fn clear_screen(out: &mut impl Write) -> fmt::Result {
    write!(out, "{}2J", CSI)
}

/// Show the cursor.
pub fn cursor_on(out: &mut impl Write) -> fmt::Result {
    write!(out, "{}?25h", CSI)
}

/// Hide the cursor.
pub fn cursor_off(out: &mut impl Write) -> fmt::Result {
    write!(out, "{}?25l", CSI)
}

/// Move the cursor. The terminal counts from 1, so add one to each axis.
pub fn move_cursor(out: &mut impl Write, pos: Position) -> fmt::Result {
    write!(out, "{}{};{}H", CSI, u16::from(pos.row) + 1, u16::from(pos.col) + 1)
}

/// Set one or more rendition parameters in a single sequence.
pub fn set_sgr<I>(out: &mut impl Write, params: I) -> fmt::Result
where
    I: IntoIterator<Item = SgrParam>,
{
    out.write_str(CSI)?;
    for (i, param) in params.into_iter().enumerate() {
        if i > 0 {
            out.write_char(';')?;
        }
        write!(out, "{}", param as u8)?;
    }
    out.write_char('m')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;

    #[test]
    fn test_sequences() {
        let mut out = String::new();
        clear_screen(&mut out).unwrap();
        cursor_off(&mut out).unwrap();
        cursor_on(&mut out).unwrap();
        assert_eq!(out, "\u{1b}[2J\u{1b}[?25l\u{1b}[?25h");
    }

    #[test]
    fn test_move_cursor_is_one_based() {
        let mut out = String::new();
        move_cursor(&mut out, Position::origin()).unwrap();
        move_cursor(&mut out, Position { row: 255, col: 9 }).unwrap();
        assert_eq!(out, "\u{1b}[1;1H\u{1b}[256;10H");
    }

    #[test]
    fn test_sgr() {
        let mut out = String::new();
        set_sgr(&mut out, [SgrParam::Bold, SgrParam::FgRed, SgrParam::BgBlue]).unwrap();
        set_sgr(&mut out, [SgrParam::Reset]).unwrap();
        assert_eq!(out, "\u{1b}[1;31;44m\u{1b}[0m");
    }
}
