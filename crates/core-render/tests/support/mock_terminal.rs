//! A `Vec<u8>`-backed [`TerminalSink`] for tests: records the exact ANSI
//! byte stream a Display Engine would emit, without a live TTY.

use anyhow::Result;
use core_terminal::TerminalSink;
use crossterm::style::Color;
use std::io::Write;

#[derive(Default)]
pub struct MockTerminal {
    pub out: Vec<u8>,
    pub raw_mode: bool,
}

impl MockTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.out)
    }
}

impl TerminalSink for MockTerminal {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    fn clear_to_end_of_line(&mut self) -> Result<()> {
        self.out.write_all(b"\x1b[K")?;
        Ok(())
    }

    fn clear_to_end_of_screen(&mut self) -> Result<()> {
        self.out.write_all(b"\x1b[J")?;
        Ok(())
    }

    fn clear_line(&mut self) -> Result<()> {
        self.out.write_all(b"\x1b[2K")?;
        Ok(())
    }

    fn move_to(&mut self, row: u16, col: u16) -> Result<()> {
        write!(self.out, "\x1b[{};{}H", row + 1, col + 1)?;
        Ok(())
    }

    fn move_up(&mut self, n: u16) -> Result<()> {
        if n > 0 {
            write!(self.out, "\x1b[{n}A")?;
        }
        Ok(())
    }

    fn move_down(&mut self, n: u16) -> Result<()> {
        if n > 0 {
            write!(self.out, "\x1b[{n}B")?;
        }
        Ok(())
    }

    fn move_to_column(&mut self, col: u16) -> Result<()> {
        write!(self.out, "\x1b[{}G", col + 1)?;
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<()> {
        self.out.write_all(b"\x1b[?25l")?;
        Ok(())
    }

    fn show_cursor(&mut self) -> Result<()> {
        self.out.write_all(b"\x1b[?25h")?;
        Ok(())
    }

    fn set_fg(&mut self, _c: Color) -> Result<()> {
        Ok(())
    }

    fn set_bg(&mut self, _c: Color) -> Result<()> {
        Ok(())
    }

    fn reset_style(&mut self) -> Result<()> {
        Ok(())
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        self.raw_mode = true;
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        self.raw_mode = false;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
