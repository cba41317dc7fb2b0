//! Write-only terminal abstraction: raw bytes out, cursor motion, region
//! clears, raw-mode entry/exit.
//!
//! Unlike a full-screen editor's backend, this sink never enters the
//! alternate screen — a line editor shares the scrollback with the rest of
//! the shell session, so `enter_raw_mode` only flips termios discipline.

use anyhow::Result;
use crossterm::{
    cursor::{Hide, MoveDown, MoveTo, MoveToColumn, MoveUp, Show},
    queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use std::io::{Stdout, Write, stdout};

pub mod capabilities;
pub use capabilities::TerminalCapabilities;
pub use crossterm::style::Color as TermColor;

/// Write-only API a Display Engine renders through. Implemented for real
/// terminals by [`CrosstermTerminal`]; test code implements it over a
/// `Vec<u8>` to assert on the exact byte stream without a live TTY.
pub trait TerminalSink {
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
    fn clear_to_end_of_line(&mut self) -> Result<()>;
    fn clear_to_end_of_screen(&mut self) -> Result<()>;
    fn clear_line(&mut self) -> Result<()>;
    fn move_to(&mut self, row: u16, col: u16) -> Result<()>;
    fn move_up(&mut self, n: u16) -> Result<()>;
    fn move_down(&mut self, n: u16) -> Result<()>;
    fn move_to_column(&mut self, col: u16) -> Result<()>;
    fn hide_cursor(&mut self) -> Result<()>;
    fn show_cursor(&mut self) -> Result<()>;
    fn set_fg(&mut self, c: Color) -> Result<()>;
    fn set_bg(&mut self, c: Color) -> Result<()>;
    fn reset_style(&mut self) -> Result<()>;
    fn enter_raw_mode(&mut self) -> Result<()>;
    fn exit_raw_mode(&mut self) -> Result<()>;
    /// Send every operation queued since the last flush.
    fn flush(&mut self) -> Result<()>;
}

/// A `crossterm`-backed sink over real `stdout`.
///
/// Operations are buffered into `crossterm`'s own command queue and flushed
/// once per display operation rather than issuing a syscall per primitive.
pub struct CrosstermTerminal {
    out: Stdout,
    raw_mode: bool,
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermTerminal {
    pub fn new() -> Self {
        Self {
            out: stdout(),
            raw_mode: false,
        }
    }

    /// Enter raw mode and return a guard that restores the prior mode on
    /// drop, even on panic or early return.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter_raw_mode()?;
        Ok(TerminalGuard {
            term: self,
            active: true,
        })
    }

    pub fn print(&mut self, s: &str) -> Result<()> {
        queue!(self.out, Print(s))?;
        Ok(())
    }
}

impl TerminalSink for CrosstermTerminal {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    fn clear_to_end_of_line(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::UntilNewLine))?;
        Ok(())
    }

    fn clear_to_end_of_screen(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::FromCursorDown))?;
        Ok(())
    }

    fn clear_line(&mut self) -> Result<()> {
        queue!(self.out, Clear(ClearType::CurrentLine))?;
        Ok(())
    }

    fn move_to(&mut self, row: u16, col: u16) -> Result<()> {
        queue!(self.out, MoveTo(col, row))?;
        Ok(())
    }

    fn move_up(&mut self, n: u16) -> Result<()> {
        if n > 0 {
            queue!(self.out, MoveUp(n))?;
        }
        Ok(())
    }

    fn move_down(&mut self, n: u16) -> Result<()> {
        if n > 0 {
            queue!(self.out, MoveDown(n))?;
        }
        Ok(())
    }

    fn move_to_column(&mut self, col: u16) -> Result<()> {
        queue!(self.out, MoveToColumn(col))?;
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<()> {
        queue!(self.out, Hide)?;
        Ok(())
    }

    fn show_cursor(&mut self) -> Result<()> {
        queue!(self.out, Show)?;
        Ok(())
    }

    fn set_fg(&mut self, c: Color) -> Result<()> {
        queue!(self.out, SetForegroundColor(c))?;
        Ok(())
    }

    fn set_bg(&mut self, c: Color) -> Result<()> {
        queue!(self.out, SetBackgroundColor(c))?;
        Ok(())
    }

    fn reset_style(&mut self) -> Result<()> {
        queue!(self.out, ResetColor)?;
        Ok(())
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        if !self.raw_mode {
            enable_raw_mode()?;
            self.raw_mode = true;
        }
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        if self.raw_mode {
            disable_raw_mode()?;
            self.raw_mode = false;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// RAII guard ensuring raw mode is left even if the caller panics or
/// returns early; restoration on every exit path is the whole point.
pub struct TerminalGuard<'a> {
    term: &'a mut CrosstermTerminal,
    active: bool,
}

impl<'a> Drop for TerminalGuard<'a> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.term.exit_raw_mode();
        }
    }
}

impl<'a> TerminalGuard<'a> {
    pub fn terminal(&mut self) -> &mut CrosstermTerminal {
        self.term
    }
}
