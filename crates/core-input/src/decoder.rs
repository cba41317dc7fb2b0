//! Byte-stream → `KeyEvent` decoder with escape-sequence assembly on an
//! explicit, configurable timeout.
//!
//! **Resolved design deviation.** A full-screen editor typically delegates
//! this entirely to `crossterm::event::read`, which hides the timeout
//! behavior behind an opaque internal state machine. A line editor needs
//! that timeout to be a first-class, testable property, so this decoder
//! reads raw bytes itself (see `tty` for the real TTY source) and assembles
//! escape sequences by hand, keeping only `core_events::KeyEvent` /
//! `NamedKey` / `ModMask` as the shared vocabulary.

use core_events::{KeyEvent, ModMask, NamedKey};
use std::time::Duration;

/// Outcome of requesting one byte from an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOutcome {
    Byte(u8),
    Timeout,
    Eof,
}

/// Anything the decoder can pull raw bytes from: a live TTY, or (in tests) a
/// scripted byte sequence. `timeout` is `None` for the first byte of a new
/// event — the decoder blocks indefinitely there, per the control loop's
/// single blocking-read suspension point — and `Some(d)` for every byte
/// while assembling an escape sequence.
pub trait ByteSource {
    fn read_byte(&mut self, timeout: Option<Duration>) -> std::io::Result<ByteOutcome>;
}

/// Decodes one `KeyEvent` at a time from a [`ByteSource`].
pub struct Decoder {
    escape_timeout: Duration,
    pending: Option<u8>,
}

impl Decoder {
    pub fn new(escape_timeout: Duration) -> Self {
        Self {
            escape_timeout,
            pending: None,
        }
    }

    fn next_byte<S: ByteSource>(
        &mut self,
        source: &mut S,
        timeout: Option<Duration>,
    ) -> std::io::Result<ByteOutcome> {
        if let Some(b) = self.pending.take() {
            return Ok(ByteOutcome::Byte(b));
        }
        source.read_byte(timeout)
    }

    /// Decode exactly one `KeyEvent`.
    pub fn next_event<S: ByteSource>(&mut self, source: &mut S) -> std::io::Result<KeyEvent> {
        let event = self.next_event_inner(source)?;
        tracing::trace!(target: "input.decode", ?event, "key_event");
        Ok(event)
    }

    fn next_event_inner<S: ByteSource>(&mut self, source: &mut S) -> std::io::Result<KeyEvent> {
        let first = match self.next_byte(source, None)? {
            ByteOutcome::Byte(b) => b,
            // The first byte of an event is never subject to the escape
            // timeout (timeout = None above); a source that reports one
            // anyway has nothing useful to resume from.
            ByteOutcome::Timeout => return Ok(KeyEvent::Incomplete),
            ByteOutcome::Eof => return Ok(KeyEvent::EndOfInput),
        };

        match first {
            0x08 | 0x7F => Ok(KeyEvent::Named(NamedKey::Backspace, ModMask::empty())),
            0x0A | 0x0D => Ok(KeyEvent::Named(NamedKey::Enter, ModMask::empty())),
            0x09 => Ok(KeyEvent::Named(NamedKey::Tab, ModMask::empty())),
            0x1B => self.assemble_escape(source),
            0x01..=0x1A => Ok(KeyEvent::Control((first - 1 + b'A') as char)),
            b if b >= 0x20 => self.decode_utf8_char(source, b),
            other => Ok(KeyEvent::Unknown(vec![other])),
        }
    }

    fn decode_utf8_char<S: ByteSource>(
        &mut self,
        source: &mut S,
        first: u8,
    ) -> std::io::Result<KeyEvent> {
        let extra = utf8_extra_bytes(first);
        if extra == 0 {
            return Ok(KeyEvent::Character(first as char));
        }
        let mut buf = vec![first];
        for _ in 0..extra {
            match self.next_byte(source, Some(self.escape_timeout))? {
                ByteOutcome::Byte(b) => buf.push(b),
                ByteOutcome::Timeout | ByteOutcome::Eof => return Ok(KeyEvent::Unknown(buf)),
            }
        }
        match std::str::from_utf8(&buf).ok().and_then(|s| s.chars().next()) {
            Some(c) => Ok(KeyEvent::Character(c)),
            None => Ok(KeyEvent::Unknown(buf)),
        }
    }

    fn assemble_escape<S: ByteSource>(&mut self, source: &mut S) -> std::io::Result<KeyEvent> {
        let second = match self.next_byte(source, Some(self.escape_timeout))? {
            ByteOutcome::Byte(b) => b,
            ByteOutcome::Timeout | ByteOutcome::Eof => {
                tracing::debug!(target: "input.decode", "escape_timeout_elapsed");
                return Ok(KeyEvent::Named(NamedKey::Escape, ModMask::empty()));
            }
        };

        match second {
            0x1B => {
                // Double ESC: the first resolves to a bare Escape now; replay
                // the second byte as the start of the next event.
                self.pending = Some(second);
                Ok(KeyEvent::Named(NamedKey::Escape, ModMask::empty()))
            }
            b'[' => self.assemble_csi(source),
            b'O' => self.assemble_ss3(source),
            b if (0x20..0x7F).contains(&b) => Ok(KeyEvent::Alt(b as char)),
            _ => Ok(KeyEvent::Unknown(vec![0x1B, second])),
        }
    }

    fn assemble_csi<S: ByteSource>(&mut self, source: &mut S) -> std::io::Result<KeyEvent> {
        let mut raw = vec![0x1B, b'['];
        let mut params = String::new();
        loop {
            match self.next_byte(source, Some(self.escape_timeout))? {
                ByteOutcome::Byte(b) if (0x30..=0x3F).contains(&b) => {
                    raw.push(b);
                    params.push(b as char);
                }
                ByteOutcome::Byte(b) if (0x40..=0x7E).contains(&b) => {
                    raw.push(b);
                    return Ok(csi_to_event(&params, b).unwrap_or(KeyEvent::Unknown(raw)));
                }
                ByteOutcome::Byte(b) => {
                    raw.push(b);
                    return Ok(KeyEvent::Unknown(raw));
                }
                ByteOutcome::Timeout | ByteOutcome::Eof => return Ok(KeyEvent::Unknown(raw)),
            }
        }
    }

    fn assemble_ss3<S: ByteSource>(&mut self, source: &mut S) -> std::io::Result<KeyEvent> {
        match self.next_byte(source, Some(self.escape_timeout))? {
            ByteOutcome::Byte(b) => {
                Ok(ss3_to_event(b).unwrap_or(KeyEvent::Unknown(vec![0x1B, b'O', b])))
            }
            ByteOutcome::Timeout | ByteOutcome::Eof => Ok(KeyEvent::Unknown(vec![0x1B, b'O'])),
        }
    }
}

fn utf8_extra_bytes(first: u8) -> usize {
    if first & 0b1110_0000 == 0b1100_0000 {
        1
    } else if first & 0b1111_0000 == 0b1110_0000 {
        2
    } else if first & 0b1111_1000 == 0b1111_0000 {
        3
    } else {
        0
    }
}

fn csi_to_event(params: &str, final_byte: u8) -> Option<KeyEvent> {
    let (code, mods) = split_modifier(params);
    let named = match (code.as_str(), final_byte) {
        ("" | "1", b'A') => NamedKey::ArrowUp,
        ("" | "1", b'B') => NamedKey::ArrowDown,
        ("" | "1", b'C') => NamedKey::ArrowRight,
        ("" | "1", b'D') => NamedKey::ArrowLeft,
        ("" | "1", b'H') => NamedKey::Home,
        ("" | "1", b'F') => NamedKey::End,
        ("1", b'~') => NamedKey::Home,
        ("4", b'~') => NamedKey::End,
        ("2", b'~') => NamedKey::Insert,
        ("3", b'~') => NamedKey::Delete,
        ("5", b'~') => NamedKey::PageUp,
        ("6", b'~') => NamedKey::PageDown,
        ("11", b'~') => NamedKey::F(1),
        ("12", b'~') => NamedKey::F(2),
        ("13", b'~') => NamedKey::F(3),
        ("14", b'~') => NamedKey::F(4),
        ("15", b'~') => NamedKey::F(5),
        ("17", b'~') => NamedKey::F(6),
        ("18", b'~') => NamedKey::F(7),
        ("19", b'~') => NamedKey::F(8),
        ("20", b'~') => NamedKey::F(9),
        ("21", b'~') => NamedKey::F(10),
        ("23", b'~') => NamedKey::F(11),
        ("24", b'~') => NamedKey::F(12),
        _ => return None,
    };
    Some(KeyEvent::Named(named, mods))
}

fn ss3_to_event(b: u8) -> Option<KeyEvent> {
    let named = match b {
        b'P' => NamedKey::F(1),
        b'Q' => NamedKey::F(2),
        b'R' => NamedKey::F(3),
        b'S' => NamedKey::F(4),
        b'H' => NamedKey::Home,
        b'F' => NamedKey::End,
        _ => return None,
    };
    Some(KeyEvent::Named(named, ModMask::empty()))
}

/// Split a CSI parameter string like `"3;5"` into (leading code, modifier
/// mask), using xterm's `Pm-1` bitmask convention for the optional second
/// field.
fn split_modifier(params: &str) -> (String, ModMask) {
    let mut parts = params.splitn(2, ';');
    let code = parts.next().unwrap_or("").to_string();
    let mods = parts
        .next()
        .and_then(|s| s.parse::<u8>().ok())
        .map(|pm| {
            let bits = pm.saturating_sub(1);
            let mut m = ModMask::empty();
            if bits & 0b001 != 0 {
                m |= ModMask::SHIFT;
            }
            if bits & 0b010 != 0 {
                m |= ModMask::ALT;
            }
            if bits & 0b100 != 0 {
                m |= ModMask::CTRL;
            }
            m
        })
        .unwrap_or(ModMask::empty());
    (code, mods)
}
