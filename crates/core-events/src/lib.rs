//! Shared vocabulary types for the line editor: key events, error kinds, and
//! the small result type edit commands use to talk to the control loop.
//!
//! Kept as its own crate, the way the teacher keeps `core-events` free of
//! dependencies on the higher-level crates, so that `core-text` and
//! `core-geometry` can share these types without pulling in terminal or
//! rendering code.

use bitflags::bitflags;

bitflags! {
    /// Modifier keys accompanying a key press.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModMask: u8 {
        const CTRL  = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const SHIFT = 0b0000_0100;
    }
}

/// A single named (non-printable) key recognized by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    F(u8),
}

/// A decoded key event, tagged per spec.md §3 "Key Event".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    /// A printable Unicode scalar value (not a control character).
    Character(char),
    /// One of the canonical named keys, possibly chorded with modifiers.
    Named(NamedKey, ModMask),
    /// Ctrl-<letter>, letter in 'A'..='Z' (always uppercase canonical form).
    Control(char),
    /// Alt-<letter/symbol>.
    Alt(char),
    /// A byte sequence the decoder could not classify; carries the raw bytes.
    Unknown(Vec<u8>),
    /// An escape sequence was in progress but more bytes are needed.
    Incomplete,
    /// The escape-assembly timeout elapsed with no further bytes (bare Escape).
    Timeout,
    /// End of input: EOF read with an empty assembly buffer.
    EndOfInput,
}

/// Error kinds the public API distinguishes, per spec.md §7.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("out of memory")]
    OutOfMemory,
    #[error("editor not initialized")]
    NotInitialized,
    #[error("terminal I/O error: {0}")]
    TerminalIO(#[source] anyhow::Error),
    #[error("interrupted")]
    Interrupted,
    #[error("end of input")]
    EndOfInput,
}

/// Outcome of dispatching a single key event to an edit command, per the
/// teacher's "exception-for-control-flow surrogates" design note: a plain
/// result enum the control loop matches on, no panics, no sentinel values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The buffer was mutated in place; an incremental redraw is needed.
    Changed,
    /// The buffer was wholesale-replaced (history navigation/search accept);
    /// the control loop should use the Display Engine's `replace_all`.
    Replaced,
    /// The terminal needs a full re-render (Ctrl-L).
    Redraw,
    /// Nothing happened (e.g. backspace at column 0).
    NoChange,
    /// The line is complete and should be returned to the caller.
    Complete(String),
    /// The line was cancelled (Ctrl-C).
    Cancelled,
    /// End of input was reached (Ctrl-D on an empty buffer, or EOF).
    EndOfInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_mask_combines() {
        let m = ModMask::CTRL | ModMask::SHIFT;
        assert!(m.contains(ModMask::CTRL));
        assert!(m.contains(ModMask::SHIFT));
        assert!(!m.contains(ModMask::ALT));
    }

    #[test]
    fn editor_error_messages() {
        assert_eq!(EditorError::OutOfMemory.to_string(), "out of memory");
        assert_eq!(
            EditorError::InvalidParameter("bad".into()).to_string(),
            "invalid parameter: bad"
        );
    }
}
