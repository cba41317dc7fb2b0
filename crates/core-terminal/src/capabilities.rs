//! Terminal capability resolution, done once at startup.
//!
//! The only capability this editor needs beyond raw-mode support is the
//! destructive-backspace sequence used by the Display Engine's history-load
//! path (`replace_all`). Resolving it here, once, keeps the render path free
//! of platform branches at command time.

/// Erase-one-column-left sequence: move left, write a space, move left again.
/// `\x08 \x08` is correct for every terminal this editor targets (including
/// modern Windows terminals via ConPTY); kept as a single resolved value
/// rather than branched per call, per the unified history-replacement design.
const DESTRUCTIVE_BACKSPACE: [u8; 3] = [0x08, b' ', 0x08];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct TerminalCapabilities {
    destructive_backspace: [u8; 3],
}

impl TerminalCapabilities {
    /// Resolve capabilities once. Cheap: no terminal probing is needed for
    /// the single capability this editor cares about.
    pub fn detect() -> Self {
        Self {
            destructive_backspace: DESTRUCTIVE_BACKSPACE,
        }
    }

    pub fn destructive_backspace(&self) -> &[u8; 3] {
        &self.destructive_backspace
    }
}
