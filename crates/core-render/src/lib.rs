//! Display Engine (design centre): owns the predictive model of what the
//! terminal currently shows for one `read_line` session, and the minimal-diff
//! logic that keeps it in sync as the buffer changes.
//!
//! Unlike a full-screen editor's renderer, this engine never addresses the
//! terminal in absolute coordinates — it shares the shell's scrollback, so
//! every vertical move is relative (`move_up`/`move_down`) and only the
//! column is absolute (`move_to_column`). All text containing embedded `\n`
//! is rewritten to `\r\n` before being written, since raw mode disables the
//! output post-processing that would otherwise supply the carriage return.

use anyhow::{Result, anyhow};
use core_geometry::{Prompt, footprint, position_at};
use core_terminal::{TerminalSink, TermColor};
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// A styled run over the plain buffer text: `range` is a byte range into the
/// buffer passed to `render_full_styled`/`replace_all_styled`, `fg`/`bg` the
/// colors to bracket it with. Never consulted by `footprint`/`position_at` —
/// those always see the plain buffer — so styling cannot skew width
/// accounting. `range` must fall on `char` boundaries; the caller (a host's
/// syntax hook) owns that invariant.
#[derive(Debug, Clone)]
pub struct StyleSpan {
    pub range: std::ops::Range<usize>,
    pub fg: Option<TermColor>,
    pub bg: Option<TermColor>,
}

/// Lifecycle states from spec: any buffer mutation moves `Synced` to
/// `Dirty`; any successful render moves `Dirty` back to `Synced`;
/// `render_full`/`replace_all` always resolve to `Synced` (including from
/// `Divergent`, which a host declares after printing external output).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Fresh,
    Synced,
    Dirty,
    Divergent,
}

#[derive(Default)]
struct RenderMetrics {
    full_renders: AtomicU64,
    incremental_renders: AtomicU64,
    replace_all_renders: AtomicU64,
    recovery_renders: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderMetricsSnapshot {
    pub full_renders: u64,
    pub incremental_renders: u64,
    pub replace_all_renders: u64,
    pub recovery_renders: u64,
}

impl RenderMetrics {
    fn snapshot(&self) -> RenderMetricsSnapshot {
        RenderMetricsSnapshot {
            full_renders: self.full_renders.load(Relaxed),
            incremental_renders: self.incremental_renders.load(Relaxed),
            replace_all_renders: self.replace_all_renders.load(Relaxed),
            recovery_renders: self.recovery_renders.load(Relaxed),
        }
    }
}

/// Predictive model of terminal content for a single `read_line` call.
pub struct DisplayEngine {
    prompt: Prompt,
    term_width: u16,
    state: EngineState,
    /// Last buffer content believed to be on screen.
    snapshot: String,
    /// Terminal row/column the cursor currently sits at, relative to the
    /// prompt's last line (row 0, col `prompt.last_line_width()` is where
    /// buffer content begins).
    cursor_row: usize,
    cursor_col: usize,
    metrics: RenderMetrics,
    generation: u64,
}

impl DisplayEngine {
    pub fn new(prompt: Prompt, term_width: u16) -> Self {
        let cursor_col = prompt.last_line_width();
        Self {
            prompt,
            term_width,
            state: EngineState::Fresh,
            snapshot: String::new(),
            cursor_row: 0,
            cursor_col,
            metrics: RenderMetrics::default(),
            generation: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Row the real cursor currently sits at, relative to the prompt's last
    /// line. Exposed for the control loop's Ctrl-L handling, which must
    /// physically reposition the terminal before a full redraw.
    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    /// Declare that the real terminal cursor now sits at the prompt's start
    /// (row 0, column 0) without going through `reposition` — used after a
    /// host-driven full-screen clear, right before `render_full`.
    pub fn reset_cursor_tracking(&mut self) {
        self.cursor_row = 0;
        self.cursor_col = 0;
    }

    pub fn metrics(&self) -> RenderMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn resize(&mut self, term_width: u16) {
        self.term_width = term_width;
        self.state = EngineState::Divergent;
    }

    /// A host declares divergence after writing output of its own (e.g. a
    /// command's result) between `read_line` calls or mid-session.
    pub fn mark_divergent(&mut self) {
        self.state = EngineState::Divergent;
    }

    /// Called by the host right after a buffer mutation, before the next
    /// `update_incremental`.
    pub fn mark_dirty(&mut self) {
        if self.state == EngineState::Synced {
            self.state = EngineState::Dirty;
        }
    }

    fn last_line_width(&self) -> usize {
        self.prompt.last_line_width()
    }

    fn position_of(&self, s: &str, byte: usize) -> core_geometry::CursorPosition {
        position_at(s, byte, self.last_line_width(), self.term_width as usize)
    }

    fn footprint_of(&self, s: &str) -> (usize, usize) {
        footprint(s, self.last_line_width(), self.term_width as usize)
    }

    /// Move the real cursor from `(self.cursor_row, self.cursor_col)` to
    /// `target`, skipping either axis that is already correct.
    fn reposition(&mut self, term: &mut dyn TerminalSink, target: core_geometry::CursorPosition) -> Result<()> {
        if target.row > self.cursor_row {
            term.move_down((target.row - self.cursor_row) as u16)?;
        } else if target.row < self.cursor_row {
            term.move_up((self.cursor_row - target.row) as u16)?;
        }
        if target.col != self.cursor_col {
            term.move_to_column(target.col as u16)?;
        }
        self.cursor_row = target.row;
        self.cursor_col = target.col;
        Ok(())
    }

    /// After writing `s` so that it ends exactly at the end of `content`,
    /// the cursor sits at `content`'s footprint end; update tracked state
    /// to match without an extra `move_to_column` call.
    fn mark_cursor_at_end_of(&mut self, content: &str) {
        let (rows, last_col) = self.footprint_of(content);
        self.cursor_row = rows - 1;
        self.cursor_col = last_col;
    }

    fn write_text(&self, term: &mut dyn TerminalSink, s: &str) -> Result<()> {
        if s.contains('\n') {
            term.write(s.replace('\n', "\r\n").as_bytes())
        } else {
            term.write(s.as_bytes())
        }
    }

    /// Write `buffer`, bracketing each `spans` run with set/reset-style
    /// sequences. Spans are clamped to `buffer`'s length and processed in
    /// start order; overlapping or out-of-order spans simply lose whichever
    /// one sorts later at a given byte. Gaps between/around spans are
    /// written plain.
    fn write_styled(&self, term: &mut dyn TerminalSink, buffer: &str, spans: &[StyleSpan]) -> Result<()> {
        if spans.is_empty() {
            return self.write_text(term, buffer);
        }
        let mut ordered: Vec<&StyleSpan> = spans.iter().collect();
        ordered.sort_by_key(|s| s.range.start);

        let mut cursor = 0usize;
        for span in ordered {
            let start = span.range.start.min(buffer.len());
            let end = span.range.end.min(buffer.len());
            if end <= start || start < cursor {
                continue;
            }
            if start > cursor {
                self.write_text(term, &buffer[cursor..start])?;
            }
            if let Some(fg) = span.fg {
                term.set_fg(fg)?;
            }
            if let Some(bg) = span.bg {
                term.set_bg(bg)?;
            }
            self.write_text(term, &buffer[start..end])?;
            term.reset_style()?;
            cursor = end;
        }
        if cursor < buffer.len() {
            self.write_text(term, &buffer[cursor..])?;
        }
        Ok(())
    }

    /// Emit the prompt followed by the buffer, then place the cursor at
    /// `cursor_byte`. Used on entry and as the recovery path.
    pub fn render_full(&mut self, term: &mut dyn TerminalSink, buffer: &str, cursor_byte: usize) -> Result<()> {
        self.write_text(term, self.prompt.raw())?;
        self.write_text(term, buffer)?;
        self.mark_cursor_at_end_of(buffer);
        let target = self.position_of(buffer, cursor_byte);
        self.reposition(term, target)?;
        term.flush()?;
        self.snapshot = buffer.to_string();
        self.state = EngineState::Synced;
        self.generation += 1;
        self.metrics.full_renders.fetch_add(1, Relaxed);
        Ok(())
    }

    /// Like `render_full`, but brackets `spans` with their styling. Width
    /// accounting (`footprint_of`/`position_of`) still runs over the plain
    /// `buffer` text, so styling never perturbs cursor placement.
    pub fn render_full_styled(
        &mut self,
        term: &mut dyn TerminalSink,
        buffer: &str,
        cursor_byte: usize,
        spans: &[StyleSpan],
    ) -> Result<()> {
        self.write_text(term, self.prompt.raw())?;
        self.write_styled(term, buffer, spans)?;
        self.mark_cursor_at_end_of(buffer);
        let target = self.position_of(buffer, cursor_byte);
        self.reposition(term, target)?;
        term.flush()?;
        self.snapshot = buffer.to_string();
        self.state = EngineState::Synced;
        self.generation += 1;
        self.metrics.full_renders.fetch_add(1, Relaxed);
        Ok(())
    }

    /// Diff `self.snapshot` against `buffer` and emit the minimal sequence
    /// that transforms one into the other, repositioning the cursor to
    /// `cursor_byte`. Falls back to one recovery `render_full` on failure.
    pub fn update_incremental(&mut self, term: &mut dyn TerminalSink, buffer: &str, cursor_byte: usize) -> Result<()> {
        if !matches!(self.state, EngineState::Synced | EngineState::Dirty) {
            return Err(anyhow!("update_incremental requires a prior render_full (state = {:?})", self.state));
        }
        match self.try_incremental(term, buffer, cursor_byte) {
            Ok(()) => {
                self.snapshot = buffer.to_string();
                self.state = EngineState::Synced;
                self.metrics.incremental_renders.fetch_add(1, Relaxed);
                Ok(())
            }
            Err(_) => match self.render_full(term, buffer, cursor_byte) {
                Ok(()) => {
                    self.metrics.recovery_renders.fetch_add(1, Relaxed);
                    Ok(())
                }
                Err(e) => {
                    self.state = EngineState::Divergent;
                    Err(anyhow!("terminal I/O failed during recovery render_full: {e}"))
                }
            },
        }
    }

    fn try_incremental(&mut self, term: &mut dyn TerminalSink, buffer: &str, cursor_byte: usize) -> Result<()> {
        let old = self.snapshot.clone();

        // Case 5: cursor-only move.
        if buffer == old {
            let target = self.position_of(buffer, cursor_byte);
            self.reposition(term, target)?;
            term.flush()?;
            return Ok(());
        }

        // Cases 1/2: pure append at end.
        if buffer.len() > old.len() && buffer.as_bytes()[..old.len()] == *old.as_bytes() {
            let old_end = self.position_of(&old, old.len());
            self.reposition(term, old_end)?;
            self.write_text(term, &buffer[old.len()..])?;
            self.mark_cursor_at_end_of(buffer);
            let target = self.position_of(buffer, cursor_byte);
            self.reposition(term, target)?;
            term.flush()?;
            return Ok(());
        }

        let (old_rows, _) = self.footprint_of(&old);
        let (new_rows, new_last_col) = self.footprint_of(buffer);
        let old_end = self.position_of(&old, old.len());

        // Case 3: same footprint — isolate the changed region and confine
        // the rewrite to a single row (otherwise fall through to case 4).
        if old_rows == new_rows && old_end.col == new_last_col {
            let prefix = common_prefix_bytes(&old, buffer);
            let suffix = common_suffix_bytes(&old, buffer, prefix);
            let change_start = self.position_of(&old, prefix);
            let old_change_end = self.position_of(&old, old.len() - suffix);
            let new_change_end = self.position_of(buffer, buffer.len() - suffix);
            if change_start.row == old_change_end.row && change_start.row == new_change_end.row {
                self.reposition(term, change_start)?;
                term.clear_to_end_of_line()?;
                self.write_text(term, &buffer[prefix..])?;
                self.mark_cursor_at_end_of(buffer);
                let target = self.position_of(buffer, cursor_byte);
                self.reposition(term, target)?;
                term.flush()?;
                return Ok(());
            }
        }

        // Case 4: footprint grows or shrinks (or a same-footprint change
        // spans multiple rows) — rewrite from the start of the input region.
        let start = self.position_of(buffer, 0);
        self.reposition(term, start)?;
        term.clear_to_end_of_screen()?;
        self.write_text(term, buffer)?;
        self.mark_cursor_at_end_of(buffer);
        let target = self.position_of(buffer, cursor_byte);
        self.reposition(term, target)?;
        term.flush()?;
        Ok(())
    }

    /// The "history load" path: erase the old content one destructive
    /// backspace at a time (locally correct regardless of the editor's
    /// belief about wrapped rows), then emit the new content.
    pub fn replace_all(&mut self, term: &mut dyn TerminalSink, new_content: &str, cursor_byte: usize) -> Result<()> {
        let old_end = self.position_of(&self.snapshot.clone(), self.snapshot.len());
        self.reposition(term, old_end)?;

        let caps = core_terminal::TerminalCapabilities::detect();
        let erase = caps.destructive_backspace();
        let old_char_count = core_text::grapheme::iter(&self.snapshot).count();
        for _ in 0..old_char_count {
            term.write(erase)?;
        }
        term.clear_to_end_of_line()?;

        self.write_text(term, new_content)?;
        self.mark_cursor_at_end_of(new_content);
        let target = self.position_of(new_content, cursor_byte);
        self.reposition(term, target)?;
        term.flush()?;

        self.snapshot = new_content.to_string();
        self.state = EngineState::Synced;
        self.generation += 1;
        self.metrics.replace_all_renders.fetch_add(1, Relaxed);
        Ok(())
    }

    /// Like `replace_all`, but brackets `spans` with their styling when
    /// writing the new content.
    pub fn replace_all_styled(
        &mut self,
        term: &mut dyn TerminalSink,
        new_content: &str,
        cursor_byte: usize,
        spans: &[StyleSpan],
    ) -> Result<()> {
        let old_end = self.position_of(&self.snapshot.clone(), self.snapshot.len());
        self.reposition(term, old_end)?;

        let caps = core_terminal::TerminalCapabilities::detect();
        let erase = caps.destructive_backspace();
        let old_char_count = core_text::grapheme::iter(&self.snapshot).count();
        for _ in 0..old_char_count {
            term.write(erase)?;
        }
        term.clear_to_end_of_line()?;

        self.write_styled(term, new_content, spans)?;
        self.mark_cursor_at_end_of(new_content);
        let target = self.position_of(new_content, cursor_byte);
        self.reposition(term, target)?;
        term.flush()?;

        self.snapshot = new_content.to_string();
        self.state = EngineState::Synced;
        self.generation += 1;
        self.metrics.replace_all_renders.fetch_add(1, Relaxed);
        Ok(())
    }
}

fn common_prefix_bytes(a: &str, b: &str) -> usize {
    let max = a.len().min(b.len());
    let mut i = 0;
    while i < max && a.as_bytes()[i] == b.as_bytes()[i] {
        i += 1;
    }
    while i > 0 && (!a.is_char_boundary(i) || !b.is_char_boundary(i)) {
        i -= 1;
    }
    i
}

fn common_suffix_bytes(a: &str, b: &str, prefix: usize) -> usize {
    let mut i = 0;
    while i < a.len() - prefix
        && i < b.len() - prefix
        && a.as_bytes()[a.len() - 1 - i] == b.as_bytes()[b.len() - 1 - i]
    {
        i += 1;
    }
    while i > 0 && (!a.is_char_boundary(a.len() - i) || !b.is_char_boundary(b.len() - i)) {
        i -= 1;
    }
    i
}

#[cfg(test)]
#[path = "../tests/support/mock_terminal.rs"]
mod mock_terminal;
