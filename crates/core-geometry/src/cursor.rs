//! Cursor Math (spec.md §4.3): pure functions mapping (buffer content,
//! cursor byte offset, prompt's last-line width, terminal column count) to
//! an on-screen row/column, with no I/O and no dependency on a live terminal.

use core_text::grapheme;

/// A computed cursor position relative to the prompt's first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    pub row: usize,
    pub col: usize,
    /// True if the cursor sits exactly at the wrap boundary (column `w`),
    /// the implicit column after the last column of a row.
    pub at_wrap_boundary: bool,
}

/// Walk `s` laid out starting at column `prompt_last_line_width`, wrapping at
/// `term_width`, and return the row/column of the byte offset `target`.
///
/// `\n` in the buffer (multiline input) advances the row and resets the
/// column to 0. Any other displayable character advances the column by its
/// width; if that would exceed `term_width - 1`, the renderer wraps to the
/// next row at column 0 *before* placing the character — matching a
/// terminal's "defer wrap" behavior closely enough for cursor positioning
/// (spec.md §4.3 explicitly leaves the exact edge behavior to the
/// implementation to document and test, so this is that documentation).
pub fn position_at(s: &str, target: usize, prompt_last_line_width: usize, term_width: usize) -> CursorPosition {
    let w = term_width.max(1);
    let mut row = 0usize;
    let mut col = prompt_last_line_width;
    let mut consumed = 0usize;

    if target == 0 {
        return CursorPosition { row, col, at_wrap_boundary: col >= w };
    }

    for g in grapheme::iter(s) {
        if consumed >= target {
            break;
        }
        if g == "\n" {
            row += 1;
            col = 0;
            consumed += 1;
            continue;
        }
        let gw = grapheme::cluster_width(g);
        if col + gw > w && col > 0 {
            row += 1;
            col = 0;
        }
        col += gw;
        consumed += g.len();
    }

    // Deferred wrap: landing exactly on the last column (col == w) after
    // the final character is not yet a wrap — a terminal only wraps when it
    // has to place the *next* cell. Only actually-overflowing rows above
    // already moved row/col during the loop.
    CursorPosition { row, col, at_wrap_boundary: col >= w }
}

/// Total rows occupied by `s` laid out after the prompt, and the display
/// width used on the last of those rows.
pub fn footprint(s: &str, prompt_last_line_width: usize, term_width: usize) -> (usize, usize) {
    let end = position_at(s, s.len(), prompt_last_line_width, term_width);
    (end.row + 1, end.col)
}

/// Inverse of `position_at`: find the byte offset whose on-screen position is
/// (target_row, target_col). Used for tests and (out of scope here) mouse
/// support. Returns the closest valid offset if the exact cell falls between
/// two cluster boundaries or past the end of content.
pub fn offset_for(s: &str, prompt_last_line_width: usize, term_width: usize, target_row: usize, target_col: usize) -> usize {
    let w = term_width.max(1);
    let mut row = 0usize;
    let mut col = prompt_last_line_width;
    let mut offset = 0usize;

    if target_row == 0 && target_col <= col {
        return 0;
    }

    for g in grapheme::iter(s) {
        if row == target_row && col >= target_col {
            return offset;
        }
        if g == "\n" {
            if row == target_row {
                return offset;
            }
            row += 1;
            col = 0;
            offset += 1;
            continue;
        }
        let gw = grapheme::cluster_width(g);
        if col + gw > w && col > 0 {
            row += 1;
            col = 0;
            if row == target_row && target_col == 0 {
                return offset;
            }
        }
        col += gw;
        offset += g.len();
    }

    offset
}
