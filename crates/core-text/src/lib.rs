//! The text buffer: a single logical line of UTF-8 text with a cursor.
//!
//! Unlike the teacher's `core-text::Buffer`, which backs a multi-line file
//! with a `ropey::Rope`, a line editor's buffer holds one line at a time.
//! A rope's balanced-tree overhead buys nothing at that scale, so the rope
//! is replaced with a plain `String`; the grapheme/width utilities below are
//! carried over largely unchanged since they operate on a single line anyway.

use anyhow::Result;

pub mod motion;
pub mod width;

pub use width::egc_width;

/// A resizable line of text with a byte-offset cursor.
///
/// Invariants: `cursor <= content.len()`, `content` is valid UTF-8, `cursor`
/// always lands on a `char` boundary, and `content` never contains `NUL` or
/// `\n` (a line editor's buffer is one display line; multi-line shell input
/// is composed by the host from multiple completed lines).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    content: String,
    cursor: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        if s.contains('\0') {
            anyhow::bail!("buffer content must not contain NUL bytes");
        }
        Ok(Self {
            cursor: s.len(),
            content: s.to_string(),
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Clamp an arbitrary byte offset to `[0, len]` and the nearest `char` boundary.
    pub fn set_cursor(&mut self, offset: usize) {
        let clamped = offset.min(self.content.len());
        self.cursor = grapheme::prev_or_at_char_boundary(&self.content, clamped);
    }

    /// Insert a single character at the cursor, advancing it by the character's UTF-8 length.
    pub fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Insert an arbitrary string at the cursor (used for paste / completion replacement).
    pub fn insert_str(&mut self, s: &str) {
        self.content.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    /// Backspace: delete the grapheme cluster immediately before the cursor.
    pub fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = grapheme::prev_boundary(&self.content, self.cursor);
        self.content.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    /// Delete: delete the grapheme cluster at the cursor.
    pub fn delete_at_cursor(&mut self) {
        if self.cursor >= self.content.len() {
            return;
        }
        let end = grapheme::next_boundary(&self.content, self.cursor);
        self.content.replace_range(self.cursor..end, "");
    }

    /// Move the cursor by `delta` graphemes (negative moves left, positive right).
    pub fn move_cursor(&mut self, delta: isize) {
        let mut remaining = delta.unsigned_abs();
        if delta < 0 {
            while remaining > 0 && self.cursor > 0 {
                self.cursor = grapheme::prev_boundary(&self.content, self.cursor);
                remaining -= 1;
            }
        } else {
            while remaining > 0 && self.cursor < self.content.len() {
                self.cursor = grapheme::next_boundary(&self.content, self.cursor);
                remaining -= 1;
            }
        }
    }

    /// Remove `[cursor, end)`, returning the removed text.
    pub fn kill_to_eol(&mut self) -> String {
        let removed = self.content[self.cursor..].to_string();
        self.content.truncate(self.cursor);
        removed
    }

    /// Remove `[0, cursor)`, returning the removed text (Ctrl-U: clear line to the left).
    pub fn kill_to_start(&mut self) -> String {
        let removed = self.content[..self.cursor].to_string();
        self.content.replace_range(..self.cursor, "");
        self.cursor = 0;
        removed
    }

    /// Delete the separator run to the left of the cursor followed by the adjacent word run.
    pub fn kill_word_backward(&mut self) -> String {
        let start = motion::word_backward_boundary(&self.content, self.cursor);
        let removed = self.content[start..self.cursor].to_string();
        self.content.replace_range(start..self.cursor, "");
        self.cursor = start;
        removed
    }

    /// Delete the word run under/after the cursor (Alt-D: kill word forward).
    pub fn delete_word_forward(&mut self) -> String {
        let end = motion::word_forward_boundary(&self.content, self.cursor);
        let removed = self.content[self.cursor..end].to_string();
        self.content.replace_range(self.cursor..end, "");
        removed
    }

    /// Replace the entire buffer content, moving the cursor to the end (history load path).
    pub fn replace_all(&mut self, s: &str) {
        self.content = s.to_string();
        self.cursor = self.content.len();
    }
}

/// Grapheme and width utilities. Pure functions over `&str`, no buffer coupling,
/// so the Display Engine and Cursor Math can use them without a `Buffer` in hand.
pub mod grapheme {
    use crate::egc_width;
    use unicode_segmentation::UnicodeSegmentation;

    /// Iterate grapheme clusters of `s`.
    pub fn iter(s: &str) -> impl Iterator<Item = &str> {
        s.graphemes(true)
    }

    /// Previous grapheme boundary strictly before `byte` (0 if none).
    pub fn prev_boundary(s: &str, byte: usize) -> usize {
        if byte == 0 || byte > s.len() {
            return 0;
        }
        let mut last = 0;
        for (idx, _) in s.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            last = idx;
        }
        last
    }

    /// Next grapheme boundary strictly after `byte` (`s.len()` if none).
    pub fn next_boundary(s: &str, byte: usize) -> usize {
        if byte >= s.len() {
            return s.len();
        }
        for (idx, _) in s.grapheme_indices(true) {
            if idx > byte {
                return idx;
            }
        }
        s.len()
    }

    /// Snap `byte` to the grapheme boundary at or before it.
    pub fn prev_or_at_char_boundary(s: &str, byte: usize) -> usize {
        if byte >= s.len() {
            return s.len();
        }
        if s.is_char_boundary(byte) {
            // May still be mid-cluster; walk to the enclosing boundary.
            let mut last = 0;
            for (idx, _) in s.grapheme_indices(true) {
                if idx > byte {
                    break;
                }
                last = idx;
            }
            return last;
        }
        prev_boundary(s, byte)
    }

    /// Visual column (terminal cells) of the prefix `s[0..byte)`.
    pub fn visual_col(s: &str, byte: usize) -> usize {
        let mut col = 0;
        for (idx, g) in s.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            col += egc_width(g) as usize;
        }
        col
    }

    /// Width in terminal cells of a single grapheme cluster.
    pub fn cluster_width(g: &str) -> usize {
        egc_width(g) as usize
    }

    /// Word-rule classification: letters, digits, and `_` are word constituents.
    pub fn is_word(g: &str) -> bool {
        g.chars()
            .next()
            .map(|c| c == '_' || c.is_alphanumeric())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_cursor_advance() {
        let mut b = Buffer::new();
        b.insert_char('h');
        b.insert_char('i');
        assert_eq!(b.content(), "hi");
        assert_eq!(b.cursor(), 2);
    }

    #[test]
    fn insert_multibyte_advances_by_byte_len() {
        let mut b = Buffer::new();
        b.insert_char('é'); // 2 bytes
        assert_eq!(b.cursor(), 2);
        b.insert_char('a');
        assert_eq!(b.content(), "éa");
    }

    #[test]
    fn backspace_at_zero_is_noop() {
        let mut b = Buffer::new();
        b.delete_before_cursor();
        assert_eq!(b.content(), "");
        assert_eq!(b.cursor(), 0);
    }

    #[test]
    fn delete_at_end_is_noop() {
        let mut b = Buffer::from_str("hi").unwrap();
        b.set_cursor(2);
        b.delete_at_cursor();
        assert_eq!(b.content(), "hi");
    }

    #[test]
    fn kill_to_eol_removes_tail() {
        let mut b = Buffer::from_str("hello world").unwrap();
        b.set_cursor(5);
        let removed = b.kill_to_eol();
        assert_eq!(removed, " world");
        assert_eq!(b.content(), "hello");
        assert_eq!(b.cursor(), 5);
    }

    #[test]
    fn kill_word_backward_removes_separator_and_word() {
        let mut b = Buffer::from_str("foo bar  baz").unwrap();
        b.set_cursor(b.len());
        b.kill_word_backward();
        assert_eq!(b.content(), "foo bar  ");
    }

    #[test]
    fn replace_all_moves_cursor_to_end() {
        let mut b = Buffer::from_str("short").unwrap();
        b.replace_all("a much longer replacement line");
        assert_eq!(b.cursor(), b.len());
    }

    #[test]
    fn grapheme_emoji_cluster() {
        let s = "a😀b";
        let after_a = grapheme::next_boundary(s, 0);
        let after_emoji = grapheme::next_boundary(s, after_a);
        assert_eq!(grapheme::prev_boundary(s, after_emoji), after_a);
    }

    #[test]
    fn grapheme_combining_mark_is_one_cluster() {
        let s = "e\u{0301}"; // e + combining acute
        let nb = grapheme::next_boundary(s, 0);
        assert_eq!(nb, s.len());
    }

    #[test]
    fn visual_col_counts_wide_cjk_as_two() {
        let s = "界";
        assert_eq!(grapheme::visual_col(s, s.len()), 2);
    }
}
