//! Word-motion helpers operating purely on `&str` + a byte cursor.
//!
//! The word rule (spec.md §4.1): a word run is a maximal sequence of Unicode
//! letters, digits, or `_`; everything else is a separator. These mirror the
//! shape of the teacher's `core-text::motion` (pure functions over a line and
//! a byte position, no editor-state coupling) without the Vim block-cursor
//! normalization that module adds — an insertion-point cursor never needs it.

use crate::grapheme;

/// Move left one grapheme boundary, or stay at 0.
pub fn left(s: &str, cursor: usize) -> usize {
    grapheme::prev_boundary(s, cursor)
}

/// Move right one grapheme boundary, or stay at `s.len()`.
pub fn right(s: &str, cursor: usize) -> usize {
    grapheme::next_boundary(s, cursor)
}

/// Starting offset of the separator run (if any) plus adjacent word run
/// immediately to the left of `cursor` — the span `kill_word_backward` removes.
pub fn word_backward_boundary(s: &str, cursor: usize) -> usize {
    let mut pos = cursor;
    // Skip separators.
    while pos > 0 {
        let prev = grapheme::prev_boundary(s, pos);
        if grapheme::is_word(&s[prev..pos]) {
            break;
        }
        pos = prev;
    }
    // Skip the word run.
    while pos > 0 {
        let prev = grapheme::prev_boundary(s, pos);
        if !grapheme::is_word(&s[prev..pos]) {
            break;
        }
        pos = prev;
    }
    pos
}

/// Ending offset of the word run (skipping any leading separators) to the
/// right of `cursor` — the span `delete_word_forward` removes.
pub fn word_forward_boundary(s: &str, cursor: usize) -> usize {
    let mut pos = cursor;
    let len = s.len();
    // Skip separators.
    while pos < len {
        let next = grapheme::next_boundary(s, pos);
        if grapheme::is_word(&s[pos..next]) {
            break;
        }
        pos = next;
    }
    // Skip the word run.
    while pos < len {
        let next = grapheme::next_boundary(s, pos);
        if !grapheme::is_word(&s[pos..next]) {
            break;
        }
        pos = next;
    }
    pos
}

/// Move left one word (Alt-B): same boundary as the kill, but non-destructive.
pub fn word_left(s: &str, cursor: usize) -> usize {
    word_backward_boundary(s, cursor)
}

/// Move right one word (Alt-F): lands after the next word run, skipping
/// leading separators, matching common readline behavior.
pub fn word_right(s: &str, cursor: usize) -> usize {
    word_forward_boundary(s, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_backward_skips_trailing_space() {
        let s = "foo bar  ";
        assert_eq!(word_backward_boundary(s, s.len()), 4); // start of "bar"
    }

    #[test]
    fn word_backward_from_middle_of_word() {
        let s = "foo bar";
        assert_eq!(word_backward_boundary(s, 3), 0); // "foo" -> start
    }

    #[test]
    fn word_forward_skips_leading_space() {
        let s = "foo  bar baz";
        assert_eq!(word_forward_boundary(s, 3), 8); // end of "bar"
    }

    #[test]
    fn word_forward_at_end_is_noop() {
        let s = "foo";
        assert_eq!(word_forward_boundary(s, 3), 3);
    }
}
