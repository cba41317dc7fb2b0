//! Grapheme cluster display width.
//!
//! A single authoritative function, `egc_width`, returns the terminal column
//! width of one grapheme cluster (EGC). Adapted from the teacher's
//! `core-text::width` classifier (ASCII / Narrow / Wide / Emoji* / Combining),
//! minus its build-time-generated override table: that table was produced by
//! a `build.rs` + TSV pipeline for terminal-specific emoji width corrections,
//! which is out of scope for a spec that only asks for East-Asian-Width-aware
//! measurement (spec.md §4.2) — the handful of sequences it special-cased
//! (flags, ZWJ families, keycaps) are covered here by the classifier directly.
//!
//! Precedence: static override (a small hand-seeded table for sequences the
//! classifier would otherwise mis-measure) → classifier → conservative widen
//! fallback for any pictographic signal left over at width 1.

/// Sequences known to be mis-measured by a pure range-based classifier.
static OVERRIDES: &[(&str, u16)] = &[("⚙", 1), ("⚙️", 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EgcKind {
    Ascii,
    Narrow,
    Wide,
    EmojiSimple,
    EmojiModifier,
    EmojiKeycap,
    EmojiFlag,
    EmojiZwj,
    Combining(bool),
}

const ZWJ: char = '\u{200D}';
const KEYCAP_COMBINING: char = '\u{20E3}';

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_skin_tone_modifier(c: char) -> bool {
    ('\u{1F3FB}'..='\u{1F3FF}').contains(&c)
}

fn is_extended_pictographic(c: char) -> bool {
    ('\u{1F300}'..='\u{1FAFF}').contains(&c) || ('\u{2600}'..='\u{27BF}').contains(&c)
}

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
        || ('\u{1AB0}'..='\u{1AFF}').contains(&c)
        || ('\u{1DC0}'..='\u{1DFF}').contains(&c)
        || ('\u{20D0}'..='\u{20FF}').contains(&c)
        || ('\u{FE20}'..='\u{FE2F}').contains(&c)
}

fn override_width(egc: &str) -> Option<u16> {
    OVERRIDES.iter().find(|(seq, _)| *seq == egc).map(|(_, w)| *w)
}

fn classify(egc: &str) -> EgcKind {
    let mut chars = egc.chars().peekable();
    let first = match chars.peek() {
        Some(c) => *c,
        None => return EgcKind::Narrow,
    };
    let single = egc.chars().count() == 1;

    if single {
        if first.is_ascii() {
            return EgcKind::Ascii;
        }
        let uwidth = unicode_width::UnicodeWidthChar::width(first).unwrap_or(1);
        if is_extended_pictographic(first) {
            return EgcKind::EmojiSimple;
        }
        if uwidth == 2 {
            return EgcKind::Wide;
        }
        return EgcKind::Narrow;
    }

    let mut count_ep = 0usize;
    let mut count_ri = 0usize;
    let mut has_zwj = false;
    let mut has_skin = false;
    let mut has_combining = false;
    let mut keycap_base: Option<char> = None;
    let mut ends_with_keycap = false;
    let mut any_wide = false;
    let mut base_wide_or_emoji = false;
    let mut saw_non_mark_base = false;
    let char_count = egc.chars().count();

    for (i, c) in egc.chars().enumerate() {
        if is_extended_pictographic(c) {
            count_ep += 1;
        }
        if is_regional_indicator(c) {
            count_ri += 1;
        }
        if c == ZWJ {
            has_zwj = true;
        }
        if is_skin_tone_modifier(c) {
            has_skin = true;
        }
        if is_combining_mark(c) {
            has_combining = true;
        }
        if c == KEYCAP_COMBINING && i == char_count - 1 {
            ends_with_keycap = true;
        }
        if keycap_base.is_none() && (c.is_ascii_digit() || c == '#' || c == '*') {
            keycap_base = Some(c);
        }
        if unicode_width::UnicodeWidthChar::width(c).unwrap_or(1) == 2 {
            any_wide = true;
        }
        if !saw_non_mark_base && !is_combining_mark(c) {
            saw_non_mark_base = true;
            if is_extended_pictographic(c)
                || unicode_width::UnicodeWidthChar::width(c).unwrap_or(1) == 2
            {
                base_wide_or_emoji = true;
            }
        }
    }

    if ends_with_keycap && keycap_base.is_some() {
        return EgcKind::EmojiKeycap;
    }
    if count_ri == 2 && char_count == 2 {
        return EgcKind::EmojiFlag;
    }
    if has_zwj && count_ep >= 2 {
        return EgcKind::EmojiZwj;
    }
    if count_ep >= 1 && has_skin {
        return EgcKind::EmojiModifier;
    }
    if count_ep == 1 && !has_zwj {
        return EgcKind::EmojiSimple;
    }
    if has_combining {
        return EgcKind::Combining(base_wide_or_emoji);
    }
    if any_wide {
        return EgcKind::Wide;
    }
    if count_ep > 0 {
        return EgcKind::EmojiSimple;
    }
    EgcKind::Narrow
}

#[inline]
fn width_for_kind(kind: EgcKind) -> u16 {
    match kind {
        EgcKind::Ascii | EgcKind::Narrow => 1,
        EgcKind::Wide
        | EgcKind::EmojiSimple
        | EgcKind::EmojiModifier
        | EgcKind::EmojiKeycap
        | EgcKind::EmojiFlag
        | EgcKind::EmojiZwj => 2,
        EgcKind::Combining(base_wide) => {
            if base_wide {
                2
            } else {
                1
            }
        }
    }
}

/// Display column width of a single grapheme cluster.
///
/// Precondition: `egc` is a single grapheme cluster (caller has already
/// segmented the source string). Wide East Asian characters count as 2
/// columns, narrow/ASCII as 1, matching spec.md §4.2.
#[inline]
pub fn egc_width(egc: &str) -> u16 {
    if egc.is_empty() {
        return 0;
    }
    if let Some(w) = override_width(egc) {
        return w;
    }
    let kind = classify(egc);
    let mut width = width_for_kind(kind);

    if width == 1 {
        let has_signal = egc
            .chars()
            .any(|c| is_extended_pictographic(c) || is_regional_indicator(c));
        if has_signal {
            width = 2;
        }
    }
    width
}
