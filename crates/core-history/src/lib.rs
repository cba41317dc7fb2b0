//! Bounded, ordered history of past input lines with a navigation pointer,
//! reverse-substring search, and a line-oriented file format.
//!
//! File I/O (opening/closing the actual history file) is left to the host —
//! this crate only knows how to parse and format the line format, the way
//! the teacher keeps file-system concerns out of its core crates and in the
//! entrypoint binary.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Distinguishes lines pushed during this session from lines read back from
/// a history file, so `no_duplicates` dedup and save-on-exit don't need to
/// re-derive it from timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Interactive,
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    pub timestamp: u64,
    pub source: Source,
}

/// Result of a navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation<'a> {
    /// The cursor now points at this entry.
    Entry(&'a str),
    /// Navigation ran off the most recent entry back to "not navigating";
    /// the caller should restore whatever was saved via `save_in_progress`.
    BackToPresent,
    /// Nothing moved (e.g. `Prev` at the oldest entry, or an empty store).
    NoChange,
}

pub struct History {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    nav: Option<usize>,
    no_duplicates: bool,
    in_progress: Option<String>,
}

impl History {
    pub fn new(capacity: usize, no_duplicates: bool) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            nav: None,
            no_duplicates,
            in_progress: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, idx: usize) -> Option<&HistoryEntry> {
        self.entries.get(idx)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Add an entry, evicting the oldest if at capacity. A whitespace-only
    /// line is a no-op. If `no_duplicates` is set, an existing entry with
    /// identical text is removed first so only the freshest copy (and its
    /// position) survives. Resets navigation, since pushing happens only
    /// once a line is complete.
    pub fn push(&mut self, text: impl Into<String>, timestamp: u64, source: Source) {
        let text = text.into();
        if text.trim().is_empty() {
            return;
        }
        if self.no_duplicates {
            self.entries.retain(|e| e.text != text);
        }
        self.entries.push_back(HistoryEntry {
            text,
            timestamp,
            source,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.nav = None;
    }

    pub fn reset_navigation(&mut self) {
        self.nav = None;
    }

    /// Whether a `prev`/`next` walk is currently underway.
    pub fn is_navigating(&self) -> bool {
        self.nav.is_some()
    }

    pub fn save_in_progress(&mut self, line: String) {
        self.in_progress = Some(line);
    }

    pub fn take_in_progress(&mut self) -> Option<String> {
        self.in_progress.take()
    }

    /// Move toward older entries. The first call from "not navigating"
    /// lands on the most recent entry.
    pub fn prev(&mut self) -> Navigation<'_> {
        if self.entries.is_empty() {
            return Navigation::NoChange;
        }
        match self.nav {
            None => {
                self.nav = Some(self.entries.len() - 1);
            }
            Some(0) => return Navigation::NoChange,
            Some(i) => self.nav = Some(i - 1),
        }
        Navigation::Entry(&self.entries[self.nav.unwrap()].text)
    }

    /// Move toward newer entries; moving past the newest returns to "not
    /// navigating".
    pub fn next(&mut self) -> Navigation<'_> {
        match self.nav {
            None => Navigation::NoChange,
            Some(i) if i + 1 < self.entries.len() => {
                self.nav = Some(i + 1);
                Navigation::Entry(&self.entries[i + 1].text)
            }
            Some(_) => {
                self.nav = None;
                Navigation::BackToPresent
            }
        }
    }

    pub fn first(&mut self) -> Navigation<'_> {
        if self.entries.is_empty() {
            return Navigation::NoChange;
        }
        self.nav = Some(0);
        Navigation::Entry(&self.entries[0].text)
    }

    pub fn last(&mut self) -> Navigation<'_> {
        if self.entries.is_empty() {
            return Navigation::NoChange;
        }
        let i = self.entries.len() - 1;
        self.nav = Some(i);
        Navigation::Entry(&self.entries[i].text)
    }

    /// Search backward for `needle` as a substring, starting strictly before
    /// index `before` (or from the newest entry if `before` is `None`).
    /// Used by reverse-incremental-search (Ctrl-R), which re-anchors on
    /// every keystroke.
    pub fn search_substring(&self, needle: &str, before: Option<usize>) -> Option<(usize, &str)> {
        if needle.is_empty() {
            return None;
        }
        let start = before.unwrap_or(self.entries.len());
        self.entries
            .iter()
            .enumerate()
            .take(start)
            .rev()
            .find(|(_, e)| e.text.contains(needle))
            .map(|(i, e)| (i, e.text.as_str()))
    }

    /// Replace the entire contents (used by `load_from`), respecting
    /// capacity by keeping only the most recent `capacity` entries.
    pub fn replace_all(&mut self, entries: Vec<HistoryEntry>) {
        self.entries = entries.into_iter().collect();
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.nav = None;
        self.in_progress = None;
    }

    /// Parse a history file (line-oriented UTF-8; entries may carry an
    /// optional `#TIMESTAMP:` prefix, decimal seconds since epoch). Entries
    /// without the prefix are assigned timestamp zero. Replaces the current
    /// contents.
    pub fn load_from<R: BufRead>(&mut self, reader: R) -> std::io::Result<usize> {
        let mut loaded = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let (timestamp, text) = parse_line(&line);
            loaded.push(HistoryEntry {
                text,
                timestamp,
                source: Source::Loaded,
            });
        }
        let count = loaded.len();
        self.replace_all(loaded);
        Ok(count)
    }

    /// Write every entry, oldest first, with the `#TIMESTAMP:` prefix.
    pub fn save_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for entry in self.entries.iter() {
            writeln!(writer, "{}", format_line(entry))?;
        }
        Ok(())
    }
}

fn parse_line(line: &str) -> (u64, String) {
    if let Some(rest) = line.strip_prefix('#') {
        if let Some((ts, text)) = rest.split_once(':') {
            if let Ok(timestamp) = ts.parse::<u64>() {
                return (timestamp, text.to_string());
            }
        }
    }
    (0, line.to_string())
}

fn format_line(entry: &HistoryEntry) -> String {
    format!("#{}:{}", entry.timestamp, entry.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_evicts_oldest_past_capacity() {
        let mut h = History::new(2, false);
        h.push("a", 1, Source::Interactive);
        h.push("b", 2, Source::Interactive);
        h.push("c", 3, Source::Interactive);
        assert_eq!(h.count(), 2);
        assert_eq!(h.get(0).unwrap().text, "b");
        assert_eq!(h.get(1).unwrap().text, "c");
    }

    #[test]
    fn no_duplicates_keeps_only_latest_copy() {
        let mut h = History::new(10, true);
        h.push("ls", 1, Source::Interactive);
        h.push("pwd", 2, Source::Interactive);
        h.push("ls", 3, Source::Interactive);
        assert_eq!(h.count(), 2);
        assert_eq!(h.get(0).unwrap().text, "pwd");
        assert_eq!(h.get(1).unwrap().text, "ls");
        assert_eq!(h.get(1).unwrap().timestamp, 3);
    }

    #[test]
    fn push_whitespace_only_is_a_no_op() {
        let mut h = History::new(10, false);
        h.push("   ", 1, Source::Interactive);
        h.push("\t\n", 2, Source::Interactive);
        assert_eq!(h.count(), 0);
    }

    #[test]
    fn is_navigating_tracks_prev_next() {
        let mut h = History::new(10, false);
        h.push("one", 1, Source::Interactive);
        assert!(!h.is_navigating());
        h.prev();
        assert!(h.is_navigating());
        h.next();
        assert!(!h.is_navigating());
    }

    #[test]
    fn navigation_prev_next_round_trip() {
        let mut h = History::new(10, false);
        h.push("one", 1, Source::Interactive);
        h.push("two", 2, Source::Interactive);
        h.push("three", 3, Source::Interactive);

        assert_eq!(h.prev(), Navigation::Entry("three"));
        assert_eq!(h.prev(), Navigation::Entry("two"));
        assert_eq!(h.prev(), Navigation::Entry("one"));
        assert_eq!(h.prev(), Navigation::NoChange);

        assert_eq!(h.next(), Navigation::Entry("two"));
        assert_eq!(h.next(), Navigation::Entry("three"));
        assert_eq!(h.next(), Navigation::BackToPresent);
    }

    #[test]
    fn prev_on_empty_history_is_no_change() {
        let mut h = History::new(10, false);
        assert_eq!(h.prev(), Navigation::NoChange);
    }

    #[test]
    fn in_progress_save_and_take() {
        let mut h = History::new(10, false);
        assert_eq!(h.take_in_progress(), None);
        h.save_in_progress("draft".to_string());
        assert_eq!(h.take_in_progress(), Some("draft".to_string()));
        assert_eq!(h.take_in_progress(), None);
    }

    #[test]
    fn search_substring_walks_backward_from_anchor() {
        let mut h = History::new(10, false);
        h.push("git status", 1, Source::Interactive);
        h.push("git commit", 2, Source::Interactive);
        h.push("ls -la", 3, Source::Interactive);

        let (idx, text) = h.search_substring("git", None).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(text, "git commit");

        let (idx2, text2) = h.search_substring("git", Some(idx)).unwrap();
        assert_eq!(idx2, 0);
        assert_eq!(text2, "git status");

        assert!(h.search_substring("git", Some(idx2)).is_none());
    }

    #[test]
    fn load_from_parses_timestamp_prefix_and_bare_lines() {
        let data = "#100:first\nsecond\n#200:third\n";
        let mut h = History::new(10, false);
        let n = h.load_from(data.as_bytes()).unwrap();
        assert_eq!(n, 3);
        assert_eq!(
            h.get(0).unwrap(),
            &HistoryEntry {
                text: "first".into(),
                timestamp: 100,
                source: Source::Loaded
            }
        );
        assert_eq!(h.get(1).unwrap().timestamp, 0);
        assert_eq!(h.get(1).unwrap().text, "second");
        assert_eq!(h.get(2).unwrap().timestamp, 200);
    }

    #[test]
    fn save_to_round_trips_through_load_from() {
        let mut h = History::new(10, false);
        h.push("alpha", 10, Source::Interactive);
        h.push("beta", 20, Source::Interactive);

        let mut buf = Vec::new();
        h.save_to(&mut buf).unwrap();

        let mut h2 = History::new(10, false);
        h2.load_from(buf.as_slice()).unwrap();
        assert_eq!(h2.count(), 2);
        assert_eq!(h2.get(0).unwrap().text, "alpha");
        assert_eq!(h2.get(0).unwrap().timestamp, 10);
        assert_eq!(h2.get(1).unwrap().text, "beta");
    }

    #[test]
    fn replace_all_respects_capacity() {
        let mut h = History::new(2, false);
        h.replace_all(vec![
            HistoryEntry {
                text: "a".into(),
                timestamp: 1,
                source: Source::Loaded,
            },
            HistoryEntry {
                text: "b".into(),
                timestamp: 2,
                source: Source::Loaded,
            },
            HistoryEntry {
                text: "c".into(),
                timestamp: 3,
                source: Source::Loaded,
            },
        ]);
        assert_eq!(h.count(), 2);
        assert_eq!(h.get(0).unwrap().text, "b");
        assert_eq!(h.get(1).unwrap().text, "c");
    }

    #[test]
    fn file_round_trip_through_tempfile() {
        use std::io::{BufReader, Seek, SeekFrom};

        let mut file = tempfile::tempfile().unwrap();
        let mut h = History::new(10, false);
        h.push("first command", 1, Source::Interactive);
        h.push("second command", 2, Source::Interactive);
        h.save_to(&mut file).unwrap();

        file.seek(SeekFrom::Start(0)).unwrap();
        let mut h2 = History::new(10, false);
        h2.load_from(BufReader::new(file)).unwrap();
        assert_eq!(h2.count(), 2);
        assert_eq!(h2.get(1).unwrap().text, "second command");
        assert_eq!(h2.get(1).unwrap().source, Source::Loaded);
    }
}
