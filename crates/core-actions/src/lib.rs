//! Edit Commands: the fixed key-to-operation dispatch table (C8).
//!
//! Unlike the teacher's `core-actions::dispatcher`, which resolves Vim-style
//! operator+motion+count compositions through a trie (`core-keymap`) and a
//! `PendingContext`, this line editor has exactly one mode and a fixed
//! binding table — dispatch is a plain `match` over `KeyEvent`, no
//! registrable keymap, no pending-operator state, save for one substate:
//! reverse-incremental-search (Ctrl-R), which needs to reinterpret the same
//! physical keys differently while it is active.
//!
//! Tab (completion) is deliberately not handled here: the binding table
//! marks it "delegated" to the host's completion hook, which only the
//! control loop (`core-editor`) has a reference to. `dispatch` treats Tab as
//! a no-op so the control loop must intercept it first when completion is
//! enabled.

use core_events::{CommandOutcome, KeyEvent, NamedKey};
use core_history::{History, Navigation};
use core_text::{Buffer, motion};

/// Reverse-incremental-search substate entered on Ctrl-R.
struct SearchState {
    query: String,
    /// Index into history and matched text of the current anchor, if any.
    matched: Option<(usize, String)>,
    pre_search: String,
    pre_cursor: usize,
}

impl SearchState {
    fn new(buffer: &Buffer) -> Self {
        Self {
            query: String::new(),
            matched: None,
            pre_search: buffer.content().to_string(),
            pre_cursor: buffer.cursor(),
        }
    }

    /// Re-anchor the search from the newest entry using the current query.
    fn rerun(&mut self, history: &History) {
        self.matched = history.search_substring(&self.query, None).map(|(i, t)| (i, t.to_string()));
    }

    /// Advance to the next older match for the current query.
    fn advance(&mut self, history: &History) {
        let before = self.matched.as_ref().map(|(i, _)| *i);
        self.matched = history.search_substring(&self.query, before).map(|(i, t)| (i, t.to_string()));
    }
}

/// Resolves decoded key events into buffer/history mutations.
///
/// Holds exactly the one piece of state a fixed dispatch table still needs:
/// whether reverse-incremental-search is active.
#[derive(Default)]
pub struct Dispatcher {
    search: Option<SearchState>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// The mini-prompt to render one line below the input while a Ctrl-R
    /// search is active: `(reverse-i-search)'Q': MATCH`.
    pub fn search_prompt(&self) -> Option<String> {
        self.search.as_ref().map(|s| {
            let matched = s.matched.as_ref().map(|(_, t)| t.as_str()).unwrap_or("");
            format!("(reverse-i-search)'{}': {matched}", s.query)
        })
    }

    pub fn dispatch(&mut self, key: KeyEvent, buffer: &mut Buffer, history: &mut History) -> CommandOutcome {
        if self.search.is_some() {
            self.dispatch_search(key, buffer, history)
        } else {
            self.dispatch_normal(key, buffer, history)
        }
    }

    fn dispatch_normal(&mut self, key: KeyEvent, buffer: &mut Buffer, history: &mut History) -> CommandOutcome {
        use KeyEvent::*;
        match key {
            Character(c) => {
                buffer.insert_char(c);
                CommandOutcome::Changed
            }
            Named(NamedKey::Enter, _) => {
                let line = buffer.content().to_string();
                history.reset_navigation();
                CommandOutcome::Complete(line)
            }
            Named(NamedKey::Backspace, _) | Control('H') => {
                if buffer.cursor() == 0 {
                    CommandOutcome::NoChange
                } else {
                    buffer.delete_before_cursor();
                    CommandOutcome::Changed
                }
            }
            Named(NamedKey::Delete, _) => {
                if buffer.cursor() >= buffer.len() {
                    CommandOutcome::NoChange
                } else {
                    buffer.delete_at_cursor();
                    CommandOutcome::Changed
                }
            }
            Control('A') | Named(NamedKey::Home, _) => move_cursor_to(buffer, 0),
            Control('E') | Named(NamedKey::End, _) => move_cursor_to(buffer, buffer.len()),
            Control('B') | Named(NamedKey::ArrowLeft, _) => move_left(buffer),
            Control('F') | Named(NamedKey::ArrowRight, _) => move_right(buffer),
            Alt('b') | Alt('B') => {
                let to = motion::word_left(buffer.content(), buffer.cursor());
                move_cursor_to(buffer, to)
            }
            Alt('f') | Alt('F') => {
                let to = motion::word_right(buffer.content(), buffer.cursor());
                move_cursor_to(buffer, to)
            }
            Control('W') => {
                if buffer.cursor() == 0 {
                    CommandOutcome::NoChange
                } else {
                    buffer.kill_word_backward();
                    CommandOutcome::Changed
                }
            }
            Alt('d') | Alt('D') => {
                if buffer.cursor() >= buffer.len() {
                    CommandOutcome::NoChange
                } else {
                    buffer.delete_word_forward();
                    CommandOutcome::Changed
                }
            }
            Control('K') => {
                if buffer.cursor() >= buffer.len() {
                    CommandOutcome::NoChange
                } else {
                    buffer.kill_to_eol();
                    CommandOutcome::Changed
                }
            }
            Control('U') => {
                if buffer.is_empty() {
                    CommandOutcome::NoChange
                } else {
                    buffer.clear();
                    CommandOutcome::Changed
                }
            }
            Control('L') => {
                tracing::debug!(target: "actions", "clear-screen requested");
                CommandOutcome::Redraw
            }
            Control('P') | Named(NamedKey::ArrowUp, _) => history_prev(buffer, history),
            Control('N') | Named(NamedKey::ArrowDown, _) => history_next(buffer, history),
            Control('R') => {
                tracing::debug!(target: "actions", "entering reverse-incremental-search");
                self.search = Some(SearchState::new(buffer));
                CommandOutcome::NoChange
            }
            Control('D') => {
                if buffer.is_empty() {
                    CommandOutcome::EndOfInput
                } else {
                    buffer.delete_at_cursor();
                    CommandOutcome::Changed
                }
            }
            Control('C') => CommandOutcome::Cancelled,
            Control('G') => CommandOutcome::Cancelled,
            EndOfInput => CommandOutcome::EndOfInput,
            // Tab (completion, delegated), unrecognized escapes, and a bare
            // timeout/incomplete assembly all leave the buffer untouched.
            _ => CommandOutcome::NoChange,
        }
    }

    fn dispatch_search(&mut self, key: KeyEvent, buffer: &mut Buffer, history: &mut History) -> CommandOutcome {
        use KeyEvent::*;
        let state = self.search.as_mut().expect("dispatch_search called without an active search");
        match key {
            Character(c) => {
                state.query.push(c);
                state.rerun(history);
                CommandOutcome::NoChange
            }
            Named(NamedKey::Backspace, _) | Control('H') => {
                state.query.pop();
                state.rerun(history);
                CommandOutcome::NoChange
            }
            Control('R') => {
                state.advance(history);
                CommandOutcome::NoChange
            }
            Named(NamedKey::Enter, _) => {
                let accepted = state.matched.take().map(|(_, t)| t).unwrap_or_else(|| state.pre_search.clone());
                tracing::debug!(target: "actions", %accepted, "reverse-incremental-search accepted on Enter");
                self.search = None;
                history.reset_navigation();
                buffer.replace_all(&accepted);
                CommandOutcome::Replaced
            }
            Control('G') | Named(NamedKey::Escape, _) => {
                let pre = std::mem::take(&mut state.pre_search);
                let cursor = state.pre_cursor;
                self.search = None;
                buffer.replace_all(&pre);
                buffer.set_cursor(cursor);
                CommandOutcome::Replaced
            }
            // Any other key exits the search, accepting the current match
            // (or leaving the pre-search buffer untouched if none matched).
            _ => {
                let accepted = state.matched.take().map(|(_, t)| t);
                self.search = None;
                match accepted {
                    Some(text) => {
                        buffer.replace_all(&text);
                        CommandOutcome::Replaced
                    }
                    None => CommandOutcome::NoChange,
                }
            }
        }
    }
}

fn move_left(buffer: &mut Buffer) -> CommandOutcome {
    if buffer.cursor() == 0 {
        return CommandOutcome::NoChange;
    }
    let to = motion::left(buffer.content(), buffer.cursor());
    move_cursor_to(buffer, to)
}

fn move_right(buffer: &mut Buffer) -> CommandOutcome {
    if buffer.cursor() >= buffer.len() {
        return CommandOutcome::NoChange;
    }
    let to = motion::right(buffer.content(), buffer.cursor());
    move_cursor_to(buffer, to)
}

fn move_cursor_to(buffer: &mut Buffer, byte: usize) -> CommandOutcome {
    if buffer.cursor() == byte {
        return CommandOutcome::NoChange;
    }
    buffer.set_cursor(byte);
    CommandOutcome::Changed
}

/// Ctrl-P / ArrowUp: step to an older entry, stashing the in-progress line
/// the first time navigation starts so Ctrl-N can restore it.
fn history_prev(buffer: &mut Buffer, history: &mut History) -> CommandOutcome {
    if history.count() > 0 && !history.is_navigating() {
        history.save_in_progress(buffer.content().to_string());
    }
    match history.prev() {
        Navigation::Entry(text) => {
            buffer.replace_all(text);
            CommandOutcome::Replaced
        }
        Navigation::NoChange | Navigation::BackToPresent => CommandOutcome::NoChange,
    }
}

/// Ctrl-N / ArrowDown: step to a newer entry, or restore the in-progress
/// line once navigation runs past the newest entry.
fn history_next(buffer: &mut Buffer, history: &mut History) -> CommandOutcome {
    match history.next() {
        Navigation::Entry(text) => {
            buffer.replace_all(text);
            CommandOutcome::Replaced
        }
        Navigation::BackToPresent => {
            let restored = history.take_in_progress().unwrap_or_default();
            buffer.replace_all(&restored);
            CommandOutcome::Replaced
        }
        Navigation::NoChange => CommandOutcome::NoChange,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::ModMask;
    use core_history::Source;

    fn history_with(lines: &[&str]) -> History {
        let mut h = History::new(10, false);
        for (i, l) in lines.iter().enumerate() {
            h.push(*l, i as u64, Source::Interactive);
        }
        h
    }

    #[test]
    fn character_inserts_at_cursor() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::new();
        let mut h = History::new(10, false);
        assert_eq!(d.dispatch(KeyEvent::Character('h'), &mut b, &mut h), CommandOutcome::Changed);
        assert_eq!(d.dispatch(KeyEvent::Character('i'), &mut b, &mut h), CommandOutcome::Changed);
        assert_eq!(b.content(), "hi");
    }

    #[test]
    fn enter_completes_with_buffer_contents() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::from_str("hello").unwrap();
        let mut h = History::new(10, false);
        let outcome = d.dispatch(KeyEvent::Named(NamedKey::Enter, ModMask::empty()), &mut b, &mut h);
        assert_eq!(outcome, CommandOutcome::Complete("hello".into()));
    }

    #[test]
    fn backspace_at_start_is_no_change() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::new();
        let mut h = History::new(10, false);
        assert_eq!(d.dispatch(KeyEvent::Control('H'), &mut b, &mut h), CommandOutcome::NoChange);
    }

    #[test]
    fn ctrl_a_and_ctrl_e_move_to_line_bounds() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::from_str("hello").unwrap();
        b.set_cursor(2);
        let mut h = History::new(10, false);
        d.dispatch(KeyEvent::Control('A'), &mut b, &mut h);
        assert_eq!(b.cursor(), 0);
        d.dispatch(KeyEvent::Control('E'), &mut b, &mut h);
        assert_eq!(b.cursor(), 5);
    }

    #[test]
    fn alt_b_and_alt_f_move_by_word() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::from_str("foo bar").unwrap();
        let mut h = History::new(10, false);
        d.dispatch(KeyEvent::Alt('b'), &mut b, &mut h);
        assert_eq!(b.cursor(), 4);
        d.dispatch(KeyEvent::Alt('b'), &mut b, &mut h);
        assert_eq!(b.cursor(), 0);
        d.dispatch(KeyEvent::Alt('f'), &mut b, &mut h);
        assert_eq!(b.cursor(), 3);
    }

    #[test]
    fn ctrl_k_kills_to_end_of_line() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::from_str("hello world").unwrap();
        b.set_cursor(5);
        let mut h = History::new(10, false);
        assert_eq!(d.dispatch(KeyEvent::Control('K'), &mut b, &mut h), CommandOutcome::Changed);
        assert_eq!(b.content(), "hello");
    }

    #[test]
    fn ctrl_u_clears_the_line() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::from_str("hello world").unwrap();
        let mut h = History::new(10, false);
        assert_eq!(d.dispatch(KeyEvent::Control('U'), &mut b, &mut h), CommandOutcome::Changed);
        assert!(b.is_empty());
    }

    #[test]
    fn ctrl_l_requests_redraw_without_touching_buffer() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::from_str("hello").unwrap();
        let mut h = History::new(10, false);
        assert_eq!(d.dispatch(KeyEvent::Control('L'), &mut b, &mut h), CommandOutcome::Redraw);
        assert_eq!(b.content(), "hello");
    }

    #[test]
    fn ctrl_d_on_empty_buffer_ends_input_but_deletes_otherwise() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::new();
        let mut h = History::new(10, false);
        assert_eq!(d.dispatch(KeyEvent::Control('D'), &mut b, &mut h), CommandOutcome::EndOfInput);

        let mut b2 = Buffer::from_str("ab").unwrap();
        b2.set_cursor(0);
        assert_eq!(d.dispatch(KeyEvent::Control('D'), &mut b2, &mut h), CommandOutcome::Changed);
        assert_eq!(b2.content(), "b");
    }

    #[test]
    fn ctrl_c_and_ctrl_g_cancel_outside_search() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::new();
        let mut h = History::new(10, false);
        assert_eq!(d.dispatch(KeyEvent::Control('C'), &mut b, &mut h), CommandOutcome::Cancelled);
        assert_eq!(d.dispatch(KeyEvent::Control('G'), &mut b, &mut h), CommandOutcome::Cancelled);
    }

    #[test]
    fn history_prev_then_next_restores_in_progress_line() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::from_str("draft").unwrap();
        let mut h = history_with(&["one", "two"]);

        assert_eq!(d.dispatch(KeyEvent::Control('P'), &mut b, &mut h), CommandOutcome::Replaced);
        assert_eq!(b.content(), "two");
        assert_eq!(d.dispatch(KeyEvent::Control('P'), &mut b, &mut h), CommandOutcome::Replaced);
        assert_eq!(b.content(), "one");
        assert_eq!(d.dispatch(KeyEvent::Control('P'), &mut b, &mut h), CommandOutcome::NoChange);

        assert_eq!(d.dispatch(KeyEvent::Control('N'), &mut b, &mut h), CommandOutcome::Replaced);
        assert_eq!(b.content(), "two");
        assert_eq!(d.dispatch(KeyEvent::Control('N'), &mut b, &mut h), CommandOutcome::Replaced);
        assert_eq!(b.content(), "draft");
    }

    #[test]
    fn reverse_search_finds_and_accepts_match() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::new();
        let mut h = history_with(&["git status", "git commit", "ls -la"]);

        d.dispatch(KeyEvent::Control('R'), &mut b, &mut h);
        assert!(d.is_searching());
        d.dispatch(KeyEvent::Character('g'), &mut b, &mut h);
        d.dispatch(KeyEvent::Character('i'), &mut b, &mut h);
        d.dispatch(KeyEvent::Character('t'), &mut b, &mut h);
        assert_eq!(d.search_prompt().unwrap(), "(reverse-i-search)'git': git commit");

        d.dispatch(KeyEvent::Control('R'), &mut b, &mut h);
        assert_eq!(d.search_prompt().unwrap(), "(reverse-i-search)'git': git status");

        let outcome = d.dispatch(KeyEvent::Named(NamedKey::Enter, ModMask::empty()), &mut b, &mut h);
        assert_eq!(outcome, CommandOutcome::Replaced);
        assert_eq!(b.content(), "git status");
        assert!(!d.is_searching());
    }

    #[test]
    fn reverse_search_ctrl_g_restores_pre_search_buffer() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::from_str("unfinished").unwrap();
        let mut h = history_with(&["git status"]);

        d.dispatch(KeyEvent::Control('R'), &mut b, &mut h);
        d.dispatch(KeyEvent::Character('g'), &mut b, &mut h);
        let outcome = d.dispatch(KeyEvent::Control('G'), &mut b, &mut h);
        assert_eq!(outcome, CommandOutcome::Replaced);
        assert_eq!(b.content(), "unfinished");
        assert!(!d.is_searching());
    }

    #[test]
    fn reverse_search_navigation_key_exits_accepting_match() {
        let mut d = Dispatcher::new();
        let mut b = Buffer::new();
        let mut h = history_with(&["git status"]);

        d.dispatch(KeyEvent::Control('R'), &mut b, &mut h);
        d.dispatch(KeyEvent::Character('g'), &mut b, &mut h);
        let outcome = d.dispatch(KeyEvent::Named(NamedKey::ArrowLeft, ModMask::empty()), &mut b, &mut h);
        assert_eq!(outcome, CommandOutcome::Replaced);
        assert_eq!(b.content(), "git status");
        assert!(!d.is_searching());
    }
}
