//! Control Loop (C9): the `Editor` handle and `read_line` entry point.
//!
//! Ties every other crate together the way spec's library surface
//! describes: `Editor::new` takes the pieces `create(config)` would
//! assemble, `read_line` runs the build-prompt / enter-raw-mode /
//! render-full / decode-dispatch-render loop, and the handle itself plays
//! the role `destroy(editor)` would — there is nothing to release beyond
//! what `Drop` on its fields already does (the terminal's raw mode is
//! restored by a local guard before `read_line` even returns).

use std::io::{BufReader, Read};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use core_actions::Dispatcher;
pub use core_config::Config;
use core_events::{CommandOutcome, EditorError, KeyEvent, NamedKey};
pub use core_events::ModMask;
use core_geometry::Prompt;
use core_history::{History, Source};
pub use core_input::{ByteSource, Decoder};
pub use core_render::StyleSpan;
use core_render::DisplayEngine;
use core_terminal::TerminalSink;
use core_text::{Buffer, grapheme};

/// A completion candidate offered by the host's completion hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub display: String,
    pub replacement: String,
}

/// `complete(input, cursor) -> candidates`, registered via `set_completion_hook`.
pub type CompletionHook = Box<dyn FnMut(&str, usize) -> Vec<Candidate>>;
/// `style(input) -> spans`, registered via `set_style_hook`. Consulted only
/// on full and replace-all renders — see the module doc on `render_styled`.
pub type StyleHook = Box<dyn Fn(&str) -> Vec<StyleSpan>>;

/// What `read_line` returned, distinguishing normal completion from the two
/// outcomes spec.md §7 gives their own error kind rather than folding
/// everything into a bare `Option<String>` (see `DESIGN.md`'s C9 entry for
/// why this crate departs from the literal `Option<String>` signature).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    Interrupted,
    EndOfInput,
}

struct CompletionCycle {
    index: usize,
    word_start: usize,
}

/// An embeddable line editor session. Generic over the terminal sink and
/// byte source so tests can swap in a `Vec<u8>`-backed sink and a scripted
/// source instead of a live TTY; `rline-repl` instantiates it over
/// `CrosstermTerminal` and `TtyReader<Stdin>`.
pub struct Editor<T: TerminalSink, S: ByteSource> {
    config: Config,
    history: History,
    dispatcher: Dispatcher,
    decoder: Decoder,
    term: T,
    source: S,
    term_width: u16,
    last_error: Option<EditorError>,
    completion: Option<CompletionHook>,
    style: Option<StyleHook>,
    completion_cycle: Option<CompletionCycle>,
}

impl<T: TerminalSink, S: ByteSource> Editor<T, S> {
    /// `create(config)`: assemble an editor session over a terminal sink and
    /// byte source. `term_width` seeds the Display Engine's wrap column;
    /// `set_term_width` updates it on `SIGWINCH`/`COLUMNS` changes.
    pub fn new(config: Config, term: T, source: S, term_width: u16) -> Self {
        let decoder = Decoder::new(Duration::from_millis(config.escape_timeout_ms));
        let history = History::new(config.max_history_size, config.no_history_duplicates);
        Self {
            config,
            history,
            dispatcher: Dispatcher::new(),
            decoder,
            term,
            source,
            term_width: term_width.max(1),
            last_error: None,
            completion: None,
            style: None,
            completion_cycle: None,
        }
    }

    pub fn set_term_width(&mut self, width: u16) {
        self.term_width = width.max(1);
    }

    pub fn set_multiline(&mut self, on: bool) {
        self.config.enable_multiline = on;
    }

    pub fn set_syntax_highlight(&mut self, on: bool) {
        self.config.enable_syntax_highlighting = on;
    }

    pub fn set_completion(&mut self, on: bool) {
        self.config.enable_auto_completion = on;
    }

    pub fn set_completion_hook(&mut self, hook: CompletionHook) {
        self.completion = Some(hook);
    }

    pub fn set_style_hook(&mut self, hook: StyleHook) {
        self.style = Some(hook);
    }

    pub fn add_history(&mut self, line: impl Into<String>) {
        self.history.push(line, now_seconds(), Source::Interactive);
    }

    pub fn clear_history(&mut self) {
        self.history.replace_all(Vec::new());
    }

    pub fn history_count(&self) -> usize {
        self.history.count()
    }

    pub fn last_error(&self) -> Option<&EditorError> {
        self.last_error.as_ref()
    }

    /// Read a history file and replace the in-memory store with its
    /// contents, respecting `max_history_size`.
    pub fn load_history(&mut self, path: impl AsRef<Path>) -> Result<usize, EditorError> {
        let file = std::fs::File::open(path).map_err(|e| EditorError::TerminalIO(e.into()))?;
        self.history
            .load_from(BufReader::new(file))
            .map_err(|e| EditorError::TerminalIO(e.into()))
    }

    pub fn save_history(&mut self, path: impl AsRef<Path>) -> Result<(), EditorError> {
        let file = std::fs::File::create(path).map_err(|e| EditorError::TerminalIO(e.into()))?;
        self.history
            .save_to(file)
            .map_err(|e| EditorError::TerminalIO(e.into()))
    }

    /// Run one full read-a-line session: enter raw mode, render the prompt,
    /// decode and dispatch keys until the line completes or input ends,
    /// restore the terminal, and (on a non-whitespace completed line) push
    /// it to history.
    pub fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome, EditorError> {
        self.last_error = None;
        let mut engine = DisplayEngine::new(Prompt::parse(prompt), self.term_width);
        let mut buffer = Buffer::new();

        self.term.enter_raw_mode().map_err(to_terminal_io)?;
        let outcome = self.run_loop(&mut engine, &mut buffer);
        let _ = self.restore_terminal(&mut engine);
        let _ = self.term.exit_raw_mode();

        let outcome = outcome.inspect_err(|e| {
            self.last_error = Some(clone_error(e));
        })?;

        if let ReadOutcome::Line(ref line) = outcome {
            if self.config.enable_history && !line.trim().is_empty() {
                self.add_history(line.clone());
            }
        }
        Ok(outcome)
    }

    fn restore_terminal(&mut self, engine: &mut DisplayEngine) -> Result<(), EditorError> {
        let row = engine.cursor_row();
        if row > 0 {
            self.term.move_up(row as u16).map_err(to_terminal_io)?;
        }
        self.term.move_to_column(0).map_err(to_terminal_io)?;
        self.term.write(b"\r\n").map_err(to_terminal_io)?;
        self.term.flush().map_err(to_terminal_io)
    }

    fn run_loop(&mut self, engine: &mut DisplayEngine, buffer: &mut Buffer) -> Result<ReadOutcome, EditorError> {
        self.initial_render(engine, buffer)?;

        loop {
            let event = self
                .decoder
                .next_event(&mut self.source)
                .map_err(|e| EditorError::TerminalIO(e.into()))?;

            if matches!(event, KeyEvent::Incomplete | KeyEvent::Timeout) {
                continue;
            }

            if self.config.enable_auto_completion
                && self.completion.is_some()
                && matches!(event, KeyEvent::Named(NamedKey::Tab, _))
            {
                self.handle_completion(buffer);
                let (content, cursor) = self.display_state(buffer);
                self.render_incremental(engine, &content, cursor)?;
                continue;
            }
            self.completion_cycle = None;

            let was_searching = self.dispatcher.is_searching();
            let outcome = self.dispatcher.dispatch(event, buffer, &mut self.history);

            match outcome {
                CommandOutcome::Changed => {
                    let (content, cursor) = self.display_state(buffer);
                    self.render_incremental(engine, &content, cursor)?;
                }
                CommandOutcome::NoChange => {
                    if was_searching || self.dispatcher.is_searching() {
                        let (content, cursor) = self.display_state(buffer);
                        self.render_incremental(engine, &content, cursor)?;
                    }
                }
                CommandOutcome::Replaced => {
                    let (content, cursor) = self.display_state(buffer);
                    self.render_replaced(engine, &content, cursor)?;
                }
                CommandOutcome::Redraw => {
                    self.handle_redraw(engine, buffer)?;
                }
                CommandOutcome::Complete(line) => return Ok(ReadOutcome::Line(line)),
                CommandOutcome::Cancelled => return Ok(ReadOutcome::Interrupted),
                CommandOutcome::EndOfInput => return Ok(ReadOutcome::EndOfInput),
            }
        }
    }

    /// While reverse-incremental-search is active, the search mini-prompt
    /// takes over the display in place of the buffer's own content — this
    /// editor has no second display row to spare, so it overlays rather
    /// than appends (see `DESIGN.md`'s C9 entry).
    fn display_state(&self, buffer: &Buffer) -> (String, usize) {
        match self.dispatcher.search_prompt() {
            Some(s) => {
                let len = s.len();
                (s, len)
            }
            None => (buffer.content().to_string(), buffer.cursor()),
        }
    }

    fn initial_render(&mut self, engine: &mut DisplayEngine, buffer: &Buffer) -> Result<(), EditorError> {
        let (content, cursor) = self.display_state(buffer);
        self.render_full_dispatch(engine, &content, cursor)
    }

    fn render_full_dispatch(&mut self, engine: &mut DisplayEngine, content: &str, cursor: usize) -> Result<(), EditorError> {
        if let Some(spans) = self.styled_spans(content) {
            tracing::trace!(target: "editor.render", path = "full_styled", spans = spans.len());
            engine.render_full_styled(&mut self.term, content, cursor, &spans).map_err(to_terminal_io)
        } else {
            tracing::trace!(target: "editor.render", path = "full");
            engine.render_full(&mut self.term, content, cursor).map_err(to_terminal_io)
        }
    }

    fn render_incremental(&mut self, engine: &mut DisplayEngine, content: &str, cursor: usize) -> Result<(), EditorError> {
        engine.mark_dirty();
        // Styled spans are threaded through the incremental diff's case
        // analysis only at the cost of real complexity for a hot path; this
        // editor instead renders fully whenever highlighting is live, which
        // trades some redraw cost for correct styling on every keystroke.
        if self.styled_spans(content).is_some() {
            self.render_full_dispatch(engine, content, cursor)
        } else {
            tracing::trace!(target: "editor.render", path = "incremental");
            engine.update_incremental(&mut self.term, content, cursor).map_err(to_terminal_io)
        }
    }

    fn render_replaced(&mut self, engine: &mut DisplayEngine, content: &str, cursor: usize) -> Result<(), EditorError> {
        if let Some(spans) = self.styled_spans(content) {
            tracing::trace!(target: "editor.render", path = "replace_all_styled", spans = spans.len());
            engine
                .replace_all_styled(&mut self.term, content, cursor, &spans)
                .map_err(to_terminal_io)
        } else {
            tracing::trace!(target: "editor.render", path = "replace_all");
            engine.replace_all(&mut self.term, content, cursor).map_err(to_terminal_io)
        }
    }

    fn styled_spans(&self, content: &str) -> Option<Vec<StyleSpan>> {
        if !self.config.enable_syntax_highlighting {
            return None;
        }
        self.style.as_ref().map(|hook| hook(content))
    }

    /// Ctrl-L: physically clear from the prompt's start to the end of the
    /// screen, then render fresh. This editor never addresses the terminal
    /// in absolute coordinates, so "clear" means "erase forward from where
    /// our own content began", not a whole-screen reset.
    fn handle_redraw(&mut self, engine: &mut DisplayEngine, buffer: &Buffer) -> Result<(), EditorError> {
        tracing::debug!(target: "editor.render", "redraw requested");
        let row = engine.cursor_row();
        if row > 0 {
            self.term.move_up(row as u16).map_err(to_terminal_io)?;
        }
        self.term.move_to_column(0).map_err(to_terminal_io)?;
        self.term.clear_to_end_of_screen().map_err(to_terminal_io)?;
        self.term.flush().map_err(to_terminal_io)?;
        engine.reset_cursor_tracking();
        engine.mark_divergent();
        let (content, cursor) = self.display_state(buffer);
        self.render_full_dispatch(engine, &content, cursor)
    }

    /// Tab: ask the completion hook for candidates over the word under the
    /// cursor, replacing it with the first candidate, or cycling to the
    /// next one on a repeated Tab press over the same replacement.
    fn handle_completion(&mut self, buffer: &mut Buffer) {
        let content = buffer.content().to_string();
        let cursor = buffer.cursor();
        let (start, end) = word_bounds(&content, cursor);

        let candidates = match self.completion.as_mut() {
            Some(hook) => hook(&content, cursor),
            None => return,
        };
        if candidates.is_empty() {
            self.completion_cycle = None;
            return;
        }

        let index = match &self.completion_cycle {
            Some(cycle) if cycle.word_start == start => (cycle.index + 1) % candidates.len(),
            _ => 0,
        };

        let replacement = candidates[index].replacement.clone();
        let mut new_content = content;
        new_content.replace_range(start..end, &replacement);
        buffer.replace_all(&new_content);
        buffer.set_cursor(start + replacement.len());

        self.completion_cycle = Some(CompletionCycle { index, word_start: start });
    }
}

fn word_bounds(content: &str, cursor: usize) -> (usize, usize) {
    let mut start = cursor;
    while start > 0 {
        let prev = grapheme::prev_boundary(content, start);
        if grapheme::is_word(&content[prev..start]) {
            start = prev;
        } else {
            break;
        }
    }
    let mut end = cursor;
    while end < content.len() {
        let next = grapheme::next_boundary(content, end);
        if grapheme::is_word(&content[end..next]) {
            end = next;
        } else {
            break;
        }
    }
    (start, end)
}

fn to_terminal_io(e: anyhow::Error) -> EditorError {
    EditorError::TerminalIO(e)
}

fn clone_error(e: &EditorError) -> EditorError {
    match e {
        EditorError::InvalidParameter(s) => EditorError::InvalidParameter(s.clone()),
        EditorError::OutOfMemory => EditorError::OutOfMemory,
        EditorError::NotInitialized => EditorError::NotInitialized,
        EditorError::TerminalIO(err) => EditorError::TerminalIO(anyhow::anyhow!(err.to_string())),
        EditorError::Interrupted => EditorError::Interrupted,
        EditorError::EndOfInput => EditorError::EndOfInput,
    }
}

fn now_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Reads one byte at a time from anything implementing `std::io::Read`,
/// applying no timeout semantics of its own beyond what `Decoder` requests —
/// used in place of `core_input::TtyReader` wherever a real file descriptor
/// isn't available (tests, or a non-TTY-backed host).
pub struct BlockingByteSource<R> {
    inner: R,
}

impl<R: Read> BlockingByteSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> ByteSource for BlockingByteSource<R> {
    fn read_byte(&mut self, _timeout: Option<Duration>) -> std::io::Result<core_input::ByteOutcome> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(0) => Ok(core_input::ByteOutcome::Eof),
            Ok(_) => Ok(core_input::ByteOutcome::Byte(buf[0])),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => self.read_byte(_timeout),
            Err(e) => Err(e),
        }
    }
}
