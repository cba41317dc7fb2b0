//! rline demo entrypoint: a minimal interactive shell-prompt loop exercising
//! the line editor's public surface end to end (history load/save,
//! completion, syntax highlighting) against a real TTY.

use std::io::stdin;
use std::path::PathBuf;
use std::sync::Once;

use anyhow::Result;
use clap::Parser;
use core_editor::{Candidate, Config, Editor, ReadOutcome, StyleSpan};
use core_input::TtyReader;
use core_terminal::{CrosstermTerminal, TermColor};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "rline-repl", version, about = "rline demo REPL")]
struct Args {
    /// Config file path (overrides discovery of `rline.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// History file to load on startup and save on exit.
    #[arg(long = "history-file")]
    history_file: Option<PathBuf>,
    /// Disable history entirely for this run.
    #[arg(long = "no-history")]
    no_history: bool,
}

fn configure_logging() -> Option<WorkerGuard> {
    std::env::var_os("RLINE_DEBUG")?;
    let log_dir = std::path::Path::new(".");
    let file_appender = tracing_appender::rolling::never(log_dir, "rline.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

/// `COLUMNS` env var wins per spec.md §6; falls back to querying the TTY,
/// then to a conservative default.
fn term_width() -> u16 {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|s| s.parse().ok())
        .or_else(|| crossterm::terminal::size().ok().map(|(w, _)| w))
        .unwrap_or(80)
}

/// Trivial path-prefix completion over the current directory, standing in
/// for a real shell's `$PATH`/filesystem completion.
fn complete_path_prefix(input: &str, cursor: usize) -> Vec<Candidate> {
    let prefix = &input[..cursor];
    let word_start = prefix.rfind(' ').map(|i| i + 1).unwrap_or(0);
    let word = &prefix[word_start..];
    if word.is_empty() {
        return Vec::new();
    }
    let Ok(entries) = std::fs::read_dir(".") else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.starts_with(word))
        .map(|name| Candidate {
            display: name.clone(),
            replacement: name,
        })
        .collect()
}

const KEYWORDS: &[&str] = &["if", "then", "else", "fi", "for", "do", "done", "while"];

/// Highlights shell-ish keywords, standing in for a real syntax hook.
fn highlight_keywords(input: &str) -> Vec<StyleSpan> {
    let mut spans = Vec::new();
    for (start, word) in input.split_whitespace().map(|w| {
        let start = w.as_ptr() as usize - input.as_ptr() as usize;
        (start, w)
    }) {
        if KEYWORDS.contains(&word) {
            spans.push(StyleSpan {
                range: start..start + word.len(),
                fg: Some(TermColor::Green),
                bg: None,
            });
        }
    }
    spans
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();
    let args = Args::parse();

    info!(target: "runtime", "startup");

    let config: Config = core_config::load_from(args.config.clone());
    let term = CrosstermTerminal::new();
    let source = TtyReader::new(stdin());
    let mut editor: Editor<CrosstermTerminal, TtyReader<std::io::Stdin>> =
        Editor::new(config, term, source, term_width());

    editor.set_completion(true);
    editor.set_completion_hook(Box::new(complete_path_prefix));
    editor.set_syntax_highlight(true);
    editor.set_style_hook(Box::new(highlight_keywords));

    if !args.no_history {
        if let Some(path) = &args.history_file {
            match editor.load_history(path) {
                Ok(n) => info!(target: "history", count = n, "loaded"),
                Err(e) => warn!(target: "history", error = %e, "could not load history file"),
            }
        }
    }

    loop {
        match editor.read_line("$ ") {
            Ok(ReadOutcome::Line(line)) => {
                println!("{line}");
            }
            Ok(ReadOutcome::Interrupted) => {
                continue;
            }
            Ok(ReadOutcome::EndOfInput) => break,
            Err(e) => {
                warn!(target: "runtime", error = %e, "read_line failed");
                break;
            }
        }
    }

    if !args.no_history {
        if let Some(path) = &args.history_file {
            if let Err(e) = editor.save_history(path) {
                warn!(target: "history", error = %e, "could not save history file");
            }
        }
    }

    Ok(())
}
