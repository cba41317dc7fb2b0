mod support;

use core_geometry::Prompt;
use core_render::DisplayEngine;
use support::mock_terminal::MockTerminal;

#[test]
fn multiline_prompt_positions_cursor_on_its_last_line() {
    let mut eng = DisplayEngine::new(Prompt::parse("first\n> "), 80);
    let mut term = MockTerminal::new();
    eng.render_full(&mut term, "hi", 2).unwrap();
    let out = term.as_str();
    assert!(out.starts_with("first\r\n> hi"));
}

/// Replays a single-row ANSI byte stream into its visible text, so a test
/// can assert on what actually ends up on screen rather than on the raw
/// byte stream. Only handles the subset of sequences this module emits for
/// an unwrapped single-line prompt: `\x08` backspace, `\x1b[K`/`\x1b[J`
/// clear, `\x1b[nG` column move, `\x1b[r;cH` absolute move. `\x1b[nA`/`\x1b[nB`
/// (row moves) are no-ops here since the scenarios below never wrap.
fn replay_single_row(bytes: &[u8]) -> String {
    let mut row: Vec<char> = Vec::new();
    let mut col: usize = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == 0x08 {
            col = col.saturating_sub(1);
            i += 1;
        } else if b == 0x1b && bytes.get(i + 1) == Some(&b'[') {
            let mut j = i + 2;
            while j < bytes.len() && (bytes[j].is_ascii_digit() || bytes[j] == b';') {
                j += 1;
            }
            let params = std::str::from_utf8(&bytes[i + 2..j]).unwrap();
            let final_byte = bytes[j];
            match final_byte {
                b'K' | b'J' => row.truncate(col),
                b'G' => {
                    let n: usize = params.parse().unwrap_or(1);
                    col = n.saturating_sub(1);
                }
                b'H' => {
                    let c: usize = params.split(';').nth(1).and_then(|s| s.parse().ok()).unwrap_or(1);
                    col = c.saturating_sub(1);
                }
                b'A' | b'B' => {}
                _ => {}
            }
            i = j + 1;
        } else {
            let ch = b as char;
            if col < row.len() {
                row[col] = ch;
            } else {
                row.push(ch);
            }
            col += 1;
            i += 1;
        }
    }
    row.into_iter().collect()
}

#[test]
fn history_load_round_trips_through_replace_all_and_incremental() {
    let mut eng = DisplayEngine::new(Prompt::parse("$ "), 80);
    let mut term = MockTerminal::new();
    eng.render_full(&mut term, "draft", 5).unwrap();
    assert_eq!(replay_single_row(&term.out), "$ draft");

    term.out.clear();
    eng.replace_all(&mut term, "git commit -m wip", 17).unwrap();
    assert!(term.as_str().ends_with("git commit -m wip"));
    // the erase must walk back the full old content, not old_len - 1, or a
    // stale leading character from "draft" survives on screen.
    let erase_count = term.out.windows(3).filter(|w| *w == [0x08, b' ', 0x08]).count();
    assert_eq!(erase_count, 5, "expected one destructive backspace per old grapheme");
    let mut cumulative = b"$ draft".to_vec();
    cumulative.extend_from_slice(&term.out);
    assert_eq!(replay_single_row(&cumulative), "$ git commit -m wip");

    term.out.clear();
    eng.update_incremental(&mut term, "git commit -m wip2", 18)
        .unwrap();
    assert_eq!(term.as_str(), "2");
    cumulative.extend_from_slice(&term.out);
    assert_eq!(replay_single_row(&cumulative), "$ git commit -m wip2");
}

#[test]
fn recovery_render_full_after_incremental_failure_increments_metric() {
    struct FlakyTerminal {
        inner: MockTerminal,
        fail_next_clear: bool,
    }
    impl core_terminal::TerminalSink for FlakyTerminal {
        fn write(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
            self.inner.write(bytes)
        }
        fn clear_to_end_of_line(&mut self) -> anyhow::Result<()> {
            if self.fail_next_clear {
                self.fail_next_clear = false;
                return Err(anyhow::anyhow!("simulated failure"));
            }
            self.inner.clear_to_end_of_line()
        }
        fn clear_to_end_of_screen(&mut self) -> anyhow::Result<()> {
            self.inner.clear_to_end_of_screen()
        }
        fn clear_line(&mut self) -> anyhow::Result<()> {
            self.inner.clear_line()
        }
        fn move_to(&mut self, row: u16, col: u16) -> anyhow::Result<()> {
            self.inner.move_to(row, col)
        }
        fn move_up(&mut self, n: u16) -> anyhow::Result<()> {
            self.inner.move_up(n)
        }
        fn move_down(&mut self, n: u16) -> anyhow::Result<()> {
            self.inner.move_down(n)
        }
        fn move_to_column(&mut self, col: u16) -> anyhow::Result<()> {
            self.inner.move_to_column(col)
        }
        fn hide_cursor(&mut self) -> anyhow::Result<()> {
            self.inner.hide_cursor()
        }
        fn show_cursor(&mut self) -> anyhow::Result<()> {
            self.inner.show_cursor()
        }
        fn set_fg(&mut self, c: crossterm::style::Color) -> anyhow::Result<()> {
            self.inner.set_fg(c)
        }
        fn set_bg(&mut self, c: crossterm::style::Color) -> anyhow::Result<()> {
            self.inner.set_bg(c)
        }
        fn reset_style(&mut self) -> anyhow::Result<()> {
            self.inner.reset_style()
        }
        fn enter_raw_mode(&mut self) -> anyhow::Result<()> {
            self.inner.enter_raw_mode()
        }
        fn exit_raw_mode(&mut self) -> anyhow::Result<()> {
            self.inner.exit_raw_mode()
        }
        fn flush(&mut self) -> anyhow::Result<()> {
            self.inner.flush()
        }
    }

    let mut eng = DisplayEngine::new(Prompt::parse("$ "), 80);
    let mut term = FlakyTerminal {
        inner: MockTerminal::new(),
        fail_next_clear: false,
    };
    eng.render_full(&mut term, "aXc", 3).unwrap();
    term.fail_next_clear = true;
    eng.update_incremental(&mut term, "aYc", 3).unwrap();
    assert_eq!(eng.metrics().recovery_renders, 1);
    assert_eq!(eng.state(), core_render::EngineState::Synced);
}
