//! Line-oriented terminal front end.
//!
//! Shows a few lines around the flagged word with the word highlighted,
//! the numbered suggestions and a command line.  Answers are read one line
//! at a time; end of input interrupts the session.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use colored::Colorize;

use crate::checker::{Action, Frontend};
use crate::source_file::{SourceFile, Word};
use crate::text_buffer::Style;

/// Lines shown above and below the word.
const CONTEXT_LINES: usize = 2;

const KEYS: &str = "[1-9,0] choose  i/I ignore (all)  r/R replace (all)  u undo  s skip file  x exit  b abort";

pub struct Display {
    pub tab_size: usize,
    pub highlight: Style,
    pub line_number: Style,
}

/// Map one answer to an action.  Digits pick suggestions, `0` is the tenth.
pub fn parse_action(input: &str) -> Option<Action> {
    let mut chars = input.trim().chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let action = match c {
        '1'..='9' => Action::SelectSuggestion(c as usize - '1' as usize),
        '0' => Action::SelectSuggestion(9),
        'i' => Action::Ignore { all: false },
        'I' => Action::Ignore { all: true },
        'r' => Action::Replace { all: false },
        'R' => Action::Replace { all: true },
        'u' => Action::Undo,
        's' => Action::Skip,
        'x' => Action::Exit,
        'b' => Action::Abort,
        _ => return None,
    };
    Some(action)
}

pub struct TerminalFrontend<R, W> {
    input: R,
    output: W,
    display: Display,
    interrupted: Arc<AtomicBool>,
}

impl<R: BufRead, W: Write> TerminalFrontend<R, W> {
    pub fn new(input: R, output: W, display: Display, interrupted: Arc<AtomicBool>) -> Self {
        Self {
            input,
            output,
            display,
            interrupted,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// `None` at end of input, which also raises the interrupt flag, and
    /// when the flag was raised (Ctrl-C) while waiting for the answer.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.interrupted.store(true, Ordering::SeqCst);
            return Ok(None);
        }
        if self.interrupted.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn show(&mut self, file: &SourceFile, word: &Word, suggestions: &[String]) -> Result<()> {
        let (line, col) = file.position(word);
        writeln!(
            self.output,
            "\n{}",
            format!("{}:{line}:{col}", file.path.display()).bold()
        )?;

        let first = word.index.line.saturating_sub(CONTEXT_LINES);
        let last = (word.index.line + CONTEXT_LINES).min(file.text.line_count() - 1);
        let width = (last + 1).to_string().len();
        for n in first..=last {
            let highlight = (n == word.index.line).then_some((word.index, &self.display.highlight));
            let text = file.text.render_line(n, self.display.tab_size, highlight);
            writeln!(
                self.output,
                "{}{:>width$}\x1b[0m {text}",
                self.display.line_number.as_sgr(),
                n + 1
            )?;
        }

        writeln!(self.output)?;
        if suggestions.is_empty() {
            writeln!(self.output, "  {}", "no suggestions".dimmed())?;
        }
        for (i, s) in suggestions.iter().take(10).enumerate() {
            writeln!(self.output, "  {}) {s}", (i + 1) % 10)?;
        }
        writeln!(self.output, "{}", KEYS.dimmed())?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Frontend for TerminalFrontend<R, W> {
    fn prompt(&mut self, file: &SourceFile, word: &Word, suggestions: &[String]) -> Result<Action> {
        self.show(file, word, suggestions)?;
        loop {
            write!(self.output, "{} ", ">".cyan())?;
            self.output.flush()?;
            let Some(answer) = self.read_line()? else {
                return Ok(Action::Abort);
            };
            match parse_action(&answer) {
                Some(action) => return Ok(action),
                None => writeln!(self.output, "{}", KEYS.dimmed())?,
            }
        }
    }

    fn read_replacement(&mut self, word: &str, all: bool) -> Result<Option<String>> {
        let caption = if all { "Replace all" } else { "Replace" };
        write!(self.output, "{caption} {word:?} with: ")?;
        self.output.flush()?;
        Ok(self.read_line()?.map(|s| s.trim().to_string()))
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{question} (y/N) ")?;
        self.output.flush()?;
        Ok(self
            .read_line()?
            .is_some_and(|a| matches!(a.trim(), "y" | "Y" | "yes")))
    }
}
