//! Interactive line prompt backed by `rustyline`.

use super::{Ask, AskError, Validate};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Where a terminal prompt gets its lines.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<String, AskError>;
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<String, AskError> {
        self.readline(prompt).map_err(map_readline_error)
    }
}

/// Prompts on the controlling terminal, one line per question.
///
/// Invalid input re-prompts with the validator's message on stderr, so a
/// rejected answer never reaches the caller.
/// Ctrl-C maps to [`AskError::Aborted`], Ctrl-D to [`AskError::Eof`].
pub struct TerminalAsk<L = DefaultEditor> {
    lines: L,
}

impl TerminalAsk {
    pub fn new() -> Result<Self, AskError> {
        let editor = DefaultEditor::new().map_err(map_readline_error)?;
        Ok(Self { lines: editor })
    }
}

impl<L: LineSource> TerminalAsk<L> {
    pub fn with_source(lines: L) -> Self {
        Self { lines }
    }

    pub fn into_source(self) -> L {
        self.lines
    }
}

impl<L: LineSource> Ask for TerminalAsk<L> {
    fn ask(&mut self, label: &str, validate: Validate<'_>) -> Result<String, AskError> {
        let prompt = format!("{}: ", label);
        loop {
            let line = self.lines.read_line(&prompt)?;
            match validate(&line) {
                Ok(()) => return Ok(line),
                Err(msg) => eprintln!("  \u{2717} {}", msg),
            }
        }
    }
}

fn map_readline_error(err: ReadlineError) -> AskError {
    match err {
        ReadlineError::Interrupted => AskError::Aborted,
        ReadlineError::Eof => AskError::Eof,
        other => AskError::Io(other.to_string()),
    }
}
