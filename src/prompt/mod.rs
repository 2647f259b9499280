//! Ask capability: the one way the resolution engine talks to an operator.
//!
//! `ask` obtains one line of text for a labeled question, re-running the
//! validator until it passes or the operator gives up. Implementations:
//! - [`terminal::TerminalAsk`]: interactive line prompt (production)
//! - [`scripted::ScriptedAsk`]: deterministic answers (tests, benches)

pub mod scripted;
pub mod terminal;

pub use scripted::ScriptedAsk;
pub use terminal::{LineSource, TerminalAsk};

/// Validator handed to [`Ask::ask`]. `Err` carries the message shown to the operator.
pub type Validate<'a> = &'a dyn Fn(&str) -> Result<(), String>;

/// Failure of the ask capability. Propagated unchanged by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AskError {
    /// Operator interrupted the prompt (Ctrl-C)
    #[error("prompt aborted")]
    Aborted,

    /// Input stream closed (Ctrl-D or end of piped input)
    #[error("end of input")]
    Eof,

    /// The terminal channel failed
    #[error("prompt I/O failed: {0}")]
    Io(String),

    /// A non-interactive answer did not pass validation
    #[error("answer rejected: {0}")]
    Rejected(String),

    /// A scripted ask ran out of answers
    #[error("no scripted answer left")]
    Exhausted,
}

/// Ask an operator a labeled question.
pub trait Ask {
    fn ask(&mut self, label: &str, validate: Validate<'_>) -> Result<String, AskError>;
}

impl<A: Ask + ?Sized> Ask for &mut A {
    fn ask(&mut self, label: &str, validate: Validate<'_>) -> Result<String, AskError> {
        (**self).ask(label, validate)
    }
}

impl<A: Ask + ?Sized> Ask for Box<A> {
    fn ask(&mut self, label: &str, validate: Validate<'_>) -> Result<String, AskError> {
        (**self).ask(label, validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(_: &str) -> Result<(), String> {
        Ok(())
    }

    fn ask_through<A: Ask>(mut a: A) -> Result<String, AskError> {
        a.ask("q", &accept)
    }

    #[test]
    fn test_prompt_error_display() {
        assert_eq!(AskError::Aborted.to_string(), "prompt aborted");
        assert_eq!(AskError::Eof.to_string(), "end of input");
        assert_eq!(
            AskError::Io("broken pipe".into()).to_string(),
            "prompt I/O failed: broken pipe"
        );
        assert_eq!(
            AskError::Rejected("required".into()).to_string(),
            "answer rejected: required"
        );
    }

    #[test]
    fn test_prompt_forwarding_impls() {
        let mut scripted = ScriptedAsk::new(["one", "two"]);
        assert_eq!(ask_through(&mut scripted).unwrap(), "one");
        let boxed: Box<dyn Ask> = Box::new(scripted);
        assert_eq!(ask_through(boxed).unwrap(), "two");
    }
}
