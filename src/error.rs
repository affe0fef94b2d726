//! Error types shared across the translator and the executor.
//!
//! These are plain structs with hand-written `Display`/`Error` impls, the
//! same way the loader's `FileLoadError` is done, rather than derived with a
//! macro crate.

use std::error::Error;
use std::fmt::{self, Display};

/// A problem found while turning TALE source into the target IR. Never
/// escapes `run`/`analyze` as a Rust panic or exception; callers only ever
/// see it wrapped into a structured result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateError {
    /// 1-based position of the offending *original* source line, when known.
    pub line: Option<usize>,
    pub message: String,
}

impl TranslateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }

    /// The canonical "I could not understand: <snippet>" shape.
    pub fn could_not_understand(snippet: &str) -> Self {
        Self::new(format!("I could not understand: {}", snippet.trim()))
    }

    /// The canonical "Wrong number of values: <snippet>" shape.
    pub fn wrong_number_of_values(snippet: &str) -> Self {
        Self::new(format!("Wrong number of values: {}", snippet.trim()))
    }

    /// Attach (or overwrite) the original line number, producing the
    /// `Line N: <message>` prefix.
    pub fn at_line(mut self, line_no: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line_no);
            self.message = format!("Line {line_no}: {}", self.message);
        }
        self
    }
}

impl Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for TranslateError {}

/// Raised when `ask` is evaluated past the end of the input tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputExhausted {
    pub message: String,
}

impl Default for InputExhausted {
    fn default() -> Self {
        Self {
            message: "No more inputs were supplied. Add values in the Inputs box (one per line)."
                .to_owned(),
        }
    }
}

impl Display for InputExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for InputExhausted {}

/// Catch-all failure from the sandboxed execution of an otherwise
/// well-translated program. `UnknownVariable` is specialized because the
/// result shaper needs to report it with its own wording and suggested fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    UnknownVariable(String),
    InputExhausted(InputExhausted),
    Other(String),
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UnknownVariable(name) => write!(f, "Unknown variable: {name}"),
            RuntimeError::InputExhausted(e) => write!(f, "{e}"),
            RuntimeError::Other(msg) => f.write_str(msg),
        }
    }
}

impl Error for RuntimeError {}

impl RuntimeError {
    pub fn other(message: impl Into<String>) -> Self {
        RuntimeError::Other(message.into())
    }
}
