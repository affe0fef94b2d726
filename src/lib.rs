//! A sandboxed engine for TALE, a line-oriented, English-like scripting
//! dialect. [`run`] translates a TALE program, executes it against a fixed
//! tape of inputs, and shapes the outcome; [`analyze`] runs the translator
//! alone and reports the first problem found, with no execution.
//!
//! Front to back: pre-scan (`scanner`) -> block synthesis and line
//! translation (`translate`) -> expression rewriting (`rewrite`) ->
//! expression validation (`expr`) -> tree-walking execution (`exec`).

pub mod engine;
pub mod error;
pub mod exec;
pub mod expr;
pub mod result;
pub mod rewrite;
pub mod scanner;
pub mod translate;

pub use engine::{analyze, run};
pub use error::{InputExhausted, RuntimeError, TranslateError};
pub use result::{AnalyzeResult, Diagnostic, RunResult};
