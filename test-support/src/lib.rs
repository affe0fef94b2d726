//! Small helpers shared by the `tests/*.rs` integration suite.
//!
//! The teacher's own `test-utils` shells out to a compiled binary and
//! asserts on its stdout/stderr, because Y programs only exist as compiled
//! executables. TALE is consumed as a library (`tale::run`/`tale::analyze`),
//! so these helpers call the engine in-process instead and assert on the
//! shape of the returned `RunResult`/`AnalyzeResult`.

use tale::{AnalyzeResult, RunResult};

/// Runs `code` with no inputs and asserts it finished successfully,
/// returning the captured output.
pub fn check_run(code: &str) -> String {
    check_run_with(code, Vec::new())
}

/// Runs `code` with `inputs` as the answers fed to each `ask` in order, and
/// asserts it finished successfully, returning the captured output.
pub fn check_run_with(code: &str, inputs: Vec<String>) -> String {
    let result = tale::run(code, inputs);
    assert!(result.ok, "expected {code:?} to run, got error: {:?}", result.error);
    result.output.unwrap_or_default()
}

/// Runs `code` and asserts it failed, returning the error message.
pub fn check_failing_run(code: &str) -> String {
    check_failing_run_with(code, Vec::new())
}

/// Runs `code` with `inputs` and asserts it failed, returning the error
/// message.
pub fn check_failing_run_with(code: &str, inputs: Vec<String>) -> String {
    let result = tale::run(code, inputs);
    assert!(!result.ok, "expected {code:?} to fail, but it produced: {:?}", result.output);
    result.error.unwrap_or_else(|| "<no error message>".to_owned())
}

/// Asserts `code` finished running successfully, returning the full result
/// for callers that need more than the output string.
pub fn run(code: &str, inputs: Vec<String>) -> RunResult {
    tale::run(code, inputs)
}

/// Analyzes `code` and asserts no diagnostics were reported.
pub fn check_analyze(code: &str) {
    let result = tale::analyze(code);
    assert!(result.ok, "expected {code:?} to analyze cleanly, got: {:?}", result.diagnostics);
}

/// Analyzes `code` and asserts at least one diagnostic was reported,
/// returning the full result for callers that want to inspect line numbers.
pub fn check_failing_analyze(code: &str) -> AnalyzeResult {
    let result = tale::analyze(code);
    assert!(!result.ok, "expected {code:?} to fail analysis");
    assert!(!result.diagnostics.is_empty());
    result
}
