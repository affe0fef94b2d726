//! Public entry points: `run` translates and executes a TALE program against
//! a fixed input tape and shapes the outcome; `analyze` runs the translator
//! alone and reports the first problem found, with no execution and no
//! input tape.

use log::{debug, warn};

use crate::exec::{builtins, tree, Env, Interpreter};
use crate::result::{AnalyzeResult, Diagnostic, RunResult};
use crate::translate::{render, translate};
use crate::RuntimeError;

const TRANSLATE_SUGGESTION: &str =
    "I could not understand the TALE syntax; check if/else/end, assignments, and helpers.";
const UNKNOWN_VARIABLE_SUGGESTION: &str = "Did you define the variable before using it?";
const INPUT_EXHAUSTED_SUGGESTION: &str =
    "Provide an input value for each `ask` line in the Inputs box before running.";
const RUNTIME_ERROR_SUGGESTION: &str = "Check the translated Python to see what went wrong.";

/// Runs `code` with `inputs` as the answers fed to each `ask` in order.
pub fn run(code: &str, inputs: Vec<String>) -> RunResult {
    let program = match translate(code) {
        Ok(program) => program,
        Err(err) => {
            warn!("translation failed: {err}");
            return RunResult::failure(err.to_string(), TRANSLATE_SUGGESTION, None, code.to_owned());
        }
    };

    let translated = render(&program);
    let tree = tree::build(&program);
    let env = Env::root();
    builtins::install(&env);

    let mut interp = Interpreter::new(inputs);
    match interp.exec_nodes(&tree, &env) {
        Ok(_) => {
            debug!("program ran to completion");
            RunResult::success(interp.into_output(), translated, code.to_owned())
        }
        Err(err) => shape_runtime_error(err, translated, code),
    }
}

fn shape_runtime_error(err: RuntimeError, translated: String, code: &str) -> RunResult {
    let tale = code.to_owned();
    match err {
        RuntimeError::UnknownVariable(_) => {
            RunResult::failure(err.to_string(), UNKNOWN_VARIABLE_SUGGESTION, Some(translated), tale)
        }
        RuntimeError::InputExhausted(_) => {
            RunResult::failure(err.to_string(), INPUT_EXHAUSTED_SUGGESTION, Some(translated), tale)
        }
        RuntimeError::Other(_) => {
            RunResult::failure(err.to_string(), RUNTIME_ERROR_SUGGESTION, Some(translated), tale)
        }
    }
}

/// Translates `code` without executing it, reporting the first problem
/// found. Used by editors to flag syntax errors as the user types, without
/// paying for a run or needing an input tape.
pub fn analyze(code: &str) -> AnalyzeResult {
    match translate(code) {
        Ok(_) => AnalyzeResult::success(),
        Err(err) => AnalyzeResult::failure(Diagnostic { line: err.line, message: err.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_reports_success_shape() {
        let result = run("say \"hi\"\n", vec![]);
        assert!(result.ok);
        assert_eq!(result.output.as_deref(), Some("hi\n"));
        assert!(result.error.is_none());
        assert!(result.translated.is_some());
    }

    #[test]
    fn run_reports_translate_error_shape() {
        let result = run("bork bork bork\n", vec![]);
        assert!(!result.ok);
        assert!(result.output.is_none());
        assert!(result.translated.is_none());
        assert_eq!(result.suggested_fix.as_deref(), Some(TRANSLATE_SUGGESTION));
    }

    #[test]
    fn run_reports_unknown_variable_shape() {
        let result = run("say missing\n", vec![]);
        assert!(!result.ok);
        assert_eq!(result.error.as_deref(), Some("Unknown variable: missing"));
        assert_eq!(result.suggested_fix.as_deref(), Some(UNKNOWN_VARIABLE_SUGGESTION));
        assert!(result.translated.is_some());
    }

    #[test]
    fn run_reports_input_exhausted_shape() {
        let result = run("ask a\n", vec![]);
        assert!(!result.ok);
        assert_eq!(result.suggested_fix.as_deref(), Some(INPUT_EXHAUSTED_SUGGESTION));
    }

    #[test]
    fn analyze_reports_success_with_no_diagnostics() {
        let result = analyze("say \"hi\"\n");
        assert!(result.ok);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn analyze_reports_translate_error_with_line() {
        let result = analyze("if x > 5\nbork bork\nend\n");
        assert!(!result.ok);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].line, Some(2));
    }
}
