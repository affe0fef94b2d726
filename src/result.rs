//! Result shapes returned by [`crate::engine::run`] and [`crate::engine::analyze`].

use serde::{Deserialize, Serialize};

/// Outcome of running a TALE program to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "suggestedFix", skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    pub translated: Option<String>,
    pub tale: String,
}

impl RunResult {
    pub fn success(output: String, translated: String, tale: String) -> Self {
        RunResult {
            ok: true,
            output: Some(output),
            error: None,
            suggested_fix: None,
            translated: Some(translated),
            tale,
        }
    }

    pub fn failure(error: String, suggested_fix: &str, translated: Option<String>, tale: String) -> Self {
        RunResult {
            ok: false,
            output: None,
            error: Some(error),
            suggested_fix: Some(suggested_fix.to_owned()),
            translated,
            tale,
        }
    }
}

/// One problem found while translating, positioned by original source line
/// when the translator could recover it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: Option<usize>,
    pub message: String,
}

/// Outcome of a translate-only pass with no execution: a dry-run used by
/// editors to flag syntax problems as the user types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalyzeResult {
    pub fn success() -> Self {
        AnalyzeResult { ok: true, diagnostics: Vec::new() }
    }

    pub fn failure(diagnostic: Diagnostic) -> Self {
        AnalyzeResult { ok: false, diagnostics: vec![diagnostic] }
    }
}
