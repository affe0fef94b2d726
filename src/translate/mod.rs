//! Block-structure synthesizer + line translator.

pub mod render;
pub mod stmt;

use log::trace;

use crate::error::TranslateError;
use crate::expr::{self, Expr};
use crate::rewrite;
use crate::scanner::{self, LogicalLine};

pub use render::render;
pub use stmt::{Emitted, Stmt};

/// Runs the pre-scanner, block synthesizer and line translator over `code`,
/// producing the translated program or the first translation error found,
/// wrapped with its originating `Line N:` prefix.
pub fn translate(code: &str) -> Result<Vec<Emitted>, TranslateError> {
    let lines = scanner::scan(code);
    let mut out = Vec::new();
    let mut indent: usize = 0;

    for LogicalLine { line_no, text } in lines {
        let trimmed = text.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower == "end" {
            indent = indent.saturating_sub(1);
            trace!("line {line_no}: end -> indent {indent}");
            continue;
        }
        if lower == "else" {
            indent = indent.saturating_sub(1);
            out.push(Emitted {
                indent,
                stmt: Stmt::Else,
            });
            indent += 1;
            continue;
        }
        if let Some(rest) = strip_kw(trimmed, "elif") {
            indent = indent.saturating_sub(1);
            let cond = parse_rewritten(rest, line_no)?;
            out.push(Emitted {
                indent,
                stmt: Stmt::Elif { cond },
            });
            indent += 1;
            continue;
        }
        if let Some(rest) = strip_kw(trimmed, "catch") {
            indent = indent.saturating_sub(1);
            let name = if rest.trim().is_empty() {
                "error".to_owned()
            } else {
                rest.trim().to_owned()
            };
            if !rewrite::is_identifier(&name) {
                return Err(TranslateError::could_not_understand(trimmed).at_line(line_no));
            }
            out.push(Emitted {
                indent,
                stmt: Stmt::Except { name },
            });
            indent += 1;
            continue;
        }
        if lower == "finally" {
            indent = indent.saturating_sub(1);
            out.push(Emitted {
                indent,
                stmt: Stmt::Finally,
            });
            indent += 1;
            continue;
        }

        let (stmt, opens_block) =
            translate_line(trimmed, line_no).map_err(|e| e.at_line(line_no))?;
        out.push(Emitted { indent, stmt });
        if opens_block {
            indent += 1;
        }
    }

    Ok(out)
}

fn parse_rewritten(text: &str, line_no: usize) -> Result<Expr, TranslateError> {
    expr::parse_expr(&rewrite::rewrite(text)).map_err(|e| e.at_line(line_no))
}

/// Strips a case-insensitive, word-bounded keyword prefix (possibly made of
/// several space-separated words, e.g. `"for each"`).
fn strip_kw<'a>(line: &'a str, kw: &str) -> Option<&'a str> {
    let head = line.get(..kw.len())?;
    if !head.eq_ignore_ascii_case(kw) {
        return None;
    }
    let rest = line.get(kw.len()..)?;
    if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace()) {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// Finds the first occurrence of `kw` as a separate word (ASCII
/// case-insensitive) and splits `s` around it.
fn split_on_kw<'a>(s: &'a str, kw: &str) -> Option<(&'a str, &'a str)> {
    let lower = s.to_ascii_lowercase();
    let kw_lower = kw.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut start = 0;
    while let Some(pos) = lower[start..].find(&kw_lower) {
        let abs = start + pos;
        let before_ok = abs == 0 || !is_word_byte(bytes[abs - 1]);
        let after_idx = abs + kw_lower.len();
        let after_ok = after_idx >= bytes.len() || !is_word_byte(bytes[after_idx]);
        if before_ok && after_ok {
            return Some((s[..abs].trim(), s[after_idx..].trim()));
        }
        start = abs + 1;
    }
    None
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn split_names(text: &str) -> Vec<String> {
    if text.contains(',') {
        text.split(',').map(|p| p.trim().to_owned()).filter(|p| !p.is_empty()).collect()
    } else {
        text.split_whitespace().map(|p| p.to_owned()).collect()
    }
}

/// Either a quoted literal key (for a bare identifier key, matching the
/// rewriter's `get D K` rule) or a fully rewritten expression.
fn key_expr(raw: &str, line_no: usize) -> Result<Expr, TranslateError> {
    let raw = raw.trim();
    if rewrite::is_identifier(raw) {
        Ok(Expr::Str(raw.to_owned()))
    } else {
        parse_rewritten(raw, line_no)
    }
}

fn method_call(target: &str, method: &str, args: Vec<Expr>, line_no: usize) -> Result<Stmt, TranslateError> {
    let target_expr = parse_rewritten(target, line_no)?;
    Ok(Stmt::Expr(Expr::Call {
        func: Box::new(Expr::Attribute {
            value: Box::new(target_expr),
            attr: method.to_owned(),
        }),
        args,
    }))
}

/// Translates one already-trimmed, non-block-marker logical line into its
/// target statement plus whether it opens a new nested block.
pub fn translate_line(line: &str, line_no: usize) -> Result<(Stmt, bool), TranslateError> {
    let lower = line.to_ascii_lowercase();

    if lower == "try" {
        return Ok((Stmt::Try, true));
    }
    if lower == "break" {
        return Ok((Stmt::Break, false));
    }
    if lower == "continue" {
        return Ok((Stmt::Continue, false));
    }
    if lower == "pass" {
        return Ok((Stmt::Pass, false));
    }

    if let Some(rest) = strip_kw(line, "if") {
        return Ok((Stmt::If { cond: parse_rewritten(rest, line_no)? }, true));
    }
    if let Some(rest) = strip_kw(line, "while") {
        return Ok((Stmt::While { cond: parse_rewritten(rest, line_no)? }, true));
    }
    if let Some(rest) = strip_kw(line, "function") {
        let (name, params) = split_name_params(rest, line_no)?;
        return Ok((Stmt::FunctionDef { name, params }, true));
    }
    if let Some(rest) = strip_kw(line, "generator") {
        let (name, params) = split_name_params(rest, line_no)?;
        return Ok((Stmt::GeneratorDef { name, params }, true));
    }
    if let Some(rest) = strip_kw(line, "class") {
        let (name, bases) = split_class_spec(rest);
        return Ok((Stmt::ClassDef { name, bases }, true));
    }
    if let Some(rest) = strip_kw(line, "with file") {
        let (path_text, name) = split_on_kw(rest, "as")
            .ok_or_else(|| TranslateError::could_not_understand(line))?;
        let path = parse_rewritten(&format!("_open_file({})", rewrite::rewrite(path_text)), line_no)?;
        if !rewrite::is_identifier(name) {
            return Err(TranslateError::could_not_understand(line));
        }
        return Ok((Stmt::With { resource: path, name: name.to_owned() }, true));
    }
    if let Some(rest) = strip_kw(line, "with") {
        let (res_text, name) = split_on_kw(rest, "as")
            .ok_or_else(|| TranslateError::could_not_understand(line))?;
        if !rewrite::is_identifier(name) {
            return Err(TranslateError::could_not_understand(line));
        }
        return Ok((
            Stmt::With { resource: parse_rewritten(res_text, line_no)?, name: name.to_owned() },
            true,
        ));
    }
    if let Some(rest) = strip_kw(line, "for each") {
        let (name, iter_text) = split_on_kw(rest, "in")
            .ok_or_else(|| TranslateError::could_not_understand(line))?;
        if !rewrite::is_identifier(name) {
            return Err(TranslateError::could_not_understand(line));
        }
        return Ok((
            Stmt::ForEach { name: name.to_owned(), iter: parse_rewritten(iter_text, line_no)? },
            true,
        ));
    }
    if let Some(rest) = strip_kw(line, "repeat") {
        if let Some((count_text, name)) = split_on_kw(rest, "as") {
            if !rewrite::is_identifier(name) {
                return Err(TranslateError::could_not_understand(line));
            }
            return Ok((
                Stmt::Repeat {
                    count: parse_rewritten(count_text, line_no)?,
                    index_name: Some(name.to_owned()),
                },
                true,
            ));
        }
        return Ok((
            Stmt::Repeat { count: parse_rewritten(rest, line_no)?, index_name: None },
            true,
        ));
    }

    if let Some(rest) = strip_kw(line, "say formatted") {
        let rewritten = rewrite::rewrite(rest);
        let value = if rewrite::looks_like_string(&rewritten) {
            Expr::FString(expr::parse_format_string(&strip_outer_quotes(&rewritten))?)
        } else {
            expr::parse_expr(&rewritten).map_err(|e| e.at_line(line_no))?
        };
        return Ok((Stmt::SayFormatted { value }, false));
    }
    if let Some(rest) = strip_kw(line, "say") {
        let args = split_say_args(rest, line_no)?;
        return Ok((Stmt::Say { args }, false));
    }

    if let Some(rest) = strip_kw(line, "ask") {
        let rest = rest.trim();
        if let Some((prompt_text, name)) = split_on_kw(rest, "as") {
            if !rewrite::is_identifier(name) {
                return Err(TranslateError::could_not_understand(line));
            }
            return Ok((
                Stmt::AskPrompt {
                    prompt: parse_rewritten(prompt_text, line_no)?,
                    name: Some(name.to_owned()),
                },
                false,
            ));
        }
        if rewrite::is_identifier(rest) {
            return Ok((Stmt::Ask { name: rest.to_owned() }, false));
        }
        return Ok((
            Stmt::AskPrompt { prompt: parse_rewritten(rest, line_no)?, name: None },
            false,
        ));
    }

    if let Some(rest) = strip_kw(line, "return") {
        let rest = rest.trim();
        let value = if rest.is_empty() { None } else { Some(parse_rewritten(rest, line_no)?) };
        return Ok((Stmt::Return(value), false));
    }
    if let Some(rest) = strip_kw(line, "yield") {
        let rest = rest.trim();
        let value = if rest.is_empty() { None } else { Some(parse_rewritten(rest, line_no)?) };
        return Ok((Stmt::Yield(value), false));
    }
    if let Some(rest) = strip_kw(line, "raise") {
        let rest = rest.trim();
        let value = if rest.is_empty() { None } else { Some(parse_rewritten(rest, line_no)?) };
        return Ok((Stmt::Raise(value), false));
    }

    if strip_kw(line, "import").is_some() {
        return Ok((Stmt::Import(line.to_owned()), false));
    }
    if strip_kw(line, "from").is_some() && line.contains(" import ") {
        return Ok((Stmt::FromImport(line.to_owned()), false));
    }
    if let Some(rest) = strip_kw(line, "global") {
        return Ok((Stmt::Global(split_names(rest)), false));
    }

    if let Some(rest) = strip_kw(line, "open") {
        let (path_text, name) = split_on_kw(rest, "as")
            .ok_or_else(|| TranslateError::could_not_understand(line))?;
        if !rewrite::is_identifier(name) {
            return Err(TranslateError::could_not_understand(line));
        }
        return Ok((
            Stmt::OpenFile { path: parse_rewritten(path_text, line_no)?, name: name.to_owned() },
            false,
        ));
    }
    if let Some(rest) = strip_kw(line, "write") {
        let (handle, content_text) = split_whitespace_once(rest)
            .ok_or_else(|| TranslateError::could_not_understand(line))?;
        return Ok((
            Stmt::Write { handle: handle.to_owned(), content: parse_rewritten(content_text, line_no)? },
            false,
        ));
    }
    if let Some(rest) = strip_kw(line, "append") {
        let (handle, content_text) = split_whitespace_once(rest)
            .ok_or_else(|| TranslateError::could_not_understand(line))?;
        return Ok((
            Stmt::Append { handle: handle.to_owned(), content: parse_rewritten(content_text, line_no)? },
            false,
        ));
    }
    if let Some(rest) = strip_kw(line, "close") {
        return Ok((Stmt::Close { handle: rest.trim().to_owned() }, false));
    }

    if let Some(rest) = strip_kw(line, "add") {
        let (value_text, name) =
            split_on_kw(rest, "to").ok_or_else(|| TranslateError::could_not_understand(line))?;
        let value = parse_rewritten(value_text, line_no)?;
        return Ok((
            Stmt::Assign {
                name: name.to_owned(),
                value: Expr::Call {
                    func: Box::new(Expr::Name("_add_to".to_owned())),
                    args: vec![Expr::Name(name.to_owned()), value],
                },
            },
            false,
        ));
    }
    if let Some(rest) = strip_kw(line, "extend") {
        let (name, expr_text) =
            split_on_kw(rest, "with").ok_or_else(|| TranslateError::could_not_understand(line))?;
        let arg = parse_rewritten(expr_text, line_no)?;
        return Ok((method_call(name, "extend", vec![arg], line_no)?, false));
    }
    if let Some(rest) = strip_kw(line, "insert") {
        let (value_text, remainder) =
            split_on_kw(rest, "into").ok_or_else(|| TranslateError::could_not_understand(line))?;
        let (name, idx_text) =
            split_on_kw(remainder, "at").ok_or_else(|| TranslateError::could_not_understand(line))?;
        let value = parse_rewritten(value_text, line_no)?;
        let idx = parse_rewritten(idx_text, line_no)?;
        return Ok((method_call(name, "insert", vec![idx, value], line_no)?, false));
    }
    if let Some(rest) = strip_kw(line, "remove") {
        let (value_text, name) =
            split_on_kw(rest, "from").ok_or_else(|| TranslateError::could_not_understand(line))?;
        let value = parse_rewritten(value_text, line_no)?;
        return Ok((method_call(name, "remove", vec![value], line_no)?, false));
    }
    if let Some(rest) = strip_kw(line, "clear") {
        return Ok((method_call(rest.trim(), "clear", vec![], line_no)?, false));
    }
    if let Some(rest) = strip_kw(line, "sort") {
        return Ok((method_call(rest.trim(), "sort", vec![], line_no)?, false));
    }
    if let Some(rest) = strip_kw(line, "reverse") {
        return Ok((method_call(rest.trim(), "reverse", vec![], line_no)?, false));
    }
    if let Some(rest) = strip_kw(line, "copy") {
        return Ok((method_call(rest.trim(), "copy", vec![], line_no)?, false));
    }

    if let Some(rest) = strip_kw(line, "set") {
        let (dict_text, remainder) =
            split_whitespace_once(rest).ok_or_else(|| TranslateError::could_not_understand(line))?;
        let (key_text, value_text) =
            split_on_kw(remainder, "to").ok_or_else(|| TranslateError::could_not_understand(line))?;
        return Ok((
            Stmt::SubscriptAssign {
                target: parse_rewritten(dict_text, line_no)?,
                index: key_expr(key_text, line_no)?,
                value: parse_rewritten(value_text, line_no)?,
            },
            false,
        ));
    }
    if let Some(rest) = strip_kw(line, "get") {
        if let Some((key_text, dict_text)) = split_on_kw(rest, "from") {
            return Ok((method_call(dict_text, "get", vec![key_expr(key_text, line_no)?], line_no)?, false));
        }
        if let Some((dict_text, key_text)) = split_whitespace_once(rest) {
            return Ok((method_call(dict_text, "get", vec![key_expr(key_text, line_no)?], line_no)?, false));
        }
        return Err(TranslateError::wrong_number_of_values(line));
    }
    if let Some(rest) = strip_kw(line, "keys") {
        return Ok((method_call(rest.trim(), "keys", vec![], line_no)?, false));
    }
    if let Some(rest) = strip_kw(line, "values") {
        return Ok((method_call(rest.trim(), "values", vec![], line_no)?, false));
    }
    if let Some(rest) = strip_kw(line, "items") {
        return Ok((method_call(rest.trim(), "items", vec![], line_no)?, false));
    }
    if let Some(rest) = strip_kw(line, "pop") {
        if let Some((dict_text, key_text)) = split_whitespace_once(rest) {
            return Ok((method_call(dict_text, "pop", vec![key_expr(key_text, line_no)?], line_no)?, false));
        }
        return Ok((method_call(rest.trim(), "pop", vec![], line_no)?, false));
    }
    if let Some(rest) = strip_kw(line, "unpack") {
        let (expr_text, targets_text) =
            split_on_kw(rest, "into").ok_or_else(|| TranslateError::could_not_understand(line))?;
        return Ok((
            Stmt::Unpack { value: parse_rewritten(expr_text, line_no)?, targets: split_names(targets_text) },
            false,
        ));
    }

    if let Some(rest) = strip_kw(line, "list") {
        let (name, value) = match split_on_kw(rest, "is") {
            Some((name, expr_text)) => (name.to_owned(), parse_rewritten(expr_text, line_no)?),
            None => (rest.trim().to_owned(), Expr::List(vec![])),
        };
        if !rewrite::is_identifier(&name) {
            return Err(TranslateError::could_not_understand(line));
        }
        return Ok((Stmt::Assign { name, value }, false));
    }
    if let Some(rest) = strip_kw(line, "dict") {
        let (name, value) = match split_on_kw(rest, "is") {
            Some((name, expr_text)) => (name.to_owned(), parse_rewritten(expr_text, line_no)?),
            None => (rest.trim().to_owned(), Expr::Dict(vec![])),
        };
        if !rewrite::is_identifier(&name) {
            return Err(TranslateError::could_not_understand(line));
        }
        return Ok((Stmt::Assign { name, value }, false));
    }

    if let Some((name, expr_text)) = split_on_kw(line, "is") {
        let name = name.trim();
        if rewrite::is_identifier(name) {
            return Ok((
                Stmt::Assign { name: name.to_owned(), value: parse_rewritten(expr_text, line_no)? },
                false,
            ));
        }
        if let Some((obj_name, attr)) = name.split_once('.') {
            if rewrite::is_identifier(obj_name) && rewrite::is_identifier(attr) {
                return Ok((
                    Stmt::SubscriptAssign {
                        target: Expr::Name(obj_name.to_owned()),
                        index: Expr::Str(attr.to_owned()),
                        value: parse_rewritten(expr_text, line_no)?,
                    },
                    false,
                ));
            }
        }
    }

    Ok((Stmt::Expr(parse_rewritten(line, line_no)?), false))
}

fn strip_outer_quotes(s: &str) -> String {
    let bytes = s.as_bytes();
    if s.len() >= 6 && s.starts_with("\"\"\"") && s.ends_with("\"\"\"") {
        return s[3..s.len() - 3].to_owned();
    }
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'"' || first == b'\'') {
            return s[1..s.len() - 1].to_owned();
        }
    }
    s.to_owned()
}

fn split_whitespace_once(s: &str) -> Option<(&str, &str)> {
    let s = s.trim();
    let idx = s.find(char::is_whitespace)?;
    let (head, tail) = s.split_at(idx);
    let tail = tail.trim_start();
    if head.is_empty() || tail.is_empty() {
        None
    } else {
        Some((head, tail))
    }
}

fn split_name_params(rest: &str, line_no: usize) -> Result<(String, Vec<String>), TranslateError> {
    let mut tokens = rest.split_whitespace();
    let name = tokens
        .next()
        .ok_or_else(|| TranslateError::could_not_understand(rest).at_line(line_no))?;
    if !rewrite::is_identifier(name) {
        return Err(TranslateError::could_not_understand(rest).at_line(line_no));
    }
    Ok((name.to_owned(), tokens.map(|t| t.to_owned()).collect()))
}

fn split_class_spec(rest: &str) -> (String, Vec<String>) {
    let rest = rest.trim();
    if let Some(open) = rest.find('(') {
        let name = rest[..open].trim().to_owned();
        let close = rest.rfind(')').unwrap_or(rest.len());
        let bases_text = &rest[open + 1..close];
        let bases = bases_text
            .split(',')
            .map(|b| b.trim().to_owned())
            .filter(|b| !b.is_empty())
            .collect();
        (name, bases)
    } else {
        (rest.to_owned(), Vec::new())
    }
}

fn split_say_args(rest: &str, line_no: usize) -> Result<Vec<Expr>, TranslateError> {
    let mut parts = rewrite::split_args(rest);
    if parts.len() < 2 {
        let plus_parts = rewrite::split_concat_args(rest);
        if plus_parts.len() > 1 && plus_parts.iter().any(|p| rewrite::looks_like_string(p.trim())) {
            parts = plus_parts;
        }
    }
    if parts.is_empty() {
        parts.push(rest.to_owned());
    }
    parts
        .iter()
        .map(|p| parse_rewritten(p.trim(), line_no))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_assignment_and_say() {
        let prog = translate("x is 5\nsay x + 1\n").unwrap();
        assert_eq!(prog.len(), 2);
        assert!(matches!(prog[0].stmt, Stmt::Assign { .. }));
        assert!(matches!(prog[1].stmt, Stmt::Say { .. }));
    }

    #[test]
    fn synthesizes_if_else_end() {
        let prog = translate("if x > 5\nsay \"big\"\nelse\nsay \"small\"\nend\n").unwrap();
        assert_eq!(prog[0].indent, 0);
        assert!(matches!(prog[0].stmt, Stmt::If { .. }));
        assert_eq!(prog[1].indent, 1);
        assert_eq!(prog[2].indent, 0);
        assert!(matches!(prog[2].stmt, Stmt::Else));
        assert_eq!(prog[3].indent, 1);
    }

    #[test]
    fn clamps_indent_at_zero() {
        let prog = translate("end\nend\nsay \"ok\"\n").unwrap();
        assert_eq!(prog[0].indent, 0);
    }

    #[test]
    fn catch_defaults_name_to_error() {
        let prog = translate("try\nsay 1\ncatch\nsay 2\nend\n").unwrap();
        assert!(matches!(&prog[2].stmt, Stmt::Except { name } if name == "error"));
    }

    #[test]
    fn translates_function_definition() {
        let prog = translate("function add a b\nreturn a + b\nend\n").unwrap();
        assert!(matches!(
            &prog[0].stmt,
            Stmt::FunctionDef { name, params } if name == "add" && params == &vec!["a".to_owned(), "b".to_owned()]
        ));
    }

    #[test]
    fn translates_repeat_with_binding() {
        let prog = translate("repeat 3 as i\nsay i\nend\n").unwrap();
        assert!(matches!(&prog[0].stmt, Stmt::Repeat { index_name: Some(n), .. } if n == "i"));
    }

    #[test]
    fn line_errors_carry_original_line_number() {
        let err = translate("x is 1\nsay __!!bad\n").unwrap_err();
        assert!(err.to_string().starts_with("Line 2:"));
    }

    #[test]
    fn add_to_desugars_to_assign_add_to_call() {
        let prog = translate("add 1 to total\n").unwrap();
        match &prog[0].stmt {
            Stmt::Assign { name, value: Expr::Call { func, args } } => {
                assert_eq!(name, "total");
                assert_eq!(**func, Expr::Name("_add_to".to_owned()));
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected stmt: {other:?}"),
        }
    }
}
