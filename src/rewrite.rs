//! Expression rewriter and the two argument splitters used by `say` and the
//! multi-argument statement forms.
//!
//! Turns TALE's keyword-headed expression vocabulary (`upper of s`,
//! `get d k`, `map fn xs`, `is same as`, `lambda a -> a+1`, ...) into
//! canonical arithmetic/call expression text the validator can parse.
//! Matching is case-sensitive: only lowercase keyword spellings (`upper `,
//! `type of `, ...) are recognized.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TranslateError;

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static TRUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\btrue\b").unwrap());
static FALSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfalse\b").unwrap());
static NOTHING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnothing\b").unwrap());
static NONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnone\b").unwrap());
static IS_NOT_SAME_AS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bis not same as\b").unwrap());
static IS_SAME_AS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bis same as\b").unwrap());
static NUMBER_CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnumber\(").unwrap());
static TEXT_CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btext\(").unwrap());
static DECIMAL_CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdecimal\(").unwrap());
static COUNT_COMPARE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^count\s*[><=]").unwrap());
static SPACE_CALL_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\s").unwrap());

pub fn is_identifier(s: &str) -> bool {
    IDENT_RE.is_match(s)
}

/// True for a bare string literal (single/double quoted on both ends, or a
/// triple-quoted block), used to short-circuit rewriting so embedded
/// colons/keywords inside string contents are never touched.
pub fn looks_like_string(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.len() >= 6 && trimmed.starts_with("\"\"\"") {
        return trimmed.ends_with("\"\"\"");
    }
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'"' || first == b'\'') {
            return true;
        }
    }
    false
}

/// Comma split respecting (simple, same-char) quoting.
pub fn split_args(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_str = false;
    let mut quote_char = '\0';
    for c in text.chars() {
        if c == '"' || c == '\'' {
            if in_str && c == quote_char {
                in_str = false;
            } else if !in_str {
                in_str = true;
                quote_char = c;
            }
        }
        if c == ',' && !in_str {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Top-level `+` split respecting quoting and bracket depth.
pub fn split_concat_args(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_str = false;
    let mut quote_char = '\0';
    let mut depth: i32 = 0;
    for c in text.chars() {
        if c == '"' || c == '\'' {
            if in_str && c == quote_char {
                in_str = false;
            } else if !in_str {
                in_str = true;
                quote_char = c;
            }
        } else if !in_str {
            if "([{".contains(c) {
                depth += 1;
            } else if ")]}".contains(c) {
                depth = (depth - 1).max(0);
            }
        }

        if c == '+' && !in_str && depth == 0 {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Comma split first, falling back to a single whitespace split; used by
/// `map`, `filter`, and the set-operator verbs.
pub fn split_first(text: &str) -> Result<(String, String), TranslateError> {
    let parts = split_args(text);
    if parts.len() < 2 {
        let mut ws = text.trim().splitn(2, char::is_whitespace);
        let first = ws.next().unwrap_or("").trim();
        let rest = ws.next().unwrap_or("").trim();
        if first.is_empty() || rest.is_empty() {
            return Err(TranslateError::wrong_number_of_values(text));
        }
        return Ok((first.to_owned(), rest.to_owned()));
    }
    let first = parts[0].clone();
    let consumed = text
        .get(first.len()..)
        .unwrap_or("")
        .trim_start()
        .trim_start_matches(',')
        .trim()
        .to_owned();
    let rest = if consumed.is_empty() {
        parts[1].trim().to_owned()
    } else {
        consumed
    };
    Ok((first.trim().to_owned(), rest))
}

/// Substitutes bare identifier keys before a `:` with quoted keys
/// (`name: v` -> `"name": v`), skipping matches inside string literals.
pub fn normalize_dict(expr: &str) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::new();
    let mut in_str = false;
    let mut quote_char = '\0';
    let mut i = 0;
    let mut prev_word_char = false;
    while i < chars.len() {
        let c = chars[i];
        if in_str {
            out.push(c);
            if c == quote_char {
                in_str = false;
            }
            i += 1;
            prev_word_char = false;
            continue;
        }
        if c == '"' || c == '\'' {
            in_str = true;
            quote_char = c;
            out.push(c);
            i += 1;
            prev_word_char = false;
            continue;
        }
        if !prev_word_char && (c.is_alphabetic() || c == '_') {
            let start = i;
            let mut j = i;
            while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            let ident: String = chars[start..j].iter().collect();
            let mut k = j;
            while k < chars.len() && chars[k].is_whitespace() {
                k += 1;
            }
            if k < chars.len() && chars[k] == ':' {
                out.push('"');
                out.push_str(&ident);
                out.push_str("\":");
                i = k + 1;
                prev_word_char = false;
                continue;
            } else {
                out.push_str(&ident);
                i = j;
                prev_word_char = true;
                continue;
            }
        }
        out.push(c);
        prev_word_char = c.is_alphanumeric() || c == '_';
        i += 1;
    }
    out
}

fn keyword_normalize(expr: &str) -> String {
    let expr = TRUE_RE.replace_all(expr, "True");
    let expr = FALSE_RE.replace_all(&expr, "False");
    let expr = NOTHING_RE.replace_all(&expr, "None");
    let expr = NONE_RE.replace_all(&expr, "None");
    let expr = IS_NOT_SAME_AS_RE.replace_all(&expr, " != ");
    let expr = IS_SAME_AS_RE.replace_all(&expr, " == ");
    let expr = NUMBER_CALL_RE.replace_all(&expr, "int(");
    let expr = TEXT_CALL_RE.replace_all(&expr, "str(");
    let expr = DECIMAL_CALL_RE.replace_all(&expr, "float(");
    expr.into_owned()
}

/// Strips one `prefix` then recurses on what remains, optionally skipping a
/// leading `"of "`.
fn unary_str_method(expr: &str, prefix: &str, method: &str) -> Option<String> {
    let tail = expr.strip_prefix(prefix)?;
    let mut tail = tail.trim();
    if let Some(rest) = tail.strip_prefix("of ") {
        tail = rest.trim();
    }
    Some(format!("({}).{}", rewrite(tail), method))
}

/// Deterministic, idempotent rewrite from TALE expression vocabulary to the
/// canonical expression grammar parsed by `crate::expr`.
pub fn rewrite(expr: &str) -> String {
    let expr = expr.trim();

    if looks_like_string(expr) {
        return expr.to_owned();
    }

    if let Some(rest) = expr.strip_prefix("type of ") {
        return format!("type({})", rewrite(rest.trim()));
    }
    if let Some(rest) = expr.strip_prefix("id of ") {
        return format!("id({})", rewrite(rest.trim()));
    }
    if expr.starts_with("text r\"") || expr.starts_with("text r'") {
        return expr[5..].trim().to_owned();
    }

    for (prefix, method) in [
        ("upper ", "upper()"),
        ("lower ", "lower()"),
        ("title ", "title()"),
        ("strip ", "strip()"),
        ("isalpha ", "isalpha()"),
        ("isdigit ", "isdigit()"),
        ("isalnum ", "isalnum()"),
    ] {
        if let Some(out) = unary_str_method(expr, prefix, method) {
            return out;
        }
    }

    if let Some(rest) = expr.strip_prefix("replace ") {
        if let Some((base, old, new)) = split_replace_args(rest) {
            return format!("({}).replace(\"{}\", \"{}\")", rewrite(base.trim()), old, new);
        }
    }

    if let Some(rest) = expr.strip_prefix("split ") {
        if let Some((base, sep)) = split_two(rest) {
            return format!("({}).split({})", rewrite(&base), rewrite(&sep));
        }
    }

    if let Some(rest) = expr.strip_prefix("join ") {
        if let Some((glue, target)) = split_two(rest) {
            return format!("({}).join({})", rewrite(&glue), rewrite(&target));
        }
    }

    if let Some(rest) = expr.strip_prefix("find ") {
        if let Some((base, sub)) = split_two(rest) {
            return format!("({}).find({})", rewrite(&base), rewrite(&sub));
        }
    }

    if expr.starts_with("count ") && !COUNT_COMPARE_RE.is_match(expr) {
        if let Some(rest) = expr.strip_prefix("count ") {
            if let Some((base, sub)) = split_two(rest) {
                return format!("({}).count({})", rewrite(&base), rewrite(&sub));
            }
        }
    }

    if let Some(rest) = expr.strip_prefix("starts ") {
        if let Some((base, sub)) = split_two(rest) {
            return format!("({}).startswith({})", rewrite(&base), rewrite(&sub));
        }
    }

    if let Some(rest) = expr.strip_prefix("ends ") {
        if let Some((base, sub)) = split_two(rest) {
            return format!("({}).endswith({})", rewrite(&base), rewrite(&sub));
        }
    }

    if let Some(rest) = expr.strip_prefix("map ") {
        if let Ok((fn_part, seq_part)) = split_first(rest) {
            return format!("map({}, {})", rewrite(&fn_part), rewrite(&seq_part));
        }
    }

    if let Some(rest) = expr.strip_prefix("filter ") {
        if let Ok((fn_part, seq_part)) = split_first(rest) {
            return format!("filter({}, {})", rewrite(&fn_part), rewrite(&seq_part));
        }
    }

    if let Some(rest) = expr.strip_prefix("enumerate ") {
        return format!("enumerate({})", rewrite(rest.trim()));
    }

    if let Some(rest) = expr.strip_prefix("zip ") {
        let parts: Vec<String> = split_args(rest).into_iter().map(|p| rewrite(p.trim())).collect();
        return format!("zip({})", parts.join(", "));
    }

    if let Some(rest) = expr.strip_prefix("next ") {
        return format!("next({})", rewrite(rest.trim()));
    }

    if let Some(body) = expr.strip_prefix("call ") {
        let body = body.trim();
        if body.contains('(') {
            return rewrite(body);
        }
        let tokens = shell_split(body);
        if let Some((fn_name, arg_parts)) = tokens.split_first() {
            if is_identifier(fn_name) {
                if arg_parts.is_empty() {
                    return format!("{fn_name}()");
                }
                let args: Vec<String> = arg_parts.iter().map(|p| rewrite(p)).collect();
                return format!("{fn_name}({})", args.join(", "));
            }
        }
        return expr.to_owned();
    }

    if let Some(body) = expr.strip_prefix("get ") {
        if let Some((dict_name, key)) = body.split_once(' ') {
            let dict_expr = rewrite(dict_name.trim());
            let raw_key = key.trim();
            let key_expr = if is_identifier(raw_key) {
                format!("\"{raw_key}\"")
            } else {
                rewrite(raw_key)
            };
            return format!("({dict_expr}).get({key_expr})");
        }
    }

    if let Some(rest) = expr.strip_prefix("len ") {
        return format!("len({})", rewrite(rest.trim()));
    }
    if let Some(rest) = expr.strip_prefix("sum ") {
        return format!("sum({})", rewrite(rest.trim()));
    }
    if let Some(rest) = expr.strip_prefix("min ") {
        return format!("min({})", rewrite(rest.trim()));
    }
    if let Some(rest) = expr.strip_prefix("max ") {
        return format!("max({})", rewrite(rest.trim()));
    }
    if let Some(rest) = expr.strip_prefix("sorted ") {
        return format!("sorted({})", rewrite(rest.trim()));
    }
    if let Some(rest) = expr.strip_prefix("any ") {
        return format!("any({})", rewrite(rest.trim()));
    }
    if let Some(rest) = expr.strip_prefix("all ") {
        return format!("all({})", rewrite(rest.trim()));
    }

    if let Some(rest) = expr.strip_prefix("union ") {
        if let Ok((a, b)) = split_first(rest) {
            return format!("({}) | ({})", rewrite(&a), rewrite(&b));
        }
    }
    if let Some(rest) = expr.strip_prefix("intersection ") {
        if let Ok((a, b)) = split_first(rest) {
            return format!("({}) & ({})", rewrite(&a), rewrite(&b));
        }
    }
    if let Some(rest) = expr.strip_prefix("difference ") {
        if let Ok((a, b)) = split_first(rest) {
            return format!("({}) - ({})", rewrite(&a), rewrite(&b));
        }
    }
    if let Some(rest) = expr.strip_prefix("subset ") {
        if let Ok((a, b)) = split_first(rest) {
            return format!("({}).issubset({})", rewrite(&a), rewrite(&b));
        }
    }

    if let Some(rest) = expr.strip_prefix("copy ") {
        return format!("({}).copy()", rewrite(rest.trim()));
    }

    if let Some(rest) = expr.strip_prefix("dict ") {
        return normalize_dict(rest);
    }

    if let Some(rest) = expr.strip_prefix("json read ") {
        return format!("read_json({})", rewrite(rest.trim()));
    }
    if let Some(rest) = expr.strip_prefix("json write ") {
        if let Some((data_part, path_part)) = rest.split_once(" to ") {
            return format!(
                "write_json({}, {})",
                rewrite(data_part.trim()),
                rewrite(path_part.trim())
            );
        }
    }
    if let Some(rest) = expr.strip_prefix("csv read ") {
        return format!("read_csv({})", rewrite(rest.trim()));
    }
    if let Some(rest) = expr.strip_prefix("csv write ") {
        if let Some((rows_part, path_part)) = rest.split_once(" to ") {
            return format!(
                "write_csv({}, {})",
                rewrite(rows_part.trim()),
                rewrite(path_part.trim())
            );
        }
    }

    if let Some(rest) = expr.strip_prefix("read ") {
        return format!("({}).read()", rewrite(rest.trim()));
    }

    if expr.starts_with("lambda ") && expr.contains("->") {
        if let Some((params, body)) = expr[7..].split_once("->") {
            return format!("lambda {}: {}", params.trim(), rewrite(body.trim()));
        }
    }

    // Space-separated call shorthand: "add 5 7" -> "add(5, 7)".
    if SPACE_CALL_HEAD_RE.is_match(expr)
        && !expr.contains(['+', '-', '*', '/', '%', '<', '>', '=', ':', '(', ')', '[', ']', '{', '}', '.', ','])
    {
        let tokens = shell_split(expr);
        if tokens.len() > 1 && is_identifier(&tokens[0]) {
            let args: Vec<String> = tokens[1..].iter().map(|p| rewrite(p)).collect();
            return format!("{}({})", tokens[0], args.join(", "));
        }
    }

    let expr = normalize_dict(expr);
    keyword_normalize(&expr)
}

/// Splits `replace X "a" "b"` into `(X, a, b)`.
fn split_replace_args(rest: &str) -> Option<(String, String, String)> {
    let first_quote = rest.find('"')?;
    let base = rest[..first_quote].trim().to_owned();
    let quoted = &rest[first_quote..];
    // fields: ["", old, " ", new, ""] for `"old" "new"`
    let fields: Vec<&str> = quoted.split('"').collect();
    if fields.len() < 5 {
        return None;
    }
    let old = fields[1].to_owned();
    let new = fields[3].to_owned();
    Some((base, old, new))
}

/// Splits `X Y` into a base expression and a single trailing argument: the
/// base is taken lazily (as short as possible) and the remainder greedily.
fn split_two(rest: &str) -> Option<(String, String)> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b' ' {
            let base = rest[..i].trim();
            let tail = rest[i..].trim_start();
            if !base.is_empty() && !tail.is_empty() {
                return Some((base.to_owned(), tail.to_owned()));
            }
        }
        i += 1;
    }
    None
}

/// A small shell-like word splitter, keeping quoted substrings intact as
/// single tokens.
fn shell_split(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_str = false;
    let mut quote_char = '\0';
    let mut has_current = false;
    for c in text.chars() {
        if in_str {
            current.push(c);
            has_current = true;
            if c == quote_char {
                in_str = false;
            }
            continue;
        }
        if c == '"' || c == '\'' {
            in_str = true;
            quote_char = c;
            current.push(c);
            has_current = true;
            continue;
        }
        if c.is_whitespace() {
            if has_current {
                out.push(std::mem::take(&mut current));
                has_current = false;
            }
        } else {
            current.push(c);
            has_current = true;
        }
    }
    if has_current {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_string_helpers() {
        assert_eq!(rewrite("upper of name"), "(name).upper()");
        assert_eq!(rewrite("upper name"), "(name).upper()");
        assert_eq!(rewrite("strip of s"), "(s).strip()");
    }

    #[test]
    fn rewrites_replace_and_split() {
        assert_eq!(
            rewrite(r#"replace s "a" "b""#),
            "(s).replace(\"a\", \"b\")"
        );
        assert_eq!(rewrite(r#"split s ",""#), "(s).split(\",\")");
    }

    #[test]
    fn rewrites_map_filter() {
        assert_eq!(rewrite("map fn xs"), "map(fn, xs)");
        assert_eq!(rewrite("filter fn xs"), "filter(fn, xs)");
    }

    #[test]
    fn rewrites_get_and_call() {
        assert_eq!(rewrite("get d key"), "(d).get(\"key\")");
        assert_eq!(rewrite("call add 1 2"), "add(1, 2)");
    }

    #[test]
    fn rewrites_keywords() {
        assert_eq!(rewrite("true"), "True");
        assert_eq!(rewrite("x is same as y"), "x == y");
        assert_eq!(rewrite("x is not same as y"), "x != y");
        assert_eq!(rewrite("number(x)"), "int(x)");
    }

    #[test]
    fn rewrites_space_call_shorthand() {
        assert_eq!(rewrite("add 2 3"), "add(2, 3)");
    }

    #[test]
    fn count_not_confused_with_comparison() {
        assert_eq!(rewrite("count > 0"), "count > 0");
        assert_eq!(rewrite("count s \"a\""), "(s).count(\"a\")");
    }

    #[test]
    fn leaves_string_literals_untouched() {
        assert_eq!(rewrite("\"name: value\""), "\"name: value\"");
    }

    #[test]
    fn normalizes_dict_keys() {
        assert_eq!(normalize_dict("{name: v, age: 3}"), "{\"name\": v, \"age\": 3}");
    }

    #[test]
    fn split_first_falls_back_to_whitespace() {
        assert_eq!(
            split_first("fn xs").unwrap(),
            ("fn".to_owned(), "xs".to_owned())
        );
    }
}
