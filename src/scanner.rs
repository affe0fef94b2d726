//! Lexical pre-scanner: splits source into logical lines, absorbs
//! `note """ ... """` blocks, and drops blank/`#` comment lines while
//! preserving original line numbers for diagnostics.

/// One surviving source line, numbered from the *original* 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    pub line_no: usize,
    pub text: String,
}

/// Splits `source` into logical lines, stripping blanks, `#` comments, and
/// `note """ ... """` blocks.
pub fn scan(source: &str) -> Vec<LogicalLine> {
    let mut out = Vec::new();
    let mut in_note = false;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim();

        if in_note {
            if trimmed.ends_with("\"\"\"") {
                in_note = false;
            }
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if trimmed.to_ascii_lowercase().starts_with("note \"\"\"") && !trimmed.ends_with("\"\"\"")
        {
            in_note = true;
            continue;
        }
        if trimmed.to_ascii_lowercase().starts_with("note \"\"\"") && trimmed.ends_with("\"\"\"") {
            // Single-line note block; absorbed entirely, nothing emitted.
            continue;
        }

        out.push(LogicalLine {
            line_no,
            text: raw_line.to_owned(),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_blank_and_comment_lines() {
        let lines = scan("x is 1\n\n# a comment\ny is 2\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[1].line_no, 4);
    }

    #[test]
    fn absorbs_multiline_note_block() {
        let src = "say \"a\"\nnote \"\"\"\nthis is\nall ignored\n\"\"\"\nsay \"b\"\n";
        let lines = scan(src);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "say \"a\"");
        assert_eq!(lines[1].line_no, 6);
        assert_eq!(lines[1].text, "say \"b\"");
    }

    #[test]
    fn absorbs_single_line_note() {
        let lines = scan("note \"\"\"just a note\"\"\"\nsay \"x\"\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "say \"x\"");
    }

    #[test]
    fn preserves_original_numbering_across_gaps() {
        let lines = scan("\n\nx is 1\n");
        assert_eq!(lines[0].line_no, 3);
    }
}
