//! Tokenizer for the canonical (rewritten) expression text.
//!
//! A hand-written character-at-a-time lexer over the small expression
//! grammar the rewriter emits.

use std::fmt::{self, Display};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Int(i64),
    Float(f64),
    Str { value: String, is_fstring: bool },
    Ident(String),
    Keyword(&'static str),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    Pipe,
    Amp,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Arrow,
    Eof,
}

const KEYWORDS: &[&str] = &[
    "and", "or", "not", "if", "else", "for", "in", "lambda", "True", "False", "None",
];

#[derive(Debug, Clone, PartialEq)]
pub struct LexError(pub String);

impl Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            src,
            pos: 0,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek2(&self) -> Option<char> {
        let mut it = self.chars.clone();
        it.next();
        it.next()
    }

    fn eat_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// Tokenize the entire input, returning all tokens followed by a single
    /// trailing `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Tok>, LexError> {
        let mut out = Vec::new();
        loop {
            let tok = self.next_token()?;
            let is_eof = tok == Tok::Eof;
            out.push(tok);
            if is_eof {
                break;
            }
        }
        Ok(out)
    }

    fn next_token(&mut self) -> Result<Tok, LexError> {
        self.eat_whitespace();
        let Some(c) = self.peek() else {
            return Ok(Tok::Eof);
        };

        if c.is_ascii_digit() || (c == '.' && matches!(self.peek2(), Some(d) if d.is_ascii_digit()))
        {
            return self.lex_number();
        }

        if c == '"' || c == '\'' {
            return self.lex_string(false, false);
        }

        if c.is_alphabetic() || c == '_' {
            return self.lex_ident_or_prefixed_string();
        }

        self.bump();
        match c {
            '+' => Ok(Tok::Plus),
            '-' => {
                if self.peek() == Some('>') {
                    self.bump();
                    Ok(Tok::Arrow)
                } else {
                    Ok(Tok::Minus)
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.bump();
                    Ok(Tok::DoubleStar)
                } else {
                    Ok(Tok::Star)
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.bump();
                    Ok(Tok::DoubleSlash)
                } else {
                    Ok(Tok::Slash)
                }
            }
            '%' => Ok(Tok::Percent),
            '|' => Ok(Tok::Pipe),
            '&' => Ok(Tok::Amp),
            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Tok::Eq)
                } else {
                    Err(LexError(format!(
                        "unexpected character '=' at byte {}",
                        self.pos
                    )))
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Tok::NotEq)
                } else {
                    Err(LexError(format!(
                        "unexpected character '!' at byte {}",
                        self.pos
                    )))
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Tok::LtE)
                } else {
                    Ok(Tok::Lt)
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    Ok(Tok::GtE)
                } else {
                    Ok(Tok::Gt)
                }
            }
            '(' => Ok(Tok::LParen),
            ')' => Ok(Tok::RParen),
            '[' => Ok(Tok::LBracket),
            ']' => Ok(Tok::RBracket),
            '{' => Ok(Tok::LBrace),
            '}' => Ok(Tok::RBrace),
            ',' => Ok(Tok::Comma),
            ':' => Ok(Tok::Colon),
            '.' => Ok(Tok::Dot),
            other => Err(LexError(format!(
                "unexpected character '{other}' at byte {}",
                self.pos
            ))),
        }
    }

    fn lex_number(&mut self) -> Result<Tok, LexError> {
        let start = self.pos;
        let mut is_float = false;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') && matches!(self.peek2(), Some(d) if d.is_ascii_digit() || true)
        {
            // Only consume the dot as a decimal point if what follows isn't
            // the start of an attribute/method access on an int literal;
            // TALE expressions never call methods directly on bare ints, so
            // a trailing dot is always a decimal point here.
            is_float = true;
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let next_ok = matches!(lookahead.peek(), Some(c) if c.is_ascii_digit())
                || matches!(lookahead.peek(), Some('+') | Some('-'));
            if next_ok {
                is_float = true;
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.bump();
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        let text = &self.src[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(Tok::Float)
                .map_err(|_| LexError(format!("invalid float literal '{text}'")))
        } else {
            text.parse::<i64>()
                .map(Tok::Int)
                .map_err(|_| LexError(format!("invalid integer literal '{text}'")))
        }
    }

    fn lex_ident_or_prefixed_string(&mut self) -> Result<Tok, LexError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        let text = &self.src[start..self.pos];

        let lower = text.to_ascii_lowercase();
        if (lower == "r" || lower == "f" || lower == "fr" || lower == "rf")
            && matches!(self.peek(), Some('"') | Some('\''))
        {
            let is_raw = lower.contains('r');
            let is_fstring = lower.contains('f');
            return self.lex_string(is_raw, is_fstring);
        }

        if let Some(kw) = KEYWORDS.iter().find(|k| **k == text) {
            return Ok(Tok::Keyword(kw));
        }
        Ok(Tok::Ident(text.to_owned()))
    }

    fn lex_string(&mut self, is_raw: bool, is_fstring: bool) -> Result<Tok, LexError> {
        let quote = self.bump().unwrap();
        let triple = self.peek() == Some(quote) && self.peek2() == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut raw = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(LexError("unterminated string literal".to_owned()));
            };
            if c == '\\' && !is_raw {
                let Some(escaped) = self.bump() else {
                    return Err(LexError("unterminated string literal".to_owned()));
                };
                raw.push('\\');
                raw.push(escaped);
                continue;
            }
            if c == quote {
                if !triple {
                    break;
                }
                if self.peek() == Some(quote) && self.peek2() == Some(quote) {
                    self.bump();
                    self.bump();
                    break;
                }
                raw.push(c);
                continue;
            }
            raw.push(c);
        }

        let value = if is_raw {
            raw
        } else {
            unescape::unescape(&raw).unwrap_or(raw)
        };
        Ok(Tok::Str { value, is_fstring })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Tok> {
        Lexer::new(src).tokenize().unwrap()
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(lex("42"), vec![Tok::Int(42), Tok::Eof]);
        assert_eq!(lex("3.14"), vec![Tok::Float(3.14), Tok::Eof]);
        assert_eq!(lex("-1"), vec![Tok::Minus, Tok::Int(1), Tok::Eof]);
    }

    #[test]
    fn lexes_strings_with_escapes() {
        let toks = lex(r#""hi\n""#);
        assert_eq!(
            toks,
            vec![
                Tok::Str {
                    value: "hi\n".to_owned(),
                    is_fstring: false
                },
                Tok::Eof
            ]
        );
    }

    #[test]
    fn lexes_raw_and_fstrings() {
        let toks = lex(r#"r"a\b""#);
        assert_eq!(
            toks[0],
            Tok::Str {
                value: "a\\b".to_owned(),
                is_fstring: false
            }
        );

        let toks = lex(r#"f"hi {name}""#);
        assert_eq!(
            toks[0],
            Tok::Str {
                value: "hi {name}".to_owned(),
                is_fstring: true
            }
        );
    }

    #[test]
    fn lexes_keywords_and_idents() {
        assert_eq!(
            lex("and x"),
            vec![Tok::Keyword("and"), Tok::Ident("x".to_owned()), Tok::Eof]
        );
    }

    #[test]
    fn lexes_operators() {
        assert_eq!(
            lex("a == b"),
            vec![
                Tok::Ident("a".into()),
                Tok::Eq,
                Tok::Ident("b".into()),
                Tok::Eof
            ]
        );
        assert_eq!(lex("2 // 3"), vec![Tok::Int(2), Tok::DoubleSlash, Tok::Int(3), Tok::Eof]);
        assert_eq!(lex("2 ** 3"), vec![Tok::Int(2), Tok::DoubleStar, Tok::Int(3), Tok::Eof]);
    }
}
