//! Recursive-descent parser turning the canonical expression text into an
//! [`Expr`] tree. Doubles as the safety validator: the grammar below only
//! has productions for the allow-listed node kinds, so anything else (a
//! walrus assignment, a `yield` inside an expression, a starred expression,
//! ...) is rejected here with the canonical `"I could not understand: ..."`
//! diagnostic rather than by a separate tree walk.

use super::ast::*;
use super::lexer::{Lexer, Tok};
use crate::error::TranslateError;

pub fn parse_expr(src: &str) -> Result<Expr, TranslateError> {
    let tokens = Lexer::new(src)
        .tokenize()
        .map_err(|_| TranslateError::could_not_understand(src))?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        original: src,
    };
    let expr = parser
        .parse_expr()
        .map_err(|_| TranslateError::could_not_understand(src))?;
    if parser.peek() != &Tok::Eof {
        return Err(TranslateError::could_not_understand(src));
    }
    Ok(expr)
}

/// Parses an f-string template's raw content (the text between the quotes,
/// already unescaped) into literal/placeholder parts. Used by `say
/// formatted` when the rewritten payload is already a bare string literal.
pub fn parse_format_string(template: &str) -> Result<Vec<FStringPart>, TranslateError> {
    parse_fstring_parts(template).map_err(|_| TranslateError::could_not_understand(template))
}

struct ParseFail;

struct Parser<'a> {
    tokens: Vec<Tok>,
    pos: usize,
    original: &'a str,
}

type PResult<T> = Result<T, ParseFail>;

impl<'a> Parser<'a> {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Tok {
        self.tokens.get(self.pos + offset).unwrap_or(&Tok::Eof)
    }

    fn bump(&mut self) -> Tok {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> PResult<()> {
        if self.peek() == tok {
            self.bump();
            Ok(())
        } else {
            Err(ParseFail)
        }
    }

    fn eat_kw(&mut self, kw: &'static str) -> PResult<()> {
        self.eat(&Tok::Keyword(kw))
    }

    fn is_kw(&self, kw: &str) -> bool {
        matches!(self.peek(), Tok::Keyword(k) if *k == kw)
    }

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_lambda_or_ternary()
    }

    fn parse_lambda_or_ternary(&mut self) -> PResult<Expr> {
        if self.is_kw("lambda") {
            self.bump();
            let mut params = Vec::new();
            while let Tok::Ident(name) = self.peek().clone() {
                self.bump();
                params.push(name);
                if self.peek() == &Tok::Comma {
                    self.bump();
                } else {
                    break;
                }
            }
            self.eat(&Tok::Colon)?;
            let body = self.parse_expr()?;
            return Ok(Expr::Lambda {
                params,
                body: Box::new(body),
            });
        }

        let body = self.parse_or()?;
        if self.is_kw("if") {
            self.bump();
            let cond = self.parse_or()?;
            self.eat_kw("else")?;
            let orelse = self.parse_expr()?;
            return Ok(Expr::IfExp {
                cond: Box::new(cond),
                body: Box::new(body),
                orelse: Box::new(orelse),
            });
        }
        Ok(body)
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let first = self.parse_and()?;
        if !self.is_kw("or") {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.is_kw("or") {
            self.bump();
            values.push(self.parse_and()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::Or,
            values,
        })
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let first = self.parse_not()?;
        if !self.is_kw("and") {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.is_kw("and") {
            self.bump();
            values.push(self.parse_not()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::And,
            values,
        })
    }

    fn parse_not(&mut self) -> PResult<Expr> {
        if self.is_kw("not") {
            self.bump();
            let operand = self.parse_not()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> PResult<Expr> {
        let left = self.parse_bitor()?;
        let mut ops = Vec::new();
        loop {
            let op = match self.peek() {
                Tok::Eq => CompareOp::Eq,
                Tok::NotEq => CompareOp::NotEq,
                Tok::Lt => CompareOp::Lt,
                Tok::LtE => CompareOp::LtE,
                Tok::Gt => CompareOp::Gt,
                Tok::GtE => CompareOp::GtE,
                _ => break,
            };
            self.bump();
            let right = self.parse_bitor()?;
            ops.push((op, right));
        }
        if ops.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                ops,
            })
        }
    }

    fn parse_bitor(&mut self) -> PResult<Expr> {
        let mut left = self.parse_bitand()?;
        while self.peek() == &Tok::Pipe {
            self.bump();
            let right = self.parse_bitand()?;
            left = Expr::BinOp {
                op: BinOp::BitOr,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> PResult<Expr> {
        let mut left = self.parse_additive()?;
        while self.peek() == &Tok::Amp {
            self.bump();
            let right = self.parse_additive()?;
            left = Expr::BinOp {
                op: BinOp::BitAnd,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                Tok::DoubleSlash => BinOp::FloorDiv,
                Tok::Percent => BinOp::Mod,
                _ => break,
            };
            self.bump();
            let right = self.parse_unary()?;
            left = Expr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let op = match self.peek() {
            Tok::Minus => Some(UnaryOp::Neg),
            Tok::Plus => Some(UnaryOp::Pos),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            });
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> PResult<Expr> {
        let left = self.parse_postfix()?;
        if self.peek() == &Tok::DoubleStar {
            self.bump();
            let right = self.parse_unary()?;
            return Ok(Expr::BinOp {
                op: BinOp::Pow,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                Tok::Dot => {
                    self.bump();
                    let Tok::Ident(attr) = self.bump() else {
                        return Err(ParseFail);
                    };
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        attr,
                    };
                }
                Tok::LParen => {
                    self.bump();
                    let args = self.parse_expr_list(&Tok::RParen)?;
                    self.eat(&Tok::RParen)?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                    };
                }
                Tok::LBracket => {
                    self.bump();
                    let index = self.parse_subscript_index()?;
                    self.eat(&Tok::RBracket)?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_subscript_index(&mut self) -> PResult<SubscriptIndex> {
        let lower = if self.peek() == &Tok::Colon {
            None
        } else {
            Some(self.parse_expr()?)
        };

        if self.peek() != &Tok::Colon {
            let Some(idx) = lower else {
                return Err(ParseFail);
            };
            return Ok(SubscriptIndex::Index(idx));
        }

        self.bump(); // ':'
        let upper = if matches!(self.peek(), Tok::Colon | Tok::RBracket) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let step = if self.peek() == &Tok::Colon {
            self.bump();
            if self.peek() == &Tok::RBracket {
                None
            } else {
                Some(self.parse_expr()?)
            }
        } else {
            None
        };
        Ok(SubscriptIndex::Slice { lower, upper, step })
    }

    /// Parses a comma-separated list of expressions up to (but not
    /// including) `end`. Handles a trailing comma.
    fn parse_expr_list(&mut self, end: &Tok) -> PResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.peek() == end {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            if self.peek() == &Tok::Comma {
                self.bump();
                if self.peek() == end {
                    break;
                }
            } else {
                break;
            }
        }
        Ok(items)
    }

    fn parse_comprehension_tail(&mut self) -> PResult<Vec<Comprehension>> {
        let mut generators = Vec::new();
        while self.is_kw("for") {
            self.bump();
            let mut targets = Vec::new();
            loop {
                let Tok::Ident(name) = self.bump() else {
                    return Err(ParseFail);
                };
                targets.push(name);
                if self.peek() == &Tok::Comma {
                    self.bump();
                } else {
                    break;
                }
            }
            self.eat_kw("in")?;
            let iter = self.parse_or()?;
            let mut ifs = Vec::new();
            while self.is_kw("if") {
                self.bump();
                ifs.push(self.parse_or()?);
            }
            generators.push(Comprehension {
                targets,
                iter,
                ifs,
            });
        }
        Ok(generators)
    }

    fn parse_atom(&mut self) -> PResult<Expr> {
        match self.peek().clone() {
            Tok::Int(v) => {
                self.bump();
                Ok(Expr::Int(v))
            }
            Tok::Float(v) => {
                self.bump();
                Ok(Expr::Float(v))
            }
            Tok::Str { value, is_fstring } => {
                self.bump();
                if is_fstring {
                    Ok(Expr::FString(parse_fstring_parts(&value)?))
                } else {
                    Ok(Expr::Str(value))
                }
            }
            Tok::Keyword("True") => {
                self.bump();
                Ok(Expr::Bool(true))
            }
            Tok::Keyword("False") => {
                self.bump();
                Ok(Expr::Bool(false))
            }
            Tok::Keyword("None") => {
                self.bump();
                Ok(Expr::None)
            }
            Tok::Ident(name) => {
                self.bump();
                Ok(Expr::Name(name))
            }
            Tok::LParen => {
                self.bump();
                if self.peek() == &Tok::RParen {
                    self.bump();
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let first = self.parse_expr()?;
                if self.is_kw("for") {
                    let generators = self.parse_comprehension_tail()?;
                    self.eat(&Tok::RParen)?;
                    return Ok(Expr::GeneratorExp {
                        elt: Box::new(first),
                        generators,
                    });
                }
                if self.peek() == &Tok::Comma {
                    let mut items = vec![first];
                    while self.peek() == &Tok::Comma {
                        self.bump();
                        if self.peek() == &Tok::RParen {
                            break;
                        }
                        items.push(self.parse_expr()?);
                    }
                    self.eat(&Tok::RParen)?;
                    return Ok(Expr::Tuple(items));
                }
                self.eat(&Tok::RParen)?;
                Ok(first)
            }
            Tok::LBracket => {
                self.bump();
                if self.peek() == &Tok::RBracket {
                    self.bump();
                    return Ok(Expr::List(Vec::new()));
                }
                let first = self.parse_expr()?;
                if self.is_kw("for") {
                    let generators = self.parse_comprehension_tail()?;
                    self.eat(&Tok::RBracket)?;
                    return Ok(Expr::ListComp {
                        elt: Box::new(first),
                        generators,
                    });
                }
                let mut items = vec![first];
                while self.peek() == &Tok::Comma {
                    self.bump();
                    if self.peek() == &Tok::RBracket {
                        break;
                    }
                    items.push(self.parse_expr()?);
                }
                self.eat(&Tok::RBracket)?;
                Ok(Expr::List(items))
            }
            Tok::LBrace => {
                self.bump();
                if self.peek() == &Tok::RBrace {
                    self.bump();
                    return Ok(Expr::Dict(Vec::new()));
                }
                let first_key = self.parse_expr()?;
                if self.peek() == &Tok::Colon {
                    self.bump();
                    let first_val = self.parse_expr()?;
                    if self.is_kw("for") {
                        let generators = self.parse_comprehension_tail()?;
                        self.eat(&Tok::RBrace)?;
                        return Ok(Expr::DictComp {
                            key: Box::new(first_key),
                            value: Box::new(first_val),
                            generators,
                        });
                    }
                    let mut pairs = vec![(first_key, first_val)];
                    while self.peek() == &Tok::Comma {
                        self.bump();
                        if self.peek() == &Tok::RBrace {
                            break;
                        }
                        let k = self.parse_expr()?;
                        self.eat(&Tok::Colon)?;
                        let v = self.parse_expr()?;
                        pairs.push((k, v));
                    }
                    self.eat(&Tok::RBrace)?;
                    return Ok(Expr::Dict(pairs));
                }
                if self.is_kw("for") {
                    let generators = self.parse_comprehension_tail()?;
                    self.eat(&Tok::RBrace)?;
                    return Ok(Expr::SetComp {
                        elt: Box::new(first_key),
                        generators,
                    });
                }
                let mut items = vec![first_key];
                while self.peek() == &Tok::Comma {
                    self.bump();
                    if self.peek() == &Tok::RBrace {
                        break;
                    }
                    items.push(self.parse_expr()?);
                }
                self.eat(&Tok::RBrace)?;
                Ok(Expr::Set(items))
            }
            Tok::Keyword("lambda") => self.parse_lambda_or_ternary(),
            _ => {
                let _ = self.original;
                Err(ParseFail)
            }
        }
    }
}

/// Splits an f-string template's raw content into literal/placeholder
/// parts, recursively parsing each `{...}` placeholder as a full
/// expression. `{{`/`}}` escape to literal braces, matching Python.
fn parse_fstring_parts(template: &str) -> PResult<Vec<FStringPart>> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let chars: Vec<char> = template.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                literal.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                literal.push('}');
                i += 2;
            }
            '{' => {
                if !literal.is_empty() {
                    parts.push(FStringPart::Lit(std::mem::take(&mut literal)));
                }
                let start = i + 1;
                let mut depth = 1;
                let mut j = start;
                while j < chars.len() && depth > 0 {
                    match chars[j] {
                        '{' => depth += 1,
                        '}' => depth -= 1,
                        _ => {}
                    }
                    if depth > 0 {
                        j += 1;
                    }
                }
                if j >= chars.len() {
                    return Err(ParseFail);
                }
                let inner: String = chars[start..j].iter().collect();
                let expr = parse_expr(&inner).map_err(|_| ParseFail)?;
                parts.push(FStringPart::Expr(expr));
                i = j + 1;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }
    if !literal.is_empty() {
        parts.push(FStringPart::Lit(literal));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_precedence() {
        let e = parse_expr("1 + 2 * 3").unwrap();
        assert_eq!(
            e,
            Expr::BinOp {
                op: BinOp::Add,
                left: Box::new(Expr::Int(1)),
                right: Box::new(Expr::BinOp {
                    op: BinOp::Mul,
                    left: Box::new(Expr::Int(2)),
                    right: Box::new(Expr::Int(3)),
                }),
            }
        );
    }

    #[test]
    fn parses_chained_comparison() {
        let e = parse_expr("1 < x < 10").unwrap();
        match e {
            Expr::Compare { ops, .. } => assert_eq!(ops.len(), 2),
            _ => panic!("expected Compare"),
        }
    }

    #[test]
    fn parses_call_and_attribute_chain() {
        let e = parse_expr("(name).upper().strip()").unwrap();
        assert!(matches!(e, Expr::Call { .. }));
    }

    #[test]
    fn parses_list_comprehension() {
        let e = parse_expr("[x * 2 for x in xs if x > 0]").unwrap();
        match e {
            Expr::ListComp { generators, .. } => {
                assert_eq!(generators.len(), 1);
                assert_eq!(generators[0].ifs.len(), 1);
            }
            _ => panic!("expected ListComp"),
        }
    }

    #[test]
    fn parses_slice() {
        let e = parse_expr("xs[1:3]").unwrap();
        assert!(matches!(e, Expr::Subscript { .. }));
    }

    #[test]
    fn rejects_walrus_and_unknown_syntax() {
        assert!(parse_expr("x := 5").is_err());
        assert!(parse_expr("yield 5").is_err());
        assert!(parse_expr("*args").is_err());
    }

    #[test]
    fn parses_fstring_with_nested_expr() {
        let e = parse_expr(r#"f"hi {name.upper()}!""#).unwrap();
        match e {
            Expr::FString(parts) => assert_eq!(parts.len(), 3),
            _ => panic!("expected FString"),
        }
    }
}
