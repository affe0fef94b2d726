//! Renders a validated [`Expr`] back to canonical text, used only to build
//! the human-readable `translated` field of a [`crate::RunOutcome`] /
//! [`crate::AnalyzeOutcome`] — the executor itself walks the tree directly
//! and never re-parses this string.

use super::ast::*;

pub fn render(expr: &Expr) -> String {
    match expr {
        Expr::None => "None".to_owned(),
        Expr::Bool(true) => "True".to_owned(),
        Expr::Bool(false) => "False".to_owned(),
        Expr::Int(i) => i.to_string(),
        Expr::Float(f) => f.to_string(),
        Expr::Str(s) => format!("{:?}", s),
        Expr::FString(parts) => {
            let mut out = String::from("f\"");
            for part in parts {
                match part {
                    FStringPart::Lit(s) => out.push_str(&s.replace('{', "{{").replace('}', "}}")),
                    FStringPart::Expr(e) => {
                        out.push('{');
                        out.push_str(&render(e));
                        out.push('}');
                    }
                }
            }
            out.push('"');
            out
        }
        Expr::Name(n) => n.clone(),
        Expr::UnaryOp { op, operand } => {
            let sym = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Pos => "+",
                UnaryOp::Not => "not ",
            };
            format!("{sym}{}", render(operand))
        }
        Expr::BinOp { op, left, right } => {
            format!("({} {} {})", render(left), bin_symbol(*op), render(right))
        }
        Expr::BoolOp { op, values } => {
            let sym = match op {
                BoolOp::And => " and ",
                BoolOp::Or => " or ",
            };
            format!(
                "({})",
                values.iter().map(render).collect::<Vec<_>>().join(sym)
            )
        }
        Expr::Compare { left, ops } => {
            let mut out = render(left);
            for (op, rhs) in ops {
                out.push(' ');
                out.push_str(cmp_symbol(*op));
                out.push(' ');
                out.push_str(&render(rhs));
            }
            out
        }
        Expr::Call { func, args } => {
            format!(
                "{}({})",
                render(func),
                args.iter().map(render).collect::<Vec<_>>().join(", ")
            )
        }
        Expr::List(items) => format!(
            "[{}]",
            items.iter().map(render).collect::<Vec<_>>().join(", ")
        ),
        Expr::Tuple(items) => format!(
            "({},)",
            items.iter().map(render).collect::<Vec<_>>().join(", ")
        ),
        Expr::Set(items) => format!(
            "{{{}}}",
            items.iter().map(render).collect::<Vec<_>>().join(", ")
        ),
        Expr::Dict(pairs) => format!(
            "{{{}}}",
            pairs
                .iter()
                .map(|(k, v)| format!("{}: {}", render(k), render(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Expr::ListComp { elt, generators } => {
            format!("[{} {}]", render(elt), render_generators(generators))
        }
        Expr::SetComp { elt, generators } => {
            format!("{{{} {}}}", render(elt), render_generators(generators))
        }
        Expr::DictComp {
            key,
            value,
            generators,
        } => format!(
            "{{{}: {} {}}}",
            render(key),
            render(value),
            render_generators(generators)
        ),
        Expr::GeneratorExp { elt, generators } => {
            format!("({} {})", render(elt), render_generators(generators))
        }
        Expr::IfExp { cond, body, orelse } => {
            format!("({} if {} else {})", render(body), render(cond), render(orelse))
        }
        Expr::Subscript { value, index } => format!("{}[{}]", render(value), render_index(index)),
        Expr::Attribute { value, attr } => format!("{}.{attr}", render(value)),
        Expr::Lambda { params, body } => format!("lambda {}: {}", params.join(", "), render(body)),
    }
}

fn render_index(index: &SubscriptIndex) -> String {
    match index {
        SubscriptIndex::Index(e) => render(e),
        SubscriptIndex::Slice { lower, upper, step } => format!(
            "{}:{}{}",
            lower.as_ref().map(render).unwrap_or_default(),
            upper.as_ref().map(render).unwrap_or_default(),
            step.as_ref().map(|s| format!(":{}", render(s))).unwrap_or_default(),
        ),
    }
}

fn render_generators(generators: &[Comprehension]) -> String {
    generators
        .iter()
        .map(|g| {
            let ifs: String = g
                .ifs
                .iter()
                .map(|c| format!(" if {}", render(c)))
                .collect();
            format!("for {} in {}{}", g.targets.join(", "), render(&g.iter), ifs)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn bin_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::FloorDiv => "//",
        BinOp::Pow => "**",
        BinOp::BitOr => "|",
        BinOp::BitAnd => "&",
    }
}

fn cmp_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "==",
        CompareOp::NotEq => "!=",
        CompareOp::Lt => "<",
        CompareOp::LtE => "<=",
        CompareOp::Gt => ">",
        CompareOp::GtE => ">=",
    }
}
