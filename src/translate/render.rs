//! Renders the flat, indent-tagged [`Emitted`] sequence back into
//! indented pseudo-Python text for the `translated` field of a result.
//! Purely cosmetic: the executor in [`crate::exec`] walks a
//! [`crate::exec::tree::Node`] tree built straight from the same
//! `Emitted` sequence and never reparses this text.

use crate::expr::render_expr;

use super::{Emitted, Stmt};

const INDENT_UNIT: &str = "    ";

pub fn render(program: &[Emitted]) -> String {
    let mut out = String::new();
    for Emitted { indent, stmt } in program {
        out.push_str(&INDENT_UNIT.repeat(*indent));
        out.push_str(&render_stmt(stmt));
        out.push('\n');
    }
    out
}

fn render_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expr(e) => render_expr(e),
        Stmt::Assign { name, value } => format!("{name} = {}", render_expr(value)),
        Stmt::SubscriptAssign {
            target,
            index,
            value,
        } => format!(
            "{}[{}] = {}",
            render_expr(target),
            render_expr(index),
            render_expr(value)
        ),
        Stmt::Unpack { value, targets } => format!("{} = {}", targets.join(", "), render_expr(value)),

        Stmt::If { cond } => format!("if {}:", render_expr(cond)),
        Stmt::Elif { cond } => format!("elif {}:", render_expr(cond)),
        Stmt::Else => "else:".to_owned(),
        Stmt::While { cond } => format!("while {}:", render_expr(cond)),
        Stmt::Try => "try:".to_owned(),
        Stmt::Except { name } => format!("except Exception as {name}:"),
        Stmt::Finally => "finally:".to_owned(),
        Stmt::FunctionDef { name, params } => format!("def {name}({}):", params.join(", ")),
        Stmt::GeneratorDef { name, params } => format!("def {name}({}):  # generator", params.join(", ")),
        Stmt::ClassDef { name, bases } => {
            if bases.is_empty() {
                format!("class {name}:")
            } else {
                format!("class {name}({}):", bases.join(", "))
            }
        }
        Stmt::With { resource, name } => format!("with {} as {name}:", render_expr(resource)),
        Stmt::ForEach { name, iter } => format!("for {name} in {}:", render_expr(iter)),
        Stmt::Repeat { count, index_name } => match index_name {
            Some(n) => format!("for {n} in range({}):", render_expr(count)),
            None => format!("for _ in range({}):", render_expr(count)),
        },

        Stmt::SayFormatted { value } => format!("print({})", render_expr(value)),
        Stmt::Say { args } => format!(
            "print({})",
            args.iter().map(render_expr).collect::<Vec<_>>().join(", ")
        ),
        Stmt::Ask { name } => format!("{name} = result = input_provider()"),
        Stmt::AskPrompt { prompt, name } => match name {
            Some(n) => format!("print({}, end=''); {n} = result = input_provider()", render_expr(prompt)),
            None => format!("print({}, end=''); result = input_provider()", render_expr(prompt)),
        },

        Stmt::Return(Some(e)) => format!("return {}", render_expr(e)),
        Stmt::Return(None) => "return".to_owned(),
        Stmt::Yield(Some(e)) => format!("yield {}", render_expr(e)),
        Stmt::Yield(None) => "yield None".to_owned(),
        Stmt::Raise(Some(e)) => format!("raise Exception({})", render_expr(e)),
        Stmt::Raise(None) => "raise Exception()".to_owned(),

        Stmt::Import(text) => text.clone(),
        Stmt::FromImport(text) => text.clone(),
        Stmt::Global(names) => format!("global {}", names.join(", ")),

        Stmt::OpenFile { path, name } => format!("{name} = _open_file({})", render_expr(path)),
        Stmt::Write { handle, content } => format!("{handle}.write({})", render_expr(content)),
        Stmt::Append { handle, content } => format!("{handle}.write({})  # append", render_expr(content)),
        Stmt::Close { handle } => format!("{handle}.close()"),

        Stmt::Break => "break".to_owned(),
        Stmt::Continue => "continue".to_owned(),
        Stmt::Pass => "pass".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::translate;

    #[test]
    fn renders_if_else_with_indentation() {
        let prog = translate("if x > 5\nsay \"big\"\nelse\nsay \"small\"\nend\n").unwrap();
        let text = render(&prog);
        assert_eq!(
            text,
            "if (x > 5):\nprint(\"big\")\nelse:\nprint(\"small\")\n".replace('\n', "\n")
                .replacen("print(\"big\")", "    print(\"big\")", 1)
                .replacen("print(\"small\")", "    print(\"small\")", 1)
        );
    }
}
