//! Builds the nested block tree the executor walks from the flat,
//! indent-tagged [`Emitted`] sequence the translator produces. The
//! translator synthesizes indentation on a flat list rather than handing
//! back a tree directly, so this module is the one extra step needed before
//! the walk can start: it groups each control head's body under it and
//! attaches `else`/`elif`/`catch`/`finally` continuations, which the
//! synthesizer emits as siblings at the *same* indent as their owning head,
//! back onto that head.

use crate::expr::Expr;
use crate::translate::{Emitted, Stmt};

#[derive(Debug, Clone)]
pub enum Node {
    Stmt(Stmt),
    If {
        branches: Vec<(Expr, Vec<Node>)>,
        orelse: Vec<Node>,
    },
    While {
        cond: Expr,
        body: Vec<Node>,
    },
    Try {
        body: Vec<Node>,
        except: Option<(String, Vec<Node>)>,
        finally: Vec<Node>,
    },
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Vec<Node>,
        is_generator: bool,
    },
    ClassDef {
        name: String,
        bases: Vec<String>,
        body: Vec<Node>,
    },
    With {
        resource: Expr,
        name: String,
        body: Vec<Node>,
    },
    ForEach {
        name: String,
        iter: Expr,
        body: Vec<Node>,
    },
    Repeat {
        count: Expr,
        index_name: Option<String>,
        body: Vec<Node>,
    },
}

/// Entry point: turns the whole translated program into a top-level block.
pub fn build(program: &[Emitted]) -> Vec<Node> {
    let mut pos = 0;
    build_block(program, &mut pos, 0)
}

fn build_block(items: &[Emitted], pos: &mut usize, indent: usize) -> Vec<Node> {
    let mut out = Vec::new();
    while *pos < items.len() && items[*pos].indent >= indent {
        if items[*pos].indent > indent {
            // A deeper line with no owning head at this level; the
            // synthesizer never produces this, but stop rather than loop.
            break;
        }
        let stmt = items[*pos].stmt.clone();
        match stmt {
            Stmt::If { cond } => {
                *pos += 1;
                let body = build_block(items, pos, indent + 1);
                let mut branches = vec![(cond, body)];
                let mut orelse = Vec::new();
                loop {
                    match peek_same_indent(items, *pos, indent) {
                        Some(Stmt::Elif { cond }) => {
                            *pos += 1;
                            let body = build_block(items, pos, indent + 1);
                            branches.push((cond, body));
                        }
                        Some(Stmt::Else) => {
                            *pos += 1;
                            orelse = build_block(items, pos, indent + 1);
                            break;
                        }
                        _ => break,
                    }
                }
                out.push(Node::If { branches, orelse });
            }
            Stmt::While { cond } => {
                *pos += 1;
                let body = build_block(items, pos, indent + 1);
                out.push(Node::While { cond, body });
            }
            Stmt::Try => {
                *pos += 1;
                let body = build_block(items, pos, indent + 1);
                let mut except = None;
                if let Some(Stmt::Except { name }) = peek_same_indent(items, *pos, indent) {
                    *pos += 1;
                    let handler_body = build_block(items, pos, indent + 1);
                    except = Some((name, handler_body));
                }
                let mut finally = Vec::new();
                if let Some(Stmt::Finally) = peek_same_indent(items, *pos, indent) {
                    *pos += 1;
                    finally = build_block(items, pos, indent + 1);
                }
                out.push(Node::Try { body, except, finally });
            }
            Stmt::FunctionDef { name, params } => {
                *pos += 1;
                let body = build_block(items, pos, indent + 1);
                out.push(Node::FunctionDef { name, params, body, is_generator: false });
            }
            Stmt::GeneratorDef { name, params } => {
                *pos += 1;
                let body = build_block(items, pos, indent + 1);
                out.push(Node::FunctionDef { name, params, body, is_generator: true });
            }
            Stmt::ClassDef { name, bases } => {
                *pos += 1;
                let body = build_block(items, pos, indent + 1);
                out.push(Node::ClassDef { name, bases, body });
            }
            Stmt::With { resource, name } => {
                *pos += 1;
                let body = build_block(items, pos, indent + 1);
                out.push(Node::With { resource, name, body });
            }
            Stmt::ForEach { name, iter } => {
                *pos += 1;
                let body = build_block(items, pos, indent + 1);
                out.push(Node::ForEach { name, iter, body });
            }
            Stmt::Repeat { count, index_name } => {
                *pos += 1;
                let body = build_block(items, pos, indent + 1);
                out.push(Node::Repeat { count, index_name, body });
            }
            // Orphaned continuations (no owning head immediately before them
            // at this indent): skip rather than loop forever.
            Stmt::Elif { .. } | Stmt::Else | Stmt::Except { .. } | Stmt::Finally => {
                *pos += 1;
            }
            other => {
                out.push(Node::Stmt(other));
                *pos += 1;
            }
        }
    }
    out
}

fn peek_same_indent(items: &[Emitted], pos: usize, indent: usize) -> Option<Stmt> {
    items
        .get(pos)
        .filter(|e| e.indent == indent)
        .map(|e| e.stmt.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::translate;

    #[test]
    fn attaches_else_to_if() {
        let prog = translate("if x > 5\nsay \"big\"\nelse\nsay \"small\"\nend\n").unwrap();
        let tree = build(&prog);
        assert_eq!(tree.len(), 1);
        match &tree[0] {
            Node::If { branches, orelse } => {
                assert_eq!(branches.len(), 1);
                assert_eq!(branches[0].1.len(), 1);
                assert_eq!(orelse.len(), 1);
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn attaches_catch_and_finally_to_try() {
        let prog = translate("try\nsay 1\ncatch err\nsay 2\nfinally\nsay 3\nend\n").unwrap();
        let tree = build(&prog);
        match &tree[0] {
            Node::Try { body, except, finally } => {
                assert_eq!(body.len(), 1);
                let (name, handler) = except.as_ref().unwrap();
                assert_eq!(name, "err");
                assert_eq!(handler.len(), 1);
                assert_eq!(finally.len(), 1);
            }
            other => panic!("expected Try, got {other:?}"),
        }
    }

    #[test]
    fn nests_function_body() {
        let prog = translate("function add a b\nreturn a + b\nend\n").unwrap();
        let tree = build(&prog);
        match &tree[0] {
            Node::FunctionDef { name, params, body, is_generator } => {
                assert_eq!(name, "add");
                assert_eq!(params, &vec!["a".to_owned(), "b".to_owned()]);
                assert_eq!(body.len(), 1);
                assert!(!is_generator);
            }
            other => panic!("expected FunctionDef, got {other:?}"),
        }
    }
}
