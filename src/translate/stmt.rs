//! The translated-program IR: a sequence of target-language statements. A
//! typed enum rather than generated target-language text, so the executor
//! can walk the tree directly instead of emitting then re-parsing source.

use crate::expr::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Assign {
        name: String,
        value: Expr,
    },
    SubscriptAssign {
        target: Expr,
        index: Expr,
        value: Expr,
    },
    Unpack {
        value: Expr,
        targets: Vec<String>,
    },

    If {
        cond: Expr,
    },
    Elif {
        cond: Expr,
    },
    Else,
    While {
        cond: Expr,
    },
    Try,
    Except {
        name: String,
    },
    Finally,
    FunctionDef {
        name: String,
        params: Vec<String>,
    },
    GeneratorDef {
        name: String,
        params: Vec<String>,
    },
    ClassDef {
        name: String,
        bases: Vec<String>,
    },
    With {
        resource: Expr,
        name: String,
    },
    ForEach {
        name: String,
        iter: Expr,
    },
    Repeat {
        count: Expr,
        index_name: Option<String>,
    },

    SayFormatted {
        value: Expr,
    },
    Say {
        args: Vec<Expr>,
    },
    Ask {
        name: String,
    },
    AskPrompt {
        prompt: Expr,
        name: Option<String>,
    },

    Return(Option<Expr>),
    Yield(Option<Expr>),
    Raise(Option<Expr>),

    Import(String),
    FromImport(String),
    Global(Vec<String>),

    OpenFile {
        path: Expr,
        name: String,
    },
    Write {
        handle: String,
        content: Expr,
    },
    Append {
        handle: String,
        content: Expr,
    },
    Close {
        handle: String,
    },

    Break,
    Continue,
    Pass,
}

/// One emitted statement at the block depth it was synthesized at.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitted {
    pub indent: usize,
    pub stmt: Stmt,
}
