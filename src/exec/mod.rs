//! The sandboxed executor: a tree-walking evaluator over the
//! [`tree::Node`] block tree, with a restricted built-in table
//! ([`builtins`]), a restricted import hook ([`import_hook`]), an injected
//! helpers table ([`helpers`]), a deterministic input tape, and a captured
//! output buffer.

pub mod builtins;
pub mod env;
pub mod eval;
pub mod helpers;
pub mod import_hook;
pub mod tree;
pub mod value;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{InputExhausted, RuntimeError};
use crate::translate::Stmt;

pub use env::Env;
pub use tree::Node;
pub use value::Value;

use std::rc::Rc;
use value::{display_value, is_truthy, ClassDef, FunctionDef};

static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?(\d+\.\d*|\d*\.\d+)$").unwrap());

/// What a block just executed asks its caller to do next: keep going, unwind
/// a loop, or unwind a function call with a value.
#[derive(Debug, Clone)]
pub enum Signal {
    None,
    Break,
    Continue,
    Return(Value),
}

/// Owns everything a single `run`/`analyze` call needs and nothing that
/// outlives it: the input tape and its cursor, the output buffer, and the
/// in-flight `yield` collector for whichever generator call is currently
/// unwinding its body. File handles opened by user code are owned through
/// `Value::File`'s `Rc<RefCell<FileHandle>>` and close on every exit path
/// via `std::fs::File`'s own `Drop`, so no separate bookkeeping is needed
/// to guarantee closure.
pub struct Interpreter {
    output: String,
    inputs: Vec<String>,
    input_index: usize,
    current_yields: Option<Vec<Value>>,
}

impl Interpreter {
    pub fn new(inputs: Vec<String>) -> Self {
        Interpreter {
            output: String::new(),
            inputs,
            input_index: 0,
            current_yields: None,
        }
    }

    pub fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub fn into_output(self) -> String {
        self.output
    }

    /// Pulls the next value off the input tape, auto-coercing numeric-looking
    /// raw strings.
    fn next_input(&mut self) -> Result<Value, RuntimeError> {
        if self.input_index >= self.inputs.len() {
            return Err(RuntimeError::InputExhausted(InputExhausted::default()));
        }
        let raw = self.inputs[self.input_index].clone();
        self.input_index += 1;
        if INT_RE.is_match(&raw) {
            if let Ok(i) = raw.parse::<i64>() {
                return Ok(Value::Int(i));
            }
        }
        if FLOAT_RE.is_match(&raw) {
            if let Ok(f) = raw.parse::<f64>() {
                return Ok(Value::Float(f));
            }
        }
        Ok(Value::Str(Rc::new(raw)))
    }

    /// Runs a block, stopping and returning early the moment any statement
    /// yields a non-[`Signal::None`] (a `break`/`continue`/`return`).
    pub fn exec_nodes(&mut self, nodes: &[Node], env: &Env) -> Result<Signal, RuntimeError> {
        for node in nodes {
            match self.exec_node(node, env)? {
                Signal::None => continue,
                other => return Ok(other),
            }
        }
        Ok(Signal::None)
    }

    fn exec_node(&mut self, node: &Node, env: &Env) -> Result<Signal, RuntimeError> {
        match node {
            Node::Stmt(stmt) => self.exec_stmt(stmt, env),

            Node::If { branches, orelse } => {
                for (cond, body) in branches {
                    if is_truthy(&self.eval_expr(cond, env)?) {
                        return self.exec_nodes(body, env);
                    }
                }
                self.exec_nodes(orelse, env)
            }

            Node::While { cond, body } => {
                while is_truthy(&self.eval_expr(cond, env)?) {
                    match self.exec_nodes(body, env)? {
                        Signal::Break => break,
                        Signal::Continue | Signal::None => {}
                        ret @ Signal::Return(_) => return Ok(ret),
                    }
                }
                Ok(Signal::None)
            }

            Node::Try { body, except, finally } => {
                let outcome = match self.exec_nodes(body, env) {
                    Ok(sig) => Ok(sig),
                    Err(err) => match except {
                        Some((name, handler)) => {
                            env.assign(name, Value::Exception(Rc::new(err.to_string())));
                            self.exec_nodes(handler, env)
                        }
                        None => Err(err),
                    },
                };
                let finally_sig = self.exec_nodes(finally, env)?;
                if !matches!(finally_sig, Signal::None) {
                    return Ok(finally_sig);
                }
                outcome
            }

            Node::FunctionDef { name, params, body, is_generator } => {
                let def = Rc::new(FunctionDef {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    closure: env.clone(),
                    is_generator: *is_generator,
                });
                env.assign(name, Value::Function(def));
                Ok(Signal::None)
            }

            Node::ClassDef { name, bases, body } => {
                let mut methods: Vec<(String, Rc<FunctionDef>)> = Vec::new();
                for base_name in bases {
                    if let Some(Value::Class(base_class)) = env.get(base_name) {
                        methods.extend(base_class.methods.iter().cloned());
                    }
                }
                for member in body {
                    if let Node::FunctionDef { name: mname, params, body, is_generator } = member {
                        methods.retain(|(n, _)| n != mname);
                        methods.push((
                            mname.clone(),
                            Rc::new(FunctionDef {
                                name: mname.clone(),
                                params: params.clone(),
                                body: body.clone(),
                                closure: env.clone(),
                                is_generator: *is_generator,
                            }),
                        ));
                    }
                }
                env.assign(name, Value::Class(Rc::new(ClassDef { name: name.clone(), methods })));
                Ok(Signal::None)
            }

            Node::With { resource, name, body } => {
                let resource_val = self.eval_expr(resource, env)?;
                env.assign(name, resource_val.clone());
                let result = self.exec_nodes(body, env);
                if matches!(resource_val, Value::File(_)) {
                    let _ = helpers::close_handle(&resource_val);
                }
                result
            }

            Node::ForEach { name, iter, body } => {
                let iter_val = self.eval_expr(iter, env)?;
                let items = builtins::as_iterable(&iter_val)?;
                for item in items {
                    env.assign(name, item);
                    match self.exec_nodes(body, env)? {
                        Signal::Break => break,
                        Signal::Continue | Signal::None => {}
                        ret @ Signal::Return(_) => return Ok(ret),
                    }
                }
                Ok(Signal::None)
            }

            Node::Repeat { count, index_name, body } => {
                let n = as_count(&self.eval_expr(count, env)?)?;
                for i in 0..n {
                    if let Some(name) = index_name {
                        env.assign(name, Value::Int(i));
                    }
                    match self.exec_nodes(body, env)? {
                        Signal::Break => break,
                        Signal::Continue | Signal::None => {}
                        ret @ Signal::Return(_) => return Ok(ret),
                    }
                }
                Ok(Signal::None)
            }
        }
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Env) -> Result<Signal, RuntimeError> {
        match stmt {
            Stmt::Expr(e) => {
                self.eval_expr(e, env)?;
                Ok(Signal::None)
            }
            Stmt::Assign { name, value } => {
                let v = self.eval_expr(value, env)?;
                env.assign(name, v);
                Ok(Signal::None)
            }
            Stmt::SubscriptAssign { target, index, value } => {
                let base = self.eval_expr(target, env)?;
                let idx = self.eval_expr(index, env)?;
                let val = self.eval_expr(value, env)?;
                eval::subscript_set(&base, &idx, val)?;
                Ok(Signal::None)
            }
            Stmt::Unpack { value, targets } => {
                let v = self.eval_expr(value, env)?;
                if targets.len() == 1 {
                    env.assign(&targets[0], v);
                } else {
                    let items = builtins::as_iterable(&v)?;
                    if items.len() != targets.len() {
                        return Err(RuntimeError::other(format!(
                            "not enough values to unpack (expected {}, got {})",
                            targets.len(),
                            items.len()
                        )));
                    }
                    for (name, item) in targets.iter().zip(items) {
                        env.assign(name, item);
                    }
                }
                Ok(Signal::None)
            }

            Stmt::SayFormatted { value } => {
                let v = self.eval_expr(value, env)?;
                self.write_output(&display_value(&v));
                self.write_output("\n");
                Ok(Signal::None)
            }
            Stmt::Say { args } => {
                let mut rendered = Vec::with_capacity(args.len());
                for a in args {
                    rendered.push(display_value(&self.eval_expr(a, env)?));
                }
                self.write_output(&rendered.join(" "));
                self.write_output("\n");
                Ok(Signal::None)
            }
            Stmt::Ask { name } => {
                let v = self.next_input()?;
                env.assign(name, v.clone());
                env.assign("result", v);
                Ok(Signal::None)
            }
            Stmt::AskPrompt { prompt, name } => {
                let prompt_val = self.eval_expr(prompt, env)?;
                self.write_output(&display_value(&prompt_val));
                let v = self.next_input()?;
                if let Some(n) = name {
                    env.assign(n, v.clone());
                }
                env.assign("result", v);
                Ok(Signal::None)
            }

            Stmt::Return(opt) => {
                let v = match opt {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::None,
                };
                Ok(Signal::Return(v))
            }
            Stmt::Yield(opt) => {
                let v = match opt {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::None,
                };
                if let Some(buf) = &mut self.current_yields {
                    buf.push(v);
                }
                Ok(Signal::None)
            }
            Stmt::Raise(opt) => {
                let msg = match opt {
                    Some(e) => display_value(&self.eval_expr(e, env)?),
                    None => "Exception".to_owned(),
                };
                Err(RuntimeError::other(msg))
            }

            Stmt::Import(line) => {
                self.exec_import(line, env)?;
                Ok(Signal::None)
            }
            Stmt::FromImport(line) => {
                self.exec_from_import(line, env)?;
                Ok(Signal::None)
            }
            Stmt::Global(names) => {
                for name in names {
                    env.declare_global(name);
                }
                Ok(Signal::None)
            }

            Stmt::OpenFile { path, name } => {
                let path_val = self.eval_expr(path, env)?;
                let file_val = helpers::open_file(self, vec![path_val])?;
                env.assign(name, file_val);
                Ok(Signal::None)
            }
            Stmt::Write { handle, content } | Stmt::Append { handle, content } => {
                let h = env
                    .get(handle)
                    .ok_or_else(|| RuntimeError::UnknownVariable(handle.clone()))?;
                let c = self.eval_expr(content, env)?;
                helpers::write_handle(&h, &display_value(&c))?;
                Ok(Signal::None)
            }
            Stmt::Close { handle } => {
                let h = env
                    .get(handle)
                    .ok_or_else(|| RuntimeError::UnknownVariable(handle.clone()))?;
                helpers::close_handle(&h)?;
                Ok(Signal::None)
            }

            Stmt::Break => Ok(Signal::Break),
            Stmt::Continue => Ok(Signal::Continue),
            Stmt::Pass => Ok(Signal::None),
        }
    }

    fn exec_import(&mut self, line: &str, env: &Env) -> Result<(), RuntimeError> {
        let body = line.get(6..).unwrap_or("").trim();
        for part in body.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (module_path, alias) = split_as(part);
            let value = import_hook::import_module(&module_path)?;
            let bind_name = alias.unwrap_or_else(|| import_hook::top_segment(&module_path).to_owned());
            env.assign(&bind_name, value);
        }
        Ok(())
    }

    fn exec_from_import(&mut self, line: &str, env: &Env) -> Result<(), RuntimeError> {
        let rest = line.get(4..).unwrap_or("").trim();
        let idx = find_ci(rest, " import ")
            .ok_or_else(|| RuntimeError::other(format!("could not understand: {line}")))?;
        let module_path = rest[..idx].trim();
        let names_part = rest[idx + " import ".len()..].trim();
        let module_val = import_hook::import_module(module_path)?;
        for name_spec in names_part.split(',') {
            let name_spec = name_spec.trim();
            if name_spec.is_empty() {
                continue;
            }
            let (attr, alias) = split_as(name_spec);
            let value = self.eval_attribute(&module_val, &attr)?;
            env.assign(&alias.unwrap_or(attr), value);
        }
        Ok(())
    }

    /// Renders a value the same way `print` does, used to build the
    /// `translated` field and by `say`/`say formatted`.
    pub fn display(value: &Value) -> String {
        display_value(value)
    }
}

fn split_as(s: &str) -> (String, Option<String>) {
    match find_ci(s, " as ") {
        Some(idx) => (s[..idx].trim().to_owned(), Some(s[idx + 4..].trim().to_owned())),
        None => (s.trim().to_owned(), None),
    }
}

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

fn as_count(v: &Value) -> Result<i64, RuntimeError> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::Float(f) => Ok(*f as i64),
        Value::Bool(b) => Ok(*b as i64),
        other => Err(RuntimeError::other(format!(
            "'{}' object cannot be interpreted as an integer",
            value::type_name(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::translate;

    fn run_program(code: &str, inputs: Vec<String>) -> (String, Option<Value>) {
        let prog = translate(code).unwrap();
        let tree = tree::build(&prog);
        let env = Env::root();
        builtins::install(&env);
        let mut interp = Interpreter::new(inputs);
        let sig = interp.exec_nodes(&tree, &env).unwrap();
        let ret = match sig {
            Signal::Return(v) => Some(v),
            _ => None,
        };
        (interp.into_output(), ret)
    }

    #[test]
    fn hello_world() {
        let (out, _) = run_program("say \"hello\"\n", vec![]);
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn arithmetic_and_assignment() {
        let (out, _) = run_program("x is 5\ny is 7\nsay x + y\n", vec![]);
        assert_eq!(out, "12\n");
    }

    #[test]
    fn input_echo_with_coercion() {
        let (out, _) = run_program("ask n\nsay n + 1\n", vec!["4".to_owned()]);
        assert_eq!(out, "5\n");
    }

    #[test]
    fn if_else_branch() {
        let (out, _) = run_program(
            "x is 10\nif x > 5\nsay \"big\"\nelse\nsay \"small\"\nend\n",
            vec![],
        );
        assert_eq!(out, "big\n");
    }

    #[test]
    fn repeat_loop() {
        let (out, _) = run_program("repeat 3\nsay \"hi\"\nend\n", vec![]);
        assert_eq!(out, "hi\nhi\nhi\n");
    }

    #[test]
    fn function_definition_and_call() {
        let (out, _) = run_program(
            "function add a b\nreturn a + b\nend\nsay add 2 3\n",
            vec![],
        );
        assert_eq!(out, "5\n");
    }

    #[test]
    fn input_exhaustion_raises() {
        let prog = translate("ask a\nask b\n").unwrap();
        let tree = tree::build(&prog);
        let env = Env::root();
        builtins::install(&env);
        let mut interp = Interpreter::new(vec!["1".to_owned()]);
        let err = interp.exec_nodes(&tree, &env).unwrap_err();
        assert!(err.to_string().contains("No more inputs"));
    }

    #[test]
    fn unknown_variable_reports_name() {
        let prog = translate("say missing\n").unwrap();
        let tree = tree::build(&prog);
        let env = Env::root();
        builtins::install(&env);
        let mut interp = Interpreter::new(vec![]);
        let err = interp.exec_nodes(&tree, &env).unwrap_err();
        assert_eq!(err.to_string(), "Unknown variable: missing");
    }

    #[test]
    fn recursive_function_works_via_shared_closure() {
        let (out, _) = run_program(
            "function fact n\nif n < 2\nreturn 1\nend\nreturn n * fact n - 1\nend\nsay fact 5\n",
            vec![],
        );
        assert_eq!(out, "120\n");
    }

    #[test]
    fn try_catch_binds_error_value() {
        let (out, _) = run_program(
            "try\nraise \"boom\"\ncatch err\nsay err\nend\n",
            vec![],
        );
        assert_eq!(out, "boom\n");
    }

    #[test]
    fn class_definition_and_method_call() {
        let (out, _) = run_program(
            "class Counter\nfunction init self start\nself.n is start\nend\nfunction bump self\nself.n is self.n + 1\nreturn self.n\nend\nend\nc is Counter 1\nsay c.bump()\n",
            vec![],
        );
        assert_eq!(out, "2\n");
    }
}
