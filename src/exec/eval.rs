//! Expression evaluation over the validated [`crate::expr::Expr`] tree.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::exec::env::Env;
use crate::exec::value::{display_value, is_truthy, type_name, value_eq, LambdaDef, Value};
use crate::exec::Interpreter;
use crate::expr::{BinOp, BoolOp, CompareOp, Comprehension, Expr, FStringPart, SubscriptIndex, UnaryOp};

impl Interpreter {
    pub fn eval_expr(&mut self, expr: &Expr, env: &Env) -> Result<Value, RuntimeError> {
        match expr {
            Expr::None => Ok(Value::None),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(Rc::new(s.clone()))),
            Expr::FString(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        FStringPart::Lit(s) => out.push_str(s),
                        FStringPart::Expr(e) => out.push_str(&display_value(&self.eval_expr(e, env)?)),
                    }
                }
                Ok(Value::Str(Rc::new(out)))
            }
            Expr::Name(name) => env
                .get(name)
                .ok_or_else(|| RuntimeError::UnknownVariable(name.clone())),
            Expr::UnaryOp { op, operand } => {
                let v = self.eval_expr(operand, env)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!is_truthy(&v))),
                    UnaryOp::Neg => negate(&v),
                    UnaryOp::Pos => match v {
                        Value::Int(_) | Value::Float(_) => Ok(v),
                        other => Err(type_err("unary +", &other)),
                    },
                }
            }
            Expr::BinOp { op, left, right } => {
                let l = self.eval_expr(left, env)?;
                let r = self.eval_expr(right, env)?;
                binop(*op, &l, &r)
            }
            Expr::BoolOp { op, values } => {
                match op {
                    BoolOp::And => {
                        let mut last = Value::Bool(true);
                        for v in values {
                            last = self.eval_expr(v, env)?;
                            if !is_truthy(&last) {
                                return Ok(last);
                            }
                        }
                        Ok(last)
                    }
                    BoolOp::Or => {
                        let mut last = Value::Bool(false);
                        for v in values {
                            last = self.eval_expr(v, env)?;
                            if is_truthy(&last) {
                                return Ok(last);
                            }
                        }
                        Ok(last)
                    }
                }
            }
            Expr::Compare { left, ops } => {
                let mut prev = self.eval_expr(left, env)?;
                for (op, rhs) in ops {
                    let r = self.eval_expr(rhs, env)?;
                    if !is_truthy(&compare(*op, &prev, &r)?) {
                        return Ok(Value::Bool(false));
                    }
                    prev = r;
                }
                Ok(Value::Bool(true))
            }
            Expr::Call { func, args } => {
                let mut values = Vec::with_capacity(args.len());
                for a in args {
                    values.push(self.eval_expr(a, env)?);
                }
                if let Expr::Attribute { value, attr } = func.as_ref() {
                    let base = self.eval_expr(value, env)?;
                    if matches!(base, Value::Object(_) | Value::Class(_)) {
                        let callee = self.eval_attribute(&base, attr)?;
                        self.call_value(callee, values)
                    } else {
                        self.call_native_method(base, attr, values)
                    }
                } else {
                    let callee = self.eval_expr(func, env)?;
                    self.call_value(callee, values)
                }
            }
            Expr::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for i in items {
                    out.push(self.eval_expr(i, env)?);
                }
                Ok(Value::List(Rc::new(RefCell::new(out))))
            }
            Expr::Tuple(items) => {
                let mut out = Vec::with_capacity(items.len());
                for i in items {
                    out.push(self.eval_expr(i, env)?);
                }
                Ok(Value::Tuple(Rc::new(out)))
            }
            Expr::Set(items) => {
                let mut out: Vec<Value> = Vec::new();
                for i in items {
                    let v = self.eval_expr(i, env)?;
                    if !out.iter().any(|e| value_eq(e, &v)) {
                        out.push(v);
                    }
                }
                Ok(Value::Set(Rc::new(RefCell::new(out))))
            }
            Expr::Dict(pairs) => {
                let mut out = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    out.push((self.eval_expr(k, env)?, self.eval_expr(v, env)?));
                }
                Ok(Value::Dict(Rc::new(RefCell::new(out))))
            }
            Expr::ListComp { elt, generators } => {
                let mut out = Vec::new();
                self.run_comprehension(generators, env, &mut |this, scope| {
                    out.push(this.eval_expr(elt, scope)?);
                    Ok(())
                })?;
                Ok(Value::List(Rc::new(RefCell::new(out))))
            }
            Expr::SetComp { elt, generators } => {
                let mut out: Vec<Value> = Vec::new();
                self.run_comprehension(generators, env, &mut |this, scope| {
                    let v = this.eval_expr(elt, scope)?;
                    if !out.iter().any(|e| value_eq(e, &v)) {
                        out.push(v);
                    }
                    Ok(())
                })?;
                Ok(Value::Set(Rc::new(RefCell::new(out))))
            }
            Expr::DictComp { key, value, generators } => {
                let mut out = Vec::new();
                self.run_comprehension(generators, env, &mut |this, scope| {
                    let k = this.eval_expr(key, scope)?;
                    let v = this.eval_expr(value, scope)?;
                    out.push((k, v));
                    Ok(())
                })?;
                Ok(Value::Dict(Rc::new(RefCell::new(out))))
            }
            Expr::GeneratorExp { elt, generators } => {
                let mut out = Vec::new();
                self.run_comprehension(generators, env, &mut |this, scope| {
                    out.push(this.eval_expr(elt, scope)?);
                    Ok(())
                })?;
                Ok(Value::List(Rc::new(RefCell::new(out))))
            }
            Expr::IfExp { cond, body, orelse } => {
                if is_truthy(&self.eval_expr(cond, env)?) {
                    self.eval_expr(body, env)
                } else {
                    self.eval_expr(orelse, env)
                }
            }
            Expr::Subscript { value, index } => {
                let base = self.eval_expr(value, env)?;
                self.eval_subscript(&base, index, env)
            }
            Expr::Attribute { value, attr } => {
                let base = self.eval_expr(value, env)?;
                self.eval_attribute(&base, attr)
            }
            Expr::Lambda { params, body } => Ok(Value::Lambda(Rc::new(LambdaDef {
                params: params.clone(),
                body: (**body).clone(),
                closure: env.clone(),
            }))),
        }
    }

    fn run_comprehension(
        &mut self,
        generators: &[Comprehension],
        env: &Env,
        emit: &mut dyn FnMut(&mut Interpreter, &Env) -> Result<(), RuntimeError>,
    ) -> Result<(), RuntimeError> {
        self.run_comprehension_level(generators, 0, env, emit)
    }

    fn run_comprehension_level(
        &mut self,
        generators: &[Comprehension],
        level: usize,
        env: &Env,
        emit: &mut dyn FnMut(&mut Interpreter, &Env) -> Result<(), RuntimeError>,
    ) -> Result<(), RuntimeError> {
        if level == generators.len() {
            return emit(self, env);
        }
        let gen = &generators[level];
        let iter_val = self.eval_expr(&gen.iter, env)?;
        let items = super::builtins::as_iterable(&iter_val)?;
        let scope = Env::child(env);
        for item in items {
            bind_targets(&gen.targets, item, &scope)?;
            let mut keep = true;
            for cond in &gen.ifs {
                if !is_truthy(&self.eval_expr(cond, &scope)?) {
                    keep = false;
                    break;
                }
            }
            if keep {
                self.run_comprehension_level(generators, level + 1, &scope, emit)?;
            }
        }
        Ok(())
    }

    fn eval_subscript(&mut self, base: &Value, index: &SubscriptIndex, env: &Env) -> Result<Value, RuntimeError> {
        match index {
            SubscriptIndex::Index(idx_expr) => {
                let idx = self.eval_expr(idx_expr, env)?;
                subscript_get(base, &idx)
            }
            SubscriptIndex::Slice { lower, upper, step } => {
                let l = match lower {
                    Some(e) => Some(as_index(&self.eval_expr(e, env)?)?),
                    None => None,
                };
                let u = match upper {
                    Some(e) => Some(as_index(&self.eval_expr(e, env)?)?),
                    None => None,
                };
                let s = match step {
                    Some(e) => as_index(&self.eval_expr(e, env)?)?,
                    None => 1,
                };
                slice_get(base, l, u, s)
            }
        }
    }

    pub(crate) fn eval_attribute(&mut self, base: &Value, attr: &str) -> Result<Value, RuntimeError> {
        match base {
            Value::Object(obj) => {
                if let Some(v) = obj.borrow().get(attr) {
                    return Ok(v);
                }
                if let Some(method) = obj.borrow().class.find_method(attr) {
                    return Ok(bind_method(method, base.clone()));
                }
                Err(RuntimeError::other(format!("'{}' object has no attribute '{attr}'", obj.borrow().class.name)))
            }
            Value::Class(class) => class
                .find_method(attr)
                .map(Value::Function)
                .ok_or_else(|| RuntimeError::other(format!("type object '{}' has no attribute '{attr}'", class.name))),
            other => Err(RuntimeError::other(format!("'{}' object has no attribute '{attr}'", type_name(other)))),
        }
    }

    /// Dispatches `.method(...)` calls on built-in containers/strings/files —
    /// every collection verb the translator emits via `method_call`, plus
    /// `rewrite::rewrite`'s string helpers. User classes never reach here:
    /// `Expr::Call` routes `Object`/`Class` receivers through
    /// `eval_attribute` instead.
    fn call_native_method(&mut self, base: Value, attr: &str, mut args: Vec<Value>) -> Result<Value, RuntimeError> {
        match (&base, attr) {
            (Value::Str(s), "upper") => Ok(Value::Str(Rc::new(s.to_uppercase()))),
            (Value::Str(s), "lower") => Ok(Value::Str(Rc::new(s.to_lowercase()))),
            (Value::Str(s), "title") => Ok(Value::Str(Rc::new(title_case(s)))),
            (Value::Str(s), "strip") => Ok(Value::Str(Rc::new(s.trim().to_owned()))),
            (Value::Str(s), "isalpha") => Ok(Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_alphabetic()))),
            (Value::Str(s), "isdigit") => Ok(Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))),
            (Value::Str(s), "isalnum") => Ok(Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_alphanumeric()))),
            (Value::Str(s), "replace") => {
                let old = one_str_arg(&mut args)?;
                let new = one_str_arg(&mut args)?;
                Ok(Value::Str(Rc::new(s.replace(&*old, &*new))))
            }
            (Value::Str(s), "split") => {
                let sep = one_str_arg(&mut args)?;
                let parts: Vec<Value> = if sep.is_empty() {
                    s.split_whitespace().map(|p| Value::Str(Rc::new(p.to_owned()))).collect()
                } else {
                    s.split(&*sep).map(|p| Value::Str(Rc::new(p.to_owned()))).collect()
                };
                Ok(Value::List(Rc::new(RefCell::new(parts))))
            }
            (Value::Str(glue), "join") => {
                let items = super::builtins::as_iterable(&one_val(&mut args)?)?;
                let strs: Vec<String> = items.iter().map(display_value).collect();
                Ok(Value::Str(Rc::new(strs.join(glue))))
            }
            (Value::Str(s), "find") => {
                let sub = one_str_arg(&mut args)?;
                match s.find(&*sub) {
                    Some(byte_idx) => Ok(Value::Int(s[..byte_idx].chars().count() as i64)),
                    None => Ok(Value::Int(-1)),
                }
            }
            (Value::Str(s), "count") => {
                let sub = one_str_arg(&mut args)?;
                if sub.is_empty() {
                    Ok(Value::Int(0))
                } else {
                    Ok(Value::Int(s.matches(&*sub).count() as i64))
                }
            }
            (Value::Str(s), "startswith") => Ok(Value::Bool(s.starts_with(&*one_str_arg(&mut args)?))),
            (Value::Str(s), "endswith") => Ok(Value::Bool(s.ends_with(&*one_str_arg(&mut args)?))),

            (Value::List(l), "extend") => {
                let items = super::builtins::as_iterable(&one_val(&mut args)?)?;
                l.borrow_mut().extend(items);
                Ok(Value::None)
            }
            (Value::List(l), "insert") => {
                if args.len() != 2 {
                    return Err(RuntimeError::other("insert expected 2 arguments"));
                }
                let value = args.remove(1);
                let idx = as_index(&args.remove(0))?;
                let mut b = l.borrow_mut();
                let len = b.len() as i64;
                let at = if idx < 0 { (idx + len).max(0) } else { idx.min(len) } as usize;
                b.insert(at, value);
                Ok(Value::None)
            }
            (Value::List(l), "remove") => {
                let target = one_val(&mut args)?;
                let mut b = l.borrow_mut();
                let pos = b
                    .iter()
                    .position(|v| value_eq(v, &target))
                    .ok_or_else(|| RuntimeError::other("list.remove(x): x not in list"))?;
                b.remove(pos);
                Ok(Value::None)
            }
            (Value::List(l), "clear") => {
                l.borrow_mut().clear();
                Ok(Value::None)
            }
            (Value::List(l), "sort") => {
                let items = l.borrow().clone();
                let sorted = match super::builtins::sort_values(self, items, false)? {
                    Value::List(v) => v.borrow().clone(),
                    _ => unreachable!(),
                };
                *l.borrow_mut() = sorted;
                Ok(Value::None)
            }
            (Value::List(l), "reverse") => {
                l.borrow_mut().reverse();
                Ok(Value::None)
            }
            (Value::List(l), "copy") => Ok(Value::List(Rc::new(RefCell::new(l.borrow().clone())))),
            (Value::List(l), "pop") => {
                let mut b = l.borrow_mut();
                if b.is_empty() {
                    return Err(RuntimeError::other("pop from empty list"));
                }
                let idx = if args.is_empty() {
                    b.len() - 1
                } else {
                    normalize_index(as_index(&args.remove(0))?, b.len())
                        .ok_or_else(|| RuntimeError::other("pop index out of range"))?
                };
                Ok(b.remove(idx))
            }

            (Value::Dict(d), "get") => {
                if args.is_empty() || args.len() > 2 {
                    return Err(RuntimeError::other("get expected 1 or 2 arguments"));
                }
                let default = if args.len() == 2 { args.remove(1) } else { Value::None };
                let key = args.remove(0);
                Ok(d.borrow().iter().find(|(k, _)| value_eq(k, &key)).map(|(_, v)| v.clone()).unwrap_or(default))
            }
            (Value::Dict(d), "keys") => {
                Ok(Value::List(Rc::new(RefCell::new(d.borrow().iter().map(|(k, _)| k.clone()).collect()))))
            }
            (Value::Dict(d), "values") => {
                Ok(Value::List(Rc::new(RefCell::new(d.borrow().iter().map(|(_, v)| v.clone()).collect()))))
            }
            (Value::Dict(d), "items") => Ok(Value::List(Rc::new(RefCell::new(
                d.borrow()
                    .iter()
                    .map(|(k, v)| Value::Tuple(Rc::new(vec![k.clone(), v.clone()])))
                    .collect(),
            )))),
            (Value::Dict(d), "pop") => {
                let key = one_val(&mut args)?;
                let mut b = d.borrow_mut();
                let pos = b
                    .iter()
                    .position(|(k, _)| value_eq(k, &key))
                    .ok_or_else(|| RuntimeError::other(display_value(&key)))?;
                Ok(b.remove(pos).1)
            }
            (Value::Dict(d), "clear") => {
                d.borrow_mut().clear();
                Ok(Value::None)
            }
            (Value::Dict(d), "copy") => Ok(Value::Dict(Rc::new(RefCell::new(d.borrow().clone())))),

            (Value::Set(s), "remove") => {
                let target = one_val(&mut args)?;
                let mut b = s.borrow_mut();
                let pos = b
                    .iter()
                    .position(|v| value_eq(v, &target))
                    .ok_or_else(|| RuntimeError::other(display_value(&target)))?;
                b.remove(pos);
                Ok(Value::None)
            }
            (Value::Set(s), "clear") => {
                s.borrow_mut().clear();
                Ok(Value::None)
            }
            (Value::Set(s), "copy") => Ok(Value::Set(Rc::new(RefCell::new(s.borrow().clone())))),
            (Value::Set(s), "issubset") => {
                let other = super::builtins::as_iterable(&one_val(&mut args)?)?;
                Ok(Value::Bool(s.borrow().iter().all(|v| other.iter().any(|w| value_eq(v, w)))))
            }

            (Value::File(_), "read") => Ok(Value::Str(Rc::new(super::helpers::read_handle(&base)?))),

            (other, attr) => Err(RuntimeError::other(format!("'{}' object has no attribute '{attr}'", type_name(other)))),
        }
    }

    /// Calls any callable value (function, lambda, builtin, class constructor,
    /// or bound method) with already-evaluated `args`.
    pub fn call_value(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::BuiltinFn(f) => (f.func)(self, args),
            Value::Function(f) => self.call_function(&f, args, None),
            Value::Lambda(l) => {
                let scope = Env::child(&l.closure);
                bind_params(&l.params, args, &scope)?;
                self.eval_expr(&l.body, &scope)
            }
            Value::Class(class) => {
                let obj = Rc::new(RefCell::new(crate::exec::value::ObjectData {
                    class: class.clone(),
                    fields: Vec::new(),
                }));
                let instance = Value::Object(obj);
                if let Some(init) = class.find_method("init") {
                    self.call_function(&init, args, Some(instance.clone()))?;
                }
                Ok(instance)
            }
            Value::Tuple(bound) if bound.len() == 2 => {
                // A bound method, represented as (receiver, function).
                if let (obj, Value::Function(f)) = (bound[0].clone(), bound[1].clone()) {
                    self.call_function(&f, args, Some(obj))
                } else {
                    Err(RuntimeError::other("object is not callable"))
                }
            }
            other => Err(RuntimeError::other(format!("'{}' object is not callable", type_name(&other)))),
        }
    }

    fn call_function(
        &mut self,
        f: &Rc<crate::exec::value::FunctionDef>,
        args: Vec<Value>,
        bound_self: Option<Value>,
    ) -> Result<Value, RuntimeError> {
        let scope = Env::child(&f.closure);
        let params = if let Some(recv) = &bound_self {
            scope.define(&f.params[0], recv.clone());
            &f.params[1..]
        } else {
            &f.params[..]
        };
        bind_params(params, args, &scope)?;

        if f.is_generator {
            let saved = self.current_yields.take();
            self.current_yields = Some(Vec::new());
            let result = self.exec_nodes(&f.body, &scope);
            let collected = self.current_yields.take().unwrap_or_default();
            self.current_yields = saved;
            result?;
            return Ok(Value::List(Rc::new(RefCell::new(collected))));
        }

        match self.exec_nodes(&f.body, &scope)? {
            crate::exec::Signal::Return(v) => Ok(v),
            _ => Ok(Value::None),
        }
    }

    /// Renders a `say formatted` value that was not already a literal
    /// f-string template at translate time (e.g. a plain variable): printed
    /// as-is, with no further interpolation attempted.
    pub fn format_value(&mut self, expr: &Expr, env: &Env) -> Result<String, RuntimeError> {
        Ok(display_value(&self.eval_expr(expr, env)?))
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut start_of_word = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if start_of_word {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            start_of_word = false;
        } else {
            out.push(c);
            start_of_word = true;
        }
    }
    out
}

fn one_str_arg(args: &mut Vec<Value>) -> Result<Rc<String>, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::other("expected a string argument"));
    }
    match args.remove(0) {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::other(format!("expected str, got '{}'", type_name(&other)))),
    }
}

fn one_val(args: &mut Vec<Value>) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::other("expected exactly one argument"));
    }
    Ok(args.remove(0))
}

fn bind_method(method: Rc<crate::exec::value::FunctionDef>, receiver: Value) -> Value {
    Value::Tuple(Rc::new(vec![receiver, Value::Function(method)]))
}

pub fn bind_targets(targets: &[String], value: Value, scope: &Env) -> Result<(), RuntimeError> {
    if targets.len() == 1 {
        scope.define(&targets[0], value);
        return Ok(());
    }
    let items = super::builtins::as_iterable(&value)?;
    if items.len() != targets.len() {
        return Err(RuntimeError::other(format!(
            "not enough values to unpack (expected {}, got {})",
            targets.len(),
            items.len()
        )));
    }
    for (name, v) in targets.iter().zip(items) {
        scope.define(name, v);
    }
    Ok(())
}

fn bind_params(params: &[String], mut args: Vec<Value>, scope: &Env) -> Result<(), RuntimeError> {
    if args.len() > params.len() {
        args.truncate(params.len());
    }
    for (i, p) in params.iter().enumerate() {
        scope.define(p, args.get(i).cloned().unwrap_or(Value::None));
    }
    Ok(())
}

fn negate(v: &Value) -> Result<Value, RuntimeError> {
    match v {
        Value::Int(i) => Ok(Value::Int(-i)),
        Value::Float(f) => Ok(Value::Float(-f)),
        Value::Bool(b) => Ok(Value::Int(-(*b as i64))),
        other => Err(type_err("unary -", other)),
    }
}

fn type_err(op: &str, v: &Value) -> RuntimeError {
    RuntimeError::other(format!("bad operand type for {op}: '{}'", type_name(v)))
}

fn as_index(v: &Value) -> Result<i64, RuntimeError> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(*b as i64),
        other => Err(RuntimeError::other(format!("slice indices must be integers, not '{}'", type_name(other)))),
    }
}

fn normalize_index(idx: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if idx < 0 { idx + len } else { idx };
    if i < 0 || i >= len {
        None
    } else {
        Some(i as usize)
    }
}

pub fn subscript_get(base: &Value, idx: &Value) -> Result<Value, RuntimeError> {
    match base {
        Value::List(l) => {
            let i = as_index(idx)?;
            let b = l.borrow();
            normalize_index(i, b.len())
                .map(|i| b[i].clone())
                .ok_or_else(|| RuntimeError::other("list index out of range"))
        }
        Value::Tuple(t) => {
            let i = as_index(idx)?;
            normalize_index(i, t.len())
                .map(|i| t[i].clone())
                .ok_or_else(|| RuntimeError::other("tuple index out of range"))
        }
        Value::Str(s) => {
            let i = as_index(idx)?;
            let chars: Vec<char> = s.chars().collect();
            normalize_index(i, chars.len())
                .map(|i| Value::Str(Rc::new(chars[i].to_string())))
                .ok_or_else(|| RuntimeError::other("string index out of range"))
        }
        Value::Dict(d) => d
            .borrow()
            .iter()
            .find(|(k, _)| value_eq(k, idx))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| RuntimeError::other(format!("{}", display_value(idx)))),
        Value::Object(obj) => {
            let attr = one_str_arg(&mut vec![idx.clone()])?;
            obj.borrow()
                .get(&attr)
                .ok_or_else(|| RuntimeError::other(format!("'{}' object has no attribute '{attr}'", obj.borrow().class.name)))
        }
        other => Err(RuntimeError::other(format!("'{}' object is not subscriptable", type_name(other)))),
    }
}

/// Backs the `set <dict> <key> to <value>` verb and plain `X[i] = v`
/// subscript assignment. Lists index in place; dicts upsert by key,
/// preserving insertion order for new keys.
pub fn subscript_set(base: &Value, idx: &Value, value: Value) -> Result<(), RuntimeError> {
    match base {
        Value::List(l) => {
            let i = as_index(idx)?;
            let mut b = l.borrow_mut();
            let len = b.len();
            let at = normalize_index(i, len).ok_or_else(|| RuntimeError::other("list assignment index out of range"))?;
            b[at] = value;
            Ok(())
        }
        Value::Dict(d) => {
            let mut b = d.borrow_mut();
            if let Some(entry) = b.iter_mut().find(|(k, _)| value_eq(k, idx)) {
                entry.1 = value;
            } else {
                b.push((idx.clone(), value));
            }
            Ok(())
        }
        Value::Object(obj) => {
            let attr = one_str_arg(&mut vec![idx.clone()])?;
            obj.borrow_mut().set(&attr, value);
            Ok(())
        }
        other => Err(RuntimeError::other(format!("'{}' object does not support item assignment", type_name(other)))),
    }
}

fn slice_get(base: &Value, lower: Option<i64>, upper: Option<i64>, step: i64) -> Result<Value, RuntimeError> {
    if step == 0 {
        return Err(RuntimeError::other("slice step cannot be zero"));
    }
    let items: Vec<Value> = match base {
        Value::List(l) => l.borrow().clone(),
        Value::Tuple(t) => (**t).clone(),
        Value::Str(s) => s.chars().map(|c| Value::Str(Rc::new(c.to_string()))).collect(),
        other => return Err(RuntimeError::other(format!("'{}' object is not subscriptable", type_name(other)))),
    };
    let len = items.len() as i64;
    let clamp = |v: i64| -> i64 { v.max(0).min(len) };
    let (mut start, mut stop) = if step > 0 {
        (lower.map(|v| if v < 0 { clamp(v + len) } else { clamp(v) }).unwrap_or(0),
         upper.map(|v| if v < 0 { clamp(v + len) } else { clamp(v) }).unwrap_or(len))
    } else {
        (lower.map(|v| if v < 0 { clamp(v + len) } else { clamp(v).min(len - 1) }).unwrap_or(len - 1),
         upper.map(|v| if v < 0 { clamp(v + len) } else { clamp(v) }).unwrap_or(-1))
    };
    if step > 0 {
        start = start.min(len);
        stop = stop.min(len);
    }
    let mut out = Vec::new();
    if step > 0 {
        let mut i = start;
        while i < stop {
            out.push(items[i as usize].clone());
            i += step;
        }
    } else {
        let mut i = start;
        while i > stop && i >= 0 && i < len {
            out.push(items[i as usize].clone());
            i += step;
        }
    }
    match base {
        Value::Str(_) => Ok(Value::Str(Rc::new(out.into_iter().map(|v| display_value(&v)).collect()))),
        Value::Tuple(_) => Ok(Value::Tuple(Rc::new(out))),
        _ => Ok(Value::List(Rc::new(RefCell::new(out)))),
    }
}

/// Mixed int/float/bool addition, used by `+`, `_add_to`, and `sum`. Also
/// covers string concatenation and list concatenation.
pub fn numeric_add(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    binop(BinOp::Add, a, b)
}

pub fn compare_gt(_interp: &mut Interpreter, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    compare(CompareOp::Gt, a, b)
}

fn as_num(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn both_int(a: &Value, b: &Value) -> Option<(i64, i64)> {
    let ai = match a {
        Value::Int(i) => Some(*i),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }?;
    let bi = match b {
        Value::Int(i) => Some(*i),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }?;
    Some((ai, bi))
}

fn binop(op: BinOp, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    use BinOp::*;
    if op == Add {
        if let (Value::Str(x), Value::Str(y)) = (a, b) {
            return Ok(Value::Str(Rc::new(format!("{x}{y}"))));
        }
        if let (Value::List(x), Value::List(y)) = (a, b) {
            let mut out = x.borrow().clone();
            out.extend(y.borrow().iter().cloned());
            return Ok(Value::List(Rc::new(RefCell::new(out))));
        }
    }
    if matches!(op, BitOr | BitAnd) {
        if let (Value::Set(x), Value::Set(y)) = (a, b) {
            let x = x.borrow();
            let y = y.borrow();
            let out: Vec<Value> = if op == BitOr {
                let mut merged = x.clone();
                for v in y.iter() {
                    if !merged.iter().any(|e| value_eq(e, v)) {
                        merged.push(v.clone());
                    }
                }
                merged
            } else {
                x.iter().filter(|v| y.iter().any(|w| value_eq(v, w))).cloned().collect()
            };
            return Ok(Value::Set(Rc::new(RefCell::new(out))));
        }
    }
    if op == Sub {
        if let (Value::Set(x), Value::Set(y)) = (a, b) {
            let x = x.borrow();
            let y = y.borrow();
            let out: Vec<Value> = x.iter().filter(|v| !y.iter().any(|w| value_eq(v, w))).cloned().collect();
            return Ok(Value::Set(Rc::new(RefCell::new(out))));
        }
    }

    if let Some((x, y)) = both_int(a, b) {
        return match op {
            Add => Ok(Value::Int(x + y)),
            Sub => Ok(Value::Int(x - y)),
            Mul => Ok(Value::Int(x * y)),
            Mod => checked(y, || Value::Int(x.rem_euclid(y))),
            FloorDiv => checked(y, || Value::Int(x.div_euclid(y))),
            Pow => Ok(if y >= 0 { Value::Int(x.pow(y as u32)) } else { Value::Float((x as f64).powi(y as i32)) }),
            Div => checked(y, || Value::Float(x as f64 / y as f64)),
            BitOr => Ok(Value::Int(x | y)),
            BitAnd => Ok(Value::Int(x & y)),
        };
    }

    let (x, y) = match (as_num(a), as_num(b)) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(RuntimeError::other(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op_symbol(op),
            type_name(a),
            type_name(b)
        ))),
    };
    match op {
        Add => Ok(Value::Float(x + y)),
        Sub => Ok(Value::Float(x - y)),
        Mul => Ok(Value::Float(x * y)),
        Div => Ok(Value::Float(x / y)),
        Mod => Ok(Value::Float(x.rem_euclid(y))),
        FloorDiv => Ok(Value::Float((x / y).floor())),
        Pow => Ok(Value::Float(x.powf(y))),
        BitOr | BitAnd => Err(RuntimeError::other("unsupported operand type(s) for bitwise op")),
    }
}

fn checked(y: i64, f: impl FnOnce() -> Value) -> Result<Value, RuntimeError> {
    if y == 0 {
        Err(RuntimeError::other("division by zero"))
    } else {
        Ok(f())
    }
}

fn op_symbol(op: BinOp) -> &'static str {
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

fn compare(op: CompareOp, a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    if matches!(op, CompareOp::Eq | CompareOp::NotEq) {
        let eq = value_eq(a, b);
        return Ok(Value::Bool(if op == CompareOp::Eq { eq } else { !eq }));
    }
    let ordering = if let (Value::Str(x), Value::Str(y)) = (a, b) {
        x.as_str().partial_cmp(y.as_str())
    } else {
        match (as_num(a), as_num(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => return Err(RuntimeError::other(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                cmp_symbol(op),
                type_name(a),
                type_name(b)
            ))),
        }
    };
    let Some(ord) = ordering else {
        return Ok(Value::Bool(false));
    };
    use std::cmp::Ordering::*;
    let result = match op {
        CompareOp::Lt => ord == Less,
        CompareOp::LtE => ord != Greater,
        CompareOp::Gt => ord == Greater,
        CompareOp::GtE => ord != Less,
        CompareOp::Eq | CompareOp::NotEq => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn cmp_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Lt => "<",
        CompareOp::LtE => "<=",
        CompareOp::Gt => ">",
        CompareOp::GtE => ">=",
        CompareOp::Eq => "==",
        CompareOp::NotEq => "!=",
    }
}
