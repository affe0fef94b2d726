//! The exhaustive built-in whitelist. Nothing outside this list, `open`'s
//! sandboxed rebinding to `_open_file`, and the helpers in
//! [`super::helpers`] is reachable from translated TALE code.

use std::rc::Rc;

use crate::error::RuntimeError;
use crate::exec::env::Env;
use crate::exec::value::{display_value, is_truthy, type_name, value_eq, BuiltinFn, Value};
use crate::exec::Interpreter;

fn def(env: &Env, name: &'static str, func: impl Fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError> + 'static) {
    env.define(name, Value::BuiltinFn(Rc::new(BuiltinFn { name, func: Box::new(func) })));
}

/// Installs every whitelisted built-in plus the injected helpers table into
/// `env`.
pub fn install(env: &Env) {
    def(env, "abs", |_, args| match one(args)? {
        Value::Int(i) => Ok(Value::Int(i.abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        v => Err(RuntimeError::other(format!("bad operand type for abs(): '{}'", type_name(&v)))),
    });

    def(env, "all", |_, args| {
        let items = as_iterable(&one(args)?)?;
        Ok(Value::Bool(items.iter().all(is_truthy)))
    });

    def(env, "any", |_, args| {
        let items = as_iterable(&one(args)?)?;
        Ok(Value::Bool(items.iter().any(is_truthy)))
    });

    def(env, "bool", |_, args| Ok(Value::Bool(args.first().map(is_truthy).unwrap_or(false))));

    def(env, "dict", |_, args| {
        if args.is_empty() {
            return Ok(Value::Dict(Rc::new(std::cell::RefCell::new(Vec::new()))));
        }
        let items = as_iterable(&one(args)?)?;
        let mut pairs = Vec::new();
        for item in items {
            let pair = as_iterable(&item)?;
            if pair.len() != 2 {
                return Err(RuntimeError::other("dict update sequence element has wrong length"));
            }
            pairs.push((pair[0].clone(), pair[1].clone()));
        }
        Ok(Value::Dict(Rc::new(std::cell::RefCell::new(pairs))))
    });

    def(env, "enumerate", |_, args| {
        let items = as_iterable(&one(args)?)?;
        let out: Vec<Value> = items
            .into_iter()
            .enumerate()
            .map(|(i, v)| Value::Tuple(Rc::new(vec![Value::Int(i as i64), v])))
            .collect();
        Ok(Value::List(Rc::new(std::cell::RefCell::new(out))))
    });

    def(env, "filter", |interp, args| {
        let (func, seq) = two(args)?;
        let items = as_iterable(&seq)?;
        let mut out = Vec::new();
        for item in items {
            let keep = if matches!(func, Value::None) {
                is_truthy(&item)
            } else {
                is_truthy(&interp.call_value(func.clone(), vec![item.clone()])?)
            };
            if keep {
                out.push(item);
            }
        }
        Ok(Value::List(Rc::new(std::cell::RefCell::new(out))))
    });

    def(env, "float", |_, args| match args.into_iter().next() {
        None => Ok(Value::Float(0.0)),
        Some(Value::Int(i)) => Ok(Value::Float(i as f64)),
        Some(Value::Float(f)) => Ok(Value::Float(f)),
        Some(Value::Bool(b)) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        Some(Value::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| RuntimeError::other(format!("could not convert string to float: '{s}'"))),
        Some(v) => Err(RuntimeError::other(format!("float() argument must be a string or a number, not '{}'", type_name(&v)))),
    });

    def(env, "int", |_, args| match args.into_iter().next() {
        None => Ok(Value::Int(0)),
        Some(Value::Int(i)) => Ok(Value::Int(i)),
        Some(Value::Float(f)) => Ok(Value::Int(f as i64)),
        Some(Value::Bool(b)) => Ok(Value::Int(if b { 1 } else { 0 })),
        Some(Value::Str(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| RuntimeError::other(format!("invalid literal for int() with base 10: '{s}'"))),
        Some(v) => Err(RuntimeError::other(format!("int() argument must be a string or a number, not '{}'", type_name(&v)))),
    });

    def(env, "len", |_, args| {
        let v = one(args)?;
        let n = match &v {
            Value::Str(s) => s.chars().count(),
            Value::List(l) => l.borrow().len(),
            Value::Dict(d) => d.borrow().len(),
            Value::Set(s) => s.borrow().len(),
            Value::Tuple(t) => t.len(),
            other => return Err(RuntimeError::other(format!("object of type '{}' has no len()", type_name(other)))),
        };
        Ok(Value::Int(n as i64))
    });

    def(env, "list", |_, args| {
        let items = match args.into_iter().next() {
            None => Vec::new(),
            Some(v) => as_iterable(&v)?,
        };
        Ok(Value::List(Rc::new(std::cell::RefCell::new(items))))
    });

    def(env, "map", |interp, args| {
        let (func, seq) = two(args)?;
        let items = as_iterable(&seq)?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(interp.call_value(func.clone(), vec![item])?);
        }
        Ok(Value::List(Rc::new(std::cell::RefCell::new(out))))
    });

    def(env, "max", |interp, args| reduce_extreme(interp, args, true));
    def(env, "min", |interp, args| reduce_extreme(interp, args, false));

    def(env, "next", |_, args| {
        let v = one(args)?;
        match v {
            Value::List(l) => {
                let mut b = l.borrow_mut();
                if b.is_empty() {
                    Err(RuntimeError::other("StopIteration"))
                } else {
                    Ok(b.remove(0))
                }
            }
            other => Err(RuntimeError::other(format!("'{}' object is not an iterator", type_name(&other)))),
        }
    });

    def(env, "print", |interp, args| {
        let rendered: Vec<String> = args.iter().map(display_value).collect();
        interp.write_output(&rendered.join(" "));
        interp.write_output("\n");
        Ok(Value::None)
    });

    def(env, "range", |_, args| {
        let (start, stop, step) = match args.len() {
            1 => (0, as_int(&args[0])?, 1),
            2 => (as_int(&args[0])?, as_int(&args[1])?, 1),
            3 => (as_int(&args[0])?, as_int(&args[1])?, as_int(&args[2])?),
            _ => return Err(RuntimeError::other("range expected 1 to 3 arguments")),
        };
        Ok(Value::Range(start, stop, step))
    });

    def(env, "round", |_, mut args| match args.len() {
        1 => match args.remove(0) {
            Value::Int(i) => Ok(Value::Int(i)),
            Value::Float(f) => Ok(Value::Int(round_half_even(f) as i64)),
            v => Err(RuntimeError::other(format!("type {} doesn't define __round__ method", type_name(&v)))),
        },
        2 => {
            let (x, ndigits) = two(args)?;
            let x = as_f64(&x)?;
            let ndigits = as_int(&ndigits)?;
            let factor = 10f64.powi(ndigits as i32);
            Ok(Value::Float(round_half_even(x * factor) / factor))
        }
        _ => Err(RuntimeError::other("round expected 1 or 2 arguments")),
    });

    def(env, "set", |_, args| {
        let items = match args.into_iter().next() {
            None => Vec::new(),
            Some(v) => as_iterable(&v)?,
        };
        let mut out: Vec<Value> = Vec::new();
        for item in items {
            if !out.iter().any(|v| value_eq(v, &item)) {
                out.push(item);
            }
        }
        Ok(Value::Set(Rc::new(std::cell::RefCell::new(out))))
    });

    def(env, "sorted", |interp, args| {
        let items = as_iterable(&one(args)?)?;
        sort_values(interp, items, false)
    });

    def(env, "str", |_, args| match args.into_iter().next() {
        None => Ok(Value::Str(Rc::new(String::new()))),
        Some(v) => Ok(Value::Str(Rc::new(display_value(&v)))),
    });

    def(env, "sum", |_, args| {
        let items = as_iterable(&one(args)?)?;
        let mut acc = Value::Int(0);
        for item in items {
            acc = super::eval::numeric_add(&acc, &item)?;
        }
        Ok(acc)
    });

    def(env, "tuple", |_, args| {
        let items = match args.into_iter().next() {
            None => Vec::new(),
            Some(v) => as_iterable(&v)?,
        };
        Ok(Value::Tuple(Rc::new(items)))
    });

    def(env, "zip", |_, args| {
        let seqs: Vec<Vec<Value>> = args.iter().map(as_iterable).collect::<Result<_, _>>()?;
        let len = seqs.iter().map(|s| s.len()).min().unwrap_or(0);
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            out.push(Value::Tuple(Rc::new(seqs.iter().map(|s| s[i].clone()).collect())));
        }
        Ok(Value::List(Rc::new(std::cell::RefCell::new(out))))
    });

    def(env, "id", |_, args| {
        let v = one(args)?;
        let addr = match &v {
            Value::List(l) => Rc::as_ptr(l) as usize,
            Value::Dict(d) => Rc::as_ptr(d) as usize,
            Value::Set(s) => Rc::as_ptr(s) as usize,
            Value::Object(o) => Rc::as_ptr(o) as usize,
            other => other as *const Value as usize,
        };
        Ok(Value::Int(addr as i64))
    });

    def(env, "type", |_, args| {
        let v = one(args)?;
        Ok(Value::Str(Rc::new(type_name(&v).to_owned())))
    });

    def(env, "Exception", |_, args| {
        let msg = args.into_iter().next().map(|v| display_value(&v)).unwrap_or_default();
        Ok(Value::Exception(Rc::new(msg)))
    });

    def(env, "open", |interp, args| super::helpers::open_file(interp, args));

    super::helpers::install(env);
}

fn one(mut args: Vec<Value>) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::other("expected exactly one argument"));
    }
    Ok(args.remove(0))
}

fn two(mut args: Vec<Value>) -> Result<(Value, Value), RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::other("expected exactly two arguments"));
    }
    let b = args.remove(1);
    let a = args.remove(0);
    Ok((a, b))
}

fn as_int(v: &Value) -> Result<i64, RuntimeError> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(*b as i64),
        other => Err(RuntimeError::other(format!("'{}' object cannot be interpreted as an integer", type_name(other)))),
    }
}

fn as_f64(v: &Value) -> Result<f64, RuntimeError> {
    match v {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Bool(b) => Ok(*b as i64 as f64),
        other => Err(RuntimeError::other(format!("type {} doesn't define __round__ method", type_name(other)))),
    }
}

/// Rounds to the nearest integer, ties to even, matching CPython's `round`.
fn round_half_even(x: f64) -> f64 {
    let floor = x.floor();
    let diff = x - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}

/// Materializes any iterable value (list/tuple/set/dict/str/range) into a
/// `Vec<Value>`; dicts iterate their keys, matching Python.
pub fn as_iterable(v: &Value) -> Result<Vec<Value>, RuntimeError> {
    match v {
        Value::List(l) => Ok(l.borrow().clone()),
        Value::Tuple(t) => Ok((**t).clone()),
        Value::Set(s) => Ok(s.borrow().clone()),
        Value::Dict(d) => Ok(d.borrow().iter().map(|(k, _)| k.clone()).collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(Rc::new(c.to_string()))).collect()),
        Value::Range(start, stop, step) => {
            let mut out = Vec::new();
            let mut i = *start;
            if *step > 0 {
                while i < *stop {
                    out.push(Value::Int(i));
                    i += step;
                }
            } else if *step < 0 {
                while i > *stop {
                    out.push(Value::Int(i));
                    i += step;
                }
            }
            Ok(out)
        }
        other => Err(RuntimeError::other(format!("'{}' object is not iterable", type_name(other)))),
    }
}

fn reduce_extreme(interp: &mut Interpreter, args: Vec<Value>, want_max: bool) -> Result<Value, RuntimeError> {
    let items = if args.len() == 1 {
        as_iterable(&args[0])?
    } else {
        args
    };
    let mut it = items.into_iter();
    let mut best = it.next().ok_or_else(|| RuntimeError::other(if want_max { "max() arg is an empty sequence" } else { "min() arg is an empty sequence" }))?;
    for item in it {
        let better = if want_max {
            is_truthy(&super::eval::compare_gt(interp, &item, &best)?)
        } else {
            is_truthy(&super::eval::compare_gt(interp, &best, &item)?)
        };
        if better {
            best = item;
        }
    }
    Ok(best)
}

pub fn sort_values(interp: &mut Interpreter, mut items: Vec<Value>, _reverse: bool) -> Result<Value, RuntimeError> {
    // Simple insertion sort using the runtime `>` so any error from
    // comparing mismatched types surfaces as a normal runtime error.
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 {
            let swap = is_truthy(&super::eval::compare_gt(interp, &items[j - 1], &items[j])?);
            if swap {
                items.swap(j - 1, j);
                j -= 1;
            } else {
                break;
            }
        }
    }
    Ok(Value::List(Rc::new(std::cell::RefCell::new(items))))
}

#[cfg(test)]
mod tests {
    fn say(code: &str) -> String {
        let result = crate::run(code, vec![]);
        assert!(result.ok, "run failed: {:?}", result.error);
        result.output.unwrap_or_default()
    }

    #[test]
    fn round_ties_to_even_like_python() {
        assert_eq!(say("say round(2.5)\n"), "2\n");
        assert_eq!(say("say round(0.5)\n"), "0\n");
        assert_eq!(say("say round(1.5)\n"), "2\n");
        assert_eq!(say("say round(-2.5)\n"), "-2\n");
    }

    #[test]
    fn round_accepts_ndigits_and_returns_a_float() {
        assert_eq!(say("say round(3.14159, 2)\n"), "3.14\n");
        assert_eq!(say("say round(2, 2)\n"), "2.0\n");
    }
}
