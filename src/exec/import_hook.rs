//! The restricted import hook: only a module whose top-level segment is one
//! of `{math, random, datetime, json, csv, os, sys}` may be imported. Each
//! whitelisted module is backed by a small set of Rust-native bindings
//! rather than an embedded interpreter for some other language — only the
//! module *name* is gatekept, leaving module contents an implementation
//! detail.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::RuntimeError;
use crate::exec::value::{BuiltinFn, ClassDef, ObjectData, Value};

pub const WHITELIST: &[&str] = &["math", "random", "datetime", "json", "csv", "os", "sys"];

pub fn top_segment(module_path: &str) -> &str {
    module_path.split('.').next().unwrap_or(module_path)
}

/// Builds the namespace object bound to a whitelisted module name. Modeled
/// as an `Object` so `math.sqrt(x)`-style attribute access reuses the same
/// attribute-lookup path as user-defined objects.
pub fn import_module(name: &str) -> Result<Value, RuntimeError> {
    let top = top_segment(name);
    if !WHITELIST.contains(&top) {
        return Err(RuntimeError::other(format!("import of '{top}' is not permitted")));
    }
    let fields = match top {
        "math" => math_namespace(),
        "random" => random_namespace(),
        "datetime" => datetime_namespace(),
        "json" => json_namespace(),
        "csv" => Vec::new(),
        "os" => os_namespace(),
        "sys" => sys_namespace(),
        _ => unreachable!(),
    };
    let class = Rc::new(ClassDef { name: top.to_owned(), methods: Vec::new() });
    Ok(Value::Object(Rc::new(RefCell::new(ObjectData { class, fields }))))
}

fn builtin(name: &'static str, f: impl Fn(&mut crate::exec::Interpreter, Vec<Value>) -> Result<Value, RuntimeError> + 'static) -> (String, Value) {
    (name.to_owned(), Value::BuiltinFn(Rc::new(BuiltinFn { name, func: Box::new(f) })))
}

fn as_f64(v: &Value) -> Result<f64, RuntimeError> {
    match v {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        other => Err(RuntimeError::other(format!("expected a number, got '{}'", crate::exec::value::type_name(other)))),
    }
}

fn math_namespace() -> Vec<(String, Value)> {
    vec![
        builtin("sqrt", |_, args| Ok(Value::Float(as_f64(&args[0])?.sqrt()))),
        builtin("floor", |_, args| Ok(Value::Int(as_f64(&args[0])?.floor() as i64))),
        builtin("ceil", |_, args| Ok(Value::Int(as_f64(&args[0])?.ceil() as i64))),
        builtin("pow", |_, args| Ok(Value::Float(as_f64(&args[0])?.powf(as_f64(&args[1])?)))),
        ("pi".to_owned(), Value::Float(std::f64::consts::PI)),
        ("e".to_owned(), Value::Float(std::f64::consts::E)),
    ]
}

fn next_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
        .wrapping_mul(2_685_821_657_736_338_717)
}

fn random_namespace() -> Vec<(String, Value)> {
    vec![
        builtin("random", |_, _args| {
            let seed = next_seed();
            Ok(Value::Float((seed >> 11) as f64 / (1u64 << 53) as f64))
        }),
        builtin("randint", |_, args| {
            let lo = match &args[0] {
                Value::Int(i) => *i,
                other => return Err(RuntimeError::other(format!("expected int, got '{}'", crate::exec::value::type_name(other)))),
            };
            let hi = match &args[1] {
                Value::Int(i) => *i,
                other => return Err(RuntimeError::other(format!("expected int, got '{}'", crate::exec::value::type_name(other)))),
            };
            if hi < lo {
                return Err(RuntimeError::other("empty range for randint()"));
            }
            let span = (hi - lo + 1) as u64;
            Ok(Value::Int(lo + (next_seed() % span) as i64))
        }),
        builtin("choice", |_, args| {
            let items = super::builtins::as_iterable(&args[0])?;
            if items.is_empty() {
                return Err(RuntimeError::other("Cannot choose from an empty sequence"));
            }
            let idx = (next_seed() as usize) % items.len();
            Ok(items[idx].clone())
        }),
    ]
}

fn datetime_namespace() -> Vec<(String, Value)> {
    vec![builtin("now", |_, _args| {
        let secs = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        Ok(Value::Str(Rc::new(format!("epoch+{secs}s"))))
    })]
}

fn json_namespace() -> Vec<(String, Value)> {
    vec![
        builtin("dumps", |_, args| {
            let json = super::helpers::value_to_json_pub(&args[0]);
            Ok(Value::Str(Rc::new(serde_json::to_string(&json).unwrap_or_default())))
        }),
        builtin("loads", |_, args| {
            let text = match &args[0] {
                Value::Str(s) => (**s).clone(),
                other => return Err(RuntimeError::other(format!("expected str, got '{}'", crate::exec::value::type_name(other)))),
            };
            let parsed: serde_json::Value = serde_json::from_str(&text).map_err(|e| RuntimeError::other(format!("{e}")))?;
            Ok(super::helpers::json_to_value_pub(&parsed))
        }),
    ]
}

fn os_namespace() -> Vec<(String, Value)> {
    vec![builtin("getcwd", |_, _args| {
        let cwd = std::env::current_dir().map(|p| p.display().to_string()).unwrap_or_default();
        Ok(Value::Str(Rc::new(cwd)))
    })]
}

fn sys_namespace() -> Vec<(String, Value)> {
    vec![("argv".to_owned(), Value::List(Rc::new(RefCell::new(Vec::new()))))]
}
