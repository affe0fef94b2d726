//! The injected helpers table: `_open_file`, `_add_to`, `read_json`,
//! `write_json`, `read_csv`, `write_csv`. The input provider is implemented
//! directly on [`super::Interpreter`] since nothing in the translated IR
//! needs to reference it as a first-class callable.

use std::cell::RefCell;
use std::fs;
use std::io::Write as _;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::exec::env::Env;
use crate::exec::value::{display_value, type_name, BuiltinFn, FileHandle, Value};

pub fn install(env: &Env) {
    env.define(
        "_add_to",
        Value::BuiltinFn(Rc::new(BuiltinFn {
            name: "_add_to",
            func: Box::new(|_, mut args| {
                if args.len() != 2 {
                    return Err(RuntimeError::other("_add_to expected 2 arguments"));
                }
                let value = args.remove(1);
                let target = args.remove(0);
                add_to(target, value)
            }),
        })),
    );

    env.define(
        "read_json",
        Value::BuiltinFn(Rc::new(BuiltinFn {
            name: "read_json",
            func: Box::new(|_, args| {
                let path = one_str(args)?;
                let text = fs::read_to_string(&*path)
                    .map_err(|e| RuntimeError::other(format!("{e}")))?;
                let parsed: serde_json::Value =
                    serde_json::from_str(&text).map_err(|e| RuntimeError::other(format!("{e}")))?;
                Ok(json_to_value(&parsed))
            }),
        })),
    );

    env.define(
        "write_json",
        Value::BuiltinFn(Rc::new(BuiltinFn {
            name: "write_json",
            func: Box::new(|_, mut args| {
                if args.len() != 2 {
                    return Err(RuntimeError::other("write_json expected 2 arguments"));
                }
                let path = match args.remove(1) {
                    Value::Str(s) => s,
                    other => return Err(RuntimeError::other(format!("expected str path, got '{}'", type_name(&other)))),
                };
                let data = value_to_json(&args.remove(0));
                let text = serde_json::to_string_pretty(&data)
                    .map_err(|e| RuntimeError::other(format!("{e}")))?;
                fs::write(&*path, text).map_err(|e| RuntimeError::other(format!("{e}")))?;
                Ok(Value::None)
            }),
        })),
    );

    env.define(
        "read_csv",
        Value::BuiltinFn(Rc::new(BuiltinFn {
            name: "read_csv",
            func: Box::new(|_, args| {
                let path = one_str(args)?;
                let mut reader = csv::ReaderBuilder::new()
                    .has_headers(false)
                    .from_path(&*path)
                    .map_err(|e| RuntimeError::other(format!("{e}")))?;
                let mut rows = Vec::new();
                for record in reader.records() {
                    let record = record.map_err(|e| RuntimeError::other(format!("{e}")))?;
                    let fields: Vec<Value> =
                        record.iter().map(|v| Value::Str(Rc::new(v.to_owned()))).collect();
                    rows.push(Value::List(Rc::new(RefCell::new(fields))));
                }
                Ok(Value::List(Rc::new(RefCell::new(rows))))
            }),
        })),
    );

    env.define(
        "write_csv",
        Value::BuiltinFn(Rc::new(BuiltinFn {
            name: "write_csv",
            func: Box::new(|_, mut args| {
                if args.len() != 2 {
                    return Err(RuntimeError::other("write_csv expected 2 arguments"));
                }
                let path = match args.remove(1) {
                    Value::Str(s) => s,
                    other => return Err(RuntimeError::other(format!("expected str path, got '{}'", type_name(&other)))),
                };
                let rows_value = args.remove(0);
                let rows = match &rows_value {
                    Value::List(l) => l.borrow().clone(),
                    other => return Err(RuntimeError::other(format!("expected list of rows, got '{}'", type_name(other)))),
                };
                let mut writer = csv::WriterBuilder::new()
                    .has_headers(false)
                    .from_path(&*path)
                    .map_err(|e| RuntimeError::other(format!("{e}")))?;
                for row in &rows {
                    let record: Vec<String> = match row {
                        Value::List(l) => l.borrow().iter().map(display_value).collect(),
                        Value::Tuple(t) => t.iter().map(display_value).collect(),
                        other => return Err(RuntimeError::other(format!("expected row to be a list, got '{}'", type_name(other)))),
                    };
                    writer.write_record(&record).map_err(|e| RuntimeError::other(format!("{e}")))?;
                }
                writer.flush().map_err(|e| RuntimeError::other(format!("{e}")))?;
                Ok(rows_value)
            }),
        })),
    );
}

fn one_str(mut args: Vec<Value>) -> Result<Rc<String>, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::other("expected exactly one argument"));
    }
    match args.remove(0) {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::other(format!("expected str, got '{}'", type_name(&other)))),
    }
}

/// `open` is rebound in the sandbox to this helper: text mode, UTF-8,
/// newline-transparent, default mode `"r"`.
pub fn open_file(_interp: &mut super::Interpreter, mut args: Vec<Value>) -> Result<Value, RuntimeError> {
    if args.is_empty() || args.len() > 2 {
        return Err(RuntimeError::other("_open_file expected 1 or 2 arguments"));
    }
    let mode = if args.len() == 2 {
        match args.remove(1) {
            Value::Str(s) => (*s).clone(),
            other => return Err(RuntimeError::other(format!("expected str mode, got '{}'", type_name(&other)))),
        }
    } else {
        "r".to_owned()
    };
    let path = match args.remove(0) {
        Value::Str(s) => (*s).clone(),
        other => return Err(RuntimeError::other(format!("expected str path, got '{}'", type_name(&other)))),
    };

    let file = match mode.as_str() {
        "r" => fs::File::open(&path).map_err(|e| RuntimeError::other(format!("{e}")))?,
        "w" => fs::File::create(&path).map_err(|e| RuntimeError::other(format!("{e}")))?,
        "a" => fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| RuntimeError::other(format!("{e}")))?,
        other => return Err(RuntimeError::other(format!("unsupported file mode '{other}'"))),
    };

    Ok(Value::File(Rc::new(RefCell::new(FileHandle {
        path,
        mode,
        file: Some(file),
    }))))
}

pub fn write_handle(handle: &Value, content: &str) -> Result<(), RuntimeError> {
    match handle {
        Value::File(fh) => {
            let mut fh = fh.borrow_mut();
            let file = fh.file.as_mut().ok_or_else(|| RuntimeError::other("I/O operation on closed file"))?;
            file.write_all(content.as_bytes()).map_err(|e| RuntimeError::other(format!("{e}")))
        }
        other => Err(RuntimeError::other(format!("'{}' object has no attribute 'write'", type_name(other)))),
    }
}

pub fn read_handle(handle: &Value) -> Result<String, RuntimeError> {
    match handle {
        Value::File(fh) => {
            use std::io::Read;
            let mut fh = fh.borrow_mut();
            let file = fh.file.as_mut().ok_or_else(|| RuntimeError::other("I/O operation on closed file"))?;
            let mut buf = String::new();
            file.read_to_string(&mut buf).map_err(|e| RuntimeError::other(format!("{e}")))?;
            Ok(buf)
        }
        other => Err(RuntimeError::other(format!("'{}' object has no attribute 'read'", type_name(other)))),
    }
}

pub fn close_handle(handle: &Value) -> Result<(), RuntimeError> {
    match handle {
        Value::File(fh) => {
            fh.borrow_mut().file = None;
            Ok(())
        }
        other => Err(RuntimeError::other(format!("'{}' object has no attribute 'close'", type_name(other)))),
    }
}

fn add_to(target: Value, value: Value) -> Result<Value, RuntimeError> {
    match target {
        Value::List(l) => {
            l.borrow_mut().push(value);
            Ok(Value::List(l))
        }
        Value::Set(s) => {
            {
                let mut b = s.borrow_mut();
                if !b.iter().any(|v| crate::exec::value::value_eq(v, &value)) {
                    b.push(value);
                }
            }
            Ok(Value::Set(s))
        }
        other => super::eval::numeric_add(&other, &value),
    }
}

pub fn json_to_value_pub(v: &serde_json::Value) -> Value {
    json_to_value(v)
}

pub fn value_to_json_pub(v: &Value) -> serde_json::Value {
    value_to_json(v)
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_json::Value::String(s) => Value::Str(Rc::new(s.clone())),
        serde_json::Value::Array(items) => {
            Value::List(Rc::new(RefCell::new(items.iter().map(json_to_value).collect())))
        }
        serde_json::Value::Object(map) => Value::Dict(Rc::new(RefCell::new(
            map.iter().map(|(k, v)| (Value::Str(Rc::new(k.clone())), json_to_value(v))).collect(),
        ))),
    }
}

fn value_to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number).unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String((**s).clone()),
        Value::List(l) => serde_json::Value::Array(l.borrow().iter().map(value_to_json).collect()),
        Value::Tuple(t) => serde_json::Value::Array(t.iter().map(value_to_json).collect()),
        Value::Set(s) => serde_json::Value::Array(s.borrow().iter().map(value_to_json).collect()),
        Value::Dict(d) => {
            let mut map = serde_json::Map::new();
            for (k, v) in d.borrow().iter() {
                map.insert(display_value(k), value_to_json(v));
            }
            serde_json::Value::Object(map)
        }
        other => serde_json::Value::String(display_value(other)),
    }
}

#[cfg(test)]
mod tests {
    fn temp_csv_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tale_helpers_test_{tag}_{}.csv", std::process::id()))
    }

    #[test]
    fn csv_round_trips_rows_as_positional_lists_with_no_synthesized_header() {
        let path = temp_csv_path("roundtrip");
        let path_str = path.to_str().unwrap().replace('\\', "\\\\");

        let write_code = format!(
            "list data is [[\"name\", \"age\"], [\"alice\", \"30\"]]\nsay csv write data to \"{path_str}\"\n"
        );
        let write_result = crate::run(&write_code, vec![]);
        assert!(write_result.ok, "write failed: {:?}", write_result.error);
        assert_eq!(write_result.output.as_deref(), Some("[['name', 'age'], ['alice', '30']]\n"));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "name,age\nalice,30\n");

        let read_code = format!("rows is csv read \"{path_str}\"\nsay rows\nsay rows[0][0]\n");
        let read_result = crate::run(&read_code, vec![]);
        assert!(read_result.ok, "read failed: {:?}", read_result.error);
        assert_eq!(
            read_result.output.as_deref(),
            Some("[['name', 'age'], ['alice', '30']]\nname\n")
        );

        std::fs::remove_file(&path).ok();
    }
}
