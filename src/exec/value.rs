//! The tagged runtime value: `{Int, Float, Str, Bool, Null, List, Map, Set,
//! Tuple, Callable, FileHandle, Foreign}`. Mutable containers use
//! `Rc<RefCell<_>>` so aliasing one name into another (as in `y is x`
//! followed by `add 1 to x`) is visible through both names.

use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::rc::Rc;

use crate::exec::env::Env;
use crate::exec::Node;

pub type RtResult<T> = Result<T, crate::error::RuntimeError>;

#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<String>),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<Vec<(Value, Value)>>>),
    Set(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    Function(Rc<FunctionDef>),
    Lambda(Rc<LambdaDef>),
    BuiltinFn(Rc<BuiltinFn>),
    Class(Rc<ClassDef>),
    Object(Rc<RefCell<ObjectData>>),
    File(Rc<RefCell<FileHandle>>),
    Range(i64, i64, i64),
    Exception(Rc<String>),
}

pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Node>,
    pub closure: Env,
    pub is_generator: bool,
}

pub struct LambdaDef {
    pub params: Vec<String>,
    pub body: crate::expr::Expr,
    pub closure: Env,
}

pub struct BuiltinFn {
    pub name: &'static str,
    pub func: Box<dyn Fn(&mut crate::exec::Interpreter, Vec<Value>) -> RtResult<Value>>,
}

pub struct ClassDef {
    pub name: String,
    pub methods: Vec<(String, Rc<FunctionDef>)>,
}

impl ClassDef {
    pub fn find_method(&self, name: &str) -> Option<Rc<FunctionDef>> {
        self.methods.iter().find(|(n, _)| n == name).map(|(_, f)| f.clone())
    }
}

pub struct ObjectData {
    pub class: Rc<ClassDef>,
    pub fields: Vec<(String, Value)>,
}

impl ObjectData {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())
    }

    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(entry) = self.fields.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
        } else {
            self.fields.push((name.to_owned(), value));
        }
    }
}

pub struct FileHandle {
    pub path: String,
    pub mode: String,
    pub file: Option<File>,
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_value(self))
    }
}

/// Structural equality matching Python's: ints/floats/bools compare
/// numerically across tags, containers compare element-wise.
pub fn value_eq(a: &Value, b: &Value) -> bool {
    use Value::*;
    match (a, b) {
        (None, None) => true,
        (Bool(x), Bool(y)) => x == y,
        (Int(x), Int(y)) => x == y,
        (Float(x), Float(y)) => x == y,
        (Int(x), Float(y)) | (Float(y), Int(x)) => *x as f64 == *y,
        (Bool(x), Int(y)) | (Int(y), Bool(x)) => (*x as i64) == *y,
        (Str(x), Str(y)) => x == y,
        (List(x), List(y)) => {
            let x = x.borrow();
            let y = y.borrow();
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| value_eq(a, b))
        }
        (Tuple(x), Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| value_eq(a, b))
        }
        (Set(x), Set(y)) => {
            let x = x.borrow();
            let y = y.borrow();
            x.len() == y.len() && x.iter().all(|v| y.iter().any(|w| value_eq(v, w)))
        }
        (Dict(x), Dict(y)) => {
            let x = x.borrow();
            let y = y.borrow();
            x.len() == y.len()
                && x.iter().all(|(k, v)| {
                    y.iter().any(|(k2, v2)| value_eq(k, k2) && value_eq(v, v2))
                })
        }
        _ => false,
    }
}

pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::None => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::List(l) => !l.borrow().is_empty(),
        Value::Dict(d) => !d.borrow().is_empty(),
        Value::Set(s) => !s.borrow().is_empty(),
        Value::Tuple(t) => !t.is_empty(),
        _ => true,
    }
}

pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::None => "NoneType",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Str(_) => "str",
        Value::List(_) => "list",
        Value::Dict(_) => "dict",
        Value::Set(_) => "set",
        Value::Tuple(_) => "tuple",
        Value::Function(_) | Value::Lambda(_) | Value::BuiltinFn(_) => "function",
        Value::Class(_) => "type",
        Value::Object(_) => "object",
        Value::File(_) => "file",
        Value::Range(..) => "range",
        Value::Exception(_) => "Exception",
    }
}

pub fn display_value(v: &Value) -> String {
    match v {
        Value::None => "None".to_owned(),
        Value::Bool(b) => if *b { "True".to_owned() } else { "False".to_owned() },
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Str(s) => (**s).clone(),
        Value::List(l) => format!(
            "[{}]",
            l.borrow().iter().map(repr_value).collect::<Vec<_>>().join(", ")
        ),
        Value::Tuple(t) => {
            let parts: Vec<String> = t.iter().map(repr_value).collect();
            if parts.len() == 1 {
                format!("({},)", parts[0])
            } else {
                format!("({})", parts.join(", "))
            }
        }
        Value::Set(s) => {
            let b = s.borrow();
            if b.is_empty() {
                "set()".to_owned()
            } else {
                format!("{{{}}}", b.iter().map(repr_value).collect::<Vec<_>>().join(", "))
            }
        }
        Value::Dict(d) => format!(
            "{{{}}}",
            d.borrow()
                .iter()
                .map(|(k, v)| format!("{}: {}", repr_value(k), repr_value(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Value::Function(f) => format!("<function {}>", f.name),
        Value::Lambda(_) => "<lambda>".to_owned(),
        Value::BuiltinFn(f) => format!("<built-in function {}>", f.name),
        Value::Class(c) => format!("<class {}>", c.name),
        Value::Object(o) => format!("<{} object>", o.borrow().class.name),
        Value::File(fh) => format!("<file {}>", fh.borrow().path),
        Value::Range(start, stop, step) => format!("range({start}, {stop}, {step})"),
        Value::Exception(msg) => (**msg).clone(),
    }
}

fn repr_value(v: &Value) -> String {
    if let Value::Str(s) = v {
        format!("'{}'", s)
    } else {
        display_value(v)
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}
