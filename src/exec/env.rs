//! Scope chain with closures.
//!
//! A flat `Vec<HashMap<_, _>>` stack would be enough if nothing captured an
//! enclosing scope, but TALE routinely passes `lambda`/`function`/
//! `generator` bodies around as first-class values (`map fn xs`,
//! `filter fn xs`), so each one needs its own captured parent scope rather
//! than a shared global stack — hence a proper `Rc<RefCell<_>>` chain.

use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::HashSet;
use std::rc::Rc;

use super::value::Value;

struct ScopeNode {
    vars: HashMap<String, Value>,
    globals: HashSet<String>,
    parent: Option<Env>,
}

#[derive(Clone)]
pub struct Env(Rc<RefCell<ScopeNode>>);

impl Env {
    pub fn root() -> Self {
        Env(Rc::new(RefCell::new(ScopeNode {
            vars: HashMap::new(),
            globals: HashSet::new(),
            parent: None,
        })))
    }

    pub fn child(parent: &Env) -> Self {
        Env(Rc::new(RefCell::new(ScopeNode {
            vars: HashMap::new(),
            globals: HashSet::new(),
            parent: Some(parent.clone()),
        })))
    }

    fn root_of(&self) -> Env {
        let mut current = self.clone();
        loop {
            let next = current.0.borrow().parent.clone();
            match next {
                Some(p) => current = p,
                None => return current,
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.0.borrow().vars.get(name) {
            return Some(v.clone());
        }
        let parent = self.0.borrow().parent.clone();
        parent.and_then(|p| p.get(name))
    }

    /// Declares `name` as referring to the module-level scope for the
    /// remainder of this scope's lifetime (the `global <names>` statement).
    pub fn declare_global(&self, name: &str) {
        self.0.borrow_mut().globals.insert(name.to_owned());
    }

    /// Binds `name` in-place: the module-level scope if declared global,
    /// otherwise this scope directly (Python's "assignment creates a local
    /// unless declared global" rule).
    pub fn assign(&self, name: &str, value: Value) {
        if self.0.borrow().globals.contains(name) {
            self.root_of().0.borrow_mut().vars.insert(name.to_owned(), value);
        } else {
            self.0.borrow_mut().vars.insert(name.to_owned(), value);
        }
    }

    /// Binds directly in this exact scope, ignoring any `global` markers
    /// (used to install parameters and built-ins).
    pub fn define(&self, name: &str, value: Value) {
        self.0.borrow_mut().vars.insert(name.to_owned(), value);
    }
}
