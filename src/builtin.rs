use std::fmt;
use std::fmt::Formatter;

use crate::object::Object;

pub type BuiltinFn = fn(Vec<Object>) -> Option<Object>;

/// A named host function. The registry order is fixed: OpGetBuiltin
/// addresses builtins by their position in BUILTINS.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BuiltinFunction {
    pub name: &'static str,
    func: BuiltinFn,
}

pub const BUILTINS: &[BuiltinFunction] = &[
    BuiltinFunction {
        name: "len",
        func: builtin_len,
    },
    BuiltinFunction {
        name: "puts",
        func: builtin_puts,
    },
    BuiltinFunction {
        name: "first",
        func: builtin_first,
    },
    BuiltinFunction {
        name: "last",
        func: builtin_last,
    },
    BuiltinFunction {
        name: "rest",
        func: builtin_rest,
    },
    BuiltinFunction {
        name: "push",
        func: builtin_push,
    },
];

impl BuiltinFunction {
    pub fn look_up(name: &str) -> Option<Self> {
        BUILTINS.iter().find(|b| b.name == name).copied()
    }

    pub fn by_index(index: usize) -> Option<Self> {
        BUILTINS.get(index).copied()
    }

    pub fn call(&self, args: Vec<Object>) -> Option<Object> {
        (self.func)(args)
    }
}

impl fmt::Display for BuiltinFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn wrong_arity(got: usize, want: usize) -> Option<Object> {
    Some(Object::Error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    )))
}

fn builtin_len(args: Vec<Object>) -> Option<Object> {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }

    match &args[0] {
        Object::String(s) => Some(Object::Integer(s.len() as i64)),
        Object::Array(elements) => Some(Object::Integer(elements.len() as i64)),
        other => Some(Object::Error(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_puts(args: Vec<Object>) -> Option<Object> {
    for arg in args {
        println!("{}", arg);
    }
    None
}

fn builtin_first(args: Vec<Object>) -> Option<Object> {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }

    match &args[0] {
        Object::Array(elements) => elements.first().cloned(),
        other => Some(Object::Error(format!(
            "argument to `first` must be ARRAY, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_last(args: Vec<Object>) -> Option<Object> {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }

    match &args[0] {
        Object::Array(elements) => elements.last().cloned(),
        other => Some(Object::Error(format!(
            "argument to `last` must be ARRAY, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_rest(args: Vec<Object>) -> Option<Object> {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }

    match &args[0] {
        Object::Array(elements) => {
            if elements.is_empty() {
                None
            } else {
                Some(Object::Array(elements[1..].to_vec()))
            }
        }
        other => Some(Object::Error(format!(
            "argument to `rest` must be ARRAY, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_push(args: Vec<Object>) -> Option<Object> {
    if args.len() != 2 {
        return wrong_arity(args.len(), 2);
    }

    match &args[0] {
        Object::Array(elements) => {
            let mut pushed = elements.clone();
            pushed.push(args[1].clone());
            Some(Object::Array(pushed))
        }
        other => Some(Object::Error(format!(
            "argument to `push` must be ARRAY, got {}",
            other.type_name()
        ))),
    }
}
