use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;

use crate::ast::{Expression, Statement};
use crate::builtin::BuiltinFunction;
use crate::code::Instructions;
use crate::environment::Environment;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET_BASIS, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

/// A hashable key: the value's type tag plus a 64-bit digest. Two
/// structurally equal integers, booleans, or strings produce equal keys.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct HashKey {
    pub kind: &'static str,
    pub value: u64,
}

impl HashKey {
    pub fn from_object(obj: &Object) -> Result<Self, String> {
        match obj {
            Object::Integer(i) => Ok(HashKey {
                kind: obj.type_name(),
                value: *i as u64,
            }),
            Object::Boolean(b) => Ok(HashKey {
                kind: obj.type_name(),
                value: u64::from(*b),
            }),
            Object::String(s) => Ok(HashKey {
                kind: obj.type_name(),
                value: fnv1a(s.as_bytes()),
            }),
            other => Err(format!("unusable as hash key: {}", other.type_name())),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Object>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(String),
    Null,
    ReturnValue(Box<Object>),
    Error(String),
    Function {
        parameters: Vec<Expression>,
        body: Statement,
        env: Rc<RefCell<Environment>>,
    },
    CompiledFunction(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Builtin(BuiltinFunction),
    Array(Vec<Object>),
    Hash(BTreeMap<HashKey, HashPair>),
    Quote(Expression),
    Macro {
        parameters: Vec<Expression>,
        body: Statement,
        env: Rc<RefCell<Environment>>,
    },
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::String(_) => "STRING",
            Object::Null => "NULL",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Error(_) => "ERROR",
            Object::Function { .. } => "FUNCTION",
            Object::CompiledFunction(_) => "COMPILED_FUNCTION",
            Object::Closure(_) => "CLOSURE",
            Object::Builtin(_) => "BUILTIN",
            Object::Array(_) => "ARRAY",
            Object::Hash(_) => "HASH",
            Object::Quote(_) => "QUOTE",
            Object::Macro { .. } => "MACRO",
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(i) => write!(f, "{}", i),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::String(s) => write!(f, "{}", s),
            Object::Null => write!(f, "null"),
            Object::ReturnValue(obj) => write!(f, "{}", obj),
            Object::Error(msg) => write!(f, "ERROR: {}", msg),
            Object::Function {
                parameters, body, ..
            } => {
                write!(
                    f,
                    "fn({}) {{\n{}\n}}",
                    parameters
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    body
                )
            }
            Object::CompiledFunction(func) => {
                write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(func))
            }
            Object::Closure(cl) => write!(f, "Closure[{:p}]", Rc::as_ptr(cl)),
            Object::Builtin(bf) => write!(f, "builtin function {}", bf),
            Object::Array(elements) => {
                write!(
                    f,
                    "[{}]",
                    elements
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Object::Hash(pairs) => {
                write!(
                    f,
                    "{{{}}}",
                    pairs
                        .values()
                        .map(|pair| format!("{}: {}", pair.key, pair.value))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Object::Quote(exp) => write!(f, "QUOTE({})", exp),
            Object::Macro {
                parameters, body, ..
            } => {
                write!(
                    f,
                    "macro({}) {{\n{}\n}}",
                    parameters
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    body
                )
            }
        }
    }
}
