//! An interpreter for phonk, a small parenthesized language with first-class
//! closures and mutable mappings.

mod builtin;
mod context;
mod environment;
mod error;
mod interpreter;
mod parser;

#[cfg(test)]
mod test_utils;

pub use context::EvaluationContext;
pub use environment::Environment;
pub use error::{ErrorKind, PhonkError};
pub use interpreter::{Builtin, BuiltinFn, Closure, Dict, DictKey, Function, Value, MAX_EVAL_DEPTH};
pub use parser::{parse, parse_atom, parse_program, parse_sexp, tokenize, Literal, Sexp, MAX_PARSE_DEPTH};
