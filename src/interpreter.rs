use core::fmt;
use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{environment::Environment, error::PhonkError, parser::{format_float, Literal, Sexp}};

/// Nesting limit for evaluation, past which evaluation fails instead of
/// exhausting the host stack.
pub const MAX_EVAL_DEPTH: usize = 1000;

pub(crate) type EvaluationResult = Result<Value, PhonkError>;

pub type BuiltinFn = fn(Vec<Value>) -> Result<Value, PhonkError>;

// Value type that can be produced by expressions
#[derive(Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(Rc<str>),
    Function(Function),
    Dict(Dict),
}

/// A value viewed as a number. Booleans count as 0 and 1.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl Value {
    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Self::Boolean(value) => Some(Number::Integer(*value as i64)),
            Self::Integer(value) => Some(Number::Integer(*value)),
            Self::Float(value) => Some(Number::Float(*value)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    /// `False`, zero, nil and empty text or mappings are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Boolean(value) => *value,
            Self::Integer(value) => *value != 0,
            Self::Float(value) => *value != 0.0,
            Self::Text(text) => !text.is_empty(),
            Self::Function(_) => true,
            Self::Dict(dict) => !dict.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Boolean(_) => "bool",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Function(_) => "function",
            Self::Dict(_) => "dict",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Dict(a), Self::Dict(b)) => a.ptr_eq(b),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

// Mappings may contain themselves, so the mappings being printed are tracked
fn write_value(value: &Value, f: &mut fmt::Formatter<'_>, open: &mut Vec<*const ()>) -> fmt::Result {
    match value {
        Value::Nil => f.write_str("nil"),
        Value::Boolean(true) => f.write_str("True"),
        Value::Boolean(false) => f.write_str("False"),
        Value::Integer(value) => write!(f, "{}", value),
        Value::Float(value) => f.write_str(&format_float(*value)),
        Value::Text(text) => f.write_str(text),
        Value::Function(function) => write!(f, "{}", function),
        Value::Dict(dict) => {
            let ptr = Rc::as_ptr(&dict.0) as *const ();
            if open.contains(&ptr) {
                return f.write_str("{...}");
            }

            open.push(ptr);
            f.write_str("{")?;
            for (index, (key, value)) in dict.0.borrow().iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: ", key)?;
                write_value(value, f, open)?;
            }
            open.pop();
            f.write_str("}")
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(self, f, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Display).fmt(f)
    }
}

/// Key of a mapping. Numerically equal numbers (and booleans) are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    Integer(i64),
    Float(u64),
    Text(Rc<str>),
}

impl TryFrom<&Value> for DictKey {
    type Error = PhonkError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Boolean(value) => Ok(Self::Integer(*value as i64)),
            Value::Integer(value) => Ok(Self::Integer(*value)),
            Value::Float(value) if value.fract() == 0.0 && *value >= -9.223_372_036_854_775_808e18 && *value < 9.223_372_036_854_775_808e18
                => Ok(Self::Integer(*value as i64)),
            Value::Float(value) => Ok(Self::Float(value.to_bits())),
            Value::Text(text) => Ok(Self::Text(text.clone())),
            other => Err(PhonkError::runtime(format!("unhashable type: '{}'", other.type_name()))),
        }
    }
}

impl fmt::Display for DictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Float(bits) => f.write_str(&format_float(f64::from_bits(*bits))),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// A mutable mapping shared by every value that refers to it.
#[derive(Clone, Default)]
pub struct Dict(Rc<RefCell<IndexMap<DictKey, Value>>>);

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn contains(&self, key: &Value) -> Result<bool, PhonkError> {
        let key = DictKey::try_from(key)?;
        Ok(self.0.borrow().contains_key(&key))
    }

    pub fn insert(&self, key: &Value, value: Value) -> Result<(), PhonkError> {
        let key = DictKey::try_from(key)?;
        self.0.borrow_mut().insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &Value) -> Result<Value, PhonkError> {
        let key = DictKey::try_from(key)?;
        self.0.borrow().get(&key)
            .cloned()
            .ok_or_else(|| PhonkError::runtime(format!("key not found: {}", key)))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    function: BuiltinFn,
}

impl Builtin {
    pub const fn new(name: &'static str, function: BuiltinFn) -> Self {
        Self { name, function }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[derive(Clone)]
pub enum Function {
    Builtin(Builtin),
    Closure(Rc<Closure>),
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            Self::Closure(closure) => write!(f, "<phonk ({})>", closure.parameters.iter().format(" ")),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Display).fmt(f)
    }
}

impl Function {
    /// Calls the function from host code.
    pub fn call(&self, values: Vec<Value>) -> Result<Value, PhonkError> {
        self.evaluate(values, 0)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Builtin(a), Self::Builtin(b)) => a.name == b.name,
            (Self::Closure(a), Self::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn evaluate(&self, values: Vec<Value>, depth: usize) -> EvaluationResult {
        match self {
            Self::Builtin(builtin) => (builtin.function)(values),
            Self::Closure(closure) => closure.evaluate(values, depth),
        }
    }
}

pub struct Closure {
    parameters: Vec<Rc<str>>,
    body: Sexp,
    environment: Environment,
}

impl Closure {
    pub fn parameters(&self) -> &[Rc<str>] {
        &self.parameters
    }

    pub fn body(&self) -> &Sexp {
        &self.body
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    fn evaluate(&self, values: Vec<Value>, depth: usize) -> EvaluationResult {
        // Missing arguments are an error, surplus ones are dropped by the zip
        if values.len() < self.parameters.len() {
            return Err(PhonkError::runtime(format!(
                "function takes {} arguments but {} were given", self.parameters.len(), values.len()
            )));
        }

        let environment = self.environment.extend(self.parameters.iter().cloned().zip(values));
        evaluate_with_depth(&self.body, &environment, depth)
    }
}

fn evaluate_atom(literal: &Literal, environment: &Environment) -> EvaluationResult {
    match literal {
        Literal::Integer(value) => Ok(Value::Integer(*value)),
        Literal::Float(value) => Ok(Value::Float(*value)),
        Literal::Symbol(name) => environment.lookup(name),
    }
}

fn evaluate_store(name: &Sexp, expression: &Sexp, environment: &Environment, depth: usize) -> EvaluationResult {
    let name = name.as_symbol()
        .ok_or_else(|| PhonkError::malformed(format!("sto expects a symbol as name, got '{}'", name)))?;

    let value = evaluate_with_depth(expression, environment, depth)?;
    let confirmation = format!("{} stored: {}", name, value);
    environment.define(name, value);

    Ok(Value::Text(confirmation.into()))
}

fn sexp_list_to_identifiers(list: &[Sexp]) -> Result<Vec<Rc<str>>, PhonkError> {
    list.iter()
        .map(|sexp| match sexp {
            Sexp::Atom(Literal::Symbol(name)) => Ok(name.clone()),
            other => Err(PhonkError::malformed(format!("parameter names must be symbols, got '{}'", other))),
        }).collect()
}

fn evaluate_function(parameters: &Sexp, body: &Sexp, environment: &Environment) -> EvaluationResult {
    // A function literal captures the environment it is evaluated in, the
    // body stays unevaluated until the closure is called
    let parameters = match parameters {
        Sexp::List(parameters) => sexp_list_to_identifiers(parameters)?,
        other => return Err(PhonkError::malformed(format!("phonk expects a parameter list, got '{}'", other))),
    };

    Ok(Value::Function(Function::Closure(Rc::new(Closure {
        parameters,
        body: body.clone(),
        environment: environment.clone(),
    }))))
}

fn evaluate_if(condition: &Sexp, consequent: &Sexp, alternative: &Sexp, environment: &Environment, depth: usize) -> EvaluationResult {
    if evaluate_with_depth(condition, environment, depth)?.is_truthy() {
        evaluate_with_depth(consequent, environment, depth)
    } else {
        evaluate_with_depth(alternative, environment, depth)
    }
}

fn evaluate_list(list: &[Sexp], environment: &Environment, depth: usize) -> Result<Vec<Value>, PhonkError> {
    list.iter()
        .map(|sexp| evaluate_with_depth(sexp, environment, depth))
        .collect()
}

fn evaluate_application(operator: &Sexp, arguments: &[Sexp], environment: &Environment, depth: usize) -> EvaluationResult {
    let function = evaluate_with_depth(operator, environment, depth)?;
    let values = evaluate_list(arguments, environment, depth)?;

    match function {
        Value::Function(function) => function.evaluate(values, depth),
        other => Err(PhonkError::malformed(format!("'{}' of type {} is not callable", other, other.type_name()))),
    }
}

fn evaluate_expression(expression: &[Sexp], environment: &Environment, depth: usize) -> EvaluationResult {
    // Special forms are recognised by their head symbol and their length,
    // everything else is a function application

    match expression {
        [] => Err(PhonkError::malformed("cannot evaluate an empty list")),
        [head, name, value] if head.as_symbol() == Some("sto")
            => evaluate_store(name, value, environment, depth),
        [head, parameters, body] if head.as_symbol() == Some("phonk")
            => evaluate_function(parameters, body, environment),
        [head, condition, consequent, alternative] if head.as_symbol() == Some("if")
            => evaluate_if(condition, consequent, alternative, environment, depth),
        [operator, arguments @ ..] => evaluate_application(operator, arguments, environment, depth),
    }
}

fn evaluate_with_depth(sexp: &Sexp, environment: &Environment, depth: usize) -> EvaluationResult {
    if depth >= MAX_EVAL_DEPTH {
        return Err(PhonkError::runtime("maximum recursion depth exceeded"));
    }

    match sexp {
        Sexp::Atom(atom) => evaluate_atom(atom, environment),
        Sexp::List(expression) => evaluate_expression(expression, environment, depth + 1),
    }
}

pub(crate) fn evaluate(sexp: &Sexp, environment: &Environment) -> EvaluationResult {
    evaluate_with_depth(sexp, environment, 0)
}
