use std::{collections::HashMap, rc::Rc};

use crate::{error::PhonkError, interpreter::{Builtin, BuiltinFn, Dict, EvaluationResult, Function, Number, Value}};


fn arguments<const N: usize>(values: Vec<Value>, name: &str) -> Result<[Value; N], PhonkError> {
    let count = values.len();
    values.try_into().map_err(|_| PhonkError::runtime(format!(
        "{}() takes {} argument{} but {} were given", name, N, if N == 1 { "" } else { "s" }, count
    )))
}

fn number(value: &Value, name: &str) -> Result<Number, PhonkError> {
    value.as_number()
        .ok_or_else(|| PhonkError::runtime(format!("{}() expects numbers, got {}", name, value.type_name())))
}

fn dict<'a>(value: &'a Value, name: &str) -> Result<&'a Dict, PhonkError> {
    match value {
        Value::Dict(dict) => Ok(dict),
        other => Err(PhonkError::runtime(format!("{}() expects a dict, got {}", name, other.type_name()))),
    }
}

fn arithmetic(
    values: Vec<Value>,
    name: &str,
    integer: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> EvaluationResult {
    // Two integers stay integers, anything involving a float becomes a float
    let [a, b] = arguments::<2>(values, name)?;
    match (number(&a, name)?, number(&b, name)?) {
        (Number::Integer(a), Number::Integer(b)) => integer(a, b)
            .map(Value::Integer)
            .ok_or_else(|| PhonkError::runtime(format!("integer overflow in {}()", name))),
        (a, b) => Ok(Value::Float(float(a.as_f64(), b.as_f64()))),
    }
}

fn builtin_add(values: Vec<Value>) -> EvaluationResult {
    arithmetic(values, "+", i64::checked_add, |a, b| a + b)
}

fn builtin_sub(values: Vec<Value>) -> EvaluationResult {
    arithmetic(values, "-", i64::checked_sub, |a, b| a - b)
}

fn builtin_mul(values: Vec<Value>) -> EvaluationResult {
    arithmetic(values, "*", i64::checked_mul, |a, b| a * b)
}

fn builtin_div(values: Vec<Value>) -> EvaluationResult {
    // True division, the result is always a float
    let [a, b] = arguments::<2>(values, "/")?;
    let (a, b) = (number(&a, "/")?.as_f64(), number(&b, "/")?.as_f64());

    if b == 0.0 { return Err(PhonkError::runtime("division by zero")); }
    Ok(Value::Float(a / b))
}

fn floor_div_integer(a: i64, b: i64) -> Result<i64, PhonkError> {
    if b == 0 { return Err(PhonkError::runtime("integer division by zero")); }

    let quotient = a.checked_div(b)
        .ok_or_else(|| PhonkError::runtime("integer overflow in //()"))?;
    if a % b != 0 && (a < 0) != (b < 0) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

fn builtin_div_int(values: Vec<Value>) -> EvaluationResult {
    // Floor division, rounding towards negative infinity
    let [a, b] = arguments::<2>(values, "//")?;
    match (number(&a, "//")?, number(&b, "//")?) {
        (Number::Integer(a), Number::Integer(b)) => floor_div_integer(a, b).map(Value::Integer),
        (a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            if b == 0.0 { return Err(PhonkError::runtime("float floor division by zero")); }
            Ok(Value::Float((a / b).floor()))
        }
    }
}

fn builtin_expt(values: Vec<Value>) -> EvaluationResult {
    let [base, exponent] = arguments::<2>(values, "expt")?;
    let (base, exponent) = (number(&base, "expt")?, number(&exponent, "expt")?);

    if let (Number::Integer(base), Number::Integer(exponent)) = (base, exponent) {
        if let Ok(exponent) = u32::try_from(exponent) {
            return base.checked_pow(exponent)
                .map(Value::Integer)
                .ok_or_else(|| PhonkError::runtime("integer overflow in expt()"));
        }
    }

    let (base, exponent) = (base.as_f64(), exponent.as_f64());
    if base == 0.0 && exponent < 0.0 {
        return Err(PhonkError::runtime("0 cannot be raised to a negative power"));
    }
    if base < 0.0 && exponent.fract() != 0.0 {
        return Err(PhonkError::runtime("negative number cannot be raised to a fractional power"));
    }
    Ok(Value::Float(base.powf(exponent)))
}

fn builtin_sin(values: Vec<Value>) -> EvaluationResult {
    let [x] = arguments::<1>(values, "sin")?;
    Ok(Value::Float(number(&x, "sin")?.as_f64().sin()))
}

fn builtin_random(values: Vec<Value>) -> EvaluationResult {
    let [] = arguments::<0>(values, "random")?;
    Ok(Value::Float(rand::random::<f64>()))
}

fn builtin_less(values: Vec<Value>) -> EvaluationResult {
    let [a, b] = arguments::<2>(values, "<")?;
    if let (Value::Text(a), Value::Text(b)) = (&a, &b) {
        return Ok(Value::Boolean(a < b));
    }

    let less = match (number(&a, "<")?, number(&b, "<")?) {
        (Number::Integer(a), Number::Integer(b)) => a < b,
        (a, b) => a.as_f64() < b.as_f64(),
    };
    Ok(Value::Boolean(less))
}

fn builtin_block(mut values: Vec<Value>) -> EvaluationResult {
    // The arguments were already evaluated in order, block only picks the last one
    Ok(values.pop().unwrap_or(Value::Nil))
}

fn builtin_dict_new(values: Vec<Value>) -> EvaluationResult {
    let [] = arguments::<0>(values, "dict-new")?;
    Ok(Value::Dict(Dict::new()))
}

fn builtin_dict_in(values: Vec<Value>) -> EvaluationResult {
    let [mapping, key] = arguments::<2>(values, "dict-in")?;
    Ok(Value::Boolean(dict(&mapping, "dict-in")?.contains(&key)?))
}

fn builtin_dict_add(values: Vec<Value>) -> EvaluationResult {
    let [mapping, key, value] = arguments::<3>(values, "dict-add")?;
    dict(&mapping, "dict-add")?.insert(&key, value.clone())?;
    Ok(value)
}

fn builtin_dict_get(values: Vec<Value>) -> EvaluationResult {
    let [mapping, key] = arguments::<2>(values, "dict-get")?;
    dict(&mapping, "dict-get")?.get(&key)
}

fn builtin(name: &'static str, function: BuiltinFn) -> (Rc<str>, Value) {
    (name.into(), Value::Function(Function::Builtin(Builtin::new(name, function))))
}

/// Bindings of the outermost frame.
pub(crate) fn builtin_frame() -> HashMap<Rc<str>, Value> {
    HashMap::from([
        builtin("+", builtin_add),
        builtin("-", builtin_sub),
        builtin("*", builtin_mul),
        builtin("/", builtin_div),
        builtin("//", builtin_div_int),
        builtin("expt", builtin_expt),
        builtin("sin", builtin_sin),
        builtin("random", builtin_random),

        builtin("<", builtin_less),

        builtin("block", builtin_block),

        ("True".into(), Value::Boolean(true)),
        ("False".into(), Value::Boolean(false)),

        builtin("dict-new", builtin_dict_new),
        builtin("dict-in", builtin_dict_in),
        builtin("dict-add", builtin_dict_add),
        builtin("dict-get", builtin_dict_get),
    ])
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    use super::*;

    fn call(name: &str, values: Vec<Value>) -> EvaluationResult {
        match builtin_frame().get(name) {
            Some(Value::Function(function)) => function.call(values),
            _ => panic!("{} is not a builtin function", name),
        }
    }

    fn int(value: i64) -> Value {
        Value::Integer(value)
    }

    #[test]
    fn arithmetic_keeps_integers_exact() -> anyhow::Result<()> {
        assert_eq!(call("+", vec![int(1), int(1)])?, int(2));
        assert_eq!(call("-", vec![int(2), int(1)])?, int(1));
        assert_eq!(call("*", vec![int(2), int(3)])?, int(6));
        assert!(matches!(call("+", vec![int(1), Value::Float(0.5)])?, Value::Float(value) if value == 1.5));
        assert!(matches!(call("*", vec![int(2), int(3)])?, Value::Integer(6)));
        assert_eq!(call("+", vec![Value::Boolean(true), int(1)])?, int(2));
        Ok(())
    }

    #[test]
    fn division_follows_true_and_floor_semantics() -> anyhow::Result<()> {
        assert_eq!(call("/", vec![int(7), int(2)])?, Value::Float(3.5));
        assert!(matches!(call("/", vec![int(4), int(2)])?, Value::Float(_)));
        assert_eq!(call("//", vec![int(7), int(2)])?, int(3));
        assert_eq!(call("//", vec![int(-7), int(2)])?, int(-4));
        assert_eq!(call("//", vec![int(7), int(-2)])?, int(-4));
        assert_eq!(call("//", vec![Value::Float(7.5), int(2)])?, Value::Float(3.0));

        for name in ["/", "//"] {
            let error = call(name, vec![int(1), int(0)]).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Runtime);
        }
        Ok(())
    }

    #[test]
    fn expt_and_overflow() -> anyhow::Result<()> {
        assert_eq!(call("expt", vec![int(2), int(10)])?, int(1024));
        assert_eq!(call("expt", vec![int(2), int(-1)])?, Value::Float(0.5));
        assert_eq!(call("expt", vec![Value::Float(2.0), int(3)])?, Value::Float(8.0));
        assert_eq!(call("expt", vec![int(2), int(64)]).unwrap_err().kind(), ErrorKind::Runtime);
        assert_eq!(call("expt", vec![int(0), int(-1)]).unwrap_err().kind(), ErrorKind::Runtime);
        assert_eq!(call("+", vec![int(i64::MAX), int(1)]).unwrap_err().kind(), ErrorKind::Runtime);
        assert_eq!(call("//", vec![int(i64::MIN), int(-1)]).unwrap_err().kind(), ErrorKind::Runtime);
        Ok(())
    }

    #[test]
    fn comparison_and_trigonometry() -> anyhow::Result<()> {
        assert_eq!(call("<", vec![int(1), int(2)])?, Value::Boolean(true));
        assert_eq!(call("<", vec![Value::Float(2.5), int(2)])?, Value::Boolean(false));
        assert_eq!(call("<", vec![Value::from("a"), Value::from("b")])?, Value::Boolean(true));
        assert_eq!(call("<", vec![Value::from("a"), int(1)]).unwrap_err().kind(), ErrorKind::Runtime);
        assert_eq!(call("sin", vec![int(0)])?, Value::Float(0.0));

        let random = call("random", vec![])?.as_f64().unwrap_or(-1.0);
        assert!((0.0..1.0).contains(&random));
        Ok(())
    }

    #[test]
    fn arity_and_type_mismatches_are_runtime_errors() {
        let cases = [
            ("+", vec![int(1)]),
            ("sin", vec![]),
            ("random", vec![int(1)]),
            ("-", vec![int(1), Value::Nil]),
            ("dict-get", vec![int(1), int(1)]),
            ("dict-new", vec![int(1)]),
        ];

        for (name, values) in cases {
            let error = call(name, values).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Runtime, "{}: {}", name, error);
        }

        let error = call("+", vec![int(1)]).unwrap_err();
        assert_eq!(error.message(), "+() takes 2 arguments but 1 were given");
    }

    #[test]
    fn block_returns_last_value() -> anyhow::Result<()> {
        assert_eq!(call("block", vec![int(1), int(2), int(3)])?, int(3));
        assert_eq!(call("block", vec![])?, Value::Nil);
        Ok(())
    }

    #[test]
    fn dict_primitives() -> anyhow::Result<()> {
        let mapping = call("dict-new", vec![])?;

        assert_eq!(call("dict-in", vec![mapping.clone(), int(1)])?, Value::Boolean(false));
        assert_eq!(call("dict-add", vec![mapping.clone(), int(1), Value::from("one")])?, Value::from("one"));
        assert_eq!(call("dict-in", vec![mapping.clone(), int(1)])?, Value::Boolean(true));
        assert_eq!(call("dict-get", vec![mapping.clone(), Value::Float(1.0)])?, Value::from("one"));

        let error = call("dict-get", vec![mapping, int(2)]).unwrap_err();
        assert_eq!(error, PhonkError::runtime("key not found: 2"));
        Ok(())
    }
}
