use crate::{
    builtin::builtin_frame,
    environment::Environment,
    error::PhonkError,
    interpreter::{evaluate, Value},
    parser::{parse, parse_program, Sexp},
};

const PRELUDE: &str = include_str!("prelude.phonk");

/// The state of one interpreter session: a global environment made of a
/// frame for user definitions in front of the builtin frame.
///
/// Dropping the context empties the global frame. Closures returned from it
/// keep working afterwards but no longer see global definitions.
pub struct EvaluationContext {
    global: Environment,
}

impl EvaluationContext {
    /// A context with the builtins and the standard library loaded.
    pub fn new() -> Result<Self, PhonkError> {
        let mut context = Self::bare();
        context.evaluate_program(PRELUDE)?;
        Ok(context)
    }

    /// A context with only the builtins.
    pub fn bare() -> Self {
        Self {
            global: Environment::root(builtin_frame()).extend([]),
        }
    }

    pub fn global(&self) -> &Environment {
        &self.global
    }

    pub fn evaluate_sexp(&mut self, sexp: &Sexp) -> Result<Value, PhonkError> {
        evaluate(sexp, &self.global)
    }

    /// Evaluates source text holding exactly one expression.
    pub fn evaluate_str(&mut self, input: &str) -> Result<Value, PhonkError> {
        let sexp = parse(input)?;
        self.evaluate_sexp(&sexp)
    }

    /// Evaluates every top-level expression in order and returns the value of
    /// the last one. Stops at the first error.
    pub fn evaluate_program(&mut self, input: &str) -> Result<Value, PhonkError> {
        let program = parse_program(input)?;

        let mut result = Value::Nil;
        for sexp in &program {
            result = self.evaluate_sexp(sexp)?;
        }
        Ok(result)
    }
}

impl Drop for EvaluationContext {
    fn drop(&mut self) {
        // Global closures capture the global frame, which holds them in turn
        self.global.clear()
    }
}
