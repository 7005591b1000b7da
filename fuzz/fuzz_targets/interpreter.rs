#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// Builtins, prelude functions and variables
#[derive(Arbitrary, Debug)]
enum PhonkAtom {
    Add, Sub, Mul, Div, DivInt, Expt,
    Sin, Random, Less, Block,
    True, False,
    DictNew, DictIn, DictAdd, DictGet,

    Fact, Fib, Sqrt, Cached, MakeAdder,

    Identifier(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for PhonkAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            PhonkAtom::Add => "+",
            PhonkAtom::Sub => "-",
            PhonkAtom::Mul => "*",
            PhonkAtom::Div => "/",
            PhonkAtom::DivInt => "//",
            PhonkAtom::Expt => "expt",
            PhonkAtom::Sin => "sin",
            PhonkAtom::Random => "random",
            PhonkAtom::Less => "<",
            PhonkAtom::Block => "block",
            PhonkAtom::True => "True",
            PhonkAtom::False => "False",
            PhonkAtom::DictNew => "dict-new",
            PhonkAtom::DictIn => "dict-in",
            PhonkAtom::DictAdd => "dict-add",
            PhonkAtom::DictGet => "dict-get",
            PhonkAtom::Fact => "fact",
            PhonkAtom::Fib => "fib",
            PhonkAtom::Sqrt => "sqrt",
            PhonkAtom::Cached => "cached",
            PhonkAtom::MakeAdder => "make_adder",
            PhonkAtom::Identifier(identifier) => identifier,
            PhonkAtom::Integer(value) => return write!(f, "{}", value),
            PhonkAtom::Float(value) => return write!(f, "{:?}", value),
        })
    }
}

#[derive(Arbitrary, Debug)]
enum PhonkCommand {
    Sto(Vec<PhonkCommand>),
    Phonk(Vec<PhonkCommand>),
    If(Vec<PhonkCommand>),
    Call(Vec<PhonkCommand>),

    Atom(PhonkAtom),
}

fn stringify_arguments(values: &[PhonkCommand]) -> String {
    values.iter()
        .map(PhonkCommand::to_string)
        .join(" ")
}

impl fmt::Display for PhonkCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhonkCommand::Atom(atom) => atom.fmt(f),
            PhonkCommand::Call(args) => write!(f, "({})", stringify_arguments(args)),
            PhonkCommand::Sto(args) => write!(f, "(sto {})", stringify_arguments(args)),
            PhonkCommand::Phonk(args) => write!(f, "(phonk {})", stringify_arguments(args)),
            PhonkCommand::If(args) => write!(f, "(if {})", stringify_arguments(args)),
        }
    }
}

fuzz_target!(|commands: Vec<PhonkCommand>| {
    let Ok(mut context) = phonk::EvaluationContext::new() else { return };

    for command in commands {
        let command = command.to_string();
        let _ = context.evaluate_str(&command);
    }
});
