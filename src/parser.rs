use core::fmt;
use std::rc::Rc;

use itertools::Itertools;
use logos::Logos;

use crate::error::PhonkError;


#[derive(Debug, Logos)]
#[logos(skip r"\s+|;[^\n]*")]
enum Token<'a> {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[regex(r"[^\s();]+", |lex| lex.slice())]
    Atom(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Symbol(Rc<str>),
}

// Sexps are the basic building blocks of phonk. Lists are reference counted so
// closures can keep their body alive without copying the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    Atom(Literal),
    List(Rc<[Sexp]>),
}

impl Sexp {
    pub fn symbol(name: &str) -> Self {
        Self::Atom(Literal::Symbol(name.into()))
    }

    pub fn list(items: impl IntoIterator<Item = Sexp>) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Atom(Literal::Symbol(name)) => Some(name),
            _ => None,
        }
    }
}

impl From<i64> for Sexp {
    fn from(value: i64) -> Self {
        Self::Atom(Literal::Integer(value))
    }
}

impl From<f64> for Sexp {
    fn from(value: f64) -> Self {
        Self::Atom(Literal::Float(value))
    }
}

/// Formats a float so that it reads back as a float: finite values always
/// carry a `.`.
pub(crate) fn format_float(value: f64) -> String {
    let text = format!("{:?}", value);
    if !value.is_finite() || text.contains('.') {
        return text;
    }

    match text.find('e') {
        Some(index) => format!("{}.0{}", &text[..index], &text[index..]),
        None => format!("{}.0", text),
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Float(value) => f.write_str(&format_float(*value)),
            Self::Symbol(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(literal) => literal.fmt(f),
            Self::List(items) => write!(f, "({})", items.iter().format(" ")),
        }
    }
}

/// Deepest list nesting the parser accepts.
pub const MAX_PARSE_DEPTH: usize = 1000;

type ParseResult<O> = Result<O, PhonkError>;

/// Splits source text into tokens. Comments run from `;` to the end of the
/// line and are dropped. Never fails; malformed input is left for the parser.
pub fn tokenize(input: &str) -> Vec<&str> {
    let mut tokens = vec![];
    let mut lexer = Token::lexer(input);

    while let Some(result) = lexer.next() {
        tokens.push(match result {
            Ok(Token::LeftParen) => "(",
            Ok(Token::RightParen) => ")",
            Ok(Token::Atom(atom)) => atom,
            Err(_) => lexer.slice(),
        });
    }

    tokens
}

/// Classifies a single non-parenthesis token.
pub fn parse_atom(token: &str) -> ParseResult<Literal> {
    let looks_numeric = token.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
        && token != "+"
        && token != "-";

    if !looks_numeric {
        return Ok(Literal::Symbol(token.into()));
    }

    if token.contains('.') {
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Literal::Float(value)),
            Ok(_) => Err(PhonkError::syntax(format!("float literal '{}' is out of range", token))),
            Err(_) => Err(PhonkError::syntax(format!("invalid float literal '{}'", token))),
        }
    } else {
        token.parse()
            .map(Literal::Integer)
            .map_err(|err| PhonkError::syntax(format!("invalid integer literal '{}': {}", token, err)))
    }
}

fn parse_token<'t, 'a: 't>(expected: &'static str) -> impl Fn(&'t [&'a str]) -> ParseResult<&'t [&'a str]> {
    move |tokens| match tokens.split_first() {
        Some((token, rest)) if *token == expected => Ok(rest),
        Some((token, _)) => Err(PhonkError::syntax(format!("expected '{}' but found '{}'", expected, token))),
        None => Err(PhonkError::syntax(format!("unexpected end of input, expected '{}'", expected))),
    }
}

fn parse_until_closing<'t, 'a: 't>(mut tokens: &'t [&'a str], depth: usize) -> ParseResult<(&'t [&'a str], Vec<Sexp>)> {
    let mut result = vec![];

    while tokens.first().is_some_and(|token| *token != ")") {
        let (rest, sexp) = parse_sexp_with_depth(tokens, depth)?;
        result.push(sexp);
        tokens = rest;
    }

    Ok((tokens, result))
}

fn parse_list<'t, 'a: 't>(tokens: &'t [&'a str], depth: usize) -> ParseResult<(&'t [&'a str], Sexp)> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(PhonkError::syntax("maximum nesting depth exceeded"));
    }

    let tokens = parse_token("(")(tokens)?;
    let (tokens, items) = parse_until_closing(tokens, depth + 1)?;
    let tokens = parse_token(")")(tokens)?;

    Ok((tokens, Sexp::List(items.into())))
}

fn parse_sexp_with_depth<'t, 'a: 't>(tokens: &'t [&'a str], depth: usize) -> ParseResult<(&'t [&'a str], Sexp)> {
    match tokens.split_first() {
        None => Err(PhonkError::syntax("unexpected end of input")),
        Some((&"(", _)) => parse_list(tokens, depth),
        Some((&")", _)) => Err(PhonkError::syntax("unexpected ')'")),
        Some((atom, rest)) => Ok((rest, Sexp::Atom(parse_atom(atom)?))),
    }
}

/// Parses exactly one expression from the front of `tokens` and returns the
/// tokens that remain after it. Lists nested deeper than [`MAX_PARSE_DEPTH`]
/// are a syntax error.
pub fn parse_sexp<'t, 'a: 't>(tokens: &'t [&'a str]) -> ParseResult<(&'t [&'a str], Sexp)> {
    parse_sexp_with_depth(tokens, 0)
}

/// Parses source text holding exactly one expression.
pub fn parse(input: &str) -> ParseResult<Sexp> {
    let tokens = tokenize(input);

    let (rest, sexp) = parse_sexp(&tokens)?;
    if let Some(token) = rest.first() {
        return Err(PhonkError::syntax(format!("unexpected trailing input starting at '{}'", token)));
    }

    Ok(sexp)
}

/// Parses every top-level expression in the source text.
pub fn parse_program(input: &str) -> ParseResult<Vec<Sexp>> {
    let tokens = tokenize(input);
    let mut tokens = tokens.as_slice();
    let mut program = vec![];

    while !tokens.is_empty() {
        let (rest, sexp) = parse_sexp(tokens)?;
        program.push(sexp);
        tokens = rest;
    }

    Ok(program)
}
