use core::fmt;

use thiserror::Error;

/// The category of a [PhonkError], usable for matching without looking
/// at the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    Name,
    MalformedExpression,
    Runtime,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Syntax => "SyntaxError",
            Self::Name => "NameError",
            Self::MalformedExpression => "MalformedExpression",
            Self::Runtime => "RuntimeError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhonkError {
    /// Unbalanced parentheses or a malformed numeric literal
    #[error("SyntaxError: {0}")]
    SyntaxError(String),

    /// A symbol that is not bound in any frame of the environment
    #[error("NameError: name '{0}' is not defined")]
    NameError(String),

    /// A list that is neither a special form nor an application of a callable
    #[error("MalformedExpression: {0}")]
    MalformedExpression(String),

    /// Failures raised while running builtins or calling closures
    #[error("RuntimeError: {0}")]
    RuntimeError(String),
}

impl PhonkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SyntaxError(_) => ErrorKind::Syntax,
            Self::NameError(_) => ErrorKind::Name,
            Self::MalformedExpression(_) => ErrorKind::MalformedExpression,
            Self::RuntimeError(_) => ErrorKind::Runtime,
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            Self::NameError(name) => format!("name '{}' is not defined", name),
            Self::SyntaxError(message)
            | Self::MalformedExpression(message)
            | Self::RuntimeError(message) => message.clone(),
        }
    }

    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::SyntaxError(message.into())
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedExpression(message.into())
    }

    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        Self::RuntimeError(message.into())
    }
}
