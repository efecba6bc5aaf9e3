//! Values held on the operand stack.

use std::fmt;

use crate::WordFault;

/// Operand stack entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Signed integer. Flags are represented as `1` and `0`.
    Int(i64),
    /// Text, used for identifiers and message payloads.
    Text(String),
}

impl Value {
    /// Canonical true flag.
    pub const TRUE: Value = Value::Int(1);
    /// Canonical false flag.
    pub const FALSE: Value = Value::Int(0);

    /// Converts a boolean into a flag value.
    #[must_use]
    pub fn flag(value: bool) -> Self {
        if value {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }

    /// Nonzero integers and non-empty text are true.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Int(value) => *value != 0,
            Self::Text(text) => !text.is_empty(),
        }
    }

    /// Extracts the integer or reports a type mismatch.
    pub fn into_int(self) -> Result<i64, WordFault> {
        match self {
            Self::Int(value) => Ok(value),
            Self::Text(text) => Err(WordFault::TypeMismatch {
                expected: "an integer",
                found: format!("\"{text}\""),
            }),
        }
    }

    /// Renders the value as text, turning integers into their decimal form.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Text(text) => text,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
