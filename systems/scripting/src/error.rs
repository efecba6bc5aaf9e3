//! Faults raised while loading or running a script.

use thiserror::Error;

use crate::word::UserWordError;

/// Execution fault that ends the current piece's turn.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InterpreterError {
    /// A token matched neither a literal, a built-in, nor a user word.
    #[error("unknown word `{0}`")]
    UnknownWord(String),
    /// A numeric literal does not fit a 64-bit integer.
    #[error("literal `{0}` is out of range")]
    InvalidLiteral(String),
    /// A text literal was opened but never closed.
    #[error("unterminated text literal starting on line {line}")]
    UnterminatedText {
        /// Line on which the literal starts.
        line: usize,
    },
    /// A `(` comment was opened but never closed.
    #[error("unterminated comment starting on line {line}")]
    UnterminatedComment {
        /// Line on which the comment starts.
        line: usize,
    },
    /// A `:` definition lacks its closing `;`.
    #[error("definition of `{0}` is missing its closing `;`")]
    UnterminatedDefinition(String),
    /// A definition started inside another definition.
    #[error("definition nested inside `{0}`")]
    NestedDefinition(String),
    /// A control word appeared without its opening or closing partner.
    #[error("unbalanced control word `{0}`")]
    UnbalancedControl(String),
    /// A definition tried to reuse a built-in or control word's name.
    #[error("`{0}` is reserved and cannot be redefined")]
    ReservedWord(String),
    /// A definition named itself with a literal.
    #[error("`{0}` is not a valid word name")]
    InvalidWordName(String),
    /// Constructing a user word failed.
    #[error(transparent)]
    Definition(#[from] UserWordError),
    /// User words expanded deeper than the configured limit.
    #[error("expansion of `{word}` exceeded the depth limit of {limit}")]
    MacroRecursion {
        /// Word whose expansion crossed the limit.
        word: String,
        /// Configured expansion depth limit.
        limit: usize,
    },
    /// The turn dispatched more tokens than the configured limit.
    #[error("turn exceeded the step limit of {0}")]
    StepLimitExceeded(usize),
    /// A word failed while executing.
    #[error("`{word}` failed: {fault}")]
    WordFailed {
        /// Word or literal being executed.
        word: String,
        /// Underlying fault.
        #[source]
        fault: WordFault,
    },
}

/// Fault raised by a single word while it manipulates the stack.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WordFault {
    /// The word needed more operands than the stack held.
    #[error("stack underflow")]
    StackUnderflow,
    /// Pushing would exceed the configured stack limit.
    #[error("stack overflow beyond {0} values")]
    StackOverflow(usize),
    /// An operand had the wrong type.
    #[error("expected {expected}, found `{found}`")]
    TypeMismatch {
        /// Description of the expected operand.
        expected: &'static str,
        /// Rendering of the operand that was found.
        found: String,
    },
    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Integer arithmetic overflowed.
    #[error("arithmetic overflow")]
    Overflow,
}
