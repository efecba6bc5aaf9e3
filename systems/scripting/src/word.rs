//! User-defined words.

use thiserror::Error;

use crate::Token;

/// Reasons a user word cannot be constructed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UserWordError {
    /// The word was given an empty name.
    #[error("user word names must not be empty")]
    EmptyName,
}

/// Name bound to a token sequence that is spliced in wherever the name appears.
///
/// Expansion is textual: the tokens replace the name in the running stream,
/// so a user word has no frame of its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserWord {
    name: String,
    tokens: Vec<Token>,
}

impl UserWord {
    /// Creates a user word, rejecting empty or blank names.
    pub fn new(name: impl Into<String>, tokens: Vec<Token>) -> Result<Self, UserWordError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(UserWordError::EmptyName);
        }
        Ok(Self { name, tokens })
    }

    /// Name the word was defined with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tokens the name expands to.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Replaces the expansion, used when a script redefines the word.
    pub fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
    }

    pub(crate) fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}
