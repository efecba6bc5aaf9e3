//! Splits script text into tokens.

use std::fmt;

use crate::InterpreterError;

/// Smallest unit of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// Integer literal.
    Number(i64),
    /// Text literal written between double quotes.
    Text(String),
    /// Word name, resolved against the dictionary when executed.
    Word(String),
}

impl Token {
    /// Returns the word name when the token is a word.
    #[must_use]
    pub fn word(&self) -> Option<&str> {
        match self {
            Self::Word(name) => Some(name),
            Self::Number(_) | Self::Text(_) => None,
        }
    }

    /// Reports whether the token is the provided word, ignoring case.
    #[must_use]
    pub fn is_word(&self, name: &str) -> bool {
        self.word()
            .is_some_and(|word| word.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "\"{text}\""),
            Self::Word(name) => f.write_str(name),
        }
    }
}

/// Splits script text into whitespace-delimited tokens.
///
/// `( ... )` and `\` comments are dropped. Text literals run from a `"` to
/// the next `"` and may contain whitespace.
pub fn tokenize(source: &str) -> Result<Vec<Token>, InterpreterError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;

    while let Some(&next) = chars.peek() {
        if next.is_whitespace() {
            if next == '\n' {
                line += 1;
            }
            let _ = chars.next();
            continue;
        }

        if next == '"' {
            let start = line;
            let _ = chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(ch) => {
                        if ch == '\n' {
                            line += 1;
                        }
                        text.push(ch);
                    }
                    None => return Err(InterpreterError::UnterminatedText { line: start }),
                }
            }
            tokens.push(Token::Text(text));
            continue;
        }

        let mut raw = String::new();
        while let Some(&ch) = chars.peek() {
            if ch.is_whitespace() {
                break;
            }
            raw.push(ch);
            let _ = chars.next();
        }

        match raw.as_str() {
            "(" => {
                let start = line;
                loop {
                    match chars.next() {
                        Some(')') => break,
                        Some('\n') => line += 1,
                        Some(_) => {}
                        None => return Err(InterpreterError::UnterminatedComment { line: start }),
                    }
                }
            }
            "\\" => {
                for ch in chars.by_ref() {
                    if ch == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            _ => tokens.push(classify(raw)?),
        }
    }

    Ok(tokens)
}

fn classify(raw: String) -> Result<Token, InterpreterError> {
    let digits = raw.strip_prefix('-').unwrap_or(&raw);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Ok(Token::Word(raw));
    }
    raw.parse()
        .map(Token::Number)
        .map_err(|_| InterpreterError::InvalidLiteral(raw))
}
