//! Case-insensitive word table shared by built-ins and user definitions.

use std::{collections::HashMap, fmt, rc::Rc};

use crate::{machine::Machine, word::UserWord, Flow, InterpreterError, WordFault};

/// Words the execution loop handles itself and that can never be redefined.
pub(crate) const CONTROL_WORDS: [&str; 7] = [":", ";", "if", "else", "then", "begin", "until"];

/// Native implementation of a built-in word.
pub(crate) type Builtin = fn(&mut Machine<'_>) -> Result<Flow, WordFault>;

/// Meaning bound to a dictionary name.
#[derive(Clone)]
pub(crate) enum Entry {
    Builtin(Builtin),
    Macro(Rc<UserWord>),
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(_) => f.write_str("Builtin"),
            Self::Macro(word) => f.debug_tuple("Macro").field(word).finish(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Dictionary {
    entries: HashMap<String, Entry>,
}

impl Dictionary {
    pub(crate) fn with_builtins() -> Self {
        let mut dictionary = Self::default();
        crate::builtins::register(&mut dictionary);
        dictionary
    }

    pub(crate) fn insert_builtin(&mut self, name: &'static str, builtin: Builtin) {
        let _ = self.entries.insert(name.to_owned(), Entry::Builtin(builtin));
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&Entry> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    pub(crate) fn is_builtin(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some(Entry::Builtin(_)))
    }

    pub(crate) fn is_reserved(&self, name: &str) -> bool {
        CONTROL_WORDS
            .iter()
            .any(|control| control.eq_ignore_ascii_case(name))
            || self.is_builtin(name)
    }

    pub(crate) fn user_word(&self, name: &str) -> Option<&UserWord> {
        match self.lookup(name)? {
            Entry::Macro(word) => Some(word),
            Entry::Builtin(_) => None,
        }
    }

    /// Binds a user word, overwriting the tokens of an earlier definition.
    pub(crate) fn define(&mut self, word: UserWord) -> Result<(), InterpreterError> {
        if self.is_reserved(word.name()) {
            return Err(InterpreterError::ReservedWord(word.name().to_owned()));
        }

        let key = word.name().to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some(Entry::Macro(existing)) => {
                log::trace!("redefining `{}`", word.name());
                Rc::make_mut(existing).set_tokens(word.into_tokens());
            }
            _ => {
                let _ = self.entries.insert(key, Entry::Macro(Rc::new(word)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Token;

    #[test]
    fn builtins_and_control_words_are_reserved() {
        let dictionary = Dictionary::with_builtins();
        assert!(dictionary.is_reserved("DUP"));
        assert!(dictionary.is_reserved("then"));
        assert!(!dictionary.is_reserved("advance"));

        let mut dictionary = dictionary;
        let word = UserWord::new("Swap", vec![Token::Number(1)]).expect("valid name");
        assert_eq!(
            dictionary.define(word),
            Err(InterpreterError::ReservedWord("Swap".to_owned()))
        );
    }

    #[test]
    fn redefinition_keeps_snapshots_untouched() {
        let mut dictionary = Dictionary::with_builtins();
        let first = UserWord::new("step", vec![Token::Number(1)]).expect("valid name");
        dictionary.define(first).expect("define");
        let snapshot = dictionary.clone();

        let second = UserWord::new("STEP", vec![Token::Number(2)]).expect("valid name");
        dictionary.define(second).expect("redefine");

        let current = dictionary.user_word("step").expect("defined");
        assert_eq!(current.tokens(), &[Token::Number(2)]);
        assert_eq!(current.name(), "step");
        let earlier = snapshot.user_word("step").expect("defined");
        assert_eq!(earlier.tokens(), &[Token::Number(1)]);
    }
}
