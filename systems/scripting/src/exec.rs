//! Token stream execution and load-time structure checks.

use std::{collections::VecDeque, rc::Rc};

use crate::{
    dictionary::{Dictionary, Entry},
    machine::Machine,
    word::{UserWord, UserWordError},
    Flow, InterpreterConfig, InterpreterError, Token, Value,
};

/// Item waiting in the execution stream.
#[derive(Debug)]
enum Pending {
    /// Token to dispatch, tagged with the expansion depth it came from.
    Token { token: Token, depth: usize },
    /// Loop test marking the end of a `begin ... until` body.
    Repeat { body: Rc<[Token]>, depth: usize },
}

/// Runs one turn's worth of tokens against a machine.
pub(crate) struct Executor<'d> {
    dictionary: &'d mut Dictionary,
    config: InterpreterConfig,
    pending: VecDeque<Pending>,
    steps: usize,
}

impl<'d> Executor<'d> {
    pub(crate) fn new(
        dictionary: &'d mut Dictionary,
        config: InterpreterConfig,
        tokens: Vec<Token>,
    ) -> Self {
        let pending = tokens
            .into_iter()
            .map(|token| Pending::Token { token, depth: 0 })
            .collect();
        Self {
            dictionary,
            config,
            pending,
            steps: 0,
        }
    }

    /// Dispatches pending items until the stream drains or a word halts.
    pub(crate) fn run(mut self, machine: &mut Machine<'_>) -> Result<Flow, InterpreterError> {
        while let Some(item) = self.pending.pop_front() {
            self.steps += 1;
            if self.steps > self.config.step_limit {
                return Err(InterpreterError::StepLimitExceeded(self.config.step_limit));
            }

            let flow = match item {
                Pending::Token { token, depth } => self.dispatch(token, depth, machine)?,
                Pending::Repeat { body, depth } => {
                    let done = machine.pop().map_err(|fault| InterpreterError::WordFailed {
                        word: "until".to_owned(),
                        fault,
                    })?;
                    if !done.is_truthy() {
                        self.schedule_loop(body, depth);
                    }
                    Flow::Continue
                }
            };

            if flow == Flow::Halt {
                log::trace!("halted after {} steps", self.steps);
                return Ok(Flow::Halt);
            }
        }
        log::trace!("stream drained after {} steps", self.steps);
        Ok(Flow::Continue)
    }

    fn dispatch(
        &mut self,
        token: Token,
        depth: usize,
        machine: &mut Machine<'_>,
    ) -> Result<Flow, InterpreterError> {
        let name = match token {
            Token::Number(value) => return push_literal(machine, Value::Int(value)),
            Token::Text(text) => return push_literal(machine, Value::Text(text)),
            Token::Word(name) => name,
        };

        match name.to_ascii_lowercase().as_str() {
            ":" => self.define_from_stream()?,
            "if" => {
                let flag = machine.pop().map_err(|fault| InterpreterError::WordFailed {
                    word: name.clone(),
                    fault,
                })?;
                if !flag.is_truthy() {
                    self.skip_branch(true)?;
                }
            }
            "else" => self.skip_branch(false)?,
            "then" => {}
            "begin" => {
                let body = self.collect_loop()?;
                self.schedule_loop(body, depth);
            }
            ";" | "until" => return Err(InterpreterError::UnbalancedControl(name)),
            _ => return self.invoke(name, depth, machine),
        }
        Ok(Flow::Continue)
    }

    fn invoke(
        &mut self,
        name: String,
        depth: usize,
        machine: &mut Machine<'_>,
    ) -> Result<Flow, InterpreterError> {
        let word = match self.dictionary.lookup(&name) {
            Some(Entry::Builtin(builtin)) => {
                return builtin(machine)
                    .map_err(|fault| InterpreterError::WordFailed { word: name, fault });
            }
            Some(Entry::Macro(word)) => Rc::clone(word),
            None => return Err(InterpreterError::UnknownWord(name)),
        };

        let depth = depth + 1;
        if depth > self.config.expansion_depth {
            return Err(InterpreterError::MacroRecursion {
                word: word.name().to_owned(),
                limit: self.config.expansion_depth,
            });
        }
        for token in word.tokens().iter().rev() {
            self.pending.push_front(Pending::Token {
                token: token.clone(),
                depth,
            });
        }
        Ok(Flow::Continue)
    }

    fn next_token(&mut self) -> Option<Token> {
        match self.pending.pop_front()? {
            Pending::Token { token, .. } => Some(token),
            Pending::Repeat { .. } => None,
        }
    }

    fn define_from_stream(&mut self) -> Result<(), InterpreterError> {
        let name = self
            .next_token()
            .ok_or_else(|| InterpreterError::UnterminatedDefinition(String::new()))?;
        let name = definition_name(&name)?;

        let mut body = Vec::new();
        loop {
            match self.next_token() {
                Some(token) if token.is_word(";") => break,
                Some(token) if token.is_word(":") => {
                    return Err(InterpreterError::NestedDefinition(name));
                }
                Some(token) => body.push(token),
                None => return Err(InterpreterError::UnterminatedDefinition(name)),
            }
        }

        log::trace!("defining `{name}` with {} tokens", body.len());
        self.dictionary.define(UserWord::new(name, body)?)
    }

    /// Drops tokens up to the `then` closing the current branch, or up to its
    /// `else` when `stop_at_else` is set.
    fn skip_branch(&mut self, stop_at_else: bool) -> Result<(), InterpreterError> {
        let mut nesting = 0_usize;
        while let Some(token) = self.next_token() {
            if token.is_word("if") {
                nesting += 1;
            } else if token.is_word("then") {
                if nesting == 0 {
                    return Ok(());
                }
                nesting -= 1;
            } else if stop_at_else && nesting == 0 && token.is_word("else") {
                return Ok(());
            }
        }
        Err(InterpreterError::UnbalancedControl("if".to_owned()))
    }

    fn collect_loop(&mut self) -> Result<Rc<[Token]>, InterpreterError> {
        let mut body = Vec::new();
        let mut nesting = 0_usize;
        while let Some(token) = self.next_token() {
            if token.is_word("begin") {
                nesting += 1;
            } else if token.is_word("until") {
                if nesting == 0 {
                    return Ok(body.into());
                }
                nesting -= 1;
            }
            body.push(token);
        }
        Err(InterpreterError::UnbalancedControl("begin".to_owned()))
    }

    fn schedule_loop(&mut self, body: Rc<[Token]>, depth: usize) {
        self.pending.push_front(Pending::Repeat {
            body: Rc::clone(&body),
            depth,
        });
        for token in body.iter().rev() {
            self.pending.push_front(Pending::Token {
                token: token.clone(),
                depth,
            });
        }
    }
}

fn push_literal(machine: &mut Machine<'_>, value: Value) -> Result<Flow, InterpreterError> {
    let word = value.to_string();
    machine
        .push(value)
        .map_err(|fault| InterpreterError::WordFailed { word, fault })?;
    Ok(Flow::Continue)
}

/// Name introduced by the token following `:`.
fn definition_name(token: &Token) -> Result<String, InterpreterError> {
    match token {
        Token::Word(name) if name == ";" => Err(UserWordError::EmptyName.into()),
        Token::Word(name) => Ok(name.clone()),
        other => Err(InterpreterError::InvalidWordName(other.to_string())),
    }
}

/// Verifies that definitions and control words pair up before anything runs.
///
/// Every definition body must balance on its own, so expanding a user word
/// never closes a construct opened outside of it.
pub(crate) fn check_structure(
    tokens: &[Token],
    dictionary: &Dictionary,
) -> Result<(), InterpreterError> {
    let mut control: Vec<&'static str> = Vec::new();
    let mut definition: Option<(String, usize)> = None;
    let mut tokens = tokens.iter();

    while let Some(token) = tokens.next() {
        let Some(word) = token.word() else {
            continue;
        };
        let floor = definition.as_ref().map_or(0, |(_, floor)| *floor);

        match word.to_ascii_lowercase().as_str() {
            ":" => {
                if let Some((name, _)) = &definition {
                    return Err(InterpreterError::NestedDefinition(name.clone()));
                }
                let name = tokens
                    .next()
                    .ok_or_else(|| InterpreterError::UnterminatedDefinition(String::new()))?;
                let name = definition_name(name)?;
                if dictionary.is_reserved(&name) {
                    return Err(InterpreterError::ReservedWord(name));
                }
                definition = Some((name, control.len()));
            }
            ";" => match definition.take() {
                Some((_, floor)) if floor == control.len() => {}
                Some(_) => return Err(unbalanced(&control)),
                None => return Err(InterpreterError::UnbalancedControl(word.to_owned())),
            },
            "if" => control.push("if"),
            "begin" => control.push("begin"),
            "else" => {
                let open = control.len() > floor;
                match control.last_mut() {
                    Some(top) if open && *top == "if" => *top = "else",
                    _ => return Err(InterpreterError::UnbalancedControl(word.to_owned())),
                }
            }
            "then" => {
                if control.len() <= floor || !matches!(control.pop(), Some("if" | "else")) {
                    return Err(InterpreterError::UnbalancedControl(word.to_owned()));
                }
            }
            "until" => {
                if control.len() <= floor || control.pop() != Some("begin") {
                    return Err(InterpreterError::UnbalancedControl(word.to_owned()));
                }
            }
            _ => {}
        }
    }

    if let Some((name, _)) = definition {
        return Err(InterpreterError::UnterminatedDefinition(name));
    }
    if control.is_empty() {
        Ok(())
    } else {
        Err(unbalanced(&control))
    }
}

/// Verifies a body bound outside of a script the same way `: ... ;` bodies are.
pub(crate) fn check_definition(
    word: &UserWord,
    dictionary: &Dictionary,
) -> Result<(), InterpreterError> {
    for token in word.tokens() {
        if token.is_word(":") {
            return Err(InterpreterError::NestedDefinition(word.name().to_owned()));
        }
        if token.is_word(";") {
            return Err(InterpreterError::UnbalancedControl(";".to_owned()));
        }
    }
    check_structure(word.tokens(), dictionary)
}

fn unbalanced(control: &[&str]) -> InterpreterError {
    let open = control.last().copied().unwrap_or(";");
    InterpreterError::UnbalancedControl(open.to_owned())
}
