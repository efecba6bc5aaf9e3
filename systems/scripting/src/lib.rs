#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stack-based scripting system that drives a single piece's turn.
//!
//! Every piece owns an [`Interpreter`]. At the start of its turn the piece's
//! script is tokenized and structurally checked (the loading phase), then its
//! tokens are consumed one at a time against an operand stack (the running
//! phase). Built-in words read the piece's own state, query the board
//! snapshot, queue world commands such as shots, and exchange mailbox
//! messages. User words defined with `: name ... ;` expand inline.
//!
//! A fault discards everything the turn produced: queued commands are
//! truncated and definitions made during the turn are rolled back. The world
//! restores the piece and mailboxes from its own checkpoint.

mod builtins;
mod dictionary;
mod error;
mod exec;
mod machine;
mod token;
mod value;
mod word;

use hexbots_core::{BoardView, Command, Piece, PieceId};
use hexbots_system_mailbox::MailboxLookup;
use serde::{Deserialize, Serialize};

use crate::{
    dictionary::Dictionary,
    exec::{check_definition, check_structure, Executor},
    machine::Machine,
};

pub use error::{InterpreterError, WordFault};
pub use token::{tokenize, Token};
pub use value::Value;
pub use word::{UserWord, UserWordError};

/// Limits that bound the work a single turn may perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Maximum number of dispatched stream items per turn, expansions included.
    pub step_limit: usize,
    /// Maximum nesting of user word expansions.
    pub expansion_depth: usize,
    /// Maximum number of values on the operand stack.
    pub stack_limit: usize,
}

impl InterpreterConfig {
    /// Default number of dispatched items per turn.
    pub const DEFAULT_STEP_LIMIT: usize = 10_000;
    /// Default user word expansion depth.
    pub const DEFAULT_EXPANSION_DEPTH: usize = 64;
    /// Default operand stack size.
    pub const DEFAULT_STACK_LIMIT: usize = 1024;
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            step_limit: Self::DEFAULT_STEP_LIMIT,
            expansion_depth: Self::DEFAULT_EXPANSION_DEPTH,
            stack_limit: Self::DEFAULT_STACK_LIMIT,
        }
    }
}

/// Stage of the interpreter within a turn.
///
/// `run_turn` holds the interpreter mutably for the whole turn, so callers
/// only ever observe [`Phase::Halted`] between turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Script text is being tokenized and checked.
    Loading,
    /// Tokens are being consumed.
    Running,
    /// No turn is in progress.
    Halted,
}

/// Control signal returned by every dispatched word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Halt,
}

/// Collaborators lent to the interpreter for the duration of one turn.
pub struct TurnContext<'a> {
    /// Piece whose script is running.
    pub piece: &'a mut Piece,
    /// Board snapshot captured when the turn began.
    pub board: &'a BoardView,
    /// Mailboxes of every piece in the match.
    pub mailboxes: &'a mut dyn MailboxLookup,
}

/// How a turn's script finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Every token was consumed.
    Completed,
    /// The script executed `end`.
    Ended,
    /// The script faulted; its commands and definitions were discarded.
    Faulted(InterpreterError),
}

impl TurnOutcome {
    /// Reports whether the turn must be discarded.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Faulted(_))
    }
}

/// Script interpreter owned by a single piece.
#[derive(Debug)]
pub struct Interpreter {
    owner: PieceId,
    config: InterpreterConfig,
    dictionary: Dictionary,
    stack: Vec<Value>,
    phase: Phase,
}

impl Interpreter {
    /// Creates an interpreter for `owner` with only the built-in words defined.
    #[must_use]
    pub fn new(owner: PieceId, config: InterpreterConfig) -> Self {
        Self {
            owner,
            config,
            dictionary: Dictionary::with_builtins(),
            stack: Vec::new(),
            phase: Phase::Halted,
        }
    }

    /// Piece the interpreter belongs to.
    #[must_use]
    pub fn owner(&self) -> &PieceId {
        &self.owner
    }

    /// Limits applied to each turn.
    #[must_use]
    pub const fn config(&self) -> InterpreterConfig {
        self.config
    }

    /// Current phase, always [`Phase::Halted`] outside of `run_turn`.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Operand stack as the last turn left it, bottom first.
    #[must_use]
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Reports whether `name` is a built-in word, ignoring case.
    #[must_use]
    pub fn is_builtin(&self, name: &str) -> bool {
        self.dictionary.is_builtin(name)
    }

    /// Returns the user word bound to `name`, ignoring case.
    #[must_use]
    pub fn user_word(&self, name: &str) -> Option<&UserWord> {
        self.dictionary.user_word(name)
    }

    /// Binds a user word ahead of any turn, for example from a shared library.
    ///
    /// The body must balance on its own and may not contain `:` or `;`.
    pub fn define(&mut self, word: UserWord) -> Result<(), InterpreterError> {
        check_definition(&word, &self.dictionary)?;
        self.dictionary.define(word)
    }

    /// Tokenizes and structurally checks `script` without running it.
    ///
    /// Returns the number of tokens. Unknown words are not reported since a
    /// script may define them before use.
    pub fn check(&self, script: &str) -> Result<usize, InterpreterError> {
        let tokens = tokenize(script)?;
        check_structure(&tokens, &self.dictionary)?;
        Ok(tokens.len())
    }

    /// Runs `script` as the owner's turn.
    ///
    /// Shots and other world mutations are appended to `out`. On a fault the
    /// commands appended during this turn are removed again and definitions
    /// return to their state before the turn.
    pub fn run_turn(
        &mut self,
        script: &str,
        context: TurnContext<'_>,
        out: &mut Vec<Command>,
    ) -> TurnOutcome {
        let start = out.len();
        let saved = self.dictionary.clone();
        log::debug!("{} begins its script", self.owner);

        let result = self.run(script, context, out);
        self.phase = Phase::Halted;

        match result {
            Ok(Flow::Continue) => TurnOutcome::Completed,
            Ok(Flow::Halt) => TurnOutcome::Ended,
            Err(error) => {
                log::debug!("{} faulted: {error}", self.owner);
                out.truncate(start);
                self.dictionary = saved;
                TurnOutcome::Faulted(error)
            }
        }
    }

    fn run(
        &mut self,
        script: &str,
        context: TurnContext<'_>,
        out: &mut Vec<Command>,
    ) -> Result<Flow, InterpreterError> {
        self.phase = Phase::Loading;
        let tokens = tokenize(script)?;
        check_structure(&tokens, &self.dictionary)?;

        self.phase = Phase::Running;
        let mut stack = std::mem::take(&mut self.stack);
        stack.clear();
        let TurnContext {
            piece,
            board,
            mailboxes,
        } = context;
        let mut machine = Machine::new(
            piece,
            board,
            mailboxes,
            out,
            stack,
            self.config.stack_limit,
        );
        let result = Executor::new(&mut self.dictionary, self.config, tokens).run(&mut machine);
        self.stack = machine.into_stack();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexbots_core::{HexCoord, PieceKind, Team};
    use hexbots_system_mailbox::MailboxDirectory;

    fn id(name: &str) -> PieceId {
        PieceId::new(name).expect("valid id")
    }

    fn run(interpreter: &mut Interpreter, script: &str) -> TurnOutcome {
        let mut piece = Piece::new(
            id("solo"),
            Team::new("red"),
            PieceKind::Scout,
            HexCoord::ORIGIN,
            0,
        );
        piece.begin_turn();
        let board = BoardView::from_snapshots(3, Vec::new());
        let mut mailboxes = MailboxDirectory::new();
        let mut out = Vec::new();
        interpreter.run_turn(
            script,
            TurnContext {
                piece: &mut piece,
                board: &board,
                mailboxes: &mut mailboxes,
            },
            &mut out,
        )
    }

    #[test]
    fn phase_returns_to_halted() {
        let mut interpreter = Interpreter::new(id("solo"), InterpreterConfig::default());
        assert_eq!(interpreter.phase(), Phase::Halted);
        assert_eq!(run(&mut interpreter, "1 2 +"), TurnOutcome::Completed);
        assert_eq!(interpreter.phase(), Phase::Halted);
        assert_eq!(interpreter.stack(), &[Value::Int(3)]);
        assert!(run(&mut interpreter, "drop drop").is_fault());
        assert_eq!(interpreter.phase(), Phase::Halted);
    }

    #[test]
    fn stack_starts_empty_each_turn() {
        let mut interpreter = Interpreter::new(id("solo"), InterpreterConfig::default());
        let _ = run(&mut interpreter, "7 8");
        let _ = run(&mut interpreter, "depth");
        assert_eq!(interpreter.stack(), &[Value::Int(0)]);
    }

    #[test]
    fn definitions_survive_between_turns() {
        let mut interpreter = Interpreter::new(id("solo"), InterpreterConfig::default());
        assert_eq!(run(&mut interpreter, ": twice 2 * ;"), TurnOutcome::Completed);
        assert_eq!(run(&mut interpreter, "21 twice"), TurnOutcome::Completed);
        assert_eq!(interpreter.stack(), &[Value::Int(42)]);
    }

    fn words(source: &str) -> Vec<Token> {
        tokenize(source).expect("tokenize")
    }

    #[test]
    fn predefined_words_run_like_script_definitions() {
        let mut interpreter = Interpreter::new(id("solo"), InterpreterConfig::default());
        let word = UserWord::new("sign", words("dup 0 < if drop -1 else 0 > then")).expect("word");
        interpreter.define(word).expect("define");

        assert_eq!(run(&mut interpreter, "-5 sign 9 sign"), TurnOutcome::Completed);
        assert_eq!(interpreter.stack(), &[Value::Int(-1), Value::Int(1)]);
    }

    #[test]
    fn predefined_words_must_balance_on_their_own() {
        let mut interpreter = Interpreter::new(id("solo"), InterpreterConfig::default());
        let open_if = UserWord::new("opener", words("if")).expect("word");
        assert_eq!(
            interpreter.define(open_if),
            Err(InterpreterError::UnbalancedControl("if".to_owned()))
        );

        let closer = UserWord::new("closer", words(";")).expect("word");
        assert_eq!(
            interpreter.define(closer),
            Err(InterpreterError::UnbalancedControl(";".to_owned()))
        );

        let nested = UserWord::new("outer", words(": inner 1 ;")).expect("word");
        assert_eq!(
            interpreter.define(nested),
            Err(InterpreterError::NestedDefinition("outer".to_owned()))
        );

        let reserved = UserWord::new("DUP", words("1")).expect("word");
        assert_eq!(
            interpreter.define(reserved),
            Err(InterpreterError::ReservedWord("DUP".to_owned()))
        );
        assert!(interpreter.user_word("opener").is_none());
        assert_eq!(
            run(&mut interpreter, "1 opener"),
            TurnOutcome::Faulted(InterpreterError::UnknownWord("opener".to_owned()))
        );
    }

    #[test]
    fn faulted_turn_rolls_back_definitions() {
        let mut interpreter = Interpreter::new(id("solo"), InterpreterConfig::default());
        let outcome = run(&mut interpreter, ": ghost 1 ; nonsense");
        assert_eq!(
            outcome,
            TurnOutcome::Faulted(InterpreterError::UnknownWord("nonsense".to_owned()))
        );
        assert!(interpreter.user_word("ghost").is_none());
    }
}
