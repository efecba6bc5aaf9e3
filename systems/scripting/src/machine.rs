//! Mutable state a running script manipulates.

use hexbots_core::{BoardView, Command, HexCoord, HexDirection, Piece, PieceSnapshot};
use hexbots_system_mailbox::MailboxLookup;

use crate::{Value, WordFault};

/// Operand stack plus the collaborators reachable during one turn.
pub(crate) struct Machine<'a> {
    stack: Vec<Value>,
    stack_limit: usize,
    pub(crate) piece: &'a mut Piece,
    pub(crate) board: &'a BoardView,
    pub(crate) mailboxes: &'a mut dyn MailboxLookup,
    pub(crate) commands: &'a mut Vec<Command>,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(
        piece: &'a mut Piece,
        board: &'a BoardView,
        mailboxes: &'a mut dyn MailboxLookup,
        commands: &'a mut Vec<Command>,
        stack: Vec<Value>,
        stack_limit: usize,
    ) -> Self {
        Self {
            stack,
            stack_limit,
            piece,
            board,
            mailboxes,
            commands,
        }
    }

    pub(crate) fn into_stack(self) -> Vec<Value> {
        self.stack
    }

    pub(crate) fn clear_stack(&mut self) {
        self.stack.clear();
    }

    pub(crate) fn push(&mut self, value: impl Into<Value>) -> Result<(), WordFault> {
        if self.stack.len() >= self.stack_limit {
            return Err(WordFault::StackOverflow(self.stack_limit));
        }
        self.stack.push(value.into());
        Ok(())
    }

    pub(crate) fn push_flag(&mut self, flag: bool) -> Result<(), WordFault> {
        self.push(Value::flag(flag))
    }

    pub(crate) fn pop(&mut self) -> Result<Value, WordFault> {
        self.stack.pop().ok_or(WordFault::StackUnderflow)
    }

    pub(crate) fn pop_int(&mut self) -> Result<i64, WordFault> {
        self.pop()?.into_int()
    }

    pub(crate) fn pop_text(&mut self) -> Result<String, WordFault> {
        Ok(self.pop()?.into_text())
    }

    /// Pops the top two operands, returning them in push order.
    pub(crate) fn pop_pair(&mut self) -> Result<(Value, Value), WordFault> {
        if self.stack.len() < 2 {
            return Err(WordFault::StackUnderflow);
        }
        let second = self.pop()?;
        let first = self.pop()?;
        Ok((first, second))
    }

    pub(crate) fn pop_int_pair(&mut self) -> Result<(i64, i64), WordFault> {
        let (first, second) = self.pop_pair()?;
        Ok((first.into_int()?, second.into_int()?))
    }

    /// Copy of the operand `depth` places below the top.
    pub(crate) fn peek(&self, depth: usize) -> Result<Value, WordFault> {
        self.stack
            .len()
            .checked_sub(depth + 1)
            .and_then(|index| self.stack.get(index))
            .cloned()
            .ok_or(WordFault::StackUnderflow)
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Absolute direction for a direction relative to the piece's facing.
    pub(crate) fn heading(&self, relative: i64) -> HexDirection {
        self.piece.heading(relative)
    }

    /// Piece other than the acting one standing on `cell` in the snapshot.
    pub(crate) fn other_occupant(&self, cell: HexCoord) -> Option<&PieceSnapshot> {
        self.board
            .occupant(cell)
            .filter(|snapshot| &snapshot.id != self.piece.id())
    }
}
