#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded per-piece mailboxes and the match-wide directory that routes
//! messages between them.
//!
//! Every piece owns exactly one [`Mailbox`]. Messages are stored in arrival
//! order and tagged with the sender's identifier; receiving is FIFO per
//! sender, so several senders interleave independently. A mailbox never grows
//! past its capacity: deliveries to a full mailbox are rejected rather than
//! queued.

use std::{collections::VecDeque, fmt};

use hexbots_core::{PieceId, MESSAGE_SEPARATOR};
use thiserror::Error;

/// Capacity assigned to mailboxes when the match does not configure one.
pub const DEFAULT_CAPACITY: usize = 8;

/// Reasons a message could not be delivered.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// No mailbox belongs to the requested recipient.
    #[error("no mailbox belongs to `{0}`")]
    UnknownRecipient(String),
    /// The recipient's mailbox is at capacity.
    #[error("mailbox of `{0}` is full")]
    Full(String),
    /// A raw message lacked the sender separator.
    #[error("message `{0}` lacks the `@` sender separator")]
    MissingSeparator(String),
    /// A mailbox for the owner already exists.
    #[error("a mailbox for `{0}` already exists")]
    DuplicateOwner(String),
}

/// Single queued message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    sender: String,
    payload: String,
}

impl Message {
    /// Creates a message from its parts.
    #[must_use]
    pub fn new(sender: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            payload: payload.into(),
        }
    }

    /// Parses the `<sender>@<payload>` wire format.
    ///
    /// The first separator splits the message; later ones belong to the
    /// payload.
    pub fn decode(raw: &str) -> Result<Self, MailboxError> {
        let (sender, payload) = raw
            .split_once(MESSAGE_SEPARATOR)
            .ok_or_else(|| MailboxError::MissingSeparator(raw.to_owned()))?;
        Ok(Self::new(sender, payload))
    }

    /// Renders the message in the `<sender>@<payload>` wire format.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Identifier of the sending piece.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Body of the message.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    fn is_from(&self, sender: &str) -> bool {
        !sender.is_empty() && self.sender.eq_ignore_ascii_case(sender)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{MESSAGE_SEPARATOR}{}", self.sender, self.payload)
    }
}

/// Bounded inbound message queue owned by one piece.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mailbox {
    owner: PieceId,
    capacity: usize,
    messages: VecDeque<Message>,
}

impl Mailbox {
    /// Creates an empty mailbox for `owner` holding at most `capacity` messages.
    #[must_use]
    pub fn new(owner: PieceId, capacity: usize) -> Self {
        Self {
            owner,
            capacity,
            messages: VecDeque::with_capacity(capacity),
        }
    }

    /// Piece that owns the mailbox.
    #[must_use]
    pub fn owner(&self) -> &PieceId {
        &self.owner
    }

    /// Maximum number of queued messages.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Reports whether no message is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Reports whether further deliveries would be rejected.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.messages.len() >= self.capacity
    }

    /// Reports whether a message from `sender` is queued, ignoring case.
    #[must_use]
    pub fn has_message(&self, sender: &str) -> bool {
        self.messages.iter().any(|message| message.is_from(sender))
    }

    /// Removes and returns the payload of the oldest message from `sender`.
    pub fn receive_message(&mut self, sender: &str) -> Option<String> {
        let index = self
            .messages
            .iter()
            .position(|message| message.is_from(sender))?;
        self.messages
            .remove(index)
            .map(|message| message.payload)
    }

    /// Parses a raw `<sender>@<payload>` message and queues it.
    pub fn add_message(&mut self, raw: &str) -> Result<(), MailboxError> {
        let message = Message::decode(raw)?;
        self.deliver(message)
    }

    /// Queues an already parsed message.
    pub fn deliver(&mut self, message: Message) -> Result<(), MailboxError> {
        if self.is_full() {
            return Err(MailboxError::Full(self.owner.to_string()));
        }
        log::trace!("mailbox {} accepted {message}", self.owner);
        self.messages.push_back(message);
        Ok(())
    }

    /// Drops every queued message regardless of sender.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Iterator over queued messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }
}

/// Capability to resolve a piece identifier into its mailbox.
///
/// Scripts receive this capability for the duration of a turn instead of
/// reaching into global match state.
pub trait MailboxLookup {
    /// Returns the mailbox owned by `id`, ignoring case.
    fn mailbox(&self, id: &str) -> Option<&Mailbox>;

    /// Returns the mailbox owned by `id` for mutation, ignoring case.
    fn mailbox_mut(&mut self, id: &str) -> Option<&mut Mailbox>;
}

/// Delivers `payload` from `sender` to the mailbox of `recipient`.
///
/// Nothing is delivered when the recipient is unknown or its mailbox is full.
pub fn send_message(
    sender: &PieceId,
    lookup: &mut dyn MailboxLookup,
    recipient: &str,
    payload: &str,
) -> Result<(), MailboxError> {
    let Some(mailbox) = lookup.mailbox_mut(recipient) else {
        log::debug!("{sender} addressed unknown recipient `{recipient}`");
        return Err(MailboxError::UnknownRecipient(recipient.to_owned()));
    };
    mailbox.deliver(Message::new(sender.as_str(), payload))
}

/// Every mailbox in a match, keyed by owner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MailboxDirectory {
    mailboxes: Vec<Mailbox>,
}

impl MailboxDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a mailbox for `owner`.
    pub fn open(&mut self, owner: PieceId, capacity: usize) -> Result<(), MailboxError> {
        if self.mailbox(owner.as_str()).is_some() {
            return Err(MailboxError::DuplicateOwner(owner.to_string()));
        }
        self.mailboxes.push(Mailbox::new(owner, capacity));
        Ok(())
    }

    /// Sends a message on behalf of `sender`.
    pub fn send(
        &mut self,
        sender: &PieceId,
        recipient: &str,
        payload: &str,
    ) -> Result<(), MailboxError> {
        send_message(sender, self, recipient, payload)
    }

    /// Number of open mailboxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    /// Reports whether no mailbox is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }

    /// Iterator over mailboxes in the order they were opened.
    pub fn iter(&self) -> impl Iterator<Item = &Mailbox> {
        self.mailboxes.iter()
    }
}

impl MailboxLookup for MailboxDirectory {
    fn mailbox(&self, id: &str) -> Option<&Mailbox> {
        self.mailboxes
            .iter()
            .find(|mailbox| mailbox.owner.matches(id))
    }

    fn mailbox_mut(&mut self, id: &str) -> Option<&mut Mailbox> {
        self.mailboxes
            .iter_mut()
            .find(|mailbox| mailbox.owner.matches(id))
    }
}
