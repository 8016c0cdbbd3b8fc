//! Chat message model and delivery status.
//!
//! A [`Message`] belongs to exactly one conversation (keyed by contact id).
//! Its text only changes while an AI reply is streaming in, and its
//! [`MessageStatus`] only ever moves forward.

use chrono::{DateTime, Utc};

use crate::ids::{ContactId, MessageId, SenderId};

/// Maximum allowed outgoing message length in bytes (64 KB).
pub const MAX_MESSAGE_LEN: usize = 64 * 1024;

/// Errors from validating user input before it becomes a message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The text is empty or whitespace only.
    #[error("message is empty")]
    Empty,

    /// The text exceeds [`MAX_MESSAGE_LEN`].
    #[error("message too large: {size} bytes (max {max} bytes)")]
    TooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },
}

/// Check that user input can be sent.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] for blank input and
/// [`ValidationError::TooLarge`] for input over [`MAX_MESSAGE_LEN`].
pub fn validate_outgoing(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    if text.len() > MAX_MESSAGE_LEN {
        return Err(ValidationError::TooLarge {
            size: text.len(),
            max: MAX_MESSAGE_LEN,
        });
    }
    Ok(())
}

/// Delivery status of a message.
///
/// Ordered `Sent < Delivered < Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageStatus {
    /// Handed off, not yet delivered.
    Sent,
    /// Delivered to the contact.
    Delivered,
    /// Read by the contact.
    Read,
}

impl MessageStatus {
    /// Whether moving from `self` to `next` is a forward transition.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        next > self
    }

    /// Tick glyph shown next to outgoing messages.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Sent => "\u{2713}",
            Self::Delivered | Self::Read => "\u{2713}\u{2713}",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Delivered => write!(f, "delivered"),
            Self::Read => write!(f, "read"),
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Message body.
    pub text: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Author of the message.
    pub sender: SenderId,
    /// Delivery status.
    pub status: MessageStatus,
    /// Whether the body was produced by the language model.
    pub is_ai: bool,
}

impl Message {
    /// A message written by the local user, starting in [`MessageStatus::Sent`].
    pub fn outgoing(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            timestamp: Utc::now(),
            sender: SenderId::Me,
            status: MessageStatus::Sent,
            is_ai: false,
        }
    }

    /// A reply from a contact. Replies are already read when they appear.
    pub fn reply(contact: &ContactId, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            timestamp: Utc::now(),
            sender: SenderId::Contact(contact.clone()),
            status: MessageStatus::Read,
            is_ai: false,
        }
    }

    /// An empty AI reply bubble that streamed fragments are written into.
    #[must_use]
    pub fn ai_placeholder(contact: &ContactId) -> Self {
        Self {
            is_ai: true,
            ..Self::reply(contact, String::new())
        }
    }

    /// Override the creation time (seed data).
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether the local user wrote this message.
    #[must_use]
    pub const fn is_outgoing(&self) -> bool {
        self.sender.is_me()
    }
}
