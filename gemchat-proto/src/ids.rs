//! Identifier types for contacts, messages and senders.

use std::fmt;

use uuid::Uuid;

/// Identifies a contact and, by extension, the conversation held with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactId(String);

impl ContactId {
    /// Create a contact identifier from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the string form of this identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Unique identifier for a message, based on UUID v7 for time-ordering.
///
/// Unique within a session (and well beyond), unlike short random strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new time-ordered message identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a message: the local user or one of the contacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SenderId {
    /// The local user.
    Me,
    /// A contact (human or AI).
    Contact(ContactId),
}

impl SenderId {
    /// Whether the message was written by the local user.
    #[must_use]
    pub const fn is_me(&self) -> bool {
        matches!(self, Self::Me)
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Me => f.write_str("me"),
            Self::Contact(id) => write!(f, "{id}"),
        }
    }
}
