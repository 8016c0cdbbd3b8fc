//! Conversation turns as seen by the completion service.

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Who authored a turn from the model's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The local user.
    User,
    /// The contact being replied for.
    Model,
}

/// One prior message handed to the completion service as context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    /// Author role.
    pub role: Role,
    /// Message body.
    pub text: String,
}

impl HistoryTurn {
    /// Create a turn.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Map a stored message: the local user is `user`, every contact is `model`.
    #[must_use]
    pub fn from_message(message: &Message) -> Self {
        let role = if message.is_outgoing() {
            Role::User
        } else {
            Role::Model
        };
        Self::new(role, message.text.clone())
    }
}
