//! Contact model and presence status.

use chrono::{DateTime, Utc};

use crate::ids::ContactId;

/// Presence status of a contact as shown in the sidebar and chat header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactStatus {
    /// Contact is available.
    Online,
    /// Contact is not connected.
    Offline,
    /// Contact is composing a reply.
    Typing,
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
            Self::Typing => write!(f, "typing..."),
        }
    }
}

/// Whether a contact is a person or backed by the completion service.
///
/// Only AI contacts carry a persona instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactKind {
    /// A regular contact answering with a canned reply.
    Human,
    /// A contact whose replies are generated by the language model.
    Ai {
        /// System prompt sent with every completion request.
        persona_instruction: Option<String>,
    },
}

/// A contact in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Contact identity.
    pub id: ContactId,
    /// Display name.
    pub name: String,
    /// Avatar image reference (never fetched by the terminal client).
    pub avatar: String,
    /// Current presence status.
    pub status: ContactStatus,
    /// Preview of the last message in the conversation.
    pub last_message: Option<String>,
    /// When the preview was last refreshed.
    pub last_message_time: Option<DateTime<Utc>>,
    /// Human or AI.
    pub kind: ContactKind,
}

impl Contact {
    /// Create a human contact with no preview.
    pub fn human(id: impl Into<String>, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            id: ContactId::new(id),
            name: name.into(),
            avatar: avatar.into(),
            status: ContactStatus::Online,
            last_message: None,
            last_message_time: None,
            kind: ContactKind::Human,
        }
    }

    /// Create an AI contact with an optional persona instruction.
    pub fn ai(
        id: impl Into<String>,
        name: impl Into<String>,
        avatar: impl Into<String>,
        persona_instruction: Option<String>,
    ) -> Self {
        Self {
            kind: ContactKind::Ai {
                persona_instruction,
            },
            ..Self::human(id, name, avatar)
        }
    }

    /// Set the initial presence status.
    #[must_use]
    pub fn with_status(mut self, status: ContactStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the initial preview text and time.
    #[must_use]
    pub fn with_preview(mut self, text: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.last_message = Some(text.into());
        self.last_message_time = Some(at);
        self
    }

    /// Whether replies from this contact come from the language model.
    #[must_use]
    pub const fn is_ai(&self) -> bool {
        matches!(self.kind, ContactKind::Ai { .. })
    }

    /// The persona instruction, if this is an AI contact that has one.
    #[must_use]
    pub fn persona_instruction(&self) -> Option<&str> {
        match &self.kind {
            ContactKind::Ai {
                persona_instruction,
            } => persona_instruction.as_deref(),
            ContactKind::Human => None,
        }
    }

    /// Case-insensitive substring match on the display name.
    ///
    /// An empty query matches every contact.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}
