//! Conversation store: the single owner of session state.
//!
//! [`ConversationStore`] keeps every contact, every conversation and the
//! active contact pointer behind one mutex. The simulator and the UI share
//! it as `Arc<ConversationStore>` and funnel all mutation through its
//! methods, so overlapping lifecycles never lose updates.
//!
//! Unknown contact or message ids are silent no-ops: scheduled work may
//! outlive the moment it was scheduled for, and there is nothing useful to
//! report to the user.
//!
//! Every mutation emits a [`StoreEvent`] on a broadcast channel so that
//! readers (the render loop, tests) can observe each intermediate state,
//! including every step of a streaming reply.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use gemchat_proto::contact::{Contact, ContactStatus};
use gemchat_proto::history::HistoryTurn;
use gemchat_proto::ids::{ContactId, MessageId};
use gemchat_proto::message::{Message, MessageStatus};

/// Capacity of the change-notification channel.
const EVENT_BUFFER: usize = 1024;

/// Complete session state. Built once from seed data, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// All contacts, in sidebar order.
    pub contacts: Vec<Contact>,
    /// Messages per contact, in insertion order.
    pub conversations: HashMap<ContactId, Vec<Message>>,
    /// Currently selected contact.
    pub active_contact: Option<ContactId>,
}

impl SessionState {
    fn contact_mut(&mut self, id: &ContactId) -> Option<&mut Contact> {
        self.contacts.iter_mut().find(|c| c.id == *id)
    }

    fn message_mut(&mut self, contact_id: &ContactId, message_id: &MessageId) -> Option<&mut Message> {
        self.conversations
            .get_mut(contact_id)?
            .iter_mut()
            .find(|m| m.id == *message_id)
    }
}

/// Change notifications emitted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The selected contact changed.
    ActiveContactChanged {
        /// New selection.
        contact_id: ContactId,
    },
    /// A message was appended to a conversation.
    MessageAppended {
        /// Conversation the message belongs to.
        contact_id: ContactId,
        /// The new message.
        message_id: MessageId,
    },
    /// A message's delivery status advanced.
    MessageStatusChanged {
        /// Conversation the message belongs to.
        contact_id: ContactId,
        /// The message whose status changed.
        message_id: MessageId,
        /// The new status.
        status: MessageStatus,
    },
    /// A message's text was replaced (streaming accumulation).
    MessageTextChanged {
        /// Conversation the message belongs to.
        contact_id: ContactId,
        /// The message whose text changed.
        message_id: MessageId,
        /// Full text after the update.
        text: String,
    },
    /// A contact's presence status (and possibly preview) changed.
    ContactStatusChanged {
        /// The contact.
        contact_id: ContactId,
        /// The new status.
        status: ContactStatus,
    },
}

/// Race-free mutation primitives over [`SessionState`].
pub struct ConversationStore {
    state: Mutex<SessionState>,
    events: broadcast::Sender<StoreEvent>,
}

impl ConversationStore {
    /// Create a store owning the given initial state.
    #[must_use]
    pub fn new(state: SessionState) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            state: Mutex::new(state),
            events,
        }
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine; the state itself is the source of truth.
        let _ = self.events.send(event);
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Set the active contact. Unknown ids are accepted; readers then see
    /// no active contact.
    pub fn select_contact(&self, id: &ContactId) {
        self.state.lock().active_contact = Some(id.clone());
        tracing::debug!(contact_id = %id, "contact selected");
        self.emit(StoreEvent::ActiveContactChanged {
            contact_id: id.clone(),
        });
    }

    /// Append a message to a conversation, creating the conversation if needed.
    pub fn append_message(&self, contact_id: &ContactId, message: Message) {
        let message_id = message.id;
        self.state
            .lock()
            .conversations
            .entry(contact_id.clone())
            .or_default()
            .push(message);
        tracing::debug!(contact_id = %contact_id, message_id = %message_id, "message appended");
        self.emit(StoreEvent::MessageAppended {
            contact_id: contact_id.clone(),
            message_id,
        });
    }

    /// Advance a message's delivery status.
    ///
    /// Returns `false` without changing anything when the message is
    /// unknown or `status` is not ahead of the current one.
    pub fn update_message_status(
        &self,
        contact_id: &ContactId,
        message_id: &MessageId,
        status: MessageStatus,
    ) -> bool {
        {
            let mut state = self.state.lock();
            let Some(message) = state.message_mut(contact_id, message_id) else {
                tracing::debug!(contact_id = %contact_id, message_id = %message_id, "status update for unknown message ignored");
                return false;
            };
            if !message.status.can_advance_to(status) {
                tracing::debug!(
                    message_id = %message_id,
                    current = %message.status,
                    requested = %status,
                    "status downgrade refused"
                );
                return false;
            }
            message.status = status;
        }
        self.emit(StoreEvent::MessageStatusChanged {
            contact_id: contact_id.clone(),
            message_id: *message_id,
            status,
        });
        true
    }

    /// Replace a message's text in place.
    ///
    /// Returns `false` when the message is unknown.
    pub fn update_message_text(
        &self,
        contact_id: &ContactId,
        message_id: &MessageId,
        text: &str,
    ) -> bool {
        {
            let mut state = self.state.lock();
            let Some(message) = state.message_mut(contact_id, message_id) else {
                tracing::debug!(contact_id = %contact_id, message_id = %message_id, "text update for unknown message ignored");
                return false;
            };
            text.clone_into(&mut message.text);
        }
        self.emit(StoreEvent::MessageTextChanged {
            contact_id: contact_id.clone(),
            message_id: *message_id,
            text: text.to_owned(),
        });
        true
    }

    /// Update a contact's status. A non-empty `preview` also replaces the
    /// preview text and refreshes its time.
    pub fn set_contact_status(
        &self,
        contact_id: &ContactId,
        status: ContactStatus,
        preview: Option<&str>,
    ) {
        {
            let mut state = self.state.lock();
            let Some(contact) = state.contact_mut(contact_id) else {
                tracing::debug!(contact_id = %contact_id, "status update for unknown contact ignored");
                return;
            };
            contact.status = status;
            if let Some(text) = preview.filter(|t| !t.is_empty()) {
                contact.last_message = Some(text.to_owned());
                contact.last_message_time = Some(Utc::now());
            }
        }
        tracing::debug!(contact_id = %contact_id, %status, "contact status changed");
        self.emit(StoreEvent::ContactStatusChanged {
            contact_id: contact_id.clone(),
            status,
        });
    }

    /// Refresh only the preview text and time of a contact.
    pub fn set_last_message(&self, contact_id: &ContactId, preview: &str) {
        let status = {
            let mut state = self.state.lock();
            let Some(contact) = state.contact_mut(contact_id) else {
                return;
            };
            contact.last_message = Some(preview.to_owned());
            contact.last_message_time = Some(Utc::now());
            contact.status
        };
        self.emit(StoreEvent::ContactStatusChanged {
            contact_id: contact_id.clone(),
            status,
        });
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All contacts in sidebar order.
    #[must_use]
    pub fn contacts(&self) -> Vec<Contact> {
        self.state.lock().contacts.clone()
    }

    /// Contacts whose name matches `query` (case-insensitive).
    #[must_use]
    pub fn search_contacts(&self, query: &str) -> Vec<Contact> {
        self.state
            .lock()
            .contacts
            .iter()
            .filter(|c| c.matches_search(query))
            .cloned()
            .collect()
    }

    /// Look up a single contact.
    #[must_use]
    pub fn contact(&self, id: &ContactId) -> Option<Contact> {
        self.state.lock().contacts.iter().find(|c| c.id == *id).cloned()
    }

    /// The selected contact id, known or not.
    #[must_use]
    pub fn active_contact_id(&self) -> Option<ContactId> {
        self.state.lock().active_contact.clone()
    }

    /// The selected contact, if it exists.
    #[must_use]
    pub fn active_contact(&self) -> Option<Contact> {
        let state = self.state.lock();
        let id = state.active_contact.as_ref()?;
        state.contacts.iter().find(|c| c.id == *id).cloned()
    }

    /// Messages of a conversation in insertion order (empty if none).
    #[must_use]
    pub fn messages(&self, contact_id: &ContactId) -> Vec<Message> {
        self.state
            .lock()
            .conversations
            .get(contact_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Look up a single message.
    #[must_use]
    pub fn message(&self, contact_id: &ContactId, message_id: &MessageId) -> Option<Message> {
        self.state
            .lock()
            .conversations
            .get(contact_id)?
            .iter()
            .find(|m| m.id == *message_id)
            .cloned()
    }

    /// Up to `limit` most recent non-empty messages strictly before
    /// `before`, oldest first, as completion history.
    ///
    /// Returns an empty history if `before` is not in the conversation.
    #[must_use]
    pub fn history_before(
        &self,
        contact_id: &ContactId,
        before: &MessageId,
        limit: usize,
    ) -> Vec<HistoryTurn> {
        let state = self.state.lock();
        let Some(messages) = state.conversations.get(contact_id) else {
            return Vec::new();
        };
        let Some(end) = messages.iter().position(|m| m.id == *before) else {
            return Vec::new();
        };
        let prior: Vec<&Message> = messages[..end]
            .iter()
            .filter(|m| !m.text.is_empty())
            .collect();
        prior[prior.len().saturating_sub(limit)..]
            .iter()
            .map(|m| HistoryTurn::from_message(m))
            .collect()
    }

    /// A full copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }
}
