//! Message lifecycle simulator.
//!
//! [`Simulator::send`] drives one outgoing message through its whole
//! lifecycle:
//!
//! 1. Validate the text and the contact, then append the message (`Sent`).
//! 2. Delivery task: `Sent -> Delivered` at [`SimulatorConfig::delivered_after`],
//!    `Delivered -> Read` at [`SimulatorConfig::read_after`].
//! 3. Reply task: a canned reply for human contacts, or a streamed
//!    completion for AI contacts written fragment by fragment into a
//!    placeholder message.
//!
//! Both tasks capture the contact id and message ids by value when they are
//! spawned; they never consult the active contact. Nothing cancels them:
//! switching conversations leaves in-flight lifecycles running.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use gemchat_proto::contact::{Contact, ContactStatus};
use gemchat_proto::history::HistoryTurn;
use gemchat_proto::ids::{ContactId, MessageId};
use gemchat_proto::message::{Message, MessageStatus, ValidationError, validate_outgoing};

use crate::completion::{CompletionAdapter, CompletionRequest, EMPTY_REPLY_FALLBACK};
use crate::store::ConversationStore;

/// Reply sent by every human contact.
pub const CANNED_REPLY: &str = "That sounds cool! I'm a bit busy now, let's talk later.";

/// Errors rejected before a lifecycle starts. Nothing is mutated.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The text is empty or too large.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The target contact does not exist.
    #[error("unknown contact: {0}")]
    UnknownContact(ContactId),
}

/// Timing and reply settings for the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Offset from send at which the message becomes `Delivered`.
    pub delivered_after: Duration,
    /// Offset from send at which the message becomes `Read`.
    pub read_after: Duration,
    /// Delay before an AI contact starts typing.
    pub ai_reply_delay: Duration,
    /// Delay before a human contact starts typing.
    pub reply_think_delay: Duration,
    /// How long a human contact types before the reply appears.
    pub reply_typing_delay: Duration,
    /// Number of prior messages sent to the completion service.
    pub history_window: usize,
    /// Stream AI replies fragment by fragment; otherwise use the
    /// single-shot completion.
    pub streaming: bool,
    /// Reply text for human contacts.
    pub canned_reply: String,
    /// Replacement text when an AI reply comes back empty. `None` leaves
    /// the reply empty.
    pub empty_reply_fallback: Option<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            delivered_after: Duration::from_secs(1),
            read_after: Duration::from_secs(2),
            ai_reply_delay: Duration::from_millis(1500),
            reply_think_delay: Duration::from_secs(2),
            reply_typing_delay: Duration::from_secs(3),
            history_window: 10,
            streaming: true,
            canned_reply: CANNED_REPLY.to_string(),
            empty_reply_fallback: Some(EMPTY_REPLY_FALLBACK.to_string()),
        }
    }
}

/// Handles to the background work of one sent message.
#[derive(Debug)]
pub struct Lifecycle {
    /// The outgoing message.
    pub message_id: MessageId,
    /// The conversation it was sent to.
    pub contact_id: ContactId,
    delivery: JoinHandle<()>,
    reply: JoinHandle<()>,
}

impl Lifecycle {
    /// Wait until the status transitions and the reply have completed.
    pub async fn finished(self) {
        for (task, handle) in [("delivery", self.delivery), ("reply", self.reply)] {
            if let Err(err) = handle.await {
                tracing::warn!(
                    message_id = %self.message_id,
                    task,
                    error = %err,
                    "lifecycle task did not complete"
                );
            }
        }
    }
}

/// Drives sent messages through delivery, read and reply.
pub struct Simulator<A: CompletionAdapter> {
    store: Arc<ConversationStore>,
    adapter: Arc<A>,
    config: Arc<SimulatorConfig>,
}

impl<A: CompletionAdapter> Clone for Simulator<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            adapter: Arc::clone(&self.adapter),
            config: Arc::clone(&self.config),
        }
    }
}

impl<A: CompletionAdapter> Simulator<A> {
    /// Create a simulator over a shared store and adapter.
    #[must_use]
    pub fn new(store: Arc<ConversationStore>, adapter: Arc<A>, config: SimulatorConfig) -> Self {
        Self {
            store,
            adapter,
            config: Arc::new(config),
        }
    }

    /// The store this simulator mutates.
    #[must_use]
    pub const fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Send `text` to `contact_id` and start its lifecycle.
    ///
    /// Must be called from within a Tokio runtime; the delivery and reply
    /// tasks are spawned onto it.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Validation`] for empty or oversized text and
    /// [`SendError::UnknownContact`] if the contact does not exist. In both
    /// cases no state is changed.
    pub fn send(&self, contact_id: &ContactId, text: &str) -> Result<Lifecycle, SendError> {
        validate_outgoing(text)?;
        let contact = self
            .store
            .contact(contact_id)
            .ok_or_else(|| SendError::UnknownContact(contact_id.clone()))?;

        let message = Message::outgoing(text);
        let message_id = message.id;
        let sent_at = Instant::now();
        self.store.append_message(contact_id, message);
        self.store.set_last_message(contact_id, text);
        tracing::info!(
            contact_id = %contact_id,
            message_id = %message_id,
            ai = contact.is_ai(),
            "message sent"
        );

        // Captured now: the prompt must not see later messages.
        let history = self
            .store
            .history_before(contact_id, &message_id, self.config.history_window);

        let delivery = tokio::spawn(self.clone().advance_status(
            contact_id.clone(),
            message_id,
            sent_at,
        ));
        let reply = if contact.is_ai() {
            tokio::spawn(self.clone().ai_reply(contact, history, text.to_string()))
        } else {
            tokio::spawn(self.clone().canned_reply(contact.id))
        };

        Ok(Lifecycle {
            message_id,
            contact_id: contact_id.clone(),
            delivery,
            reply,
        })
    }

    /// Timer-driven `Sent -> Delivered -> Read`.
    async fn advance_status(self, contact_id: ContactId, message_id: MessageId, sent_at: Instant) {
        for (offset, status) in [
            (self.config.delivered_after, MessageStatus::Delivered),
            (self.config.read_after, MessageStatus::Read),
        ] {
            tokio::time::sleep_until(sent_at + offset).await;
            if self
                .store
                .update_message_status(&contact_id, &message_id, status)
            {
                tracing::debug!(message_id = %message_id, %status, "status advanced");
            }
        }
    }

    /// Human contact: think, type, reply with the canned text.
    async fn canned_reply(self, contact_id: ContactId) {
        tokio::time::sleep(self.config.reply_think_delay).await;
        self.store
            .set_contact_status(&contact_id, ContactStatus::Typing, None);

        tokio::time::sleep(self.config.reply_typing_delay).await;
        let text = self.config.canned_reply.clone();
        self.store
            .append_message(&contact_id, Message::reply(&contact_id, text.as_str()));
        self.store
            .set_contact_status(&contact_id, ContactStatus::Online, Some(&text));
    }

    /// AI contact: type, then fill a placeholder from the completion service.
    async fn ai_reply(self, contact: Contact, history: Vec<HistoryTurn>, prompt: String) {
        tokio::time::sleep(self.config.ai_reply_delay).await;
        let contact_id = contact.id.clone();
        self.store
            .set_contact_status(&contact_id, ContactStatus::Typing, None);

        let placeholder = Message::ai_placeholder(&contact_id);
        let reply_id = placeholder.id;
        self.store.append_message(&contact_id, placeholder);

        let request = CompletionRequest::new(contact.persona_instruction(), history, prompt);
        let mut text = String::new();
        let mut fragments = 0usize;

        if self.config.streaming {
            let mut stream = self.adapter.stream(request);
            while let Some(fragment) = stream.next().await {
                text.push_str(&fragment);
                fragments += 1;
                self.store.update_message_text(&contact_id, &reply_id, &text);
            }
        } else {
            text = self.adapter.complete(request).await;
            fragments = 1;
            self.store.update_message_text(&contact_id, &reply_id, &text);
        }

        if text.is_empty()
            && let Some(fallback) = &self.config.empty_reply_fallback
        {
            tracing::warn!(contact_id = %contact_id, "completion produced no text, using fallback");
            text.clone_from(fallback);
            self.store.update_message_text(&contact_id, &reply_id, &text);
        }

        tracing::info!(
            contact_id = %contact_id,
            message_id = %reply_id,
            fragments,
            len = text.len(),
            "ai reply finished"
        );
        self.store
            .set_contact_status(&contact_id, ContactStatus::Online, Some(&text));
    }
}
