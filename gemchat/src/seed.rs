//! Fixed initial session: the contacts and messages present at startup.

use std::collections::HashMap;

use chrono::{Duration, Utc};

use gemchat_proto::contact::{Contact, ContactStatus};
use gemchat_proto::ids::ContactId;
use gemchat_proto::message::{Message, MessageStatus};

use crate::store::SessionState;

/// Id of the AI contact.
pub const AI_CONTACT_ID: &str = "gemini-ai";

/// Persona instruction for the AI contact.
pub const AI_PERSONA: &str = "You are a helpful and witty WhatsApp assistant. Keep your responses \
     concise and friendly, use emojis occasionally like a real human would in a chat.";

const AI_GREETING: &str = "Hello! I am your AI assistant. How can I help you today?";

/// Build the initial session state. The first contact is selected.
#[must_use]
pub fn initial_state() -> SessionState {
    let now = Utc::now();

    let contacts = vec![
        Contact::ai(
            AI_CONTACT_ID,
            "Gemini AI Assistant",
            "https://picsum.photos/seed/gemini/200",
            Some(AI_PERSONA.to_string()),
        )
        .with_preview(AI_GREETING, now),
        Contact::human(
            "alex-rivera",
            "Alex Rivera",
            "https://picsum.photos/seed/alex/200",
        )
        .with_preview("See you at 7!", now - Duration::hours(1)),
        Contact::human(
            "sarah-chen",
            "Sarah Chen",
            "https://picsum.photos/seed/sarah/200",
        )
        .with_status(ContactStatus::Offline)
        .with_preview("Did you check the new designs?", now - Duration::hours(24)),
        Contact::human(
            "design-group",
            "Product Design Team",
            "https://picsum.photos/seed/team/200",
        )
        .with_preview("The presentation looks great!", now - Duration::hours(48)),
    ];

    let ai = ContactId::new(AI_CONTACT_ID);
    let alex = ContactId::new("alex-rivera");

    let mut greeting = Message::reply(&ai, AI_GREETING).at(now - Duration::seconds(10));
    greeting.is_ai = true;

    let mut dinner_reply = Message::outgoing("Yes! See you at 7!").at(now - Duration::hours(1));
    dinner_reply.status = MessageStatus::Read;

    let conversations = HashMap::from([
        (ai.clone(), vec![greeting]),
        (
            alex.clone(),
            vec![
                Message::reply(&alex, "Hey, are we still on for dinner?")
                    .at(now - Duration::hours(2)),
                dinner_reply,
            ],
        ),
    ]);

    SessionState {
        active_contact: contacts.first().map(|c| c.id.clone()),
        contacts,
        conversations,
    }
}
