//! Integration tests for streamed AI replies.
//!
//! These tests validate:
//! - Fragments accumulate into one placeholder message, one update each
//! - The prompt still moves Sent, Delivered, Read while the reply streams
//! - The contact shows `typing...` while streaming and returns online after
//! - An empty stream is replaced by the fallback text
//! - The history window and persona reach the completion adapter
//! - Switching conversations does not interrupt a running stream

use std::sync::Arc;
use std::time::Duration;

use gemchat::completion::EMPTY_REPLY_FALLBACK;
use gemchat::completion::scripted::ScriptedAdapter;
use gemchat::simulator::{Simulator, SimulatorConfig};
use gemchat::store::{ConversationStore, SessionState, StoreEvent};
use gemchat_proto::contact::{Contact, ContactStatus};
use gemchat_proto::history::Role;
use gemchat_proto::ids::{ContactId, SenderId};
use gemchat_proto::message::{Message, MessageStatus};

const PERSONA: &str = "You are a witty assistant.";

fn ai_id() -> ContactId {
    ContactId::new("gemini-ai")
}

fn alex_id() -> ContactId {
    ContactId::new("alex")
}

/// Store with the AI contact (active) and one human contact.
fn make_store() -> Arc<ConversationStore> {
    Arc::new(ConversationStore::new(SessionState {
        contacts: vec![
            Contact::ai("gemini-ai", "Gemini AI Assistant", "g", Some(PERSONA.into())),
            Contact::human("alex", "Alex Rivera", "a"),
        ],
        active_contact: Some(ai_id()),
        ..SessionState::default()
    }))
}

/// Three fragments, 100ms apart.
fn hi_there_adapter() -> ScriptedAdapter {
    ScriptedAdapter::new(["Hi", " there", "!"]).with_fragment_delay(Duration::from_millis(100))
}

// =============================================================================
// Accumulation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn fragments_accumulate_into_one_reply() {
    let store = make_store();
    let sim = Simulator::new(Arc::clone(&store), Arc::new(hi_there_adapter()), SimulatorConfig::default());
    let mut events = store.subscribe();

    sim.send(&ai_id(), "Hello").unwrap().finished().await;

    let messages = store.messages(&ai_id());
    assert_eq!(messages.len(), 2);
    let reply = &messages[1];
    assert_eq!(reply.text, "Hi there!");
    assert!(reply.is_ai);
    assert_eq!(reply.sender, SenderId::Contact(ai_id()));

    let contact = store.contact(&ai_id()).unwrap();
    assert_eq!(contact.status, ContactStatus::Online);
    assert_eq!(contact.last_message.as_deref(), Some("Hi there!"));

    let texts: Vec<String> = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|event| match event {
            StoreEvent::MessageTextChanged {
                message_id, text, ..
            } if message_id == reply.id => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(texts, ["Hi", "Hi there", "Hi there!"]);
}

#[tokio::test(start_paused = true)]
async fn ai_prompt_status_advances_without_skips() {
    let store = make_store();
    let sim = Simulator::new(Arc::clone(&store), Arc::new(hi_there_adapter()), SimulatorConfig::default());
    let mut events = store.subscribe();

    let lifecycle = sim.send(&ai_id(), "Hello").unwrap();
    let id = lifecycle.message_id;
    lifecycle.finished().await;

    let mut observed = vec![MessageStatus::Sent];
    while let Ok(event) = events.try_recv() {
        if let StoreEvent::MessageStatusChanged {
            message_id, status, ..
        } = event
            && message_id == id
        {
            observed.push(status);
        }
    }
    assert_eq!(
        observed,
        [MessageStatus::Sent, MessageStatus::Delivered, MessageStatus::Read]
    );
    assert_eq!(store.message(&ai_id(), &id).unwrap().status, MessageStatus::Read);
}

#[tokio::test(start_paused = true)]
async fn contact_types_while_streaming() {
    let store = make_store();
    let sim = Simulator::new(Arc::clone(&store), Arc::new(hi_there_adapter()), SimulatorConfig::default());
    let lifecycle = sim.send(&ai_id(), "Hello").unwrap();

    // t = 1.4s: still waiting, no placeholder yet.
    tokio::time::sleep(Duration::from_millis(1400)).await;
    assert_eq!(store.contact(&ai_id()).unwrap().status, ContactStatus::Online);
    assert_eq!(store.messages(&ai_id()).len(), 1);

    // t = 1.65s: typing, first fragment visible.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(store.contact(&ai_id()).unwrap().status, ContactStatus::Typing);
    let partial = store.messages(&ai_id()).pop().unwrap();
    assert_eq!(partial.text, "Hi");
    assert!(partial.is_ai);

    // t = 2s: done.
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(store.contact(&ai_id()).unwrap().status, ContactStatus::Online);
    assert_eq!(store.messages(&ai_id()).pop().unwrap().text, "Hi there!");

    lifecycle.finished().await;
}

#[tokio::test(start_paused = true)]
async fn empty_stream_uses_fallback_text() {
    let store = make_store();
    let sim = Simulator::new(Arc::clone(&store), Arc::new(ScriptedAdapter::silent()), SimulatorConfig::default());

    sim.send(&ai_id(), "Hello").unwrap().finished().await;

    let reply = store.messages(&ai_id()).pop().unwrap();
    assert_eq!(reply.text, EMPTY_REPLY_FALLBACK);
    let contact = store.contact(&ai_id()).unwrap();
    assert_eq!(contact.status, ContactStatus::Online);
    assert_eq!(contact.last_message.as_deref(), Some(EMPTY_REPLY_FALLBACK));
}

// =============================================================================
// Request contents
// =============================================================================

#[tokio::test(start_paused = true)]
async fn history_window_holds_last_ten_prior_messages() {
    let store = make_store();
    let ai = ai_id();
    for i in 0..12 {
        let message = if i % 2 == 0 {
            Message::outgoing(format!("question {i}"))
        } else {
            Message::reply(&ai, format!("answer {i}"))
        };
        store.append_message(&ai, message);
    }
    let adapter = ScriptedAdapter::new(["ok"]);
    let sim = Simulator::new(Arc::clone(&store), Arc::new(adapter.clone()), SimulatorConfig::default());

    sim.send(&ai, "latest").unwrap().finished().await;

    let requests = adapter.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.prompt, "latest");
    assert_eq!(request.system_instruction, PERSONA);
    assert_eq!(request.history.len(), 10);
    assert_eq!(request.history[0].text, "question 2");
    assert_eq!(request.history[0].role, Role::User);
    assert_eq!(request.history[9].text, "answer 11");
    assert_eq!(request.history[9].role, Role::Model);
    assert!(request.history.iter().all(|turn| turn.text != "latest"));
}

#[tokio::test(start_paused = true)]
async fn short_conversation_sends_all_prior_messages() {
    let store = make_store();
    let ai = ai_id();
    store.append_message(&ai, Message::reply(&ai, "Hello! How can I help?"));
    let adapter = ScriptedAdapter::new(["ok"]);
    let sim = Simulator::new(Arc::clone(&store), Arc::new(adapter.clone()), SimulatorConfig::default());

    sim.send(&ai, "What's up?").unwrap().finished().await;

    let history = &adapter.requests()[0].history;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::Model);
}

#[tokio::test(start_paused = true)]
async fn second_message_sees_first_reply_in_history() {
    let store = make_store();
    let ai = ai_id();
    let adapter = ScriptedAdapter::new(["first reply"]);
    let sim = Simulator::new(Arc::clone(&store), Arc::new(adapter.clone()), SimulatorConfig::default());

    sim.send(&ai, "one").unwrap().finished().await;
    sim.send(&ai, "two").unwrap().finished().await;

    let requests = adapter.requests();
    assert_eq!(requests.len(), 2);
    let texts: Vec<&str> = requests[1].history.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, ["one", "first reply"]);
}

// =============================================================================
// Conversation switching
// =============================================================================

#[tokio::test(start_paused = true)]
async fn switching_conversation_mid_stream_keeps_streaming() {
    let store = make_store();
    let sim = Simulator::new(Arc::clone(&store), Arc::new(hi_there_adapter()), SimulatorConfig::default());
    let lifecycle = sim.send(&ai_id(), "Hello").unwrap();

    // First fragment is in, then the user opens another chat.
    tokio::time::sleep(Duration::from_millis(1650)).await;
    assert_eq!(store.messages(&ai_id()).pop().unwrap().text, "Hi");
    store.select_contact(&alex_id());

    lifecycle.finished().await;

    assert_eq!(store.active_contact_id(), Some(alex_id()));
    assert_eq!(store.messages(&ai_id()).pop().unwrap().text, "Hi there!");
    assert!(store.messages(&alex_id()).is_empty());
    assert_eq!(store.contact(&ai_id()).unwrap().status, ContactStatus::Online);
}
