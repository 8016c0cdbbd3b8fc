//! Integration tests for overlapping lifecycles.
//!
//! These tests validate:
//! - Lifecycles for different contacts never write into each other's
//!   conversation
//! - Two quick messages to one contact both complete, in send order
//! - Concurrent sends from many tasks lose no messages

use std::sync::Arc;
use std::time::Duration;

use gemchat::completion::scripted::ScriptedAdapter;
use gemchat::simulator::{CANNED_REPLY, Simulator, SimulatorConfig};
use gemchat::store::{ConversationStore, SessionState};
use gemchat_proto::contact::{Contact, ContactStatus};
use gemchat_proto::ids::{ContactId, SenderId};
use gemchat_proto::message::MessageStatus;

fn make_simulator(adapter: ScriptedAdapter) -> Simulator<ScriptedAdapter> {
    make_simulator_with(adapter, SimulatorConfig::default())
}

fn make_simulator_with(adapter: ScriptedAdapter, config: SimulatorConfig) -> Simulator<ScriptedAdapter> {
    let store = Arc::new(ConversationStore::new(SessionState {
        contacts: vec![
            Contact::ai("gemini-ai", "Gemini AI Assistant", "g", None),
            Contact::human("alex", "Alex Rivera", "a"),
            Contact::human("sarah", "Sarah Chen", "s"),
        ],
        active_contact: Some(ContactId::new("gemini-ai")),
        ..SessionState::default()
    }));
    Simulator::new(store, Arc::new(adapter), config)
}

#[tokio::test(start_paused = true)]
async fn overlapping_lifecycles_stay_in_their_conversations() {
    let sim = make_simulator(
        ScriptedAdapter::new(["Sure", ", happy", " to help"]).with_fragment_delay(Duration::from_millis(200)),
    );
    let ai = ContactId::new("gemini-ai");
    let alex = ContactId::new("alex");
    let store = Arc::clone(sim.store());

    let to_ai = sim.send(&ai, "Can you help?").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    store.select_contact(&alex);
    let to_alex = sim.send(&alex, "Hey Alex").unwrap();

    to_ai.finished().await;
    to_alex.finished().await;

    let ai_messages = store.messages(&ai);
    assert_eq!(ai_messages.len(), 2);
    assert_eq!(ai_messages[0].text, "Can you help?");
    assert_eq!(ai_messages[1].text, "Sure, happy to help");
    assert!(
        ai_messages
            .iter()
            .all(|m| m.sender == SenderId::Me || m.sender == SenderId::Contact(ai.clone()))
    );

    let alex_messages = store.messages(&alex);
    assert_eq!(alex_messages.len(), 2);
    assert_eq!(alex_messages[0].text, "Hey Alex");
    assert_eq!(alex_messages[1].text, CANNED_REPLY);
    assert!(!alex_messages[1].is_ai);

    assert_eq!(store.contact(&ai).unwrap().last_message.as_deref(), Some("Sure, happy to help"));
    assert_eq!(store.contact(&alex).unwrap().last_message.as_deref(), Some(CANNED_REPLY));
    assert!(store.messages(&ContactId::new("sarah")).is_empty());
}

#[tokio::test(start_paused = true)]
async fn two_quick_messages_to_one_contact_both_complete() {
    let sim = make_simulator(ScriptedAdapter::silent());
    let alex = ContactId::new("alex");
    let store = Arc::clone(sim.store());

    let first = sim.send(&alex, "one").unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    let second = sim.send(&alex, "two").unwrap();
    let (first_id, second_id) = (first.message_id, second.message_id);

    // t = 1.2s: only the first has been delivered.
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(store.message(&alex, &first_id).unwrap().status, MessageStatus::Delivered);
    assert_eq!(store.message(&alex, &second_id).unwrap().status, MessageStatus::Sent);

    first.finished().await;
    second.finished().await;

    let messages = store.messages(&alex);
    let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, ["one", "two", CANNED_REPLY, CANNED_REPLY]);
    assert!(
        messages
            .iter()
            .filter(|m| m.is_outgoing())
            .all(|m| m.status == MessageStatus::Read)
    );
    assert_eq!(store.contact(&alex).unwrap().status, ContactStatus::Online);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_lose_nothing() {
    let config = SimulatorConfig {
        delivered_after: Duration::from_millis(5),
        read_after: Duration::from_millis(10),
        ai_reply_delay: Duration::from_millis(1),
        reply_think_delay: Duration::from_millis(1),
        reply_typing_delay: Duration::from_millis(1),
        ..SimulatorConfig::default()
    };
    let sim = make_simulator_with(ScriptedAdapter::silent(), config);

    let mut tasks = Vec::new();
    for i in 0..20 {
        let sim = sim.clone();
        let contact = if i % 2 == 0 {
            ContactId::new("alex")
        } else {
            ContactId::new("sarah")
        };
        tasks.push(tokio::spawn(async move {
            sim.send(&contact, &format!("msg {i}")).unwrap().finished().await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for name in ["alex", "sarah"] {
        let messages = sim.store().messages(&ContactId::new(name));
        let outgoing = messages.iter().filter(|m| m.is_outgoing()).count();
        let replies = messages.len() - outgoing;
        assert_eq!(outgoing, 10, "{name} outgoing");
        assert_eq!(replies, 10, "{name} replies");
        assert!(
            messages
                .iter()
                .filter(|m| m.is_outgoing())
                .all(|m| m.status == MessageStatus::Read)
        );
    }
}
