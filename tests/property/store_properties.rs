//! Property-based tests for the conversation store.
//!
//! Uses proptest to verify:
//! 1. Status updates applied in any order never lower a message's status.
//! 2. The history window is the last `limit` non-empty messages before the
//!    prompt, oldest first, with roles taken from the sender.
//! 3. Appends to one conversation never touch another.

use std::sync::Arc;

use proptest::prelude::*;

use gemchat::store::{ConversationStore, SessionState};
use gemchat_proto::contact::Contact;
use gemchat_proto::history::Role;
use gemchat_proto::ids::ContactId;
use gemchat_proto::message::{Message, MessageStatus};

fn arb_status() -> impl Strategy<Value = MessageStatus> {
    prop_oneof![
        Just(MessageStatus::Sent),
        Just(MessageStatus::Delivered),
        Just(MessageStatus::Read),
    ]
}

/// A prior message: (outgoing?, text). Empty texts model unfinished replies.
fn arb_prior() -> impl Strategy<Value = (bool, String)> {
    (any::<bool>(), prop_oneof![Just(String::new()), "[a-z]{1,8}"])
}

fn make_store() -> (Arc<ConversationStore>, ContactId, ContactId) {
    let a = Contact::human("a", "A", "x");
    let b = Contact::human("b", "B", "y");
    let ids = (a.id.clone(), b.id.clone());
    let store = Arc::new(ConversationStore::new(SessionState {
        contacts: vec![a, b],
        ..SessionState::default()
    }));
    (store, ids.0, ids.1)
}

proptest! {
    #[test]
    fn store_status_is_monotonic(requests in prop::collection::vec(arb_status(), 0..24)) {
        let (store, a, _) = make_store();
        let message = Message::outgoing("hi");
        let id = message.id;
        store.append_message(&a, message);

        let mut last = MessageStatus::Sent;
        for status in requests {
            let applied = store.update_message_status(&a, &id, status);
            let now = store.message(&a, &id).unwrap().status;
            prop_assert!(now >= last);
            prop_assert_eq!(applied, status > last);
            last = now;
        }
    }

    #[test]
    fn history_window_is_tail_of_prior_messages(
        prior in prop::collection::vec(arb_prior(), 0..30),
        limit in 0usize..15,
    ) {
        let (store, a, _) = make_store();
        for (outgoing, text) in &prior {
            let message = if *outgoing {
                Message::outgoing(text.as_str())
            } else {
                Message::reply(&a, text.as_str())
            };
            store.append_message(&a, message);
        }
        let prompt = Message::outgoing("prompt");
        let prompt_id = prompt.id;
        store.append_message(&a, prompt);

        let history = store.history_before(&a, &prompt_id, limit);

        let expected: Vec<(Role, &str)> = prior
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(outgoing, text)| (if *outgoing { Role::User } else { Role::Model }, text.as_str()))
            .collect();
        let expected = &expected[expected.len().saturating_sub(limit)..];

        prop_assert_eq!(history.len(), expected.len());
        for (turn, (role, text)) in history.iter().zip(expected) {
            prop_assert_eq!(turn.role, *role);
            prop_assert_eq!(turn.text.as_str(), *text);
        }
    }

    #[test]
    fn appends_stay_in_their_conversation(targets in prop::collection::vec(any::<bool>(), 0..40)) {
        let (store, a, b) = make_store();
        for (i, to_a) in targets.iter().enumerate() {
            let contact = if *to_a { &a } else { &b };
            store.append_message(contact, Message::outgoing(format!("{i}")));
        }

        let count_a = targets.iter().filter(|t| **t).count();
        prop_assert_eq!(store.messages(&a).len(), count_a);
        prop_assert_eq!(store.messages(&b).len(), targets.len() - count_a);

        let order: Vec<usize> = store
            .messages(&a)
            .iter()
            .map(|m| m.text.parse().unwrap())
            .collect();
        prop_assert!(order.windows(2).all(|w| w[0] < w[1]));
    }
}
