//! Integration tests for the key-driven application flow.
//!
//! Drives [`App`] with key events exactly as the terminal loop does, hands
//! submitted messages to the simulator, and renders with ratatui's test
//! backend.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{Terminal, backend::TestBackend};

use gemchat::app::{App, PanelFocus};
use gemchat::completion::scripted::ScriptedAdapter;
use gemchat::seed::{self, AI_CONTACT_ID, AI_PERSONA};
use gemchat::simulator::{CANNED_REPLY, Simulator, SimulatorConfig};
use gemchat::store::ConversationStore;
use gemchat::ui;
use gemchat_proto::contact::ContactStatus;
use gemchat_proto::ids::ContactId;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

struct Harness {
    app: App,
    sim: Simulator<ScriptedAdapter>,
    adapter: ScriptedAdapter,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(ConversationStore::new(seed::initial_state()));
        let adapter = ScriptedAdapter::new(["Hi", " there", "!"]).with_fragment_delay(Duration::from_millis(100));
        let sim = Simulator::new(Arc::clone(&store), Arc::new(adapter.clone()), SimulatorConfig::default());
        Self {
            app: App::new(store),
            sim,
            adapter,
        }
    }

    /// Feed one key; send whatever the app submits.
    fn press(&mut self, code: KeyCode) {
        if let Some(out) = self.app.handle_key_event(key(code)) {
            self.sim.send(&out.contact_id, &out.text).unwrap();
        }
    }

    fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    fn screen(&self) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| ui::draw(frame, &self.app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }
}

#[tokio::test(start_paused = true)]
async fn typing_and_enter_streams_ai_reply() {
    let mut h = Harness::new();
    let ai = ContactId::new(AI_CONTACT_ID);

    h.type_text("Hello");
    h.press(KeyCode::Enter);
    assert!(h.app.input.is_empty());

    let messages = h.app.store().messages(&ai);
    assert_eq!(messages.last().unwrap().text, "Hello");

    // Mid-stream the header shows the typing indicator.
    tokio::time::sleep(Duration::from_millis(1650)).await;
    assert!(h.screen().contains("typing..."));

    tokio::time::sleep(Duration::from_secs(2)).await;
    let reply = h.app.store().messages(&ai).pop().unwrap();
    assert_eq!(reply.text, "Hi there!");
    assert!(h.screen().contains("Hi there!"));

    let requests = h.adapter.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].system_instruction, AI_PERSONA);
    assert_eq!(requests[0].prompt, "Hello");
    // The seeded greeting is the only prior message.
    assert_eq!(requests[0].history.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn switching_to_human_contact_and_sending() {
    let mut h = Harness::new();
    let alex = ContactId::new("alex-rivera");

    h.press(KeyCode::Tab);
    assert_eq!(h.app.focus, PanelFocus::Sidebar);
    h.press(KeyCode::Down);
    h.press(KeyCode::Enter);
    assert_eq!(h.app.focus, PanelFocus::Input);
    assert_eq!(h.app.store().active_contact_id(), Some(alex.clone()));

    h.type_text("Still on?");
    h.press(KeyCode::Enter);
    assert!(h.screen().contains("Still on?"));

    tokio::time::sleep(Duration::from_millis(6000)).await;
    let messages = h.app.store().messages(&alex);
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].text, CANNED_REPLY);
    assert_eq!(h.app.store().contact(&alex).unwrap().status, ContactStatus::Online);
    assert!(h.adapter.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn leaving_ai_chat_mid_stream_does_not_stop_reply() {
    let mut h = Harness::new();
    let ai = ContactId::new(AI_CONTACT_ID);

    h.type_text("Hello");
    h.press(KeyCode::Enter);
    tokio::time::sleep(Duration::from_millis(1650)).await;

    // Open Sarah's chat through the search box.
    h.press(KeyCode::Tab);
    h.type_text("sarah");
    h.press(KeyCode::Enter);
    assert_eq!(h.app.store().active_contact_id(), Some(ContactId::new("sarah-chen")));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.app.store().messages(&ai).pop().unwrap().text, "Hi there!");
    assert!(h.app.store().messages(&ContactId::new("sarah-chen")).is_empty());

    // The sidebar preview shows the finished reply.
    h.press(KeyCode::Backspace);
    h.press(KeyCode::Backspace);
    h.press(KeyCode::Backspace);
    h.press(KeyCode::Backspace);
    h.press(KeyCode::Backspace);
    assert!(h.screen().contains("Hi there!"));
}

#[tokio::test]
async fn blank_enter_sends_nothing() {
    let mut h = Harness::new();
    let before = h.app.store().snapshot();

    h.type_text("   ");
    h.press(KeyCode::Enter);

    assert_eq!(h.app.store().snapshot(), before);
    assert_eq!(h.app.input, "   ");
}
