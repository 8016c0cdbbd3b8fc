//! Application state and event handling.
//!
//! [`App`] holds only presentation state (input line, focus, search query,
//! scroll). Conversations live in the shared [`ConversationStore`]; the app
//! reads them at draw time and asks the caller to send messages by
//! returning an [`OutgoingMessage`] from [`App::handle_key_event`].

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use gemchat_proto::contact::Contact;
use gemchat_proto::ids::ContactId;

use crate::store::ConversationStore;

/// Which panel is currently focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// Input box is focused (default).
    Input,
    /// Sidebar contact list and search box are focused.
    Sidebar,
    /// Chat message list is focused.
    Chat,
}

/// A message the user asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Conversation the message goes to.
    pub contact_id: ContactId,
    /// Text exactly as typed.
    pub text: String,
}

/// Main application state.
pub struct App {
    store: Arc<ConversationStore>,
    /// Current text input.
    pub input: String,
    /// Cursor position in input (character index).
    pub cursor_position: usize,
    /// Which panel is focused.
    pub focus: PanelFocus,
    /// Sidebar search query.
    pub search: String,
    /// Selected row in the filtered contact list.
    pub selected_contact: usize,
    /// Messages scrolled up from the bottom of the chat.
    pub message_scroll: usize,
    /// Transient notice shown in the status bar.
    pub notice: Option<String>,
    /// chrono format string for message and sidebar times.
    pub timestamp_format: String,
    /// Completion backend shown in the status bar.
    pub backend_label: String,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Create the application over a shared store.
    #[must_use]
    pub fn new(store: Arc<ConversationStore>) -> Self {
        let mut app = Self {
            store,
            input: String::new(),
            cursor_position: 0,
            focus: PanelFocus::Input,
            search: String::new(),
            selected_contact: 0,
            message_scroll: 0,
            notice: None,
            timestamp_format: "%H:%M".to_string(),
            backend_label: "offline".to_string(),
            should_quit: false,
        };
        app.sync_selection();
        app
    }

    /// Use a custom timestamp format.
    #[must_use]
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    /// Name the completion backend in the status bar.
    #[must_use]
    pub fn with_backend_label(mut self, label: impl Into<String>) -> Self {
        self.backend_label = label.into();
        self
    }

    /// The shared store.
    #[must_use]
    pub const fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Contacts matching the search query, in sidebar order.
    #[must_use]
    pub fn visible_contacts(&self) -> Vec<Contact> {
        self.store.search_contacts(&self.search)
    }

    /// Show a notice in the status bar until the next key press.
    pub fn notify(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    /// Handle a key event.
    ///
    /// Returns the message to send when the user submits non-blank input.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<OutgoingMessage> {
        self.notice = None;

        // Global shortcuts
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                self.should_quit = true;
                return None;
            }
            (KeyCode::BackTab, _) | (KeyCode::Tab, KeyModifiers::SHIFT) => {
                self.cycle_focus_backward();
                return None;
            }
            (KeyCode::Tab, _) => {
                self.cycle_focus_forward();
                return None;
            }
            _ => {}
        }

        // Focus-specific shortcuts
        match self.focus {
            PanelFocus::Input => return self.handle_input_key(key),
            PanelFocus::Sidebar => self.handle_sidebar_key(key),
            PanelFocus::Chat => self.handle_chat_key(key),
        }
        None
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Option<OutgoingMessage> {
        match key.code {
            KeyCode::Enter => return self.submit_message(),
            KeyCode::Char(c) => self.enter_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.cursor_position = 0,
            KeyCode::End => self.cursor_position = self.input.chars().count(),
            _ => {}
        }
        None
    }

    /// Typing in the sidebar edits the search query.
    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.prev_contact(),
            KeyCode::Down => self.next_contact(),
            KeyCode::Enter => {
                self.open_selected();
                self.focus = PanelFocus::Input;
            }
            KeyCode::Char(c) => {
                self.search.push(c);
                self.selected_contact = 0;
            }
            KeyCode::Backspace => {
                self.search.pop();
                self.sync_selection();
            }
            _ => {}
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(),
            KeyCode::End => self.message_scroll = 0,
            _ => {}
        }
    }

    /// Cycle focus forward: Input -> Sidebar -> Chat -> Input.
    const fn cycle_focus_forward(&mut self) {
        self.focus = match self.focus {
            PanelFocus::Input => PanelFocus::Sidebar,
            PanelFocus::Sidebar => PanelFocus::Chat,
            PanelFocus::Chat => PanelFocus::Input,
        };
    }

    /// Cycle focus backward: Input -> Chat -> Sidebar -> Input.
    const fn cycle_focus_backward(&mut self) {
        self.focus = match self.focus {
            PanelFocus::Input => PanelFocus::Chat,
            PanelFocus::Chat => PanelFocus::Sidebar,
            PanelFocus::Sidebar => PanelFocus::Input,
        };
    }

    /// Take the input as a message for the active contact.
    ///
    /// Blank input is ignored and left in place.
    fn submit_message(&mut self) -> Option<OutgoingMessage> {
        if self.input.trim().is_empty() {
            return None;
        }
        let Some(contact_id) = self.store.active_contact_id() else {
            self.notify("Select a conversation first");
            return None;
        };

        let text = std::mem::take(&mut self.input);
        self.cursor_position = 0;
        self.message_scroll = 0;
        Some(OutgoingMessage { contact_id, text })
    }

    /// Byte offset of the cursor in `input`.
    fn cursor_byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map_or(self.input.len(), |(i, _)| i)
    }

    /// Insert a character at the cursor position.
    fn enter_char(&mut self, c: char) {
        let index = self.cursor_byte_index();
        self.input.insert(index, c);
        self.cursor_position += 1;
    }

    /// Delete the character before the cursor.
    fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = self.cursor_byte_index();
            self.input.remove(index);
        }
    }

    const fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    fn scroll_up(&mut self) {
        let len = self
            .store
            .active_contact_id()
            .map_or(0, |id| self.store.messages(&id).len());
        if self.message_scroll < len.saturating_sub(1) {
            self.message_scroll += 1;
        }
    }

    const fn scroll_down(&mut self) {
        if self.message_scroll > 0 {
            self.message_scroll -= 1;
        }
    }

    /// Select the previous contact and open its conversation.
    fn prev_contact(&mut self) {
        if self.selected_contact > 0 {
            self.selected_contact -= 1;
            self.open_selected();
        }
    }

    /// Select the next contact and open its conversation.
    fn next_contact(&mut self) {
        if self.selected_contact + 1 < self.visible_contacts().len() {
            self.selected_contact += 1;
            self.open_selected();
        }
    }

    /// Make the highlighted contact active.
    fn open_selected(&mut self) {
        if let Some(contact) = self.visible_contacts().get(self.selected_contact) {
            if self.store.active_contact_id().as_ref() != Some(&contact.id) {
                self.message_scroll = 0;
            }
            self.store.select_contact(&contact.id);
        }
    }

    /// Point the selection at the active contact if it is visible.
    fn sync_selection(&mut self) {
        let active = self.store.active_contact_id();
        self.selected_contact = self
            .visible_contacts()
            .iter()
            .position(|c| Some(&c.id) == active.as_ref())
            .unwrap_or(0);
    }
}
