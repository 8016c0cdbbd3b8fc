//! Sidebar rendering: search box and contact list.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use gemchat_proto::contact::{Contact, ContactStatus};

use super::theme;
use crate::app::{App, PanelFocus};

/// Widest preview shown under a contact name, in terminal columns.
const PREVIEW_COLUMNS: usize = 32;

/// Render the sidebar with the search box and contact list.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus == PanelFocus::Sidebar;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    render_search(frame, chunks[0], app, is_focused);
    render_contacts(frame, chunks[1], app, is_focused);
}

fn render_search(frame: &mut Frame, area: Rect, app: &App, is_focused: bool) {
    let line = if app.search.is_empty() {
        Line::from(Span::styled("Search or start new chat", theme::dimmed()))
    } else {
        Line::from(Span::styled(app.search.as_str(), theme::normal()))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::border(is_focused))
        .style(theme::header_bg());

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_contacts(frame: &mut Frame, area: Rect, app: &App, is_focused: bool) {
    let active = app.store().active_contact_id();
    let contacts = app.visible_contacts();

    let items: Vec<ListItem> = contacts
        .iter()
        .enumerate()
        .map(|(idx, contact)| {
            let is_selected = idx == app.selected_contact;
            let is_active = active.as_ref() == Some(&contact.id);

            let style = if is_selected && is_focused {
                theme::selected()
            } else if is_active {
                theme::active()
            } else {
                theme::normal()
            };

            ListItem::new(vec![
                title_line(contact, &app.timestamp_format),
                preview_line(contact),
            ])
            .style(style)
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(" Chats ", theme::panel_title(theme::ACCENT)))
        .borders(Borders::ALL)
        .border_style(theme::border(is_focused))
        .style(Style::default().bg(theme::BG_SIDEBAR));

    let list = if items.is_empty() {
        List::new(vec![ListItem::new(Span::styled(
            "No contacts found",
            theme::dimmed(),
        ))])
    } else {
        List::new(items)
    };

    frame.render_widget(list.block(block), area);
}

/// Status dot, name, optional AI badge and preview time.
fn title_line<'a>(contact: &'a Contact, format: &str) -> Line<'a> {
    let dot_color = match contact.status {
        ContactStatus::Online | ContactStatus::Typing => theme::ACCENT,
        ContactStatus::Offline => theme::PRESENCE_OFFLINE,
    };
    let mut spans = vec![
        Span::styled("\u{25cf} ", Style::default().fg(dot_color)),
        Span::styled(contact.name.as_str(), theme::bold()),
    ];
    if contact.is_ai() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(" AI ", theme::ai_badge()));
    }
    if let Some(at) = contact.last_message_time {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format_time(at, format), theme::dimmed()));
    }
    Line::from(spans)
}

/// Last message preview, or the typing indicator.
fn preview_line(contact: &Contact) -> Line<'_> {
    if contact.status == ContactStatus::Typing {
        return Line::from(Span::styled(
            format!("  {}", ContactStatus::Typing),
            theme::accent(),
        ));
    }
    let preview = contact.last_message.as_deref().unwrap_or_default();
    Line::from(Span::styled(
        format!("  {}", truncate(preview, PREVIEW_COLUMNS)),
        theme::dimmed(),
    ))
}

/// Format a UTC timestamp in local time.
///
/// An invalid user-supplied format falls back to `HH:MM`.
pub(crate) fn format_time(at: DateTime<Utc>, format: &str) -> String {
    let local = at.with_timezone(&Local);
    let mut out = String::new();
    if write!(out, "{}", local.format(format)).is_err() {
        return local.format("%H:%M").to_string();
    }
    out
}

/// Cut `text` to `max` columns on one line, with an ellipsis if cut.
fn truncate(text: &str, max: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.width() <= max && first_line.len() == text.len() {
        return first_line.to_string();
    }
    let mut cut = String::new();
    let mut used = 0;
    for ch in first_line.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > max {
            break;
        }
        used += ch_width;
        cut.push(ch);
    }
    cut.push('\u{2026}');
    cut
}
