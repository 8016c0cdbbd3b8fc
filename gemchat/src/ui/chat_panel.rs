//! Chat panel rendering (header + message list + input box).

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use gemchat_proto::contact::{Contact, ContactStatus};
use gemchat_proto::message::{Message, MessageStatus};

use super::sidebar::format_time;
use super::theme;
use crate::app::{App, PanelFocus};

/// Shown at the top of every conversation.
pub const ENCRYPTION_NOTICE: &str =
    "Messages are end-to-end encrypted. No one outside of this chat can read them.";

/// Bubbles never take more than this share of the panel width (percent).
const BUBBLE_WIDTH_PERCENT: usize = 75;

/// Render the chat panel for the active contact, or the empty state.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(contact) = app.store().active_contact() else {
        render_empty(frame, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(frame, chunks[0], &contact);
    render_messages(frame, chunks[1], app, &contact);
    render_input(frame, chunks[2], app);
}

/// Landing view when no conversation is open.
fn render_empty(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::default(),
        Line::from(Span::styled("Gemini Messenger for Web", theme::bold())),
        Line::from(Span::styled(
            "Send and receive messages without keeping your phone online.",
            theme::dimmed(),
        )),
        Line::default(),
        Line::from(Span::styled(ENCRYPTION_NOTICE, theme::dimmed())),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::border(false))
        .style(Style::default().bg(theme::BG_CHAT));
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn render_header(frame: &mut Frame, area: Rect, contact: &Contact) {
    let status_style = match contact.status {
        ContactStatus::Typing => theme::accent(),
        ContactStatus::Online | ContactStatus::Offline => theme::dimmed(),
    };
    let mut spans = vec![Span::styled(contact.name.as_str(), theme::bold())];
    if contact.is_ai() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(" AI ", theme::ai_badge()));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::styled(contact.status.to_string(), status_style));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::border(false))
        .style(theme::header_bg());
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Render the message list, pinned to the bottom unless scrolled.
fn render_messages(frame: &mut Frame, area: Rect, app: &App, contact: &Contact) {
    let is_focused = app.focus == PanelFocus::Chat;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::border(is_focused))
        .style(Style::default().bg(theme::BG_CHAT));
    let inner = block.inner(area);

    let messages = app.store().messages(&contact.id);
    let shown = messages.len().saturating_sub(app.message_scroll);
    let bubble_width = (usize::from(inner.width) * BUBBLE_WIDTH_PERCENT / 100).max(8);

    let mut lines = vec![
        Line::from(Span::styled(format!(" {ENCRYPTION_NOTICE} "), theme::notice()))
            .alignment(Alignment::Center),
        Line::default(),
    ];
    for message in &messages[..shown] {
        lines.extend(bubble_lines(message, bubble_width, &app.timestamp_format));
        lines.push(Line::default());
    }

    // Keep the newest lines visible.
    let overflow = lines.len().saturating_sub(usize::from(inner.height));
    let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);

    frame.render_widget(Paragraph::new(lines).block(block).scroll((scroll, 0)), area);
}

/// Lines of one message bubble: wrapped body, then time and ticks.
fn bubble_lines(message: &Message, width: usize, time_format: &str) -> Vec<Line<'static>> {
    let outgoing = message.is_outgoing();
    let alignment = if outgoing {
        Alignment::Right
    } else {
        Alignment::Left
    };
    let style = theme::bubble(outgoing);

    let mut lines: Vec<Line<'static>> = if message.text.is_empty() {
        // Streaming reply that has not produced text yet.
        vec![Line::from(Span::styled(" \u{2026} ", style))]
    } else {
        wrap(&message.text, width.saturating_sub(2))
            .into_iter()
            .map(|row| Line::from(Span::styled(format!(" {row} "), style)))
            .collect()
    };

    let mut meta = vec![Span::styled(
        format_time(message.timestamp, time_format),
        theme::dimmed(),
    )];
    if outgoing {
        meta.push(Span::raw(" "));
        meta.push(Span::styled(
            message.status.symbol(),
            theme::ticks(message.status == MessageStatus::Read),
        ));
    }
    lines.push(Line::from(meta));

    lines
        .into_iter()
        .map(|line| line.alignment(alignment))
        .collect()
}

/// Greedy word wrap to `width` terminal columns. Words wider than a row
/// are split between characters.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for paragraph in text.split('\n') {
        let mut row = String::new();
        let mut row_width = 0;
        for word in paragraph.split(' ') {
            if row_width > 0 && row_width + 1 + word.width() > width {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            if row_width > 0 {
                row.push(' ');
                row_width += 1;
            }
            for ch in word.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if row_width > 0 && row_width + ch_width > width {
                    rows.push(std::mem::take(&mut row));
                    row_width = 0;
                }
                row.push(ch);
                row_width += ch_width;
            }
        }
        rows.push(row);
    }
    rows
}

/// Render the input box.
fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus == PanelFocus::Input;

    let input_line = if app.input.is_empty() && !is_focused {
        Line::from(Span::styled("Type a message", theme::dimmed()))
    } else {
        // Insert cursor character at cursor position
        let mut display_text = app.input.clone();
        if is_focused {
            let index = display_text
                .char_indices()
                .nth(app.cursor_position)
                .map_or(display_text.len(), |(i, _)| i);
            display_text.insert(index, '\u{2588}');
        }
        Line::from(Span::styled(display_text, theme::normal()))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::border(is_focused))
        .style(Style::default().bg(theme::BG_INPUT));

    frame.render_widget(Paragraph::new(input_line).block(block), area);
}
