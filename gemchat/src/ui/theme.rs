//! Theme and styling constants for the TUI.
//!
//! Dark messenger palette: green accents, teal outgoing bubbles, slate
//! incoming bubbles.

use ratatui::style::{Color, Modifier, Style};

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::Rgb(0xe9, 0xed, 0xef);

/// Secondary foreground color (previews, timestamps).
pub const FG_SECONDARY: Color = Color::Rgb(0x86, 0x96, 0xa0);

/// Application background.
pub const BG_APP: Color = Color::Rgb(0x0c, 0x13, 0x17);

/// Sidebar background.
pub const BG_SIDEBAR: Color = Color::Rgb(0x11, 0x1b, 0x21);

/// Chat background.
pub const BG_CHAT: Color = Color::Rgb(0x0b, 0x14, 0x1a);

/// Header and status bar background.
pub const BG_HEADER: Color = Color::Rgb(0x20, 0x2c, 0x33);

/// Input box background.
pub const BG_INPUT: Color = Color::Rgb(0x2a, 0x39, 0x42);

/// Accent color: focus, typing indicator, AI badge.
pub const ACCENT: Color = Color::Rgb(0x00, 0xa8, 0x84);

/// Outgoing message bubble.
pub const BUBBLE_OUTGOING: Color = Color::Rgb(0x00, 0x5c, 0x4b);

/// Incoming message bubble.
pub const BUBBLE_INCOMING: Color = Color::Rgb(0x20, 0x2c, 0x33);

/// Read receipt ticks.
pub const TICK_READ: Color = Color::Rgb(0x53, 0xbd, 0xeb);

/// Encryption notice text.
pub const NOTICE: Color = Color::Rgb(0xff, 0xd2, 0x79);

/// Presence: offline indicator color.
pub const PRESENCE_OFFLINE: Color = Color::DarkGray;

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (timestamps, metadata).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Accent text (typing indicator, unread markers).
#[must_use]
pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

/// Border style for a panel depending on focus.
#[must_use]
pub fn border(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(BG_HEADER)
    }
}

/// Selected contact row while the sidebar has focus.
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(FG_PRIMARY)
        .bg(BG_INPUT)
        .add_modifier(Modifier::BOLD)
}

/// Active contact row while another panel has focus.
#[must_use]
pub fn active() -> Style {
    Style::default().fg(FG_PRIMARY).bg(BG_HEADER)
}

/// Small "AI" badge next to a contact name.
#[must_use]
pub fn ai_badge() -> Style {
    Style::default()
        .fg(BG_APP)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

/// Bubble style for a message.
#[must_use]
pub fn bubble(outgoing: bool) -> Style {
    let bg = if outgoing {
        BUBBLE_OUTGOING
    } else {
        BUBBLE_INCOMING
    };
    Style::default().fg(FG_PRIMARY).bg(bg)
}

/// Style for status ticks; read receipts are blue.
#[must_use]
pub fn ticks(read: bool) -> Style {
    if read {
        Style::default().fg(TICK_READ)
    } else {
        dimmed()
    }
}

/// Encryption notice at the top of every conversation.
#[must_use]
pub fn notice() -> Style {
    Style::default().fg(NOTICE).bg(BG_HEADER)
}

/// Style for the status bar and chat header background.
#[must_use]
pub fn header_bg() -> Style {
    Style::default().fg(FG_PRIMARY).bg(BG_HEADER)
}

/// Style for panel titles with a given color (bold).
#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}
