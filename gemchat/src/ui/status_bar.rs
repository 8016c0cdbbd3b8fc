//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, PanelFocus};

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match app.focus {
        PanelFocus::Input => "Enter: send | Tab: switch panel | Esc: quit | \u{2190}\u{2192}: move cursor",
        PanelFocus::Sidebar => "Type: search | \u{2191}\u{2193}: open chat | Enter: focus input | Esc: quit",
        PanelFocus::Chat => "Tab: switch panel | \u{2191}\u{2193}/jk: scroll | End: latest | Esc: quit",
    };

    let mut spans = vec![
        Span::styled(concat!("GemChat v", env!("CARGO_PKG_VERSION")), theme::bold()),
        Span::raw(" | "),
        Span::styled("\u{25cf}", theme::accent()),
        Span::raw(format!(" {}", app.backend_label)),
        Span::raw(" | "),
    ];
    match &app.notice {
        Some(notice) => spans.push(Span::styled(notice.as_str(), theme::notice())),
        None => spans.push(Span::styled(help_text, theme::dimmed())),
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::header_bg());
    frame.render_widget(paragraph, area);
}
