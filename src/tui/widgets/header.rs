//! Header widget for the TUI.
//!
//! Displays the application name, version, and which endpoint the client uses.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::Widget,
};

/// Header bar widget.
pub struct Header<'a> {
    provider_info: &'a str,
    has_provider: bool,
    is_connected: bool,
}

impl<'a> Header<'a> {
    /// Creates a new header widget.
    pub fn new(provider_info: &'a str, has_provider: bool, is_connected: bool) -> Self {
        Self {
            provider_info,
            has_provider,
            is_connected,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let style = Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        for x in area.left()..area.right() {
            buf[(x, area.y)].set_style(style);
        }

        let left_text = format!(" wallet-glance v{}", env!("CARGO_PKG_VERSION"));
        buf.set_span(area.x, area.y, &Span::styled(left_text, style), area.width);

        // Right side: connection dot and endpoint
        let status_dot = if self.is_connected { "●" } else { "○" };
        let status_color = if self.is_connected {
            Color::Green
        } else {
            Color::Gray
        };
        let status_style = Style::default().bg(Color::Blue).fg(status_color);

        let kind = if self.has_provider { "wallet" } else { "read-only" };
        let info_text = format!(" [{}: {}] ", kind, self.provider_info);
        let right_width = info_text.chars().count() as u16 + 2;
        if right_width < area.width {
            let right_x = area.right().saturating_sub(right_width);
            buf.set_string(right_x, area.y, " ", style);
            buf.set_string(right_x + 1, area.y, status_dot, status_style);
            buf.set_string(right_x + 2, area.y, &info_text, style);
        }
    }
}
