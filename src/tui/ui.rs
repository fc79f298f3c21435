//! UI rendering for the TUI.
//!
//! Defines the layout and renders all UI components.

use super::app::{App, Screen};
use super::widgets::{header, wallet};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
    Frame,
};

/// Renders the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: header, wallet panel, key hints
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(5),    // Wallet panel
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_header(frame, main_layout[0], app);
    render_wallet(frame, main_layout[1], app);
    render_footer(frame, main_layout[2], app);
}

/// Renders the header bar.
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let connected = app.account.is_some();
    let widget = header::Header::new(&app.provider_info, app.has_provider, connected);
    frame.render_widget(widget, area);
}

/// Renders the wallet panel.
fn render_wallet(frame: &mut Frame, area: Rect, app: &App) {
    let processing = app.is_processing.then_some(&app.progress);
    let widget = wallet::WalletPanel::new(app.screen(), &app.symbol, &app.spinner).processing(processing);
    frame.render_widget(widget, area);
}

/// Renders the key hints.
fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let hint = match app.screen() {
        Screen::Disconnected(button) => format!(" enter: {}  q: quit", button.as_str()),
        _ => " q: quit".to_string(),
    };
    let widget = Paragraph::new(Line::from(hint)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(widget, area);
}
