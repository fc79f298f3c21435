//! Wallet panel widget.
//!
//! Shows the loading indicator, the connected account and its balance, or the
//! connect/install button.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::tui::app::{ConnectButton, Screen};

use super::spinner::Spinner;

/// The main wallet panel.
pub struct WalletPanel<'a> {
    screen: Screen<'a>,
    symbol: &'a str,
    processing: Option<&'a Spinner>,
    loading: &'a Spinner,
}

impl<'a> WalletPanel<'a> {
    /// Creates a panel for `screen`, using `loading` while the first attempt runs.
    pub fn new(screen: Screen<'a>, symbol: &'a str, loading: &'a Spinner) -> Self {
        Self {
            screen,
            symbol,
            processing: None,
            loading,
        }
    }

    /// Shows `spinner` under the button while a connect is in flight.
    pub fn processing(mut self, spinner: Option<&'a Spinner>) -> Self {
        self.processing = spinner;
        self
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let label = Style::default().fg(Color::Gray);
        let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

        match &self.screen {
            Screen::Loading => vec![Line::from(""), Line::from(self.loading.display())],
            Screen::Connected { account, balance } => vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled("Connected wallet: ", label),
                    Span::styled(account.to_string(), value.fg(Color::Cyan)),
                ]),
                Line::from(vec![
                    Span::styled("Balance: ", label),
                    Span::styled(format!("{} {}", balance, self.symbol), value),
                ]),
            ],
            Screen::Disconnected(button) => {
                let color = match button {
                    ConnectButton::Connect => Color::Green,
                    ConnectButton::Install => Color::Yellow,
                };
                let mut lines = vec![
                    Line::from(""),
                    Line::from(Span::styled(
                        format!("[ {} ]", button.label()),
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    )),
                ];
                if let Some(spinner) = self.processing {
                    lines.push(Line::from(spinner.display()));
                }
                lines
            }
        }
    }
}

impl Widget for WalletPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Wallet ")
            .border_style(Style::default().fg(Color::DarkGray));

        Paragraph::new(self.lines())
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
