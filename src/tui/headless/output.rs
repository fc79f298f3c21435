//! Output formatting for headless mode.
//!
//! Provides different output formats: text, JSON, and frames.
//! Trailing blanks are trimmed so screens compare cleanly.

use super::{HeadlessResult, HeadlessState};
use ratatui::buffer::Buffer;
use serde::Serialize;

/// Output format for headless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain text output of the final screen.
    #[default]
    Text,
    /// JSON output with screen, state, and metadata.
    Json,
    /// Frame-by-frame output showing state after each event.
    Frames,
}

/// Renders a ratatui buffer to a string.
pub struct ScreenRenderer;

impl ScreenRenderer {
    /// Renders a buffer to a plain text string.
    pub fn render(buffer: &Buffer) -> String {
        let area = buffer.area;
        if area.height == 0 {
            return String::new();
        }

        let lines = (0..area.height)
            .map(|y| {
                let line = (0..area.width)
                    .map(|x| buffer.cell((x, y)).map_or(" ", |cell| cell.symbol()))
                    .collect::<Vec<_>>()
                    .join("");
                line.trim_end_matches(' ').to_string()
            })
            .collect::<Vec<_>>();

        let trimmed_lines = lines
            .into_iter()
            .rev()
            .skip_while(|line| line.is_empty())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>();

        let output_lines = if trimmed_lines.is_empty() {
            vec![String::new()]
        } else {
            trimmed_lines
        };

        format!("{}\n", output_lines.join("\n"))
    }
}

/// One-line summary of the wallet state.
fn wallet_summary(state: &HeadlessState) -> String {
    format!(
        "Account: {} | Balance: {} | Outcome: {}",
        state.account.as_deref().unwrap_or("none"),
        state.balance,
        state.outcome.as_deref().unwrap_or("none")
    )
}

/// JSON output structure.
#[derive(Debug, Serialize)]
struct JsonOutput {
    screen: String,
    screen_lines: Vec<String>,
    events_executed: usize,
    duration_ms: u64,
    assertions: AssertionSummary,
    state: HeadlessState,
}

#[derive(Debug, Serialize)]
struct AssertionSummary {
    passed: usize,
    failed: usize,
}

/// Formats headless execution results.
pub struct HeadlessOutput {
    format: OutputFormat,
}

impl HeadlessOutput {
    /// Creates a new output formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result according to the configured format.
    pub fn format(&self, result: &HeadlessResult) -> String {
        match self.format {
            OutputFormat::Text => self.format_text(result),
            OutputFormat::Json => self.format_json(result),
            OutputFormat::Frames => self.format_frames(result),
        }
    }

    /// Formats as plain text.
    fn format_text(&self, result: &HeadlessResult) -> String {
        let assertions = if result.assertions_passed > 0 || result.assertions_failed > 0 {
            format!(
                " | Assertions: {} passed, {} failed",
                result.assertions_passed, result.assertions_failed
            )
        } else {
            String::new()
        };

        format!(
            "{}\n{}\nEvents: {} executed in {}ms{}\n",
            result.screen,
            wallet_summary(&result.state),
            result.events_executed,
            result.duration.as_millis(),
            assertions
        )
    }

    /// Formats as JSON.
    fn format_json(&self, result: &HeadlessResult) -> String {
        let json_output = JsonOutput {
            screen: result.screen.clone(),
            screen_lines: result.screen_lines.clone(),
            events_executed: result.events_executed,
            duration_ms: result.duration.as_millis() as u64,
            assertions: AssertionSummary {
                passed: result.assertions_passed,
                failed: result.assertions_failed,
            },
            state: result.state.clone(),
        };

        serde_json::to_string_pretty(&json_output)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e))
    }

    /// Formats as frame-by-frame output.
    fn format_frames(&self, result: &HeadlessResult) -> String {
        let frames_text = result
            .frames
            .iter()
            .map(|frame| {
                let event_desc = frame.event.as_deref().unwrap_or("initial");
                format!(
                    "=== FRAME {} ({}) ===\n{}\n\n",
                    frame.number, event_desc, frame.screen
                )
            })
            .collect::<Vec<_>>()
            .join("");

        let assertions = if result.assertions_passed > 0 || result.assertions_failed > 0 {
            format!(
                "Assertions: {} passed, {} failed\n",
                result.assertions_passed, result.assertions_failed
            )
        } else {
            String::new()
        };

        format!(
            "{}Total: {} frames, {} events executed in {}ms\n{}",
            frames_text,
            result.frames.len(),
            result.events_executed,
            result.duration.as_millis(),
            assertions
        )
    }
}
