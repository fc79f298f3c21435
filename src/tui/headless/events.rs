//! Event DSL parser for headless mode.
//!
//! Parses event strings like "key:enter", "wait:100ms" or "accounts:0xabc" into
//! executable events.

use crate::error::{Result, WalletError};
use alloy_primitives::U256;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::HeadlessState;

/// An assertion to check against the screen or state.
#[derive(Debug, Clone)]
pub enum Assertion {
    /// Screen contains text (case-insensitive).
    Contains(String),
    /// Screen contains text (case-sensitive).
    ContainsExact(String),
    /// Screen does not contain text.
    NotContains(String),
    /// Screen matches regex pattern.
    Matches(String),
    /// State field equals value.
    StateEquals { field: String, value: String },
    /// State field comparison (>=, <=, >, <).
    StateCompare {
        field: String,
        op: String,
        value: String,
    },
}

impl Assertion {
    /// Checks the assertion against the screen and a state snapshot.
    pub fn check(&self, screen: &str, state: &HeadlessState) -> bool {
        match self {
            Self::Contains(text) => screen.to_lowercase().contains(&text.to_lowercase()),
            Self::ContainsExact(text) => screen.contains(text),
            Self::NotContains(text) => !screen.to_lowercase().contains(&text.to_lowercase()),
            Self::Matches(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(screen))
                .unwrap_or(false),
            Self::StateEquals { field, value } => {
                state.field(field).as_deref() == Some(value.as_str())
            }
            Self::StateCompare { field, op, value } => {
                compare_values(state.field(field).as_deref(), op, value)
            }
        }
    }
}

/// Compares values using the given operator.
fn compare_values(actual: Option<&str>, op: &str, expected: &str) -> bool {
    let actual = match actual {
        Some(v) => v,
        None => return false,
    };

    // Try numeric comparison first
    if let (Ok(a), Ok(e)) = (actual.parse::<i64>(), expected.parse::<i64>()) {
        return match op {
            ">=" => a >= e,
            "<=" => a <= e,
            ">" => a > e,
            "<" => a < e,
            "=" | "==" => a == e,
            _ => false,
        };
    }

    match op {
        "=" | "==" => actual == expected,
        _ => false,
    }
}

/// A parsed event that can be executed.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// Let background work run for a duration.
    Wait(Duration),
    /// Resize the terminal.
    Resize(u16, u16),
    /// Take a named snapshot.
    Snapshot(String),
    /// Replace the mock wallet's accounts. Empty means disconnected.
    Accounts(Vec<String>),
    /// Set the mock wallet's balance for an address, in the smallest unit.
    Balance { address: String, wei: U256 },
    /// Assert something about the screen or state.
    Assert(Assertion),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => {
                let mut parts = Vec::new();
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    parts.push("ctrl");
                }
                if key.modifiers.contains(KeyModifiers::ALT) {
                    parts.push("alt");
                }
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    parts.push("shift");
                }
                let key_name = key_code_to_string(&key.code);
                parts.push(&key_name);
                write!(f, "key:{}", parts.join("+"))
            }
            Self::Wait(d) => write!(f, "wait:{}ms", d.as_millis()),
            Self::Resize(w, h) => write!(f, "resize:{}x{}", w, h),
            Self::Snapshot(name) => write!(f, "snapshot:{}", name),
            Self::Accounts(accounts) => write!(f, "accounts:{}", accounts.join("|")),
            Self::Balance { address, wei } => write!(f, "balance:{}={}", address, wei),
            Self::Assert(a) => match a {
                Assertion::Contains(t) => write!(f, "assert:contains:{}", t),
                Assertion::ContainsExact(t) => write!(f, "assert:contains-exact:{}", t),
                Assertion::NotContains(t) => write!(f, "assert:not-contains:{}", t),
                Assertion::Matches(p) => write!(f, "assert:matches:{}", p),
                Assertion::StateEquals { field, value } => {
                    write!(f, "assert:state:{}={}", field, value)
                }
                Assertion::StateCompare { field, op, value } => {
                    write!(f, "assert:state:{}{}{}", field, op, value)
                }
            },
        }
    }
}

fn key_code_to_string(code: &KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        _ => "unknown".to_string(),
    }
}

/// Parser for the event DSL.
#[derive(Debug, Default)]
pub struct EventParser;

impl EventParser {
    /// Creates a new event parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses all events from an input string.
    /// Supports comma-separated and newline-separated events.
    pub fn parse_all(&self, input: &str) -> Result<Vec<Event>> {
        let mut events = Vec::new();

        for line in input.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            for part in line.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }

                events.push(self.parse_one(part)?);
            }
        }

        Ok(events)
    }

    /// Parses a single event string.
    pub fn parse_one(&self, input: &str) -> Result<Event> {
        let input = input.trim();

        let (event_type, value) = match input.split_once(':') {
            Some((t, v)) => (t.trim().to_lowercase(), v.trim()),
            None => {
                return Err(WalletError::config(format!(
                    "Invalid event syntax: '{}'. Expected format: type:value",
                    input
                )));
            }
        };

        match event_type.as_str() {
            "key" => self.parse_key(value),
            "wait" => self.parse_wait(value),
            "resize" => self.parse_resize(value),
            "snapshot" => Ok(Event::Snapshot(value.to_string())),
            "accounts" => Ok(self.parse_accounts(value)),
            "balance" => self.parse_balance(value),
            "assert" => self.parse_assert(value),
            _ => Err(WalletError::config(format!(
                "Unknown event type: '{}'. Valid types: key, wait, resize, snapshot, accounts, balance, assert",
                event_type
            ))),
        }
    }

    /// Parses a key event like "enter", "ctrl+c", "space".
    fn parse_key(&self, value: &str) -> Result<Event> {
        let parts: Vec<&str> = value.split('+').collect();
        let mut modifiers = KeyModifiers::empty();
        let mut key_str = "";

        for (i, part) in parts.iter().enumerate() {
            if i == parts.len() - 1 {
                key_str = *part;
                continue;
            }
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => {
                    return Err(WalletError::config(format!(
                        "Unknown modifier: '{}'. Valid modifiers: ctrl, alt, shift",
                        part
                    )));
                }
            }
        }

        let code = self.parse_key_code(key_str)?;

        Ok(Event::Key(KeyEvent::new(code, modifiers)))
    }

    /// Parses a key code string into a KeyCode.
    fn parse_key_code(&self, s: &str) -> Result<KeyCode> {
        let code = match s.to_lowercase().as_str() {
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        return Err(WalletError::config(format!(
                            "Unknown key: '{}'. Use single characters or named keys like enter, esc, space",
                            s
                        )));
                    }
                }
            }
        };

        Ok(code)
    }

    /// Parses a wait duration like "100ms", "2s", or just "100" (defaults to ms).
    fn parse_wait(&self, value: &str) -> Result<Event> {
        let value = value.trim().to_lowercase();
        let invalid = || WalletError::config(format!("Invalid duration: '{}'", value));

        let duration = if let Some(ms) = value.strip_suffix("ms") {
            Duration::from_millis(ms.parse().map_err(|_| invalid())?)
        } else if let Some(secs) = value.strip_suffix('s') {
            Duration::from_secs(secs.parse().map_err(|_| invalid())?)
        } else {
            Duration::from_millis(value.parse().map_err(|_| invalid())?)
        };

        Ok(Event::Wait(duration))
    }

    /// Parses a resize event like "120x40".
    fn parse_resize(&self, value: &str) -> Result<Event> {
        let Some((width, height)) = value.split_once('x') else {
            return Err(WalletError::config(format!(
                "Invalid resize format: '{}'. Expected WIDTHxHEIGHT",
                value
            )));
        };

        let width: u16 = width
            .parse()
            .map_err(|_| WalletError::config(format!("Invalid width: '{}'", width)))?;
        let height: u16 = height
            .parse()
            .map_err(|_| WalletError::config(format!("Invalid height: '{}'", height)))?;

        Ok(Event::Resize(width, height))
    }

    /// Parses an account list like "0xabc|0xdef". An empty value means no accounts.
    fn parse_accounts(&self, value: &str) -> Event {
        let accounts = value
            .split('|')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect();
        Event::Accounts(accounts)
    }

    /// Parses a balance like "0xabc=1500000000000000000".
    fn parse_balance(&self, value: &str) -> Result<Event> {
        let Some((address, wei)) = value.split_once('=') else {
            return Err(WalletError::config(format!(
                "Invalid balance format: '{}'. Expected ADDRESS=WEI",
                value
            )));
        };
        let wei = U256::from_str(wei.trim())
            .map_err(|e| WalletError::config(format!("Invalid balance '{}': {}", wei, e)))?;

        Ok(Event::Balance {
            address: address.trim().to_string(),
            wei,
        })
    }

    /// Parses an assertion like "contains:Balance" or "state:loading=false".
    fn parse_assert(&self, value: &str) -> Result<Event> {
        let (assert_type, rest) = match value.split_once(':') {
            Some((t, r)) => (t.trim().to_lowercase(), r.trim()),
            None => {
                return Err(WalletError::config(format!(
                    "Invalid assertion syntax: '{}'. Expected assert:type:value",
                    value
                )));
            }
        };

        let assertion = match assert_type.as_str() {
            "contains" => Assertion::Contains(rest.to_string()),
            "contains-exact" => Assertion::ContainsExact(rest.to_string()),
            "not-contains" => Assertion::NotContains(rest.to_string()),
            "matches" => Assertion::Matches(rest.to_string()),
            "state" => self.parse_state_assertion(rest)?,
            _ => {
                return Err(WalletError::config(format!(
                    "Unknown assertion type: '{}'. Valid types: contains, contains-exact, not-contains, matches, state",
                    assert_type
                )));
            }
        };

        Ok(Event::Assert(assertion))
    }

    /// Parses a state assertion like "account=none" or "generation>=2".
    fn parse_state_assertion(&self, value: &str) -> Result<Assertion> {
        for op in &[">=", "<=", ">", "<", "="] {
            if let Some(pos) = value.find(op) {
                let field = value[..pos].trim().to_string();
                let val = value[pos + op.len()..].trim().to_string();

                if *op == "=" {
                    return Ok(Assertion::StateEquals { field, value: val });
                }
                return Ok(Assertion::StateCompare {
                    field,
                    op: op.to_string(),
                    value: val,
                });
            }
        }

        Err(WalletError::config(format!(
            "Invalid state assertion: '{}'. Expected field=value or field>=value",
            value
        )))
    }
}
