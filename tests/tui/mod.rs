//! Tests for the terminal UI through the binary's headless mode.

pub mod common;
pub mod headless_test;
