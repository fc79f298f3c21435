//! wallet-glance - a terminal front-end for an Ethereum wallet.
//!
//! This library exposes the core modules for use in integration tests.

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod provider;
pub mod tui;
pub mod units;
