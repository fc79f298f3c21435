//! Connection management for wallet-glance.
//!
//! Owns the provider-backed client handle and the single account-change
//! subscription, and runs the connect sequence the view relies on.

pub mod manager;
pub mod sequence;

pub use manager::{ClientKind, ConnectionEvent, ConnectionManager, InitOutcome};
pub use sequence::{run_connect_sequence, ConnectOutcome, ConnectReport};
