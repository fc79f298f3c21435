//! TUI widgets for wallet-glance.

pub mod header;
pub mod spinner;
pub mod wallet;
