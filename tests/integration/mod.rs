//! Integration tests for the provider and connection layers.

pub mod connection_test;
pub mod http_test;
pub mod rpc_stub;
