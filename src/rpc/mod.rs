//! JSON-RPC 2.0 transport to the ledger engine.
//!
//! Each call is a single request written to a fresh engine process's stdin
//! and a single response read from its stdout.

pub mod client;
pub mod envelope;
pub mod methods;
