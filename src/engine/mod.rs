//! Engine management for the rustledger WASI module.
//!
//! This module provides:
//! - Module fetching on first use (`fetch`)
//! - Launcher discovery (`launcher`)
//! - One-shot process execution (`process`)
//! - The shared engine handle (`lifecycle`)

pub mod fetch;
pub mod launcher;
pub mod lifecycle;
pub mod process;

pub use fetch::{EngineFetcher, FetchError};
pub use lifecycle::{EngineConfig, LedgerEngine};
pub use process::{CapabilityScope, ProcessInvoker, ProcessOutput};
