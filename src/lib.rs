//! Ledger gateway - Rust client for the rustledger engine over JSON-RPC on stdio.

mod defaults;
pub mod error;

pub mod client;
pub mod engine;
pub mod filter;
pub mod rpc;

pub use error::{Error, Result};

pub use engine::fetch::{EngineFetcher, FetchError};
pub use engine::lifecycle::{EngineConfig, LedgerEngine};
pub use engine::process::{CapabilityScope, ProcessInvoker, ProcessOutput};

pub use rpc::client::RpcClient;
pub use rpc::methods;

pub use client::{
    check_api_version, EngineDiagnostic, EntriesResult, Entry, LedgerClient, LoadFullResult,
    LoadResult, QueryResult, TypesResult, ValidateResult, VersionInfo,
};
pub use filter::{entry_in_window, filter_entries, DirectiveKind};

pub use defaults::{ENGINE_URL, ENGINE_VERSION, SUPPORTED_API_VERSION};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
