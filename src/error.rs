//! Error types for the ledger gateway.

use std::time::Duration;

use thiserror::Error;

use crate::engine::process::ProcessOutput;

/// JSON-RPC "internal error" code, used when the engine omits one.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// Gateway error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Launcher executable missing or engine misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Engine binary could not be acquired
    #[error("Acquisition error: {0}")]
    Acquisition(#[from] crate::engine::fetch::FetchError),

    /// Engine process could not be started
    #[error("Failed to launch {launcher}: {source}")]
    Launch {
        launcher: String,
        #[source]
        source: std::io::Error,
    },

    /// Engine process exceeded its time budget and was killed
    #[error("Engine timed out after {timeout:?}{}", stderr_suffix(.stderr))]
    Timeout {
        timeout: Duration,
        pid: Option<u32>,
        /// Whatever the engine wrote to stderr before it was killed
        stderr: String,
    },

    /// Engine produced no output on stdout
    #[error("Empty response: {diagnostic}")]
    EmptyResponse {
        diagnostic: String,
        exit_code: Option<i32>,
    },

    /// Engine output was not a valid JSON-RPC response
    #[error("Invalid JSON response: {reason}{}", stderr_suffix(.stderr))]
    MalformedResponse {
        reason: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    /// Engine returned a JSON-RPC error object
    #[error("[{code}] {message}")]
    Protocol { code: i64, message: String },

    /// Engine speaks an API version this client does not support
    #[error("Incompatible API version {found:?}, expected {expected}*")]
    ApiVersion {
        expected: &'static str,
        found: Option<String>,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error came from engine construction rather than a single call.
    ///
    /// Fatal errors mean the installation is broken; re-issuing the call will
    /// not help.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::Acquisition(_))
    }

    pub(crate) fn malformed(reason: impl Into<String>, output: &ProcessOutput) -> Self {
        Error::MalformedResponse {
            reason: reason.into(),
            stderr: captured(&output.stderr),
            exit_code: output.exit_code,
        }
    }
}

/// Trimmed, lossily decoded stderr.
pub(crate) fn captured(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).trim().to_string()
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(" (stderr: {})", stderr)
    }
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;
