//! Typed results returned by the client API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A ledger directive as produced by the engine.
///
/// Only the directive kind and date are interpreted by the gateway; every
/// other field (accounts, postings, meta, hash) is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Directive kind, e.g. `Open`, `Close`, `Transaction`
    #[serde(rename = "type")]
    pub kind: String,
    /// ISO date, `YYYY-MM-DD`
    pub date: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entry {
    pub fn new(kind: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            date: date.into(),
            fields: Map::new(),
        }
    }
}

/// An error or warning the engine reported about ledger content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineDiagnostic {
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Result of `ledger.load`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadResult {
    #[serde(default, alias = "apiVersion")]
    pub api_version: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub errors: Vec<EngineDiagnostic>,
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Result of `ledger.loadFile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadFullResult {
    #[serde(default, alias = "apiVersion")]
    pub api_version: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub errors: Vec<EngineDiagnostic>,
    #[serde(default)]
    pub options: Map<String, Value>,
    /// Plugin directives declared in the file
    #[serde(default)]
    pub plugins: Vec<Value>,
    /// Every file pulled in through includes
    #[serde(default)]
    pub loaded_files: Vec<String>,
}

/// Result of `ledger.validate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateResult {
    #[serde(default, alias = "apiVersion")]
    pub api_version: String,
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<EngineDiagnostic>,
}

/// Result of `query.execute`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default, alias = "apiVersion")]
    pub api_version: String,
    #[serde(default)]
    pub columns: Vec<Value>,
    #[serde(default)]
    pub rows: Vec<Value>,
    #[serde(default)]
    pub errors: Vec<EngineDiagnostic>,
}

/// Result of `entry.clamp` and `entry.filter`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntriesResult {
    #[serde(default, alias = "apiVersion")]
    pub api_version: String,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub errors: Vec<EngineDiagnostic>,
}

/// Result of `util.types`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypesResult {
    #[serde(default, alias = "apiVersion")]
    pub api_version: String,
    #[serde(default)]
    pub all_directives: Vec<String>,
    #[serde(default)]
    pub booking_methods: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of `util.version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    #[serde(default, alias = "apiVersion")]
    pub api_version: String,
    #[serde(default = "unknown_version")]
    pub version: String,
}

fn unknown_version() -> String {
    "unknown".to_string()
}

#[derive(Deserialize)]
pub(crate) struct Formatted {
    #[serde(default)]
    pub formatted: String,
}

#[derive(Deserialize)]
pub(crate) struct Encrypted {
    #[serde(default)]
    pub encrypted: bool,
}

#[derive(Deserialize)]
pub(crate) struct AccountType {
    #[serde(default, rename = "accountType")]
    pub account_type: String,
}

#[derive(Deserialize)]
pub(crate) struct CreatedEntry {
    pub entry: Entry,
}

#[derive(Deserialize)]
pub(crate) struct CreatedEntries {
    #[serde(default)]
    pub entries: Vec<Entry>,
}
