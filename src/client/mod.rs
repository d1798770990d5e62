//! High-level client API for the ledger engine.
//!
//! Each method maps to one engine call (two for [`LedgerClient::clamp`]) and
//! projects the result into a typed record.

mod response;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::defaults::{STDIN_FILENAME, SUPPORTED_API_VERSION};
use crate::engine::lifecycle::{EngineConfig, LedgerEngine};
use crate::engine::process::CapabilityScope;
use crate::error::{Error, Result};
use crate::rpc::client::{Reply, RpcClient};
use crate::rpc::methods;

use response::{AccountType, CreatedEntries, CreatedEntry, Encrypted, Formatted};
pub use response::{
    EngineDiagnostic, EntriesResult, Entry, LoadFullResult, LoadResult, QueryResult, TypesResult,
    ValidateResult, VersionInfo,
};

/// A client for the rustledger engine.
///
/// Cloning is cheap; clones share the same engine handle.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    rpc: RpcClient,
}

impl LedgerClient {
    /// Create a client over an existing engine handle.
    pub fn new(engine: Arc<LedgerEngine>) -> Self {
        Self {
            rpc: RpcClient::new(engine),
        }
    }

    /// Build a dedicated engine handle and a client over it.
    pub async fn connect(config: EngineConfig) -> Result<Self> {
        let engine = LedgerEngine::new(config).await?;
        Ok(Self::new(Arc::new(engine)))
    }

    /// Client over the process-wide engine handle.
    pub async fn shared(config: EngineConfig) -> Result<Self> {
        Ok(Self::new(LedgerEngine::shared(config).await?))
    }

    pub fn engine(&self) -> &Arc<LedgerEngine> {
        self.rpc.engine()
    }

    /// Parse ledger source into entries, errors and options.
    ///
    /// `filename` is used in entry metadata; it is only sent when it differs
    /// from `<stdin>`.
    pub async fn load(&self, source: &str, filename: &str) -> Result<LoadResult> {
        let mut params = Map::new();
        params.insert("source".into(), json!(source));
        if filename != STDIN_FILENAME {
            params.insert("filename".into(), json!(filename));
        }
        self.request(methods::LEDGER_LOAD, Some(params), None).await
    }

    /// Load a ledger file with include resolution, decryption and plugins.
    ///
    /// The engine is granted access to `/` so includes may reference any
    /// path, including parent directories.
    pub async fn load_full(&self, path: &Path, plugins: &[String]) -> Result<LoadFullResult> {
        let path = absolute_path(path)?;
        let mut params = Map::new();
        params.insert("path".into(), json!(path.to_string_lossy()));
        if !plugins.is_empty() {
            params.insert("plugins".into(), json!(plugins));
        }
        self.request(
            methods::LEDGER_LOAD_FILE,
            Some(params),
            Some(&CapabilityScope::root()),
        )
        .await
    }

    pub async fn validate(&self, source: &str) -> Result<ValidateResult> {
        let params = object(json!({ "source": source }));
        self.request(methods::LEDGER_VALIDATE, params, None).await
    }

    /// Run a query against ledger source.
    pub async fn query(&self, source: &str, query: &str) -> Result<QueryResult> {
        let params = object(json!({ "source": source, "query": query }));
        self.request(methods::QUERY_EXECUTE, params, None).await
    }

    /// Reformat ledger source to canonical form.
    pub async fn format_source(&self, source: &str) -> Result<String> {
        let params = object(json!({ "source": source }));
        let data: Formatted = self.request(methods::FORMAT_SOURCE, params, None).await?;
        Ok(data.formatted)
    }

    pub async fn format_entry(&self, entry: &Entry) -> Result<String> {
        let params = object(json!({ "entry": to_value(entry)? }));
        let data: Formatted = self.request(methods::FORMAT_ENTRY, params, None).await?;
        Ok(data.formatted)
    }

    pub async fn format_entries(&self, entries: &[Entry]) -> Result<String> {
        let params = object(json!({ "entries": to_value(entries)? }));
        let data: Formatted = self.request(methods::FORMAT_ENTRIES, params, None).await?;
        Ok(data.formatted)
    }

    /// Create a complete entry (with meta and hash) from a partial one.
    pub async fn create_entry(&self, spec: &Value) -> Result<Entry> {
        let params = object(json!({ "entry": spec }));
        let data: CreatedEntry = self.request(methods::ENTRY_CREATE, params, None).await?;
        Ok(data.entry)
    }

    pub async fn create_entries(&self, specs: &[Value]) -> Result<Vec<Entry>> {
        let params = object(json!({ "entries": specs }));
        let data: CreatedEntries = self
            .request(methods::ENTRY_CREATE_BATCH, params, None)
            .await?;
        Ok(data.entries)
    }

    /// Restrict source to a date range, summarizing earlier activity into
    /// opening balances.
    ///
    /// The engine is stateless, so the source is loaded first and the parsed
    /// entries are clamped in a second call.
    pub async fn clamp(
        &self,
        source: &str,
        begin_date: &str,
        end_date: &str,
    ) -> Result<EntriesResult> {
        let loaded = self
            .call(methods::LEDGER_LOAD, object(json!({ "source": source })), None)
            .await?;
        let entries = loaded
            .result
            .get("entries")
            .cloned()
            .unwrap_or_else(|| json!([]));
        self.clamp_raw(entries, begin_date, end_date).await
    }

    /// Like [`clamp`](Self::clamp) but on already-parsed entries.
    pub async fn clamp_entries(
        &self,
        entries: &[Entry],
        begin_date: &str,
        end_date: &str,
    ) -> Result<EntriesResult> {
        self.clamp_raw(to_value(entries)?, begin_date, end_date).await
    }

    /// Keep the entries visible in `[begin_date, end_date)`.
    ///
    /// See [`crate::filter::filter_entries`] for the exact rule.
    pub async fn filter_entries(
        &self,
        entries: &[Entry],
        begin_date: &str,
        end_date: &str,
    ) -> Result<EntriesResult> {
        let params = date_window(to_value(entries)?, begin_date, end_date);
        self.request(methods::ENTRY_FILTER, params, None).await
    }

    /// Check whether a file is GPG encrypted.
    pub async fn is_encrypted(&self, path: &Path) -> Result<bool> {
        let path = absolute_path(path)?;
        let params = object(json!({ "path": path.to_string_lossy() }));
        let data: Encrypted = self
            .request(
                methods::UTIL_IS_ENCRYPTED,
                params,
                Some(&CapabilityScope::root()),
            )
            .await?;
        Ok(data.encrypted)
    }

    /// Root type of an account (`Assets`, `Liabilities`, ...).
    pub async fn get_account_type(&self, account: &str) -> Result<String> {
        let params = object(json!({ "account": account }));
        let data: AccountType = self
            .request(methods::UTIL_GET_ACCOUNT_TYPE, params, None)
            .await?;
        Ok(data.account_type)
    }

    /// Engine type constants (directive kinds, booking methods, ...).
    pub async fn types(&self) -> Result<TypesResult> {
        self.request(methods::UTIL_TYPES, None, None).await
    }

    /// Engine version string, `"unknown"` if not reported.
    pub async fn version(&self) -> Result<String> {
        Ok(self.version_info().await?.version)
    }

    pub async fn version_info(&self) -> Result<VersionInfo> {
        self.request(methods::UTIL_VERSION, None, None).await
    }

    async fn clamp_raw(
        &self,
        entries: Value,
        begin_date: &str,
        end_date: &str,
    ) -> Result<EntriesResult> {
        let params = date_window(entries, begin_date, end_date);
        self.request(methods::ENTRY_CLAMP, params, None).await
    }

    async fn call(
        &self,
        method: &str,
        params: Option<Map<String, Value>>,
        scope: Option<&CapabilityScope>,
    ) -> Result<Reply> {
        let reply = self.rpc.exchange(method, params, scope).await?;
        if self.engine().verifies_api_version() {
            check_api_version(&reply.result)?;
        }
        Ok(reply)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Map<String, Value>>,
        scope: Option<&CapabilityScope>,
    ) -> Result<T> {
        let Reply { result, output } = self.call(method, params, scope).await?;
        serde_json::from_value(Value::Object(result)).map_err(|e| {
            Error::malformed(format!("unexpected {} result: {}", method, e), &output)
        })
    }
}

/// Verify a result declares an API version this client supports.
pub fn check_api_version(result: &Map<String, Value>) -> Result<()> {
    let found = result
        .get("api_version")
        .or_else(|| result.get("apiVersion"))
        .and_then(Value::as_str);

    match found {
        Some(version) if version.starts_with(SUPPORTED_API_VERSION) => Ok(()),
        other => Err(Error::ApiVersion {
            expected: SUPPORTED_API_VERSION,
            found: other.map(String::from),
        }),
    }
}

fn date_window(entries: Value, begin_date: &str, end_date: &str) -> Option<Map<String, Value>> {
    object(json!({
        "entries": entries,
        "beginDate": begin_date,
        "endDate": end_date,
    }))
}

fn object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(_) if path.is_absolute() => Ok(normalize(path)),
        Err(_) => Ok(normalize(&std::env::current_dir()?.join(path))),
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
