//! Engine handle construction and configuration.
//!
//! Provides the `LedgerEngine` struct which binds:
//! - The engine module path, downloaded on first use
//! - The launcher executable, resolved once
//! - The per-handle correlation counter

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::defaults::{
    CALL_TIMEOUT, ENGINE_FILE_NAME, ENGINE_PATH_ENV, ENGINE_URL, LAUNCHER_NAME, LAUNCHER_PATH_ENV,
};
use crate::engine::fetch::EngineFetcher;
use crate::engine::launcher::resolve_launcher;
use crate::engine::process::{CapabilityScope, ProcessInvoker, ProcessOutput};
use crate::error::{Error, Result};

/// Settings used to build a [`LedgerEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Where the engine module lives (or will be downloaded to).
    pub binary_path: PathBuf,
    /// Launcher name or path; bare names are looked up on `PATH`.
    pub launcher: PathBuf,
    pub download_url: String,
    /// Lowercase hex SHA-256 the download must match, if any.
    pub expected_sha256: Option<String>,
    /// Upper bound for a single engine call.
    pub timeout: Duration,
    /// Reject results whose `api_version` is not `1.x`.
    pub verify_api_version: bool,
}

impl EngineConfig {
    pub fn new() -> Self {
        let binary_path = std::env::var_os(ENGINE_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_binary_path);
        let launcher = std::env::var_os(LAUNCHER_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(LAUNCHER_NAME));

        Self {
            binary_path,
            launcher,
            download_url: ENGINE_URL.to_string(),
            expected_sha256: None,
            timeout: CALL_TIMEOUT,
            verify_api_version: true,
        }
    }

    pub fn with_binary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    pub fn with_launcher(mut self, launcher: impl Into<PathBuf>) -> Self {
        self.launcher = launcher.into();
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.expected_sha256 = Some(digest.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_api_version_check(mut self, enabled: bool) -> Self {
        self.verify_api_version = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_binary_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ledger-gateway")
        .join(ENGINE_FILE_NAME)
}

static SHARED_ENGINE: OnceCell<Arc<LedgerEngine>> = OnceCell::const_new();

/// A resolved binding to the engine module and its launcher.
///
/// The handle holds no process: every call spawns a fresh engine. It is
/// cheap to share behind an `Arc` and safe to call from many tasks at once.
#[derive(Debug)]
pub struct LedgerEngine {
    binary_path: PathBuf,
    invoker: ProcessInvoker,
    timeout: Duration,
    verify_api_version: bool,
    next_id: AtomicU64,
}

impl LedgerEngine {
    /// Build a handle, downloading the engine module if it is missing.
    ///
    /// Fails with [`Error::Acquisition`] if the download fails and with
    /// [`Error::Configuration`] if the launcher cannot be found.
    pub async fn new(config: EngineConfig) -> Result<Self> {
        let fetcher = EngineFetcher::with_url(config.download_url.clone())
            .with_sha256(config.expected_sha256.clone());
        fetcher.ensure(&config.binary_path).await?;

        if !config.binary_path.is_file() {
            return Err(Error::Configuration(format!(
                "engine module missing at {}",
                config.binary_path.display()
            )));
        }

        let launcher = resolve_launcher(&config.launcher)?;
        log::debug!(
            "Using launcher {:?} for engine {:?}",
            launcher,
            config.binary_path
        );

        Ok(Self {
            binary_path: config.binary_path,
            invoker: ProcessInvoker::new(launcher),
            timeout: config.timeout,
            verify_api_version: config.verify_api_version,
            next_id: AtomicU64::new(1),
        })
    }

    /// Process-wide handle, constructed once on first use.
    ///
    /// Concurrent first callers wait for a single construction. The config is
    /// only consulted by the call that performs it; if construction fails the
    /// next call tries again.
    pub async fn shared(config: EngineConfig) -> Result<Arc<Self>> {
        SHARED_ENGINE
            .get_or_try_init(move || async move { Self::new(config).await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn launcher(&self) -> &Path {
        self.invoker.launcher()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn verifies_api_version(&self) -> bool {
        self.verify_api_version
    }

    /// Allocate the next correlation id. Never returns the same value twice.
    pub fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Run the engine once with `request` on stdin.
    pub async fn invoke(
        &self,
        request: &[u8],
        scope: Option<&CapabilityScope>,
    ) -> Result<ProcessOutput> {
        self.invoker
            .invoke(&self.binary_path, request, scope, self.timeout)
            .await
    }
}
