//! Engine binary fetching.

use std::path::{Path, PathBuf};

use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::defaults::{DOWNLOAD_TIMEOUT, ENGINE_URL, ENGINE_VERSION};

/// Errors that can occur while acquiring the engine binary.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to download {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Engine binary fetcher.
///
/// Downloads the engine module once, when it is missing locally. There is no
/// retry: a failed attempt surfaces immediately.
pub struct EngineFetcher {
    client: Client,
    url: String,
    expected_sha256: Option<String>,
}

impl EngineFetcher {
    /// Create a fetcher for the pinned engine release.
    pub fn new() -> Self {
        Self::with_url(ENGINE_URL)
    }

    /// Create a fetcher for a custom download location.
    pub fn with_url(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.into(),
            expected_sha256: None,
        }
    }

    /// Require the download to hash to the given lowercase hex SHA-256.
    pub fn with_sha256(mut self, expected: Option<String>) -> Self {
        self.expected_sha256 = expected.map(|s| s.to_ascii_lowercase());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make sure a file exists at `path`, downloading it if necessary.
    ///
    /// Returns `true` when a download took place.
    pub async fn ensure(&self, path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        log::info!("Downloading rustledger engine ({})...", ENGINE_VERSION);
        let content = self.download().await?;
        self.verify(&content)?;
        install(path, &content).await?;
        log::info!("Installed rustledger engine at {:?}", path);

        Ok(true)
    }

    async fn download(&self) -> Result<Vec<u8>> {
        let http_err = |source| FetchError::Http {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().await.map_err(http_err)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(http_err)?;
        Ok(bytes.to_vec())
    }

    fn verify(&self, content: &[u8]) -> Result<()> {
        let Some(expected) = &self.expected_sha256 else {
            return Ok(());
        };

        let actual = hex::encode(Sha256::digest(content));
        if &actual != expected {
            return Err(FetchError::Integrity {
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }
}

impl Default for EngineFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Write via a temp sibling so a failed write never leaves a partial binary.
async fn install(path: &Path, content: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("part");
    let io_err = |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Err(e) = tokio::fs::write(&tmp_path, content).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(io_err(e));
    }
    tokio::fs::rename(&tmp_path, path).await.map_err(io_err)
}
