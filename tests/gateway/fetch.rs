//! Engine module download on first use.

use ledger_gateway::{EngineConfig, EngineFetcher, Error, FetchError, LedgerEngine};
use sha2::{Digest, Sha256};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::fixture::{write_script, RESPONDER};

const MODULE_BYTES: &[u8] = b"\0asm\x01\0\0\0";

async fn serve_module(server: &MockServer, status: u16, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path("/engine.wasm"))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(MODULE_BYTES))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_download_creates_parent_directories() {
    let server = MockServer::start().await;
    serve_module(&server, 200, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("cache/nested/engine.wasm");
    let fetcher = EngineFetcher::with_url(format!("{}/engine.wasm", server.uri()));

    assert!(fetcher.ensure(&target).await.unwrap());
    assert_eq!(std::fs::read(&target).unwrap(), MODULE_BYTES);

    // Second call finds the file and stays offline.
    assert!(!fetcher.ensure(&target).await.unwrap());
}

#[tokio::test]
async fn test_http_error_is_acquisition_failure() {
    let server = MockServer::start().await;
    serve_module(&server, 404, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("engine.wasm");
    let fetcher = EngineFetcher::with_url(format!("{}/engine.wasm", server.uri()));

    match fetcher.ensure(&target).await.unwrap_err() {
        FetchError::Status { status, .. } => assert_eq!(status, 404),
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(!target.exists(), "failed download must not leave a file");
}

#[tokio::test]
async fn test_checksum_mismatch_rejected() {
    let server = MockServer::start().await;
    serve_module(&server, 200, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("engine.wasm");
    let fetcher = EngineFetcher::with_url(format!("{}/engine.wasm", server.uri()))
        .with_sha256(Some("00".repeat(32)));

    assert!(matches!(
        fetcher.ensure(&target).await,
        Err(FetchError::Integrity { .. })
    ));
    assert!(!target.exists());
}

#[tokio::test]
async fn test_engine_construction_downloads_then_runs() {
    let server = MockServer::start().await;
    serve_module(&server, 200, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let binary = dir.path().join("modules/engine.wasm");
    let launcher = write_script(dir.path(), "fake-wasmtime", RESPONDER);
    std::fs::write(
        dir.path().join("result.json"),
        r#"{"api_version":"1.0","version":"0.9.1"}"#,
    )
    .unwrap();

    let config = EngineConfig::new()
        .with_binary_path(&binary)
        .with_launcher(&launcher)
        .with_download_url(format!("{}/engine.wasm", server.uri()))
        .with_sha256(hex::encode(Sha256::digest(MODULE_BYTES)));
    let client = ledger_gateway::LedgerClient::connect(config).await.unwrap();

    assert!(binary.exists());
    assert_eq!(client.engine().binary_path(), binary.as_path());
    assert_eq!(client.version().await.unwrap(), "0.9.1");
}

#[tokio::test]
async fn test_failed_download_is_fatal() {
    let server = MockServer::start().await;
    serve_module(&server, 500, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::new()
        .with_binary_path(dir.path().join("engine.wasm"))
        .with_launcher("/bin/sh")
        .with_download_url(format!("{}/engine.wasm", server.uri()));

    let err = LedgerEngine::new(config).await.unwrap_err();
    assert!(matches!(err, Error::Acquisition(FetchError::Status { status: 500, .. })));
    assert!(err.is_fatal());
}
