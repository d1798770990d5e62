//! Transport behavior against misbehaving engines.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use ledger_gateway::engine::process::pid_is_alive;
use ledger_gateway::Error;
use serde_json::json;

use crate::fixture::FakeEngine;

#[tokio::test]
async fn test_timeout_kills_engine() {
    let engine = FakeEngine::with_script("exec sleep 30\n", Duration::from_secs(1)).await;

    let started = Instant::now();
    let err = engine.client.version().await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
    match err {
        Error::Timeout { timeout, pid, .. } => {
            assert_eq!(timeout, Duration::from_secs(1));
            let pid = pid.expect("pid of killed engine");
            assert!(!pid_is_alive(pid), "engine {} still running", pid);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_carries_stderr() {
    let engine = FakeEngine::with_script(
        "echo 'engine stuck loading module' >&2\nexec sleep 30\n",
        Duration::from_secs(1),
    )
    .await;

    match engine.client.version().await.unwrap_err() {
        Error::Timeout { stderr, .. } => assert_eq!(stderr, "engine stuck loading module"),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_output_reports_exit_code() {
    let engine = FakeEngine::with_script("cat > /dev/null\nexit 1\n", Duration::from_secs(10)).await;

    match engine.client.version().await.unwrap_err() {
        Error::EmptyResponse {
            diagnostic,
            exit_code,
        } => {
            assert_eq!(exit_code, Some(1));
            assert!(diagnostic.contains("Exit code 1"), "diagnostic: {}", diagnostic);
        }
        other => panic!("expected empty response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_output_carries_stderr() {
    let engine = FakeEngine::with_script(
        "cat > /dev/null\necho 'Error: unknown import' >&2\nexit 1\n",
        Duration::from_secs(10),
    )
    .await;

    match engine.client.version().await.unwrap_err() {
        Error::EmptyResponse { diagnostic, .. } => {
            assert_eq!(diagnostic, "Error: unknown import")
        }
        other => panic!("expected empty response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_object_becomes_protocol_error() {
    let engine = FakeEngine::with_script(
        r#"cat > /dev/null
printf '%s\n' '{"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":1}'
"#,
        Duration::from_secs(10),
    )
    .await;

    match engine.client.types().await.unwrap_err() {
        Error::Protocol { code, message } => {
            assert_eq!(code, -32601);
            assert_eq!(message, "Method not found");
        }
        other => panic!("expected protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_output_is_malformed() {
    let engine = FakeEngine::with_script(
        "cat > /dev/null\necho 'thread main panicked'\necho 'wasm backtrace' >&2\nexit 101\n",
        Duration::from_secs(10),
    )
    .await;

    match engine.client.version().await.unwrap_err() {
        Error::MalformedResponse {
            stderr, exit_code, ..
        } => {
            assert_eq!(exit_code, Some(101));
            assert_eq!(stderr, "wasm backtrace");
        }
        other => panic!("expected malformed response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_utf8_output_is_malformed() {
    let engine = FakeEngine::with_script(
        r#"cat > /dev/null
printf '{"jsonrpc":"2.0","result":{"api_version":"1.0","formatted":"caf\351"},"id":1}\n'
"#,
        Duration::from_secs(10),
    )
    .await;

    assert!(matches!(
        engine.client.format_source("").await,
        Err(Error::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn test_mismatched_id_is_malformed() {
    let engine = FakeEngine::with_script(
        r#"cat > /dev/null
printf '%s\n' '{"jsonrpc":"2.0","result":{"api_version":"1.0","version":"0.9.1"},"id":999}'
"#,
        Duration::from_secs(10),
    )
    .await;

    match engine.client.version().await.unwrap_err() {
        Error::MalformedResponse { reason, .. } => {
            assert!(reason.contains("999"), "reason: {}", reason)
        }
        other => panic!("expected malformed response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ids_increase_per_call() {
    let engine = FakeEngine::responding(json!({"api_version": "1.0", "version": "0.9.1"})).await;

    for _ in 0..3 {
        assert_eq!(engine.client.version().await.unwrap(), "0.9.1");
    }

    let ids: Vec<u64> = engine
        .requests()
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_params_omitted_without_arguments() {
    let engine = FakeEngine::responding(json!({"api_version": "1.0"})).await;

    assert_eq!(engine.client.version().await.unwrap(), "unknown");

    let request = &engine.requests()[0];
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "util.version");
    assert!(request.get("params").is_none());
}

#[tokio::test]
async fn test_incompatible_api_version() {
    let engine = FakeEngine::responding(json!({"api_version": "2.0", "valid": true})).await;

    match engine.client.validate("").await.unwrap_err() {
        Error::ApiVersion { expected, found } => {
            assert_eq!(expected, "1.");
            assert_eq!(found.as_deref(), Some("2.0"));
        }
        other => panic!("expected api version error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_api_version_check_can_be_disabled() {
    let config = ledger_gateway::EngineConfig::new()
        .with_timeout(Duration::from_secs(10))
        .with_api_version_check(false);
    let engine = FakeEngine::build(crate::fixture::RESPONDER, config).await;
    engine.set_default_result(json!({"valid": true}));

    let result = engine.client.validate("").await.unwrap();
    assert!(result.valid);
    assert_eq!(result.api_version, "");
}

#[tokio::test]
async fn test_concurrent_calls_use_distinct_ids() {
    let engine = FakeEngine::responding(json!({"api_version": "1.0", "valid": true})).await;

    let calls = (0..12).map(|_| {
        let client = engine.client.clone();
        tokio::spawn(async move { client.validate("").await })
    });
    for handle in calls.collect::<Vec<_>>() {
        assert!(handle.await.unwrap().unwrap().valid);
    }

    let ids: HashSet<u64> = engine
        .requests()
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids.len(), 12);
}

#[tokio::test]
async fn test_engine_binary_passed_last() {
    let engine = FakeEngine::responding(json!({"api_version": "1.0"})).await;
    engine.client.version().await.unwrap();

    let args = engine.args();
    assert_eq!(args[0], format!("run {}", engine.binary().display()));
}
