//! Request/response client over one-shot engine processes.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};

use crate::engine::lifecycle::LedgerEngine;
use crate::engine::process::{CapabilityScope, ProcessOutput};
use crate::error::Result;
use crate::rpc::envelope::{decode_response, Request};

/// A decoded result and the engine output it was read from.
#[derive(Debug, Clone)]
pub struct Reply {
    pub result: Map<String, Value>,
    /// Kept so later failures on the result can still report stderr.
    pub output: ProcessOutput,
}

/// JSON-RPC client bound to an engine handle.
///
/// Stateless between calls apart from the handle's id counter, so it can be
/// cloned freely and used from concurrent tasks.
#[derive(Debug, Clone)]
pub struct RpcClient {
    engine: Arc<LedgerEngine>,
}

impl RpcClient {
    pub fn new(engine: Arc<LedgerEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<LedgerEngine> {
        &self.engine
    }

    /// Perform one JSON-RPC call and return its `result` mapping.
    ///
    /// `params` is omitted from the envelope when `None`. `scope` grants the
    /// engine filesystem access for this call only.
    pub async fn call(
        &self,
        method: &str,
        params: Option<Map<String, Value>>,
        scope: Option<&CapabilityScope>,
    ) -> Result<Map<String, Value>> {
        Ok(self.exchange(method, params, scope).await?.result)
    }

    /// Like [`call`](Self::call), also returning the raw process output.
    pub async fn exchange(
        &self,
        method: &str,
        params: Option<Map<String, Value>>,
        scope: Option<&CapabilityScope>,
    ) -> Result<Reply> {
        let id = self.engine.next_request_id();
        let payload = Request::new(id, method, params.as_ref()).to_bytes()?;

        log::debug!(
            "rpc {} id={} scope={:?} bytes={}",
            method,
            id,
            scope.map(CapabilityScope::path),
            payload.len()
        );
        let started = Instant::now();

        let output = self.engine.invoke(&payload, scope).await?;
        let result = decode_response(id, &output);

        log::debug!(
            "rpc {} id={} finished in {:?} (exit {:?}, ok={})",
            method,
            id,
            started.elapsed(),
            output.exit_code,
            result.is_ok()
        );

        Ok(Reply {
            result: result?,
            output,
        })
    }
}
