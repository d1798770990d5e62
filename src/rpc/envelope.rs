//! JSON-RPC 2.0 envelopes exchanged with the engine.
//!
//! Wire format: one compact JSON object per direction.
//! - Request: `{"jsonrpc":"2.0","method":"...","params":{...},"id":1}`
//! - Response: `{"jsonrpc":"2.0","result":{...},"id":1}`
//! - Error: `{"jsonrpc":"2.0","error":{"code":...,"message":"..."},"id":1}`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::process::ProcessOutput;
use crate::error::{Error, Result, INTERNAL_ERROR_CODE};

pub const JSONRPC_VERSION: &str = "2.0";

/// Outbound request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Request<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<&'a Map<String, Value>>,
    pub id: u64,
}

impl<'a> Request<'a> {
    pub fn new(id: u64, method: &'a str, params: Option<&'a Map<String, Value>>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorObject {
    pub code: Option<i64>,
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Inbound response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorObject>,
}

/// Turn raw engine output into the result mapping for request `id`.
///
/// An error object wins over a result; a response with neither yields an
/// empty mapping. The echoed id must match the request.
pub fn decode_response(id: u64, output: &ProcessOutput) -> Result<Map<String, Value>> {
    if output.stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::EmptyResponse {
            diagnostic: output.diagnostic(),
            exit_code: output.exit_code,
        });
    }

    // Parsed from raw bytes: output that is not valid UTF-8 is not a response.
    let response: Response = serde_json::from_slice(&output.stdout)
        .map_err(|e| Error::malformed(e.to_string(), output))?;

    if let Some(error) = response.error {
        return Err(Error::Protocol {
            code: error.code.unwrap_or(INTERNAL_ERROR_CODE),
            message: error.message.unwrap_or_else(|| "Unknown error".to_string()),
        });
    }

    match response.jsonrpc.as_deref() {
        Some(JSONRPC_VERSION) => {}
        other => {
            return Err(Error::malformed(
                format!("unsupported jsonrpc version {:?}", other),
                output,
            ))
        }
    }

    match response.id.as_ref().and_then(Value::as_u64) {
        Some(echoed) if echoed == id => {}
        _ => {
            return Err(Error::malformed(
                format!(
                    "response id {} does not match request id {}",
                    response.id.unwrap_or(Value::Null),
                    id
                ),
                output,
            ))
        }
    }

    match response.result {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(other) => Err(Error::malformed(
            format!("result is not an object: {}", other),
            output,
        )),
    }
}
