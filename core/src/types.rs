//! Result values handed to the host bridge.
//!
//! # Design
//! Each transport event produces a fresh value here and the dispatcher keeps
//! nothing. The serialized shape uses camelCase keys so a host bridge can pass
//! the JSON straight to the caller.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::http::{parse_header_blob, HttpResponse, ProgressEvent, ResponseType};

/// Status reported when the transport failed before any response arrived.
pub const ERROR_STATUS: i32 = -1;

/// Opaque token the caller uses to correlate an asynchronous result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CallbackId(String);

impl CallbackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallbackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Response body interpreted according to the requested `ResponseType`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Text(String),
    Json(Value),
    Bytes(Vec<u8>),
}

impl ResponseData {
    /// JSON that fails to parse decodes to `null`.
    pub fn decode(response_type: ResponseType, body: Vec<u8>) -> Self {
        match response_type {
            ResponseType::Json => {
                ResponseData::Json(serde_json::from_slice(&body).unwrap_or(Value::Null))
            }
            ResponseType::ArrayBuffer => ResponseData::Bytes(body),
            ResponseType::Text | ResponseType::Jsonp => {
                ResponseData::Text(String::from_utf8_lossy(&body).into_owned())
            }
        }
    }
}

/// Terminal result of an HTTP dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseResult {
    pub status: i32,
    pub ok: bool,
    pub status_text: String,
    pub data: ResponseData,
    pub headers: BTreeMap<String, String>,
}

impl ResponseResult {
    pub fn from_response(response: HttpResponse, response_type: ResponseType) -> Self {
        let status = i32::from(response.status);
        Self {
            status,
            ok: (200..300).contains(&status),
            status_text: response.status_text,
            data: ResponseData::decode(response_type, response.body),
            headers: parse_header_blob(&response.headers),
        }
    }

    /// The sentinel delivered when the transport fails.
    pub fn transport_error() -> Self {
        Self {
            status: ERROR_STATUS,
            ok: false,
            status_text: String::new(),
            data: ResponseData::Text(String::new()),
            headers: BTreeMap::new(),
        }
    }
}

/// Non-terminal snapshot of an in-flight HTTP transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResult {
    pub ready_state: u8,
    pub status: i32,
    pub length: u64,
    pub total: u64,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
}

impl From<ProgressEvent> for ProgressResult {
    fn from(event: ProgressEvent) -> Self {
        Self {
            ready_state: event.ready_state,
            status: i32::from(event.status),
            length: event.loaded,
            total: event.total,
            status_text: event.status_text,
            headers: parse_header_blob(&event.headers),
        }
    }
}

/// Everything a host bridge can receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Delivery {
    Response(ResponseResult),
    Progress(ProgressResult),
    /// Payload produced by the script-injection primitive.
    Script(Value),
    /// Error raised by the script-injection primitive, passed through as its
    /// message.
    ScriptError(String),
}

impl From<Result<Value, TransportError>> for Delivery {
    fn from(outcome: Result<Value, TransportError>) -> Self {
        match outcome {
            Ok(payload) => Delivery::Script(payload),
            Err(err) => Delivery::ScriptError(err.to_string()),
        }
    }
}
