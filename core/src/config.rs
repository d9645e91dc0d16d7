//! Option validation and normalization.
//!
//! # Design
//! `normalize` is a pure function from `RequestOptions` to either a
//! `NormalizedConfig` or the first `DispatchError` encountered. Checks run in
//! a fixed order (method, url, mode, type) and every enum-like field comes out
//! as a closed enum. The strategy for a dispatch is derived from the
//! normalized response type and never re-inspected from strings.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::body::encode_body;
use crate::error::DispatchError;
use crate::http::{HttpMethod, HttpRequest, RequestMode, ResponseType};
use crate::options::RequestOptions;

pub const DEFAULT_TIMEOUT_MS: i64 = 2500;

/// Which transport strategy a normalized config runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Http,
    ScriptInjection,
}

/// A validated, defaulted copy of `RequestOptions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedConfig {
    pub method: HttpMethod,
    pub url: String,
    pub mode: RequestMode,
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    /// Accepted and normalized, but no strategy enforces it.
    pub timeout: i64,
}

impl NormalizedConfig {
    pub fn strategy(&self) -> StrategyKind {
        match self.response_type {
            ResponseType::Jsonp => StrategyKind::ScriptInjection,
            _ => StrategyKind::Http,
        }
    }

    /// Build the request an `HttpTransport` executes. Bodies on GET and HEAD
    /// are dropped.
    pub fn to_http_request(&self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.url.clone(),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body: self.body.clone().filter(|_| self.method.allows_body()),
            response_type: self.response_type,
        }
    }
}

/// Validate `options` and fill in defaults.
pub fn normalize(options: &RequestOptions) -> Result<NormalizedConfig, DispatchError> {
    let options = options.clone();

    let method = match options.method.as_deref() {
        None => HttpMethod::Get,
        Some(raw) => {
            HttpMethod::parse(raw).ok_or_else(|| DispatchError::InvalidMethod(raw.to_string()))?
        }
    };

    let url = match options.url {
        Some(url) if !url.is_empty() => url,
        _ => return Err(DispatchError::MissingUrl),
    };

    let mode = match options.mode.as_deref() {
        None => RequestMode::Cors,
        Some(raw) => {
            RequestMode::parse(raw).ok_or_else(|| DispatchError::InvalidMode(raw.to_string()))?
        }
    };

    let response_type = match options.response_type.as_deref() {
        None => ResponseType::Text,
        Some(raw) => {
            ResponseType::parse(raw).ok_or_else(|| DispatchError::InvalidType(raw.to_string()))?
        }
    };

    let mut headers = options.headers.unwrap_or_default();
    let body = encode_body(&mut headers, options.body);
    let timeout = parse_timeout(options.timeout.as_ref());

    Ok(NormalizedConfig {
        method,
        url,
        mode,
        response_type,
        headers,
        body,
        timeout,
    })
}

/// Integer coercion with a fallback: the leading integer of a string or the
/// truncated number. Zero, non-numeric and absent values give the default.
pub fn parse_timeout(raw: Option<&Value>) -> i64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Some(Value::String(s)) => leading_integer(s),
        _ => None,
    };
    match parsed {
        None | Some(0) => DEFAULT_TIMEOUT_MS,
        Some(ms) => ms,
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
