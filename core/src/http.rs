//! HTTP transport types exchanged with the transport primitives.
//!
//! # Design
//! Requests and transport events are plain data. The HTTP strategy builds an
//! `HttpRequest`, hands it to an `HttpTransport` primitive, and interprets the
//! `HttpResponse` / `ProgressEvent` values the primitive reports back. The
//! strategy never touches the network itself, so it can be driven by a real
//! client or by a test double with identical results.
//!
//! Response headers travel as the raw `Name: Value` blob a browser-style
//! transport exposes; `parse_header_blob` turns it into a map.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// HTTP method accepted in request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
}

impl HttpMethod {
    /// Case-insensitive lookup; `None` for anything outside the closed set.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "PATCH" => Some(HttpMethod::Patch),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// GET and HEAD requests never carry a body on the wire.
    pub fn allows_body(self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request mode. Validated and carried along; neither strategy acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Cors,
    NoCors,
    SameOrigin,
    Navigate,
}

impl RequestMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "cors" => Some(RequestMode::Cors),
            "no-cors" => Some(RequestMode::NoCors),
            "same-origin" => Some(RequestMode::SameOrigin),
            "navigate" => Some(RequestMode::Navigate),
            _ => None,
        }
    }
}

/// Expected response interpretation. `Jsonp` also selects the
/// script-injection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Json,
    Jsonp,
    ArrayBuffer,
}

impl ResponseType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "text" => Some(ResponseType::Text),
            "json" => Some(ResponseType::Json),
            "jsonp" => Some(ResponseType::Jsonp),
            "arraybuffer" => Some(ResponseType::ArrayBuffer),
            _ => None,
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub response_type: ResponseType,
}

/// A completed HTTP response as reported by a transport primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    /// Raw header blob, one `Name: Value` pair per line.
    pub headers: String,
    pub body: Vec<u8>,
}

/// In-flight transfer state reported while a response body is arriving.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub ready_state: u8,
    pub status: u16,
    pub status_text: String,
    pub headers: String,
    pub loaded: u64,
    /// Zero when the total size is not known.
    pub total: u64,
}

static HEADER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+): (.+)").expect("header line pattern is valid"));

/// Parse a newline-separated header blob into a map.
///
/// Each line is matched against `name: value`. The name is greedy, so a line
/// containing several `": "` separators splits on the last one. Lines that do
/// not match are skipped. A trailing `\r` is dropped before matching.
pub fn parse_header_blob(blob: &str) -> BTreeMap<String, String> {
    blob.split('\n')
        .filter_map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            HEADER_LINE
                .captures(line)
                .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        })
        .collect()
}
