//! Transport primitives backed by a blocking `ureq` agent.
//!
//! Each request runs on its own thread so `send` / `fetch` return
//! immediately. Results reach the caller only through the event sink.

use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use serde_json::Value;
use ureq::http::{HeaderMap, Response};
use ureq::{Agent, Body};

use super::{HttpEvents, HttpTransport, ScriptCallback, ScriptTransport, LOADING};
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, ProgressEvent};

static NEXT_CALLBACK: AtomicUsize = AtomicUsize::new(0);

/// Settings for the bundled primitives.
#[derive(Debug, Clone)]
pub struct UreqConfig {
    /// Read size per progress event.
    pub chunk_size: usize,
    /// Query parameter naming the script callback.
    pub callback_param: String,
    /// Prefix of generated script callback names.
    pub callback_prefix: String,
    pub script_timeout: Duration,
}

impl Default for UreqConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16 * 1024,
            callback_param: "callback".to_string(),
            callback_prefix: "__jp".to_string(),
            script_timeout: Duration::from_secs(60),
        }
    }
}

/// HTTP primitive reporting progress per chunk read.
///
/// Non-2xx statuses are ordinary responses, not errors.
#[derive(Debug, Clone)]
pub struct UreqHttpTransport {
    agent: Agent,
    chunk_size: usize,
}

impl UreqHttpTransport {
    pub fn new(config: &UreqConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            chunk_size: config.chunk_size.max(1),
        }
    }
}

impl Default for UreqHttpTransport {
    fn default() -> Self {
        Self::new(&UreqConfig::default())
    }
}

impl HttpTransport for UreqHttpTransport {
    fn send(&self, request: HttpRequest, events: Box<dyn HttpEvents>) {
        let agent = self.agent.clone();
        let chunk_size = self.chunk_size;
        thread::spawn(move || exchange(&agent, request, chunk_size, events));
    }
}

fn exchange(agent: &Agent, request: HttpRequest, chunk_size: usize, mut events: Box<dyn HttpEvents>) {
    let mut response = match run(agent, request) {
        Ok(response) => response,
        Err(err) => return events.error(err),
    };

    let status = response.status().as_u16();
    let status_text = response
        .status()
        .canonical_reason()
        .unwrap_or_default()
        .to_string();
    let headers = header_blob(response.headers());
    let total = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let mut body = Vec::new();
    let mut buf = vec![0u8; chunk_size];
    let mut reader = response.body_mut().as_reader();
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                body.extend_from_slice(&buf[..n]);
                events.progress(ProgressEvent {
                    ready_state: LOADING,
                    status,
                    status_text: status_text.clone(),
                    headers: headers.clone(),
                    loaded: body.len() as u64,
                    total,
                });
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return events.error(TransportError::Body(err.to_string())),
        }
    }

    events.load(HttpResponse {
        status,
        status_text,
        headers,
        body,
    });
}

fn run(agent: &Agent, request: HttpRequest) -> Result<Response<Body>, TransportError> {
    let mut builder = ureq::http::Request::builder()
        .method(request.method.as_str())
        .uri(request.url.as_str());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let response = match request.body {
        Some(body) => agent.run(
            builder
                .body(body)
                .map_err(|e| TransportError::Network(e.to_string()))?,
        ),
        None => agent.run(
            builder
                .body(())
                .map_err(|e| TransportError::Network(e.to_string()))?,
        ),
    };
    Ok(response?)
}

/// Render headers as `Name: value` lines, the shape a browser transport
/// reports. Repeated headers collapse into one line joined by `", "`.
fn header_blob(headers: &HeaderMap) -> String {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}: {values}\r\n", name.as_str())
        })
        .collect()
}

/// Append `param=value` to the query of `url`, ahead of any fragment.
fn append_query(url: &str, param: &str, value: &str) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    match fragment {
        Some(fragment) => format!("{base}{separator}{param}={value}#{fragment}"),
        None => format!("{base}{separator}{param}={value}"),
    }
}

/// Script-injection primitive: fetches `url` with a generated callback name
/// and unwraps the JSON argument of that callback.
#[derive(Debug, Clone)]
pub struct UreqScriptTransport {
    agent: Agent,
    callback_param: String,
    callback_prefix: String,
}

impl UreqScriptTransport {
    pub fn new(config: &UreqConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.script_timeout))
            .build()
            .new_agent();
        Self {
            agent,
            callback_param: config.callback_param.clone(),
            callback_prefix: config.callback_prefix.clone(),
        }
    }
}

impl Default for UreqScriptTransport {
    fn default() -> Self {
        Self::new(&UreqConfig::default())
    }
}

impl ScriptTransport for UreqScriptTransport {
    fn fetch(&self, url: &str, done: ScriptCallback) {
        let callback = format!(
            "{}{}",
            self.callback_prefix,
            NEXT_CALLBACK.fetch_add(1, Ordering::Relaxed)
        );
        let target = append_query(url, &self.callback_param, &callback);
        let agent = self.agent.clone();
        thread::spawn(move || done(load_script(&agent, &target, &callback)));
    }
}

fn load_script(agent: &Agent, url: &str, callback: &str) -> Result<Value, TransportError> {
    let mut response = agent.get(url).call()?;
    let script = response
        .body_mut()
        .read_to_string()
        .map_err(|e| TransportError::Body(e.to_string()))?;
    unwrap_script(&script, callback)
}

/// Extract the JSON argument from a `callback(<json>);` script.
///
/// A call with no argument yields `null`.
pub fn unwrap_script(script: &str, callback: &str) -> Result<Value, TransportError> {
    let call = script.trim().trim_end_matches(';').trim_end();
    let argument = call
        .strip_prefix(callback)
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| TransportError::MalformedScript(format!("expected a call to {callback}")))?;
    if argument.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(argument).map_err(|e| TransportError::MalformedScript(e.to_string()))
}
