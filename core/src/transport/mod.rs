//! Transport primitives and the two dispatch strategies built on them.
//!
//! # Design
//! Primitives are the I/O edge: `HttpTransport` runs one HTTP exchange and
//! reports load / progress / error events, `ScriptTransport` fetches a
//! script-injection (JSONP) payload and reports it once. Both are
//! fire-and-forget; results always come back through the supplied sinks.
//!
//! Strategies sit on top and share one contract, `Strategy::execute`. The
//! dispatcher picks a strategy once from the normalized config and hands it
//! the completion and optional progress sinks.
//!
//! `HttpEvents::load` and `HttpEvents::error` consume the sink, so at most one
//! terminal event can reach it and no progress can follow.

mod blocking;
mod http;
mod script;

use serde_json::Value;

pub use self::blocking::{unwrap_script, UreqConfig, UreqHttpTransport, UreqScriptTransport};
pub use self::http::HttpStrategy;
pub use self::script::ScriptInjectionStrategy;

use crate::config::NormalizedConfig;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, ProgressEvent};
use crate::types::{Delivery, ProgressResult};

/// `readyState` while the response body is being received.
pub const LOADING: u8 = 3;

/// Event sink for a single HTTP exchange.
pub trait HttpEvents: Send {
    fn progress(&mut self, event: ProgressEvent);
    fn load(self: Box<Self>, response: HttpResponse);
    fn error(self: Box<Self>, error: TransportError);
}

/// Executes HTTP requests without blocking the caller.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: HttpRequest, events: Box<dyn HttpEvents>);
}

pub type ScriptCallback = Box<dyn FnOnce(Result<Value, TransportError>) + Send>;

/// Fetches a script-injection payload without blocking the caller.
pub trait ScriptTransport: Send + Sync {
    fn fetch(&self, url: &str, done: ScriptCallback);
}

pub type CompletionFn = Box<dyn FnOnce(Delivery) + Send>;
pub type ProgressFn = Box<dyn FnMut(ProgressResult) + Send>;

/// Uniform execution contract shared by both strategies.
pub trait Strategy: Send + Sync {
    fn execute(
        &self,
        config: NormalizedConfig,
        on_complete: CompletionFn,
        on_progress: Option<ProgressFn>,
    );
}
