//! Request dispatch core for the stream module.
//!
//! # Overview
//! Normalizes a loosely-specified request description into a validated
//! configuration and executes it on one of two transport strategies: plain
//! HTTP or script injection (JSONP). Results, and optional progress updates,
//! flow back through callback identifiers resolved by an injected host bridge.
//!
//! # Design
//! - `config::normalize` is pure and returns `Result<NormalizedConfig, DispatchError>`.
//! - Body encoding is inferred JSON-first; form-urlencoded only when JSON fails.
//! - Strategies share the `Strategy::execute` contract and are selected once
//!   per dispatch from the normalized response type.
//! - Transport primitives and the host bridge are traits; `ureq`-backed
//!   primitives ship in `transport`.
//! - The `timeout` option is normalized and carried but not enforced.

pub mod body;
pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod options;
pub mod transport;
pub mod types;

pub use bridge::{Diagnostics, HostBridge, LogDiagnostics};
pub use config::{normalize, NormalizedConfig, StrategyKind};
pub use dispatcher::RequestDispatcher;
pub use error::{DispatchError, TransportError};
pub use http::{parse_header_blob, HttpMethod, HttpRequest, HttpResponse, RequestMode, ResponseType};
pub use options::{RequestBody, RequestOptions};
pub use transport::UreqConfig;
pub use types::{CallbackId, Delivery, ProgressResult, ResponseData, ResponseResult};
