//! Seams between the dispatcher and its host.
//!
//! # Design
//! The dispatcher never resolves callback identifiers itself. It calls
//! `HostBridge::deliver` and leaves the mapping from identifier to a real
//! handler to whoever embeds it (an FFI host, a test recorder, a channel).
//! Human-readable failures go to a `Diagnostics` sink, which must not panic.

use crate::types::{CallbackId, Delivery};

/// Resolves callback identifiers to caller-side handlers.
pub trait HostBridge: Send + Sync {
    /// `is_progress` marks repeatable, non-final deliveries.
    fn deliver(&self, id: &CallbackId, result: Delivery, is_progress: bool);
}

/// Receives human-readable error strings.
pub trait Diagnostics: Send + Sync {
    fn report(&self, message: &str);
}

/// Diagnostics routed to the `log` facade at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, message: &str) {
        log::error!(target: "stream", "{message}");
    }
}

impl<F> HostBridge for F
where
    F: Fn(&CallbackId, Delivery, bool) + Send + Sync,
{
    fn deliver(&self, id: &CallbackId, result: Delivery, is_progress: bool) {
        self(id, result, is_progress)
    }
}
