//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! The C host supplies one `StreamDeliverFn` plus an opaque `user_data`
//! pointer when creating a dispatcher. `CBridge` adapts that pair to the core
//! `HostBridge` trait: every delivery is serialized to JSON and handed to the
//! function pointer together with the callback identifier.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use stream_core::{CallbackId, Delivery, DispatchError, HostBridge, RequestDispatcher};

/// Delivery function implemented by the C host.
///
/// Called from transport threads, so it must be thread-safe. Both strings are
/// only valid for the duration of the call.
pub type StreamDeliverFn = extern "C" fn(
    user_data: *mut c_void,
    callback_id: *const c_char,
    result_json: *const c_char,
    is_progress: bool,
);

/// Opaque handle to a `RequestDispatcher`. C callers receive a pointer to
/// this and pass it back into every FFI function.
pub struct FfiStreamDispatcher {
    pub(crate) inner: RequestDispatcher,
}

/// Outcome of `stream_fetch`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDispatchStatus {
    Ok = 0,
    InvalidMethod = 1,
    InvalidMode = 2,
    InvalidType = 3,
    MissingUrl = 4,
    MissingHeaders = 5,
    /// `options_json` was not valid UTF-8 or not an options object.
    InvalidOptions = 6,
    NullArg = 7,
    Panic = 8,
}

impl From<&DispatchError> for FfiDispatchStatus {
    fn from(err: &DispatchError) -> Self {
        match err {
            DispatchError::InvalidMethod(_) => FfiDispatchStatus::InvalidMethod,
            DispatchError::InvalidMode(_) => FfiDispatchStatus::InvalidMode,
            DispatchError::InvalidType(_) => FfiDispatchStatus::InvalidType,
            DispatchError::MissingUrl => FfiDispatchStatus::MissingUrl,
            DispatchError::MissingHeaders => FfiDispatchStatus::MissingHeaders,
        }
    }
}

/// `HostBridge` over a C function pointer.
pub(crate) struct CBridge {
    deliver: StreamDeliverFn,
    // Stored as an address so the bridge stays `Send + Sync`; the host owns
    // the pointee and keeps it alive for the dispatcher's lifetime.
    user_data: usize,
}

impl CBridge {
    pub(crate) fn new(deliver: StreamDeliverFn, user_data: *mut c_void) -> Self {
        Self {
            deliver,
            user_data: user_data as usize,
        }
    }
}

impl HostBridge for CBridge {
    fn deliver(&self, id: &CallbackId, result: Delivery, is_progress: bool) {
        let json = match serde_json::to_string(&result) {
            Ok(json) => json,
            Err(err) => {
                log::error!(target: "stream", "failed to serialize delivery for {id}: {err}");
                return;
            }
        };
        let (Ok(c_id), Ok(c_json)) = (CString::new(id.as_str()), CString::new(json)) else {
            log::error!(target: "stream", "delivery for {id} contains an interior NUL");
            return;
        };
        (self.deliver)(
            self.user_data as *mut c_void,
            c_id.as_ptr(),
            c_json.as_ptr(),
            is_progress,
        );
    }
}
