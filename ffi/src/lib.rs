//! C-ABI wrapper around `stream-core`.
//!
//! # Overview
//! Lets a host written in any language with a C FFI dispatch requests through
//! the stream dispatcher. The host registers one delivery function; results
//! come back to it as JSON strings tagged with the caller's callback id.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Options cross the boundary as JSON text and are deserialized into
//!   `RequestOptions`, keeping the C surface independent of the option shape.
//! - Requests run on the bundled ureq primitives; deliveries arrive on
//!   transport threads.
//! - The C caller owns all returned pointers and must call the matching
//!   `stream_*_free` function to release them.

pub mod types;

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use stream_core::{normalize, CallbackId, RequestDispatcher, RequestOptions, UreqConfig};

use types::*;

// ---------------------------------------------------------------------------
// Dispatcher lifecycle
// ---------------------------------------------------------------------------

/// Create a dispatcher that reports results through `deliver`.
///
/// `user_data` is passed back verbatim on every delivery and must stay valid
/// until the last in-flight request has completed. Returns null if `deliver`
/// is null or if an internal panic occurs. Free with `stream_dispatcher_free`.
#[unsafe(no_mangle)]
pub extern "C" fn stream_dispatcher_new(
    deliver: Option<StreamDeliverFn>,
    user_data: *mut c_void,
) -> *mut FfiStreamDispatcher {
    catch_unwind(|| {
        let Some(deliver) = deliver else {
            return std::ptr::null_mut();
        };
        let bridge = Arc::new(CBridge::new(deliver, user_data));
        let inner = RequestDispatcher::with_ureq(&UreqConfig::default(), bridge);
        Box::into_raw(Box::new(FfiStreamDispatcher { inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a dispatcher created by `stream_dispatcher_new`. Safe to call with
/// null. Requests already in flight still deliver their results.
#[unsafe(no_mangle)]
pub extern "C" fn stream_dispatcher_free(dispatcher: *mut FfiStreamDispatcher) {
    if !dispatcher.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(dispatcher) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Read a borrowed C string as UTF-8.
fn borrowed_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn parse_options(options_json: *const c_char) -> Option<RequestOptions> {
    let raw = borrowed_str(options_json)?;
    match serde_json::from_str(raw) {
        Ok(options) => Some(options),
        Err(err) => {
            log::error!(target: "stream", "[stream] options for \"fetch\" API are not valid: {err}");
            None
        }
    }
}

/// Dispatch a request described by `options_json`.
///
/// The final result is delivered once under `callback_id`. When
/// `progress_callback_id` is non-null, progress snapshots are delivered under
/// it (with `is_progress = true`) before the final result. Any status other
/// than `Ok` means nothing will ever be delivered for this call.
#[unsafe(no_mangle)]
pub extern "C" fn stream_fetch(
    dispatcher: *const FfiStreamDispatcher,
    options_json: *const c_char,
    callback_id: *const c_char,
    progress_callback_id: *const c_char,
) -> FfiDispatchStatus {
    catch_unwind(AssertUnwindSafe(|| {
        if dispatcher.is_null() || options_json.is_null() || callback_id.is_null() {
            return FfiDispatchStatus::NullArg;
        }
        let dispatcher = unsafe { &*dispatcher };
        let Some(options) = parse_options(options_json) else {
            return FfiDispatchStatus::InvalidOptions;
        };
        let Some(completion) = borrowed_str(callback_id).map(CallbackId::new) else {
            return FfiDispatchStatus::NullArg;
        };
        let progress = borrowed_str(progress_callback_id).map(CallbackId::new);

        match dispatcher.inner.fetch(&options, completion, progress) {
            Ok(()) => FfiDispatchStatus::Ok,
            Err(err) => FfiDispatchStatus::from(&err),
        }
    }))
    .unwrap_or(FfiDispatchStatus::Panic)
}

/// Validate and normalize `options_json` without dispatching.
///
/// Returns the normalized config as a JSON C string, or null if the options
/// are invalid. Free with `stream_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn stream_normalize_options(options_json: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        let Some(options) = parse_options(options_json) else {
            return std::ptr::null_mut();
        };
        let config = match normalize(&options) {
            Ok(config) => config,
            Err(err) => {
                log::error!(target: "stream", "{err}");
                return std::ptr::null_mut();
            }
        };
        serde_json::to_string(&config)
            .ok()
            .and_then(|json| CString::new(json).ok())
            .map_or(std::ptr::null_mut(), CString::into_raw)
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a string returned by `stream_normalize_options`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn stream_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    type Received = (String, serde_json::Value, bool);

    extern "C" fn record(
        user_data: *mut c_void,
        callback_id: *const c_char,
        result_json: *const c_char,
        is_progress: bool,
    ) {
        let tx = unsafe { &*(user_data as *const Mutex<Sender<Received>>) };
        let id = unsafe { CStr::from_ptr(callback_id) }.to_str().unwrap().to_string();
        let json = unsafe { CStr::from_ptr(result_json) }.to_str().unwrap();
        let value = serde_json::from_str(json).unwrap();
        let _ = tx.lock().unwrap().send((id, value, is_progress));
    }

    /// Dispatcher plus the receiving end of its deliveries. The sender is
    /// leaked so it outlives every transport thread.
    fn recording_dispatcher() -> (*mut FfiStreamDispatcher, Receiver<Received>) {
        let (tx, rx) = mpsc::channel();
        let sink: &'static Mutex<Sender<Received>> = Box::leak(Box::new(Mutex::new(tx)));
        let dispatcher = stream_dispatcher_new(Some(record), sink as *const _ as *mut c_void);
        assert!(!dispatcher.is_null());
        (dispatcher, rx)
    }

    fn start_server() -> std::net::SocketAddr {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });
        addr
    }

    #[test]
    fn dispatcher_new_null_deliver_returns_null() {
        let dispatcher = stream_dispatcher_new(None, std::ptr::null_mut());
        assert!(dispatcher.is_null());
    }

    #[test]
    fn fetch_null_args() {
        let (dispatcher, _rx) = recording_dispatcher();
        let options = CString::new(r#"{"url":"http://x"}"#).unwrap();
        let id = CString::new("cb").unwrap();

        assert_eq!(
            stream_fetch(std::ptr::null(), options.as_ptr(), id.as_ptr(), std::ptr::null()),
            FfiDispatchStatus::NullArg
        );
        assert_eq!(
            stream_fetch(dispatcher, std::ptr::null(), id.as_ptr(), std::ptr::null()),
            FfiDispatchStatus::NullArg
        );
        assert_eq!(
            stream_fetch(dispatcher, options.as_ptr(), std::ptr::null(), std::ptr::null()),
            FfiDispatchStatus::NullArg
        );

        stream_dispatcher_free(dispatcher);
    }

    #[test]
    fn fetch_rejects_malformed_options_json() {
        let (dispatcher, rx) = recording_dispatcher();
        let options = CString::new("{not json").unwrap();
        let id = CString::new("cb").unwrap();

        let status = stream_fetch(dispatcher, options.as_ptr(), id.as_ptr(), std::ptr::null());
        assert_eq!(status, FfiDispatchStatus::InvalidOptions);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        stream_dispatcher_free(dispatcher);
    }

    #[test]
    fn fetch_maps_validation_errors() {
        let (dispatcher, rx) = recording_dispatcher();
        let id = CString::new("cb").unwrap();
        let cases = [
            (r#"{"url":"http://x","method":"TRACE"}"#, FfiDispatchStatus::InvalidMethod),
            (r#"{"url":"http://x","mode":"open"}"#, FfiDispatchStatus::InvalidMode),
            (r#"{"url":"http://x","type":"blob"}"#, FfiDispatchStatus::InvalidType),
            (r#"{"method":"GET"}"#, FfiDispatchStatus::MissingUrl),
            (r#"{"url":"http://x","method":5}"#, FfiDispatchStatus::InvalidMethod),
            (r#"{"url":"http://x","type":null}"#, FfiDispatchStatus::InvalidType),
        ];
        for (json, expected) in cases {
            let options = CString::new(json).unwrap();
            let status = stream_fetch(dispatcher, options.as_ptr(), id.as_ptr(), std::ptr::null());
            assert_eq!(status, expected, "{json}");
        }
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        stream_dispatcher_free(dispatcher);
    }

    #[test]
    fn fetch_delivers_json_result() {
        let addr = start_server();
        let (dispatcher, rx) = recording_dispatcher();
        let options =
            CString::new(format!(r#"{{"url":"http://{addr}/json","type":"json"}}"#)).unwrap();
        let id = CString::new("done-1").unwrap();
        let progress = CString::new("progress-1").unwrap();

        let status = stream_fetch(dispatcher, options.as_ptr(), id.as_ptr(), progress.as_ptr());
        assert_eq!(status, FfiDispatchStatus::Ok);

        let (id, result) = loop {
            let (id, value, is_progress) = rx.recv_timeout(Duration::from_secs(10)).unwrap();
            if is_progress {
                assert_eq!(id, "progress-1");
                assert_eq!(value["readyState"], 3);
                continue;
            }
            break (id, value);
        };
        assert_eq!(id, "done-1");
        assert_eq!(result["status"], 200);
        assert_eq!(result["ok"], true);
        assert_eq!(result["data"]["message"], "hello");

        stream_dispatcher_free(dispatcher);
    }

    #[test]
    fn normalize_options_returns_config_json() {
        let options = CString::new(r#"{"url":"http://x","method":"post","body":{"a":1}}"#).unwrap();
        let out = stream_normalize_options(options.as_ptr());
        assert!(!out.is_null());

        let json = unsafe { CStr::from_ptr(out) }.to_str().unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["headers"]["Content-Type"], "application/json;charset=UTF-8");
        assert_eq!(value["body"], r#"{"a":1}"#);
        assert_eq!(value["timeout"], 2500);

        stream_free_string(out);
    }

    #[test]
    fn normalize_options_invalid_returns_null() {
        let options = CString::new(r#"{"url":"http://x","type":"xml"}"#).unwrap();
        assert!(stream_normalize_options(options.as_ptr()).is_null());
        assert!(stream_normalize_options(std::ptr::null()).is_null());
    }

    #[test]
    fn free_null_is_safe() {
        stream_dispatcher_free(std::ptr::null_mut());
        stream_free_string(std::ptr::null_mut());
    }
}
