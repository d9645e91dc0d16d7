//! Error types for the request dispatcher.
//!
//! # Design
//! Validation failures (`DispatchError`) are detected synchronously while
//! normalizing options and stop the dispatch before any transport runs; the
//! completion callback is never invoked for them. `TransportError` is what a
//! transport primitive reports asynchronously. The HTTP strategy turns it into
//! a `status = -1` sentinel result, the script-injection strategy hands it to
//! the completion callback as-is.
//!
//! The `Display` strings double as the diagnostic-channel messages.

use thiserror::Error;

/// Options rejected during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(
        "[stream] options.method \"{0}\" for \"fetch\" API should be one of GET,POST,PUT,DELETE,HEAD,PATCH."
    )]
    InvalidMethod(String),

    #[error(
        "[stream] options.mode \"{0}\" for \"fetch\" API should be one of cors,no-cors,same-origin,navigate."
    )]
    InvalidMode(String),

    #[error(
        "[stream] options.type \"{0}\" for \"fetch\" API should be one of text,json,jsonp,arraybuffer."
    )]
    InvalidType(String),

    #[error("[stream] options.url should be set for \"fetch\" API.")]
    MissingUrl,

    /// Kept for parity with the error taxonomy. Absent headers always default
    /// to an empty map, so normalization never produces this.
    #[error("[stream] options.headers should be a plain object.")]
    MissingHeaders,
}

/// Failure reported by a transport primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection, DNS, TLS or protocol failure before a response arrived.
    #[error("network error: {0}")]
    Network(String),

    /// The response started but its body could not be read to the end.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// A script-injection response that does not wrap a JSON payload in the
    /// expected callback invocation.
    #[error("malformed script response: {0}")]
    MalformedScript(String),

    #[error("request timed out")]
    Timeout,
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => TransportError::Timeout,
            other => TransportError::Network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_method_message_names_the_value_and_choices() {
        let msg = DispatchError::InvalidMethod("FETCH".to_string()).to_string();
        assert_eq!(
            msg,
            "[stream] options.method \"FETCH\" for \"fetch\" API should be one of GET,POST,PUT,DELETE,HEAD,PATCH."
        );
    }

    #[test]
    fn missing_url_message() {
        assert_eq!(
            DispatchError::MissingUrl.to_string(),
            "[stream] options.url should be set for \"fetch\" API."
        );
    }

    #[test]
    fn transport_error_display() {
        assert_eq!(TransportError::Timeout.to_string(), "request timed out");
        assert_eq!(
            TransportError::Network("connection refused".into()).to_string(),
            "network error: connection refused"
        );
    }
}
