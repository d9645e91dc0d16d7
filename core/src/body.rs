//! Request body encoding inference.
//!
//! When the caller sets no `Content-Type` and supplies a truthy body, the body
//! is JSON-encoded first. Form-urlencoded detection only runs if the JSON
//! encoder fails, so a plain string body ends up as a quoted JSON string.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::options::RequestBody;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const TYPE_JSON: &str = "application/json;charset=UTF-8";
pub const TYPE_FORM: &str = "application/x-www-form-urlencoded";

static FORM_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^&=]+=[^&=]+)(?:&[^&=]+=[^&=]+)*$").expect("form body pattern is valid")
});

/// Serialize `body` and set `Content-Type` in `headers` when it can be inferred.
///
/// An explicit non-empty `Content-Type` or a falsy body disables inference and
/// the body passes through as text.
pub fn encode_body(
    headers: &mut BTreeMap<String, String>,
    body: Option<RequestBody>,
) -> Option<String> {
    let body = body?;
    let content_type_set = headers.get(CONTENT_TYPE).is_some_and(|v| !v.is_empty());
    if content_type_set || !body.is_truthy() {
        return body.into_text();
    }

    match serde_json::to_string(&body) {
        Ok(json) => {
            headers.insert(CONTENT_TYPE.to_string(), TYPE_JSON.to_string());
            Some(json)
        }
        Err(_) => match body {
            RequestBody::Opaque(text) if FORM_BODY.is_match(&text) => {
                headers.insert(CONTENT_TYPE.to_string(), TYPE_FORM.to_string());
                Some(encode_uri(&text))
            }
            other => other.into_text(),
        },
    }
}

/// Everything `encodeURI` escapes: all but alphanumerics and the URI
/// reserved and unreserved marks.
const ENCODE_URI: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

/// Percent-encode `input` the way `encodeURI` does.
pub fn encode_uri(input: &str) -> String {
    utf8_percent_encode(input, ENCODE_URI).to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn encode(headers: &mut BTreeMap<String, String>, body: RequestBody) -> Option<String> {
        encode_body(headers, Some(body))
    }

    #[test]
    fn object_body_becomes_json() {
        let mut headers = BTreeMap::new();
        let body = encode(&mut headers, json!({"a": 1}).into());
        assert_eq!(body.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(headers[CONTENT_TYPE], TYPE_JSON);
    }

    #[test]
    fn string_body_becomes_quoted_json_even_if_form_shaped() {
        let mut headers = BTreeMap::new();
        let body = encode(&mut headers, "a=1&b=2".into());
        assert_eq!(body.as_deref(), Some(r#""a=1&b=2""#));
        assert_eq!(headers[CONTENT_TYPE], TYPE_JSON);
    }

    #[test]
    fn unencodable_form_string_becomes_form_body() {
        let mut headers = BTreeMap::new();
        let body = encode(&mut headers, RequestBody::Opaque("name=J D&x=é".into()));
        assert_eq!(body.as_deref(), Some("name=J%20D&x=%C3%A9"));
        assert_eq!(headers[CONTENT_TYPE], TYPE_FORM);
    }

    #[test]
    fn unencodable_non_form_string_passes_through() {
        let mut headers = BTreeMap::new();
        let body = encode(&mut headers, RequestBody::Opaque("a==b".into()));
        assert_eq!(body.as_deref(), Some("a==b"));
        assert!(!headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn explicit_content_type_disables_inference() {
        let mut headers = BTreeMap::from([(CONTENT_TYPE.to_string(), "text/plain".to_string())]);
        let body = encode(&mut headers, "raw text".into());
        assert_eq!(body.as_deref(), Some("raw text"));
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn empty_content_type_counts_as_unset() {
        let mut headers = BTreeMap::from([(CONTENT_TYPE.to_string(), String::new())]);
        encode(&mut headers, json!([1, 2]).into());
        assert_eq!(headers[CONTENT_TYPE], TYPE_JSON);
    }

    #[test]
    fn falsy_bodies_skip_inference() {
        let mut headers = BTreeMap::new();
        assert_eq!(encode(&mut headers, json!(null).into()), None);
        assert_eq!(encode(&mut headers, json!(0).into()).as_deref(), Some("0"));
        assert_eq!(encode(&mut headers, json!(false).into()).as_deref(), Some("false"));
        assert_eq!(encode(&mut headers, "".into()).as_deref(), Some(""));
        assert!(headers.is_empty());
    }

    #[test]
    fn absent_body_is_none() {
        let mut headers = BTreeMap::new();
        assert_eq!(encode_body(&mut headers, None), None);
        assert!(headers.is_empty());
    }

    #[test]
    fn encode_uri_keeps_reserved_characters() {
        assert_eq!(encode_uri("a=1&b=/x?y#z"), "a=1&b=/x?y#z");
        assert_eq!(encode_uri("a b%"), "a%20b%25");
        assert_eq!(encode_uri("-_.!~*'()"), "-_.!~*'()");
        assert_eq!(encode_uri("[x]|\"é"), "%5Bx%5D%7C%22%C3%A9");
    }
}
