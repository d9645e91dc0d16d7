//! Caller-supplied request options.
//!
//! # Design
//! `RequestOptions` is loose: every field is optional and the
//! enum-like fields are free-form strings, so the options can be deserialized
//! straight from whatever a host hands over. Validation happens later in
//! `config::normalize`, which works on its own copy and never mutates these.

use std::collections::BTreeMap;

use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Raw, unvalidated options for a single dispatch.
///
/// `method`, `mode` and `type` distinguish a missing key (`None`, defaulted
/// later) from an explicit `null`, which is kept as the text `"null"` and
/// fails validation. Other scalars are stringified, so `5` becomes `"5"`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestOptions {
    #[serde(default, deserialize_with = "deserialize_coerced")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "deserialize_url")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_coerced")]
    pub mode: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "deserialize_coerced")]
    pub response_type: Option<String>,
    /// Header values of any scalar type are sent as their string form.
    #[serde(default, deserialize_with = "deserialize_headers")]
    pub headers: Option<BTreeMap<String, String>>,
    pub body: Option<RequestBody>,
    /// Number or numeric string; anything else falls back to the default.
    pub timeout: Option<Value>,
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn response_type(mut self, response_type: impl Into<String>) -> Self {
        self.response_type = Some(response_type.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: impl Into<Value>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }
}

/// Loose string form of a JSON value, as a script host would print it.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => f.to_string(),
            (None, None, None) => n.to_string(),
        },
        Value::String(s) => s.clone(),
        // Array.prototype.toString: elements joined by commas, null as empty.
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn deserialize_coerced<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Some(coerce_to_string(&value)))
}

// A null url is as missing as an absent one.
fn deserialize_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(coerce_to_string(&other)),
    })
}

fn deserialize_headers<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let headers = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(headers.map(|headers| {
        headers
            .into_iter()
            .map(|(name, value)| (name, coerce_to_string(&value)))
            .collect()
    }))
}

/// A request body of any shape.
///
/// `Opaque` holds text the JSON encoder refuses to serialize. It is the only
/// way to reach form-urlencoded inference, which runs when JSON encoding fails.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum RequestBody {
    Value(Value),
    Opaque(String),
}

impl RequestBody {
    /// Truthiness in the loose sense: `null`, `false`, `0` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            RequestBody::Value(Value::Null) => false,
            RequestBody::Value(Value::Bool(b)) => *b,
            RequestBody::Value(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            RequestBody::Value(Value::String(s)) => !s.is_empty(),
            RequestBody::Value(_) => true,
            RequestBody::Opaque(s) => !s.is_empty(),
        }
    }

    /// Body text when no encoding was inferred. `null` means no body.
    pub fn into_text(self) -> Option<String> {
        match self {
            RequestBody::Value(Value::Null) => None,
            RequestBody::Value(Value::String(s)) => Some(s),
            RequestBody::Value(other) => Some(other.to_string()),
            RequestBody::Opaque(s) => Some(s),
        }
    }
}

impl Serialize for RequestBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RequestBody::Value(value) => value.serialize(serializer),
            RequestBody::Opaque(_) => Err(S::Error::custom("opaque body is not JSON-encodable")),
        }
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Value(value)
    }
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        RequestBody::Value(Value::String(value.to_string()))
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        RequestBody::Value(Value::String(value))
    }
}
