use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Size of the `/large` body, several read chunks long.
pub const LARGE_BODY_LEN: usize = 64 * 1024;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Echo {
    pub method: String,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Deserialize)]
pub struct JsonpQuery {
    pub callback: Option<String>,
}

pub fn app() -> Router {
    Router::new()
        .route("/text", get(text))
        .route("/json", get(json_payload))
        .route("/bytes", get(bytes))
        .route("/large", get(large))
        .route("/status/{code}", get(status))
        .route("/echo", any(echo))
        .route("/jsonp", get(jsonp))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn text() -> impl IntoResponse {
    ([("x-stream", "mock")], "hello stream")
}

async fn json_payload() -> Json<Value> {
    Json(json!({"message": "hello", "count": 2}))
}

async fn bytes() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        vec![0u8, 1, 2, 255],
    )
}

async fn large() -> String {
    "x".repeat(LARGE_BODY_LEN)
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(Echo {
        method: method.to_string(),
        content_type,
        body,
    })
}

async fn jsonp(Query(query): Query<JsonpQuery>) -> Result<impl IntoResponse, StatusCode> {
    let callback = query.callback.ok_or(StatusCode::BAD_REQUEST)?;
    let script = format!("{callback}({});", json!({"jsonp": true, "callback": callback}));
    Ok(([(header::CONTENT_TYPE, "application/javascript")], script))
}
