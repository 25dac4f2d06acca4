//! JSON request body parsing.
//!
//! Runs ahead of the route table. `application/json` bodies are buffered up to
//! the configured limit, parsed, and attached to the request as [`JsonBody`].
//! The limit applies to JSON bodies only; a declared `Content-Length` above it
//! is rejected before the body is read.
//! The buffered bytes are handed on unchanged so handlers may still read the
//! raw body. Other content types pass through without being read.

use std::error::Error as StdError;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use http_body_util::LengthLimitError;
use serde_json::Value;

use crate::http::error::AppError;

/// Parsed JSON body, available as `Extension<JsonBody>` to handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonBody(pub Value);

/// Middleware entry point; the state is the body limit in bytes.
pub async fn parse_json(
    State(limit): State<usize>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !is_json(request.headers()) {
        return Ok(next.run(request).await);
    }

    if declared_length(request.headers()).is_some_and(|length| length > limit as u64) {
        return Err(AppError::PayloadTooLarge { limit });
    }

    let (mut parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|err| read_error(err, limit))?;

    let value = parse_strict(&bytes)?;
    parts.extensions.insert(JsonBody(value));

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// True for `application/json`, ignoring parameters and case.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Parse a body in strict mode: only objects and arrays are accepted at the
/// top level. An empty body is treated as `{}`.
pub fn parse_strict(bytes: &Bytes) -> Result<Value, AppError> {
    if bytes.is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| AppError::MalformedJson(e.to_string()))?;

    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        _ => Err(AppError::NonStructuralJson),
    }
}

fn read_error(err: axum::Error, limit: usize) -> AppError {
    let inner = err.into_inner();
    if exceeds_limit(&*inner) {
        AppError::PayloadTooLarge { limit }
    } else {
        tracing::warn!(error = %inner, "Failed to read request body");
        AppError::BodyRead
    }
}

fn exceeds_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Extension;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::post;
    use axum::{middleware, Router};
    use tower::ServiceExt;

    fn app(limit: usize) -> Router {
        Router::new()
            .route(
                "/echo",
                post(|body: Option<Extension<JsonBody>>| async move {
                    match body {
                        Some(Extension(JsonBody(value))) => value.to_string(),
                        None => "no json".to_string(),
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(limit, parse_json))
    }

    async fn send(limit: usize, content_type: &str, body: &'static str) -> (StatusCode, String) {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/echo")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        let response = app(limit).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("Application/JSON; charset=utf-8"));
        assert!(is_json(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/jsonp"));
        assert!(!is_json(&headers));
    }

    #[test]
    fn test_strict_mode() {
        assert_eq!(parse_strict(&Bytes::new()).unwrap(), serde_json::json!({}));
        assert_eq!(parse_strict(&Bytes::from_static(b"[1,2]")).unwrap(), serde_json::json!([1, 2]));
        assert!(matches!(parse_strict(&Bytes::from_static(b"\"hi\"")), Err(AppError::NonStructuralJson)));
        assert!(matches!(parse_strict(&Bytes::from_static(b"42")), Err(AppError::NonStructuralJson)));
        assert!(matches!(parse_strict(&Bytes::from_static(b"{\"a\":")), Err(AppError::MalformedJson(_))));
    }

    #[tokio::test]
    async fn test_parsed_body_reaches_handler() {
        let (status, body) = send(1024, "application/json", r#"{"qty":2}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"qty":2}"#);
    }

    #[tokio::test]
    async fn test_empty_json_body_is_empty_object() {
        let (status, body) = send(1024, "application/json", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{}");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (status, _) = send(1024, "application/json", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(1024, "application/json", "true").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversize_body_is_rejected() {
        let (status, body) = send(8, "application/json", r#"{"key":"value"}"#).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body.contains("8 byte limit"));
    }

    #[tokio::test]
    async fn test_other_content_types_untouched() {
        let (status, body) = send(8, "text/plain", "not json and longer than the limit").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "no json");
    }
}
