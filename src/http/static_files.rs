//! Fallback for requests no mounted group owns.
//!
//! Development answers `404`. Production serves the frontend bundle: existing
//! files as-is, and the entry document for any other `GET`/`HEAD` so the
//! client-side router can take over.

use axum::routing::{any, get_service, MethodRouter};
use tower_http::services::{ServeDir, ServeFile};

use crate::config::{RunMode, StaticConfig};
use crate::http::error::not_found;

pub fn fallback(mode: RunMode, config: &StaticConfig) -> MethodRouter {
    match mode {
        RunMode::Development => any(not_found),
        RunMode::Production => spa(config),
    }
}

/// Static assets with the entry document as catch-all.
///
/// Methods other than `GET`/`HEAD` fall through to `404`.
pub fn spa(config: &StaticConfig) -> MethodRouter {
    if !config.root.is_dir() {
        tracing::warn!(
            root = %config.root.display(),
            "Frontend build directory not found; unmatched routes will return 404"
        );
    }

    let entry = ServeFile::new(config.index_path());
    let assets = ServeDir::new(&config.root).fallback(entry);

    get_service(assets).fallback(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use std::fs;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn bundle() -> StaticConfig {
        let root: PathBuf = std::env::temp_dir().join(format!("storefront-dist-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::write(root.join("index.html"), "<!doctype html><div id=root></div>").unwrap();
        fs::write(root.join("assets").join("app.js"), "console.log(1)").unwrap();
        StaticConfig {
            root,
            ..Default::default()
        }
    }

    async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, Option<String>, String) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_development_returns_not_found() {
        let router = Router::new().fallback_service(fallback(RunMode::Development, &bundle()));
        let (status, _, _) = call(router, "GET", "/products/shoes").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_production_serves_assets_and_entry_document() {
        let config = bundle();
        let router = Router::new().fallback_service(fallback(RunMode::Production, &config));

        let (status, content_type, body) = call(router.clone(), "GET", "/assets/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().contains("javascript"));
        assert_eq!(body, "console.log(1)");

        let (status, content_type, body) = call(router.clone(), "GET", "/checkout/success").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(body.contains("id=root"));

        let (status, _, _) = call(router.clone(), "HEAD", "/orders").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = call(router, "POST", "/checkout/success").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        fs::remove_dir_all(&config.root).unwrap_or_default();
    }
}
