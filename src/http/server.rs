//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the axum Router: built-in routes, mounted groups, fallback
//! - Wire up middleware (request id, tracing, JSON with its size limit, cookies)
//! - Trim trailing slashes before routing, so `/api/cart/` reaches `/api/cart`
//! - Serve on a bound listener until shutdown

use std::future::Future;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::normalize_path::NormalizePath;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::cache::CacheStatus;
use crate::config::{AppConfig, RunMode};
use crate::database::DatabaseStatus;
use crate::http::body::parse_json;
use crate::http::cookies::parse_cookies;
use crate::http::health::healthz;
use crate::http::request::{request_span, UuidRequestId, X_REQUEST_ID};
use crate::http::static_files;
use crate::routing::RouteTable;

/// State for the built-in routes. Mounted groups carry their own.
#[derive(Clone)]
pub struct AppState {
    pub mode: RunMode,
    pub cache: CacheStatus,
    pub database: DatabaseStatus,
}

/// The routed application behind trailing-slash normalization.
///
/// Normalization has to run before routing, so it wraps the `Router` instead
/// of being one of its layers.
pub type App = NormalizePath<Router>;

pub struct HttpServer {
    app: App,
}

impl HttpServer {
    pub fn new(config: &AppConfig, state: AppState, routes: RouteTable) -> Self {
        let router = Self::build_router(config, state, routes);
        Self {
            app: NormalizePath::trim_trailing_slash(router),
        }
    }

    /// Compose the full application.
    ///
    /// Layers run outermost first: request id, trace span, JSON parser
    /// (which enforces the body limit), cookie parser, then routing.
    pub fn build_router(config: &AppConfig, state: AppState, routes: RouteTable) -> Router {
        let limit = config.server.body_limit_bytes;

        let builtin = Router::new()
            .route("/healthz", get(healthz))
            .with_state(state);

        let fallback = static_files::fallback(config.mode, &config.static_files);

        // Each `layer` call wraps everything added before it.
        routes
            .into_router(builtin, fallback)
            .layer(middleware::from_fn(parse_cookies))
            .layer(middleware::from_fn_with_state(limit, parse_json))
            // The JSON parser enforces the only body limit.
            .layer(DefaultBodyLimit::disable())
            .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The composed application, for in-process testing.
    pub fn app(&self) -> App {
        self.app.clone()
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::debug!(address = %addr, "HTTP server starting");

        let service = axum::ServiceExt::<Request>::into_make_service(self.app);
        axum::serve(listener, service)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheState;
    use crate::database::DatabaseState;
    use crate::routing::{pending_group, ApiGroups};
    use axum::extract::Extension;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::post;
    use axum::response::Response;
    use tower::ServiceExt;

    use crate::http::body::JsonBody;
    use crate::http::cookies::Cookies;

    fn state() -> AppState {
        AppState {
            mode: RunMode::Development,
            cache: CacheStatus::fixed(CacheState::Connecting),
            database: DatabaseStatus::fixed(DatabaseState::Connected),
        }
    }

    fn cart_group() -> Router {
        Router::new()
            .route(
                "/items",
                post(|cookies: Cookies, Extension(JsonBody(body)): Extension<JsonBody>| async move {
                    format!("{}:{}", cookies.get("cartId").unwrap_or("-"), body["sku"])
                }),
            )
            .route(
                "/receipt",
                post(|body: axum::body::Bytes| async move { body.len().to_string() }),
            )
    }

    /// A JSON object of exactly `size` bytes.
    fn json_of_size(size: usize) -> String {
        let frame = r#"{"pad":""}"#.len();
        format!(r#"{{"pad":"{}"}}"#, "x".repeat(size - frame))
    }

    fn app(config: &AppConfig) -> App {
        let routes = RouteTable::new()
            .mount("/api/cart", cart_group())
            .unwrap()
            .mount("/api/auth", pending_group("auth"))
            .unwrap();
        HttpServer::new(config, state(), routes).app()
    }

    async fn send(router: App, request: Request<Body>) -> Response {
        router.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_json_and_cookies_reach_handlers() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/cart/items")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, "cartId=c-17")
            .body(Body::from(r#"{"sku":"tee-black"}"#))
            .unwrap();

        let response = send(app(&AppConfig::default()), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"c-17:"tee-black""#);
    }

    #[tokio::test]
    async fn test_request_id_generated_and_propagated() {
        let router = app(&AppConfig::default());

        let response = send(router.clone(), Request::get("/healthz").body(Body::empty()).unwrap()).await;
        let generated = response.headers().get(&X_REQUEST_ID).unwrap().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(generated).is_ok());

        let request = Request::get("/healthz")
            .header(&X_REQUEST_ID, "client-supplied")
            .body(Body::empty())
            .unwrap();
        let response = send(router, request).await;
        assert_eq!(response.headers()[&X_REQUEST_ID], "client-supplied");
    }

    #[tokio::test]
    async fn test_declared_oversize_body_rejected_before_routing() {
        let mut config = AppConfig::default();
        config.server.body_limit_bytes = 16;

        let request = Request::builder()
            .method("POST")
            .uri("/api/cart/items")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, "64")
            .body(Body::from("x".repeat(64)))
            .unwrap();

        let response = send(app(&config), request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_non_json_body_over_limit_reaches_handler() {
        let mut config = AppConfig::default();
        config.server.body_limit_bytes = 16;

        let request = Request::builder()
            .method("POST")
            .uri("/api/cart/receipt")
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, "64")
            .body(Body::from(vec![7u8; 64]))
            .unwrap();

        let response = send(app(&config), request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"64");
    }

    #[tokio::test]
    async fn test_default_limit_boundary() {
        use crate::config::schema::DEFAULT_BODY_LIMIT;

        let router = app(&AppConfig::default());
        let json_post = |body: String| {
            Request::builder()
                .method("POST")
                .uri("/api/cart/items")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len().to_string())
                .body(Body::from(body))
                .unwrap()
        };

        let at_limit = json_of_size(DEFAULT_BODY_LIMIT);
        assert_eq!(at_limit.len(), DEFAULT_BODY_LIMIT);
        let response = send(router.clone(), json_post(at_limit)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let over_limit = json_of_size(DEFAULT_BODY_LIMIT + 1);
        let response = send(router, json_post(over_limit)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/cart/items")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{"))
            .unwrap();

        let response = send(app(&AppConfig::default()), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unmatched_and_pending_routes() {
        let router = app(&AppConfig::default());

        let response = send(router.clone(), Request::get("/nowhere").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(router, Request::get("/api/auth/me").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_trailing_slash_stays_on_the_api() {
        let router = app(&AppConfig::default());

        let response = send(router.clone(), Request::get("/api/auth/").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);

        let request = Request::builder()
            .method("POST")
            .uri("/api/cart/receipt/")
            .body(Body::from("four"))
            .unwrap();
        let response = send(router, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"4");
    }

    #[tokio::test]
    async fn test_storefront_table_mounts_every_group() {
        let routes = RouteTable::storefront(ApiGroups::pending()).unwrap();
        let router = HttpServer::new(&AppConfig::default(), state(), routes).app();

        for prefix in crate::routing::API_MOUNTS {
            let uri = format!("{prefix}/anything");
            let response = send(router.clone(), Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED, "{prefix}");
        }
    }
}
