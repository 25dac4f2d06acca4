//! `GET /healthz`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::cache::CacheState;
use crate::database::DatabaseState;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub mode: &'static str,
    pub cache: CacheState,
    pub database: DatabaseState,
}

/// Healthy once the primary store is connected. The cache state is reported
/// but does not affect the status code.
pub async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let database = state.database.current();
    let healthy = database == DatabaseState::Connected;

    let report = HealthReport {
        status: if healthy { "ok" } else { "unavailable" },
        mode: state.mode.as_str(),
        cache: state.cache.current(),
        database,
    };

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}
