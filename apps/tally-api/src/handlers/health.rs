//! # Health Handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    /// `None` when the migration bookkeeping could not be read.
    pub pending_migrations: Option<usize>,
}

/// 200 when the database answers with its schema up to date, 503
/// otherwise. No company header needed.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let pending_migrations = match state.db.pending_migrations().await {
        Ok(pending) => Some(pending),
        Err(e) => {
            warn!(error = %e, "Could not read migration status");
            None
        }
    };

    if database && pending_migrations == Some(0) {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database,
                pending_migrations,
            }),
        )
    } else {
        warn!(database, ?pending_migrations, "Health check failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded",
                database,
                pending_migrations,
            }),
        )
    }
}
