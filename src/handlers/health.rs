use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::{db, AppState};

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness and database reachability report.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_status = match db::ping(&state.db).await {
        Ok(()) => "up",
        Err(e) => {
            warn!(error = %e, "Health check: database ping failed");
            "down"
        }
    };

    let code = if db_status == "up" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(json!({
            "status": db_status,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
            "database": db_status,
        })),
    )
}
