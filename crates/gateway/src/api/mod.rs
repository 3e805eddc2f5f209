pub mod config;
pub mod health;
pub mod mappings;
pub mod models;
pub mod providers;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;

use ul_domain::Error;

use crate::state::AppState;

/// Build the admin API router. Everything lives under `/api/v1`.
pub fn router() -> Router<AppState> {
    let v1 = Router::new()
        // Liveness
        .route("/health", get(health::liveness))
        // Providers
        .route(
            "/providers",
            get(providers::list_providers).post(providers::upsert_provider),
        )
        .route(
            "/providers/:id",
            get(providers::get_provider)
                .put(providers::update_provider)
                .delete(providers::delete_provider),
        )
        .route("/providers/:id/test", post(providers::test_provider))
        .route("/providers/:id/refresh", post(providers::refresh_provider))
        .route("/discovery", post(providers::run_discovery))
        // Models
        .route("/models", get(models::list_models))
        .route("/models/stats", get(models::statistics))
        .route("/models/batch-rename", post(models::batch_rename))
        .route("/models/batch-delete", post(models::batch_delete))
        .route(
            "/models/:id",
            get(models::get_model).delete(models::delete_model),
        )
        .route("/models/:id/rename", put(models::rename_model))
        // Routing plan views
        .route("/mappings", get(mappings::plan))
        .route("/mappings/groups", get(mappings::groups))
        .route("/mappings/splits", get(mappings::splits))
        // Output documents
        .route("/config/generate", post(config::generate))
        .route("/config/preview", get(config::preview))
        .route("/config/validate", post(config::validate))
        .route("/config/apply", post(config::apply))
        // Provider health
        .route("/health/providers", get(health::statistics))
        .route("/health/providers/:id/history", get(health::history))
        .route("/health/check", post(health::check_all));

    Router::new().nest("/api/v1", v1)
}

// ── Error responses ──────────────────────────────────────────────────

/// Domain error rendered as `{"error": {"kind", "message"}}`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::TransientNetwork(_) | Error::TerminalNetwork(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match &self.0 {
            Error::Conflict(_) => "conflict",
            other => other.kind().as_str(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "admin request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "admin request rejected");
        }
        let body = serde_json::json!({
            "error": {
                "kind": self.kind(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_statuses() {
        let cases = [
            (Error::validation("bad"), StatusCode::BAD_REQUEST, "validation"),
            (Error::not_found("model", "m1"), StatusCode::NOT_FOUND, "not_found"),
            (Error::Conflict("taken".into()), StatusCode::CONFLICT, "conflict"),
            (
                Error::TerminalNetwork("HTTP 401".into()),
                StatusCode::BAD_GATEWAY,
                "terminal_network",
            ),
            (
                Error::TransientNetwork("timeout".into()),
                StatusCode::BAD_GATEWAY,
                "transient_network",
            ),
            (Error::Other("boom".into()), StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        ];
        for (err, status, kind) in cases {
            let api = ApiError(err);
            assert_eq!(api.status(), status);
            assert_eq!(api.kind(), kind);
        }
    }
}
