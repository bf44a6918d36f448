//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::auth::auth_middleware};
use khata_core::KhataError;

pub mod credits;
pub mod customers;
pub mod health;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Every ledger route requires an authenticated shop identity
    let protected_routes = Router::new()
        .merge(credits::routes())
        .merge(customers::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Maps a ledger error onto its HTTP representation.
pub(crate) fn khata_error_response(err: &KhataError) -> Response {
    if matches!(err, KhataError::StoreUnavailable(_)) {
        error!(error = %err, "Ledger store unavailable");
    }

    let status = StatusCode::from_u16(err.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
            "retryable": err.is_retryable(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use khata_shared::{JwtConfig, JwtService};
    use sea_orm::DatabaseConnection;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    // No live pool: these tests only reach routes that never touch storage.
    fn test_state() -> AppState {
        AppState {
            db: Arc::new(DatabaseConnection::default()),
            jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
        }
    }

    #[test]
    fn test_error_status_mapping() {
        let response = khata_error_response(&KhataError::InvalidAmount);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = khata_error_response(&KhataError::TenantMismatch {
            requested: Uuid::nil(),
        });
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = khata_error_response(&KhataError::UnknownCustomer(Uuid::nil()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = khata_error_response(&KhataError::UnknownEntry(Uuid::nil()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = khata_error_response(&KhataError::StoreUnavailable("down".into()));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = crate::create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ledger_routes_require_a_token() {
        let app = crate::create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/credits")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let app = crate::create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/credits")
                    .header("authorization", "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
