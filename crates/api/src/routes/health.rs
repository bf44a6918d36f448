//! Liveness endpoint for the ledger service.
//!
//! Liveness only, no dependency probes: storage trouble surfaces as
//! `StoreUnavailable` on the affected request, not as process health.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::AppState;

/// Liveness report.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always "healthy" while the process can serve requests.
    pub status: &'static str,
    /// Service identifier, for fleets that scrape many health endpoints.
    pub service: &'static str,
    /// Crate version, so deploys are verifiable from the outside.
    pub version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "khata",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Creates the health route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
