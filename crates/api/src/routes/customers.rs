//! Customer balance routes: cached reads and reconciliation.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;

use crate::{AppState, middleware::AuthUser, routes::khata_error_response};
use khata_core::TenantGuard;
use khata_db::repositories::CustomerBalanceRepository;
use khata_shared::{CustomerId, ShopId};

/// Creates the customer balance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/customers/outstanding/{shop_id}/{customer_id}",
            get(get_outstanding),
        )
        .route(
            "/customers/reconcile/{shop_id}/{customer_id}",
            post(reconcile),
        )
}

/// Response carrying an outstanding balance.
#[derive(Debug, Serialize)]
pub struct OutstandingResponse {
    /// Shop the balance belongs to.
    pub shop_id: ShopId,
    /// Customer the balance belongs to.
    pub customer_id: CustomerId,
    /// Sum of signed entry amounts; positive means the customer owes.
    pub outstanding: String,
}

/// GET `/customers/outstanding/{shop_id}/{customer_id}` - Cached balance.
///
/// A customer with no recorded entries reads as zero.
async fn get_outstanding(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((shop_id, customer_id)): Path<(ShopId, CustomerId)>,
) -> impl IntoResponse {
    let scope = match TenantGuard::authorize(auth.shop_id(), shop_id.into_inner()) {
        Ok(scope) => scope,
        Err(e) => return khata_error_response(&e),
    };

    let repo = CustomerBalanceRepository::new((*state.db).clone());
    match repo.get_outstanding(&scope, customer_id.into_inner()).await {
        Ok(outstanding) => (
            StatusCode::OK,
            Json(OutstandingResponse {
                shop_id,
                customer_id,
                outstanding: outstanding.to_string(),
            }),
        )
            .into_response(),
        Err(e) => khata_error_response(&e),
    }
}

/// POST `/customers/reconcile/{shop_id}/{customer_id}` - Rebuild the cache.
///
/// Recomputes the balance from the entry log and overwrites the cached
/// figure. Idempotent; meant for scheduled audits and drift recovery.
async fn reconcile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((shop_id, customer_id)): Path<(ShopId, CustomerId)>,
) -> impl IntoResponse {
    let scope = match TenantGuard::authorize(auth.shop_id(), shop_id.into_inner()) {
        Ok(scope) => scope,
        Err(e) => return khata_error_response(&e),
    };

    let repo = CustomerBalanceRepository::new((*state.db).clone());
    match repo.reconcile(&scope, customer_id.into_inner()).await {
        Ok(outstanding) => (
            StatusCode::OK,
            Json(OutstandingResponse {
                shop_id,
                customer_id,
                outstanding: outstanding.to_string(),
            }),
        )
            .into_response(),
        Err(e) => khata_error_response(&e),
    }
}
