//! Credit ledger routes: recording entries and browsing history.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{AppState, middleware::AuthUser, routes::khata_error_response};
use khata_core::{EntryKind, HistoryQuery, HistorySort, KhataError, TenantGuard};
use khata_db::entities::credit_entries;
use khata_db::repositories::{CreditEntryRepository, EntryWithCustomer, RecordEntryInput};
use khata_shared::{CreditEntryId, CustomerId, PageRequest, PageResponse, ShopId};

/// Creates the credit ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/credits", post(record_credit))
        .route("/credits", get(list_credits))
        .route("/credits/{entry_id}/reversal", post(reverse_credit))
}

/// Request body for recording a ledger entry.
#[derive(Debug, Deserialize)]
pub struct RecordCreditRequest {
    /// Customer the entry belongs to.
    pub customer_id: CustomerId,
    /// Signed decimal amount: positive = credit extended, negative = repayment.
    pub amount: String,
    /// Optional free-text memo.
    pub description: Option<String>,
    /// Business transaction date; defaults to now.
    pub occurred_at: Option<DateTime<Utc>>,
    /// Client token making retried submissions safe.
    pub idempotency_key: Option<String>,
    /// Target shop; defaults to the authenticated shop.
    pub shop_id: Option<ShopId>,
}

/// Query parameters for listing ledger entries.
#[derive(Debug, Deserialize)]
pub struct ListCreditsQuery {
    /// Filter to a single customer.
    pub customer_id: Option<CustomerId>,
    /// Sort field: `occurred_at`, `amount`, or `customer_name`.
    pub sort: Option<String>,
    /// Sort direction: `asc` or `desc`.
    pub direction: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Response for a single ledger entry.
#[derive(Debug, Serialize)]
pub struct CreditEntryResponse {
    /// Entry ID.
    pub id: CreditEntryId,
    /// Customer ID.
    pub customer_id: CustomerId,
    /// Customer display name, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// `credit_given` or `repayment`, derived from the amount's sign.
    pub kind: EntryKind,
    /// Signed amount.
    pub amount: String,
    /// Memo.
    pub description: Option<String>,
    /// Business transaction date.
    pub occurred_at: String,
    /// Server-assigned ingestion timestamp.
    pub recorded_at: String,
}

impl From<credit_entries::Model> for CreditEntryResponse {
    fn from(entry: credit_entries::Model) -> Self {
        Self {
            id: CreditEntryId::from_uuid(entry.id),
            customer_id: CustomerId::from_uuid(entry.customer_id),
            customer_name: None,
            kind: EntryKind::of(entry.amount),
            amount: entry.amount.to_string(),
            description: entry.description,
            occurred_at: entry.occurred_at.to_rfc3339(),
            recorded_at: entry.recorded_at.to_rfc3339(),
        }
    }
}

impl From<EntryWithCustomer> for CreditEntryResponse {
    fn from(item: EntryWithCustomer) -> Self {
        let mut response = Self::from(item.entry);
        response.customer_name = item.customer_name;
        response
    }
}

/// POST `/credits` - Record a ledger entry.
async fn record_credit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RecordCreditRequest>,
) -> impl IntoResponse {
    let target_shop = payload
        .shop_id
        .map_or_else(|| auth.shop_id(), ShopId::into_inner);

    let scope = match TenantGuard::authorize(auth.shop_id(), target_shop) {
        Ok(scope) => scope,
        Err(e) => return khata_error_response(&e),
    };

    let Ok(amount) = Decimal::from_str(&payload.amount) else {
        return khata_error_response(&KhataError::InvalidAmount);
    };

    let repo = CreditEntryRepository::new((*state.db).clone());
    let input = RecordEntryInput {
        customer_id: payload.customer_id.into_inner(),
        amount,
        description: payload.description,
        occurred_at: payload.occurred_at.map(Into::into),
        idempotency_key: payload.idempotency_key,
    };

    match repo.record_entry(&scope, input).await {
        Ok(entry) => {
            (StatusCode::CREATED, Json(CreditEntryResponse::from(entry))).into_response()
        }
        Err(e) => khata_error_response(&e),
    }
}

/// POST `/credits/{entry_id}/reversal` - Record the compensating entry for
/// a recorded entry. Repeating the call surfaces the same reversal.
async fn reverse_credit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(entry_id): Path<CreditEntryId>,
) -> impl IntoResponse {
    // Reversals always target the caller's own shop.
    let scope = match TenantGuard::authorize(auth.shop_id(), auth.shop_id()) {
        Ok(scope) => scope,
        Err(e) => return khata_error_response(&e),
    };

    let repo = CreditEntryRepository::new((*state.db).clone());
    match repo.reverse_entry(&scope, entry_id.into_inner()).await {
        Ok(entry) => {
            (StatusCode::CREATED, Json(CreditEntryResponse::from(entry))).into_response()
        }
        Err(e) => khata_error_response(&e),
    }
}

/// GET `/credits` - List ledger entries, paginated and sortable.
async fn list_credits(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListCreditsQuery>,
) -> impl IntoResponse {
    // Listing is always against the caller's own shop.
    let scope = match TenantGuard::authorize(auth.shop_id(), auth.shop_id()) {
        Ok(scope) => scope,
        Err(e) => return khata_error_response(&e),
    };

    let sort = match HistorySort::parse(query.sort.as_deref(), query.direction.as_deref()) {
        Ok(sort) => sort,
        Err(e) => return khata_error_response(&e),
    };

    let mut page = PageRequest::default();
    if let Some(n) = query.page {
        page.page = n;
    }
    if let Some(n) = query.per_page {
        page.per_page = n;
    }

    let history = HistoryQuery {
        customer_id: query.customer_id.map(CustomerId::into_inner),
        sort,
        offset: page.offset(),
        limit: page.limit(),
    };

    let repo = CreditEntryRepository::new((*state.db).clone());
    match repo.list_entries(&scope, &history).await {
        Ok((items, total)) => {
            let items: Vec<CreditEntryResponse> =
                items.into_iter().map(CreditEntryResponse::from).collect();
            (
                StatusCode::OK,
                Json(PageResponse::new(items, total, page.page, page.per_page)),
            )
                .into_response()
        }
        Err(e) => khata_error_response(&e),
    }
}
