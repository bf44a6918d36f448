//! Khata error types for validation and storage errors.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum KhataError {
    // ========== Validation Errors ==========
    /// Entry amount must be a nonzero decimal.
    #[error("Entry amount must be a nonzero decimal")]
    InvalidAmount,

    /// Unknown sort field for history queries.
    #[error("Unknown sort field: {0}")]
    InvalidSort(String),

    /// Customer does not exist in the caller's shop.
    #[error("Unknown customer: {0}")]
    UnknownCustomer(Uuid),

    /// Ledger entry does not exist in the caller's shop.
    #[error("Unknown ledger entry: {0}")]
    UnknownEntry(Uuid),

    /// Caller is not authorized for the requested shop.
    #[error("Authenticated shop does not match requested shop {requested}")]
    TenantMismatch {
        /// The shop the caller attempted to access.
        requested: Uuid,
    },

    // ========== Storage Errors ==========
    /// Transient storage failure. The ledger never retries internally;
    /// callers retry with an idempotency token.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl KhataError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidSort(_) => "INVALID_SORT",
            Self::UnknownCustomer(_) => "UNKNOWN_CUSTOMER",
            Self::UnknownEntry(_) => "UNKNOWN_ENTRY",
            Self::TenantMismatch { .. } => "TENANT_MISMATCH",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount | Self::InvalidSort(_) => 400,
            Self::TenantMismatch { .. } => 403,
            Self::UnknownCustomer(_) | Self::UnknownEntry(_) => 404,
            Self::StoreUnavailable(_) => 503,
        }
    }

    /// Returns true if the caller may retry the operation.
    ///
    /// Retries of `record_entry` must carry the same idempotency token so
    /// the store can discard duplicate submissions.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(KhataError::InvalidAmount.error_code(), "INVALID_AMOUNT");
        assert_eq!(
            KhataError::InvalidSort("foo".into()).error_code(),
            "INVALID_SORT"
        );
        assert_eq!(
            KhataError::UnknownCustomer(Uuid::nil()).error_code(),
            "UNKNOWN_CUSTOMER"
        );
        assert_eq!(
            KhataError::UnknownEntry(Uuid::nil()).error_code(),
            "UNKNOWN_ENTRY"
        );
        assert_eq!(
            KhataError::TenantMismatch {
                requested: Uuid::nil()
            }
            .error_code(),
            "TENANT_MISMATCH"
        );
        assert_eq!(
            KhataError::StoreUnavailable("down".into()).error_code(),
            "STORE_UNAVAILABLE"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(KhataError::InvalidAmount.http_status_code(), 400);
        assert_eq!(KhataError::InvalidSort("x".into()).http_status_code(), 400);
        assert_eq!(
            KhataError::TenantMismatch {
                requested: Uuid::nil()
            }
            .http_status_code(),
            403
        );
        assert_eq!(
            KhataError::UnknownCustomer(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(KhataError::UnknownEntry(Uuid::nil()).http_status_code(), 404);
        assert_eq!(
            KhataError::StoreUnavailable("down".into()).http_status_code(),
            503
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(KhataError::StoreUnavailable("timeout".into()).is_retryable());
        assert!(!KhataError::InvalidAmount.is_retryable());
        assert!(
            !KhataError::TenantMismatch {
                requested: Uuid::nil()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_display() {
        let err = KhataError::UnknownCustomer(Uuid::nil());
        assert_eq!(
            err.to_string(),
            "Unknown customer: 00000000-0000-0000-0000-000000000000"
        );

        let err = KhataError::InvalidSort("colour".into());
        assert_eq!(err.to_string(), "Unknown sort field: colour");
    }
}
