//! History query types for khata display.
//!
//! Sort fields are validated here, before the database is touched; an
//! unknown field fails with `InvalidSort`. Customer display name is a join
//! against the Customer Directory, not a ledger-owned field.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::KhataError;

/// Fields a customer's history can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Business transaction date.
    OccurredAt,
    /// Signed entry amount.
    Amount,
    /// Customer display name, resolved via the Customer Directory.
    CustomerName,
}

impl FromStr for SortField {
    type Err = KhataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "occurred_at" => Ok(Self::OccurredAt),
            "amount" => Ok(Self::Amount),
            "customer_name" => Ok(Self::CustomerName),
            other => Err(KhataError::InvalidSort(other.to_string())),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl FromStr for SortDirection {
    type Err = KhataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(KhataError::InvalidSort(other.to_string())),
        }
    }
}

/// A validated sort specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySort {
    /// Field to sort by.
    pub field: SortField,
    /// Direction to sort in.
    pub direction: SortDirection,
}

impl Default for HistorySort {
    /// Newest entries first, the khata notebook's natural reading order.
    fn default() -> Self {
        Self {
            field: SortField::OccurredAt,
            direction: SortDirection::Desc,
        }
    }
}

impl HistorySort {
    /// Parses a sort specification from optional query-string parts.
    ///
    /// # Errors
    ///
    /// Returns `KhataError::InvalidSort` for an unknown field or direction.
    pub fn parse(field: Option<&str>, direction: Option<&str>) -> Result<Self, KhataError> {
        let default = Self::default();
        Ok(Self {
            field: field.map_or(Ok(default.field), SortField::from_str)?,
            direction: direction.map_or(Ok(default.direction), SortDirection::from_str)?,
        })
    }
}

/// A validated history query.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    /// Restrict to one customer; `None` lists the whole shop's ledger.
    pub customer_id: Option<Uuid>,
    /// Sort specification.
    pub sort: HistorySort,
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}
