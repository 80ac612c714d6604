//! Shared primitive types used across both pipelines.

use serde::{Deserialize, Serialize};

/// Stable identifier of a customer as it appears in the purchase log.
pub type CustomerId = String;

/// Stable identifier of a product as it appears in the purchase log.
pub type ProductId = String;

/// Numeric cluster id in `0..k`. Ids carry no ordering meaning.
pub type ClusterId = usize;

/// Result of looking a customer up in one of the pipeline indexes.
///
/// An absent customer is an expected outcome, not an error: callers
/// must match on the variant before touching the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CustomerLookup<T> {
    Found(T),
    NotFound { customer_id: CustomerId },
}

impl<T> CustomerLookup<T> {
    pub fn not_found(customer_id: impl Into<CustomerId>) -> Self {
        Self::NotFound { customer_id: customer_id.into() }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound { .. } => None,
        }
    }

    pub fn as_found(&self) -> Option<&T> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound { .. } => None,
        }
    }
}
