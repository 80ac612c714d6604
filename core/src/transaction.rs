//! The purchase record both pipelines read from.

use crate::{
    error::{InsightError, InsightResult},
    types::{CustomerId, ProductId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One line of the purchase log. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub customer_id:   CustomerId,
    pub product_id:    ProductId,
    pub category:      String,
    pub amount:        f64,
    pub purchase_date: NaiveDate,
}

impl Transaction {
    /// Build a validated record. `line` is only used for error reporting.
    pub fn new(
        customer_id: impl Into<CustomerId>,
        product_id: impl Into<ProductId>,
        category: impl Into<String>,
        amount: f64,
        purchase_date: NaiveDate,
        line: u64,
    ) -> InsightResult<Self> {
        let txn = Self {
            customer_id: customer_id.into(),
            product_id: product_id.into(),
            category: category.into(),
            amount,
            purchase_date,
        };
        txn.validate(line)?;
        Ok(txn)
    }

    fn validate(&self, line: u64) -> InsightResult<()> {
        let blank = [
            ("customer_id", &self.customer_id),
            ("product_id", &self.product_id),
            ("category", &self.category),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty());
        if let Some((field, _)) = blank {
            return Err(InsightError::MalformedRecord {
                line,
                reason: format!("{field} is empty"),
            });
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(InsightError::MalformedRecord {
                line,
                reason: format!("amount {} is not a non-negative number", self.amount),
            });
        }
        Ok(())
    }
}

/// Parse `YYYY-MM-DD`, tolerating a trailing time component
/// (`2024-12-03 14:22:00` or `2024-12-03T14:22:00`).
pub fn parse_purchase_date(raw: &str, line: u64) -> InsightResult<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| InsightError::MalformedRecord {
        line,
        reason: format!("purchase date '{trimmed}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 3).unwrap()
    }

    #[test]
    fn negative_amount_rejected() {
        let err = Transaction::new("C1", "P1", "Books", -1.0, date(), 7).unwrap_err();
        assert!(matches!(err, InsightError::MalformedRecord { line: 7, .. }));
    }

    #[test]
    fn blank_category_rejected() {
        let err = Transaction::new("C1", "P1", "  ", 1.0, date(), 2).unwrap_err();
        assert!(err.to_string().contains("category"));
    }

    #[test]
    fn zero_amount_is_legal() {
        assert!(Transaction::new("C1", "P1", "Books", 0.0, date(), 2).is_ok());
    }

    #[test]
    fn date_with_time_suffix_parses() {
        assert_eq!(parse_purchase_date("2024-12-03 10:00:00", 1).unwrap(), date());
        assert_eq!(parse_purchase_date("2024-12-03T10:00:00", 1).unwrap(), date());
        assert!(parse_purchase_date("03/12/2024", 1).is_err());
    }
}
