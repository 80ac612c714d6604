//! Transaction Store: the in-memory purchase table both pipelines share.
//!
//! RULE: loaded once per run, then read-only.
//! Sources live in submodules: `csv_source` parses the tabular log,
//! `ledger` persists records to SQLite and reads them back.

mod csv_source;
mod ledger;

pub use csv_source::{write_csv, CSV_HEADERS};
pub use ledger::PurchaseLedger;

use crate::{
    error::{InsightError, InsightResult},
    transaction::Transaction,
    types::{CustomerId, ProductId},
};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct TransactionStore {
    transactions: Vec<Transaction>,
    /// First category observed per product, in load order.
    product_categories: HashMap<ProductId, String>,
}

impl TransactionStore {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        let mut product_categories = HashMap::new();
        let mut conflicts = 0usize;
        for t in &transactions {
            match product_categories.get(&t.product_id) {
                None => {
                    product_categories.insert(t.product_id.clone(), t.category.clone());
                }
                Some(existing) if existing != &t.category => conflicts += 1,
                Some(_) => {}
            }
        }
        if conflicts > 0 {
            log::warn!(
                "{conflicts} records list a product under a different category than first seen; \
                 keeping the first-seen category"
            );
        }
        Self { transactions, product_categories }
    }

    /// Same as `new`, but refuses an empty table.
    pub fn non_empty(transactions: Vec<Transaction>) -> InsightResult<Self> {
        if transactions.is_empty() {
            return Err(InsightError::EmptyStore);
        }
        Ok(Self::new(transactions))
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn total_amount(&self) -> f64 {
        self.transactions.iter().map(|t| t.amount).sum()
    }

    /// Distinct customer ids, sorted.
    pub fn customer_ids(&self) -> Vec<CustomerId> {
        self.transactions
            .iter()
            .map(|t| t.customer_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct product ids, sorted.
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.product_categories
            .keys()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.transactions
            .iter()
            .map(|t| t.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The first category a product was recorded under.
    pub fn product_category(&self, product_id: &str) -> Option<&str> {
        self.product_categories.get(product_id).map(String::as_str)
    }

    pub fn from_csv_path(path: &str) -> InsightResult<Self> {
        let txns = csv_source::read_path(path)?;
        log::info!("loaded {} purchase records from {path}", txns.len());
        Self::non_empty(txns)
    }

    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> InsightResult<Self> {
        Self::non_empty(csv_source::read(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(c: &str, p: &str, cat: &str, amount: f64) -> Transaction {
        let d = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        Transaction::new(c, p, cat, amount, d, 0).unwrap()
    }

    #[test]
    fn first_seen_category_wins() {
        let store = TransactionStore::new(vec![
            txn("C1", "P1", "Books", 5.0),
            txn("C2", "P1", "Kitchen", 5.0),
        ]);
        assert_eq!(store.product_category("P1"), Some("Books"));
        assert_eq!(store.product_category("P9"), None);
    }

    #[test]
    fn ids_are_sorted_and_distinct() {
        let store = TransactionStore::new(vec![
            txn("C2", "P2", "Books", 1.0),
            txn("C1", "P1", "Books", 1.0),
            txn("C2", "P1", "Books", 1.0),
        ]);
        assert_eq!(store.customer_ids(), vec!["C1", "C2"]);
        assert_eq!(store.product_ids(), vec!["P1", "P2"]);
    }

    #[test]
    fn empty_store_refused() {
        assert!(matches!(
            TransactionStore::non_empty(Vec::new()),
            Err(InsightError::EmptyStore)
        ));
    }
}
