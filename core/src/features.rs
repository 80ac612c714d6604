//! Feature Builder: one behavioural vector per customer.
//!
//! Every vector carries a share for every category observed anywhere
//! in the store, so all vectors have the same dimensionality.

use crate::{
    clock::ReferenceClock,
    store::TransactionStore,
    types::CustomerId,
};
use chrono::NaiveDate;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Scalar features that precede the category shares in a numeric row.
pub const SCALAR_FEATURES: [&str; 4] = [
    "total_spending",
    "purchase_frequency",
    "average_purchase_amount",
    "days_since_last_purchase",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerFeatureVector {
    pub customer_id:              CustomerId,
    pub total_spending:           f64,
    pub purchase_frequency:       usize,
    pub average_purchase_amount:  f64,
    pub days_since_last_purchase: i64,
    pub last_purchase_date:       NaiveDate,
    /// Fraction of total spending per category. All zeros when the
    /// customer spent nothing (shares are undefined there).
    pub category_share:           BTreeMap<String, f64>,
}

impl CustomerFeatureVector {
    pub fn has_spend(&self) -> bool {
        self.total_spending > 0.0
    }

    /// Scalars followed by shares, in the order of `categories`.
    pub fn numeric_row(&self, categories: &[String]) -> Vec<f64> {
        let mut row = vec![
            self.total_spending,
            self.purchase_frequency as f64,
            self.average_purchase_amount,
            self.days_since_last_purchase as f64,
        ];
        row.extend(
            categories
                .iter()
                .map(|c| self.category_share.get(c).copied().unwrap_or(0.0)),
        );
        row
    }
}

/// All feature vectors for one run, keyed and ordered by customer id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSet {
    pub reference_date: NaiveDate,
    pub categories:     Vec<String>,
    vectors:            BTreeMap<CustomerId, CustomerFeatureVector>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, customer_id: &str) -> Option<&CustomerFeatureVector> {
        self.vectors.get(customer_id)
    }

    pub fn vectors(&self) -> &BTreeMap<CustomerId, CustomerFeatureVector> {
        &self.vectors
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomerFeatureVector> {
        self.vectors.values()
    }

    pub fn feature_names(&self) -> Vec<String> {
        SCALAR_FEATURES
            .iter()
            .map(|s| s.to_string())
            .chain(self.categories.iter().map(|c| format!("share:{c}")))
            .collect()
    }

    /// Dense (customers × features) matrix in customer-id order.
    pub fn to_matrix(&self) -> Array2<f64> {
        let cols = SCALAR_FEATURES.len() + self.categories.len();
        let mut m = Array2::zeros((self.vectors.len(), cols));
        for (i, v) in self.vectors.values().enumerate() {
            for (j, x) in v.numeric_row(&self.categories).into_iter().enumerate() {
                m[[i, j]] = x;
            }
        }
        m
    }
}

#[derive(Default)]
struct Accumulator {
    total:      f64,
    count:      usize,
    last:       Option<NaiveDate>,
    by_category: BTreeMap<String, f64>,
}

/// Aggregate the store into one feature vector per customer.
/// Recency is measured in whole days up to `clock.today()`.
pub fn build_feature_vectors(store: &TransactionStore, clock: &ReferenceClock) -> FeatureSet {
    let reference_date = clock.today();
    let mut acc: BTreeMap<CustomerId, Accumulator> = BTreeMap::new();
    let mut categories = BTreeSet::new();

    for t in store.transactions() {
        categories.insert(t.category.clone());
        let a = acc.entry(t.customer_id.clone()).or_default();
        a.total += t.amount;
        a.count += 1;
        a.last = Some(a.last.map_or(t.purchase_date, |d| d.max(t.purchase_date)));
        *a.by_category.entry(t.category.clone()).or_insert(0.0) += t.amount;
    }

    let categories: Vec<String> = categories.into_iter().collect();
    let mut zero_spend = 0usize;

    let vectors = acc
        .into_iter()
        .filter_map(|(customer_id, a)| {
            let last = a.last?;
            let category_share = categories
                .iter()
                .map(|c| {
                    let spent = a.by_category.get(c).copied().unwrap_or(0.0);
                    let share = if a.total > 0.0 { spent / a.total } else { 0.0 };
                    (c.clone(), share)
                })
                .collect();
            if a.total <= 0.0 {
                zero_spend += 1;
            }
            let v = CustomerFeatureVector {
                customer_id: customer_id.clone(),
                total_spending: a.total,
                purchase_frequency: a.count,
                average_purchase_amount: a.total / a.count as f64,
                days_since_last_purchase: (reference_date - last).num_days(),
                last_purchase_date: last,
                category_share,
            };
            Some((customer_id, v))
        })
        .collect::<BTreeMap<_, _>>();

    if zero_spend > 0 {
        log::warn!("{zero_spend} customers have zero total spending; their category shares are zero");
    }
    log::info!(
        "features: {} customers × {} categories (reference date {reference_date})",
        vectors.len(),
        categories.len()
    );

    FeatureSet { reference_date, categories, vectors }
}
