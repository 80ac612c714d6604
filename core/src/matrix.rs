//! Purchase Matrix Builder: dense customer × product spend pivot.
//!
//! Rows and columns are the distinct ids in the store, sorted, so a
//! customer's row and a product's column are stable lookups.

use crate::{
    store::TransactionStore,
    types::{CustomerId, ProductId},
};
use ndarray::{Array2, ArrayView1};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PurchaseMatrix {
    customers:    Vec<CustomerId>,
    products:     Vec<ProductId>,
    customer_idx: HashMap<CustomerId, usize>,
    product_idx:  HashMap<ProductId, usize>,
    /// Summed amount per pair; 0.0 when never purchased.
    values:       Array2<f64>,
    /// True where at least one transaction exists, whatever its amount.
    purchased:    Array2<bool>,
}

impl PurchaseMatrix {
    pub fn customers(&self) -> &[CustomerId] {
        &self.customers
    }

    pub fn products(&self) -> &[ProductId] {
        &self.products
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn customer_row(&self, customer_id: &str) -> Option<usize> {
        self.customer_idx.get(customer_id).copied()
    }

    pub fn product_col(&self, product_id: &str) -> Option<usize> {
        self.product_idx.get(product_id).copied()
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, f64> {
        self.values.row(row)
    }

    pub fn amount(&self, customer_id: &str, product_id: &str) -> Option<f64> {
        Some(self.values[[self.customer_row(customer_id)?, self.product_col(product_id)?]])
    }

    pub fn has_record(&self, row: usize, col: usize) -> bool {
        self.purchased[[row, col]]
    }
}

pub fn build_purchase_matrix(store: &TransactionStore) -> PurchaseMatrix {
    let customers = store.customer_ids();
    let products = store.product_ids();
    let customer_idx: HashMap<CustomerId, usize> = customers
        .iter()
        .enumerate()
        .map(|(i, c)| (c.clone(), i))
        .collect();
    let product_idx: HashMap<ProductId, usize> = products
        .iter()
        .enumerate()
        .map(|(j, p)| (p.clone(), j))
        .collect();

    let shape = (customers.len(), products.len());
    let mut values = Array2::<f64>::zeros(shape);
    let mut purchased = Array2::from_elem(shape, false);
    for t in store.transactions() {
        // Both ids were collected from this same store.
        let (Some(&i), Some(&j)) = (customer_idx.get(&t.customer_id), product_idx.get(&t.product_id))
        else {
            continue;
        };
        values[[i, j]] += t.amount;
        purchased[[i, j]] = true;
    }

    log::info!(
        "purchase matrix: {} customers × {} products, {} non-empty cells",
        shape.0,
        shape.1,
        purchased.iter().filter(|p| **p).count()
    );

    PurchaseMatrix {
        customers,
        products,
        customer_idx,
        product_idx,
        values,
        purchased,
    }
}
