//! Sales aggregation: plain group-by totals over the store, no derived state.

use crate::{
    store::TransactionStore,
    thresholds::percentile,
    transaction::Transaction,
    types::{CustomerId, ProductId},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub total:      f64,
    pub count:      usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySales {
    pub category: String,
    pub total:    f64,
    pub count:    usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSpend {
    pub customer_id: CustomerId,
    pub total:       f64,
    pub count:       usize,
    pub mean:        f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProducts {
    pub top_products:   Vec<ProductSales>,
    pub total_products: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    pub category_sales:   Vec<CategorySales>,
    pub total_categories: usize,
}

/// Mean and median are taken over each customer's average order value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub mean_spending:   f64,
    pub median_spending: f64,
    pub total_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAnalysis {
    pub summary_stats: SpendingSummary,
    pub top_customers: Vec<CustomerSpend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullAnalysis {
    pub products_analysis: TopProducts,
    pub category_analysis: CategoryAnalysis,
    pub customer_analysis: CustomerAnalysis,
}

/// (total, count) per key, sorted by total descending then key ascending.
fn totals_by<'a>(
    store: &'a TransactionStore,
    key: impl Fn(&'a Transaction) -> &'a str,
) -> Vec<(String, f64, usize)> {
    let mut acc: HashMap<&str, (f64, usize)> = HashMap::new();
    for t in store.transactions() {
        let e = acc.entry(key(t)).or_insert((0.0, 0));
        e.0 += t.amount;
        e.1 += 1;
    }
    let mut rows: Vec<(String, f64, usize)> = acc
        .into_iter()
        .map(|(k, (total, count))| (k.to_string(), total, count))
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

pub fn top_products(store: &TransactionStore, limit: usize) -> TopProducts {
    let rows = totals_by(store, |t| t.product_id.as_str());
    TopProducts {
        total_products: rows.len(),
        top_products: rows
            .into_iter()
            .take(limit)
            .map(|(product_id, total, count)| ProductSales { product_id, total, count })
            .collect(),
    }
}

pub fn category_analysis(store: &TransactionStore) -> CategoryAnalysis {
    let rows = totals_by(store, |t| t.category.as_str());
    CategoryAnalysis {
        total_categories: rows.len(),
        category_sales: rows
            .into_iter()
            .map(|(category, total, count)| CategorySales { category, total, count })
            .collect(),
    }
}

pub fn customer_analysis(store: &TransactionStore, top_n: usize) -> CustomerAnalysis {
    let customers: Vec<CustomerSpend> = totals_by(store, |t| t.customer_id.as_str())
        .into_iter()
        .map(|(customer_id, total, count)| CustomerSpend {
            customer_id,
            total,
            count,
            mean: total / count as f64,
        })
        .collect();

    let mut means: Vec<f64> = customers.iter().map(|c| c.mean).collect();
    means.sort_by(f64::total_cmp);
    let summary_stats = if means.is_empty() {
        SpendingSummary { mean_spending: 0.0, median_spending: 0.0, total_customers: 0 }
    } else {
        SpendingSummary {
            mean_spending:   means.iter().sum::<f64>() / means.len() as f64,
            median_spending: percentile(&means, 0.5),
            total_customers: means.len(),
        }
    };

    CustomerAnalysis {
        summary_stats,
        top_customers: customers.into_iter().take(top_n).collect(),
    }
}

pub fn full_analysis(store: &TransactionStore, top_products_n: usize, top_customers_n: usize) -> FullAnalysis {
    FullAnalysis {
        products_analysis: top_products(store, top_products_n),
        category_analysis: category_analysis(store),
        customer_analysis: customer_analysis(store, top_customers_n),
    }
}
