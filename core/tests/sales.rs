//! Sales aggregation tests.

use basket_core::{sales, Transaction, TransactionStore};
use chrono::NaiveDate;

fn txn(c: &str, p: &str, cat: &str, amount: f64) -> Transaction {
    let d = NaiveDate::from_ymd_opt(2024, 12, 2).unwrap();
    Transaction::new(c, p, cat, amount, d, 0).unwrap()
}

fn store() -> TransactionStore {
    TransactionStore::new(vec![
        txn("C001", "P001", "Books", 10.0),
        txn("C001", "P002", "Toys", 30.0),
        txn("C002", "P002", "Toys", 30.0),
        txn("C003", "P003", "Food", 60.0),
        txn("C003", "P001", "Books", 20.0),
        txn("C003", "P001", "Books", 40.0),
    ])
}

#[test]
fn top_products_rank_by_total_then_id() {
    let top = sales::top_products(&store(), 2);
    assert_eq!(top.total_products, 3);
    let ids: Vec<&str> = top.top_products.iter().map(|p| p.product_id.as_str()).collect();
    // P001 = 70; P002 and P003 tie at 60, so P002 wins on id.
    assert_eq!(ids, vec!["P001", "P002"]);
    assert_eq!(top.top_products[0].count, 3);
}

#[test]
fn category_totals_conserve_spend() {
    let s = store();
    let analysis = sales::category_analysis(&s);
    assert_eq!(analysis.total_categories, 3);
    let sum: f64 = analysis.category_sales.iter().map(|c| c.total).sum();
    assert!((sum - s.total_amount()).abs() < 1e-9);
    assert_eq!(analysis.category_sales[0].category, "Books");
}

#[test]
fn customer_summary_uses_average_order_value() {
    let analysis = sales::customer_analysis(&store(), 1);
    // Per-customer averages: C001 20, C002 30, C003 40.
    let stats = &analysis.summary_stats;
    assert_eq!(stats.total_customers, 3);
    assert!((stats.mean_spending - 30.0).abs() < 1e-9);
    assert!((stats.median_spending - 30.0).abs() < 1e-9);

    assert_eq!(analysis.top_customers.len(), 1);
    assert_eq!(analysis.top_customers[0].customer_id, "C003");
    assert!((analysis.top_customers[0].total - 120.0).abs() < 1e-9);
}
