//! Feature Builder integration tests: conservation, shares, recency.

use basket_core::{
    build_feature_vectors, clock::ReferenceClock, Transaction, TransactionStore,
};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn txn(c: &str, p: &str, cat: &str, amount: f64, day: u32) -> Transaction {
    Transaction::new(c, p, cat, amount, date(2024, 12, day), 0).unwrap()
}

fn sample_store() -> TransactionStore {
    TransactionStore::new(vec![
        txn("C001", "P001", "Electronics", 120.0, 1),
        txn("C001", "P002", "Books", 30.0, 10),
        txn("C001", "P001", "Electronics", 50.0, 20),
        txn("C002", "P003", "Food", 12.5, 5),
        txn("C003", "P002", "Books", 40.0, 28),
        txn("C003", "P004", "Toys", 60.0, 28),
    ])
}

fn fixed_clock() -> ReferenceClock {
    ReferenceClock::Fixed(date(2025, 1, 1))
}

/// Sum of total_spending over all vectors equals the sum of all amounts.
#[test]
fn total_spending_is_conserved() {
    let store = sample_store();
    let features = build_feature_vectors(&store, &fixed_clock());

    let summed: f64 = features.iter().map(|v| v.total_spending).sum();
    assert!(
        (summed - store.total_amount()).abs() < 1e-9,
        "Feature spend {summed} != store spend {}",
        store.total_amount()
    );
    assert_eq!(features.len(), 3, "Expected one vector per distinct customer");
}

#[test]
fn category_shares_sum_to_one_for_spending_customers() {
    let features = build_feature_vectors(&sample_store(), &fixed_clock());
    for v in features.iter().filter(|v| v.has_spend()) {
        let total: f64 = v.category_share.values().sum();
        assert!(
            (total - 1.0).abs() < 1e-9,
            "Shares of {} sum to {total}, expected 1.0",
            v.customer_id
        );
    }
}

#[test]
fn every_vector_covers_every_observed_category() {
    let features = build_feature_vectors(&sample_store(), &fixed_clock());
    assert_eq!(features.categories, vec!["Books", "Electronics", "Food", "Toys"]);
    for v in features.iter() {
        assert_eq!(
            v.category_share.len(),
            4,
            "{} is missing category columns",
            v.customer_id
        );
    }
    let c2 = features.get("C002").expect("C002 present");
    assert_eq!(c2.category_share["Food"], 1.0);
    assert_eq!(c2.category_share["Books"], 0.0);
}

#[test]
fn frequency_average_and_recency_are_per_customer() {
    let features = build_feature_vectors(&sample_store(), &fixed_clock());
    let c1 = features.get("C001").expect("C001 present");
    assert_eq!(c1.purchase_frequency, 3);
    assert!((c1.total_spending - 200.0).abs() < 1e-9);
    assert!((c1.average_purchase_amount - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(c1.last_purchase_date, date(2024, 12, 20));
    assert_eq!(c1.days_since_last_purchase, 12);

    let c3 = features.get("C003").expect("C003 present");
    assert_eq!(c3.days_since_last_purchase, 4);
}

/// A single purchase on the reference date yields 0 days and shares of 1.0.
#[test]
fn single_transaction_customer_on_reference_day() {
    let store = TransactionStore::new(vec![txn("C009", "P001", "Books", 25.0, 15)]);
    let features = build_feature_vectors(&store, &ReferenceClock::Fixed(date(2024, 12, 15)));
    let v = features.get("C009").expect("C009 present");
    assert_eq!(v.purchase_frequency, 1);
    assert_eq!(v.average_purchase_amount, v.total_spending);
    assert_eq!(v.days_since_last_purchase, 0);
    assert_eq!(v.category_share["Books"], 1.0);
}

#[test]
fn zero_spend_customer_gets_zero_shares_not_nan() {
    let store = TransactionStore::new(vec![
        txn("C001", "P001", "Books", 0.0, 3),
        txn("C002", "P002", "Toys", 10.0, 3),
    ]);
    let features = build_feature_vectors(&store, &fixed_clock());
    let v = features.get("C001").expect("C001 present");
    assert!(!v.has_spend());
    assert!(
        v.category_share.values().all(|s| *s == 0.0),
        "Zero-spend shares must be 0, got {:?}",
        v.category_share
    );
}

#[test]
fn feature_matrix_rows_follow_customer_order() {
    let features = build_feature_vectors(&sample_store(), &fixed_clock());
    let m = features.to_matrix();
    assert_eq!(m.nrows(), 3);
    assert_eq!(m.ncols(), features.feature_names().len());
    assert!((m[[0, 0]] - 200.0).abs() < 1e-9, "Row 0 must be C001");
    assert!((m[[1, 0]] - 12.5).abs() < 1e-9, "Row 1 must be C002");
}
