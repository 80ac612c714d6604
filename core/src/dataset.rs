//! Synthetic purchase-log generator.
//!
//! Uniform picks of customer, product and category per record; the
//! amount is uniform in the category's range, rounded to cents; the
//! date is uniform over the configured window, both ends inclusive.

use crate::{
    config::DatasetConfig,
    error::InsightResult,
    rng::{RngBank, StageSlot},
    store::write_csv,
    transaction::Transaction,
};
use chrono::Duration;
use std::io::Write;

pub fn customer_ids(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("C{i:03}")).collect()
}

pub fn product_ids(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("P{i:03}")).collect()
}

pub fn generate(config: &DatasetConfig) -> InsightResult<Vec<Transaction>> {
    config.validate()?;
    let mut rng = RngBank::new(config.seed).for_stage(StageSlot::Dataset);
    let customers = customer_ids(config.customers);
    let products = product_ids(config.products);
    let span_days = (config.end_date - config.start_date).num_days() as usize + 1;

    let mut out = Vec::with_capacity(config.records);
    for i in 0..config.records {
        let customer = &customers[rng.next_index(customers.len())];
        let product = &products[rng.next_index(products.len())];
        let range = &config.categories[rng.next_index(config.categories.len())];
        let date = config.start_date + Duration::days(rng.next_index(span_days) as i64);
        let amount = (rng.uniform(range.min_amount, range.max_amount) * 100.0).round() / 100.0;
        out.push(Transaction::new(
            customer.as_str(),
            product.as_str(),
            range.category.as_str(),
            amount,
            date,
            i as u64 + 2,
        )?);
    }
    log::info!(
        "generated {} records over {} customers and {} products (seed {})",
        out.len(),
        config.customers,
        config.products,
        config.seed
    );
    Ok(out)
}

pub fn generate_csv<W: Write>(config: &DatasetConfig, writer: W) -> InsightResult<usize> {
    let txns = generate(config)?;
    write_csv(writer, &txns)?;
    Ok(txns.len())
}
