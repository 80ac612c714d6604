//! Same inputs, same seed: both pipelines must reproduce their output
//! exactly. Any divergence here breaks reproducible reports.

use basket_core::{
    config::{DatasetConfig, InsightConfig},
    dataset, CustomerSegmentation, RecommendationEngine, TransactionStore,
};
use chrono::NaiveDate;

fn config() -> InsightConfig {
    let mut config = InsightConfig::default();
    config.segmentation.reference_date = NaiveDate::from_ymd_opt(2025, 1, 10);
    config.segmentation.cluster_count = 4;
    config.recommendation.factor_count = 6;
    config.dataset = DatasetConfig {
        seed: 0xDEAD_BEEF,
        customers: 60,
        products: 30,
        records: 900,
        ..DatasetConfig::default()
    };
    config
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn store(config: &InsightConfig) -> TransactionStore {
    TransactionStore::non_empty(dataset::generate(&config.dataset).expect("generate"))
        .expect("non-empty store")
}

#[test]
fn segmentation_is_reproducible() {
    init_logging();
    let config = config();
    let a = CustomerSegmentation::run(&store(&config), &config.segmentation).expect("run a");
    let b = CustomerSegmentation::run(&store(&config), &config.segmentation).expect("run b");

    let (ra, rb) = (a.report(), b.report());
    assert_eq!(ra.customers, rb.customers, "Customer segments diverged");
    assert_eq!(ra.segments, rb.segments, "Segment stats diverged");
    assert_eq!(ra.summary.thresholds, rb.summary.thresholds);
}

#[test]
fn recommendations_are_reproducible() {
    init_logging();
    let config = config();
    let a = RecommendationEngine::fit(&store(&config), &config.recommendation).expect("fit a");
    let b = RecommendationEngine::fit(&store(&config), &config.recommendation).expect("fit b");

    for customer in ["C001", "C017", "C060"] {
        assert_eq!(
            a.recommend(customer, 5),
            b.recommend(customer, 5),
            "Recommendations for {customer} diverged"
        );
    }
}
