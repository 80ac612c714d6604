//! Customer segmentation and latent-factor product recommendations
//! over a transactional purchase log.
//!
//! Two independent batch pipelines share one read-only [`store::TransactionStore`]:
//!
//! - segmentation: features → thresholds → clusters → segment labels
//! - recommendation: purchase matrix → latent factors → ranked products

pub mod clock;
pub mod cluster;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod matrix;
pub mod predictor;
pub mod recommend;
pub mod rng;
pub mod sales;
pub mod segment;
pub mod segmentation;
pub mod store;
pub mod thresholds;
pub mod transaction;
pub mod types;

pub use cluster::cluster;
pub use config::InsightConfig;
pub use error::{InsightError, InsightResult};
pub use features::{build_feature_vectors, CustomerFeatureVector, FeatureSet};
pub use matrix::{build_purchase_matrix, PurchaseMatrix};
pub use predictor::{fit_predictor, PredictedAffinityMatrix};
pub use recommend::{Recommendation, RecommendationEngine, RecommendationList};
pub use segment::{label_segment, SegmentLabel};
pub use segmentation::{run_segmentation, CustomerSegmentation, SegmentationReport};
pub use store::{PurchaseLedger, TransactionStore};
pub use thresholds::{compute_thresholds, SegmentationThresholds};
pub use transaction::Transaction;
pub use types::CustomerLookup;
