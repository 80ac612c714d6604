//! Segmentation pipeline.
//!
//! EXECUTION ORDER (fixed):
//!   1. Feature Builder
//!   2. Threshold Calculator  (once per run, passed explicitly onward)
//!   3. Cluster Engine        (descriptive cluster ids)
//!   4. Segment Labeler       (reads features + thresholds, never cluster ids)

use crate::{
    cluster::{cluster_with, ClusterOutcome},
    config::SegmentationConfig,
    error::InsightResult,
    features::{build_feature_vectors, CustomerFeatureVector, FeatureSet},
    segment::{label_segment, SegmentLabel},
    store::TransactionStore,
    thresholds::{compute_thresholds, SegmentationThresholds},
    types::{ClusterId, CustomerId, CustomerLookup},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerMetrics {
    pub total_spending:           f64,
    pub purchase_frequency:       usize,
    pub average_order_value:      f64,
    pub days_since_last_purchase: i64,
}

impl From<&CustomerFeatureVector> for CustomerMetrics {
    fn from(v: &CustomerFeatureVector) -> Self {
        Self {
            total_spending:           v.total_spending,
            purchase_frequency:       v.purchase_frequency,
            average_order_value:      v.average_purchase_amount,
            days_since_last_purchase: v.days_since_last_purchase,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSegment {
    pub customer_id: CustomerId,
    pub cluster_id:  ClusterId,
    pub segment:     SegmentLabel,
    pub metrics:     CustomerMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentStats {
    pub segment_name:            SegmentLabel,
    pub customer_count:          usize,
    pub avg_spending:            f64,
    pub avg_frequency:           f64,
    pub avg_order_value:         f64,
    pub avg_days_since_purchase: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationSummary {
    pub total_customers:    usize,
    pub number_of_segments: usize,
    pub cluster_count:      usize,
    /// RFC 3339 timestamp of when the report was produced.
    pub analysis_date:      String,
    pub reference_date:     NaiveDate,
    pub thresholds:         SegmentationThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationReport {
    pub summary:   SegmentationSummary,
    pub segments:  Vec<SegmentStats>,
    pub customers: Vec<CustomerSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSegmentDetail {
    pub customer_id: CustomerId,
    pub segment:     SegmentLabel,
    pub cluster_id:  ClusterId,
    pub metrics:     CustomerMetrics,
    pub thresholds:  SegmentationThresholds,
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

/// One completed segmentation run. Thresholds are computed once and kept.
pub struct CustomerSegmentation {
    features:   FeatureSet,
    thresholds: SegmentationThresholds,
    clusters:   ClusterOutcome,
    labels:     BTreeMap<CustomerId, SegmentLabel>,
    config:     SegmentationConfig,
}

impl CustomerSegmentation {
    pub fn run(store: &TransactionStore, config: &SegmentationConfig) -> InsightResult<Self> {
        config.validate()?;
        let features = build_feature_vectors(store, &config.clock());
        let thresholds = compute_thresholds(
            &features,
            config.high_percentile,
            config.medium_percentile,
            config.recency_multiplier,
        )?;
        let clusters = cluster_with(&features, config)?;
        let labels = features
            .iter()
            .map(|v| (v.customer_id.clone(), label_segment(v, &thresholds)))
            .collect();

        Ok(Self {
            features,
            thresholds,
            clusters,
            labels,
            config: config.clone(),
        })
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn thresholds(&self) -> &SegmentationThresholds {
        &self.thresholds
    }

    pub fn cluster_assignments(&self) -> &BTreeMap<CustomerId, ClusterId> {
        &self.clusters.assignments
    }

    pub fn segment_of(&self, customer_id: &str) -> Option<SegmentLabel> {
        self.labels.get(customer_id).copied()
    }

    pub fn get_customer_segment(&self, customer_id: &str) -> CustomerLookup<CustomerSegmentDetail> {
        let (Some(v), Some(segment), Some(cluster_id)) = (
            self.features.get(customer_id),
            self.labels.get(customer_id),
            self.clusters.assignments.get(customer_id),
        ) else {
            return CustomerLookup::not_found(customer_id);
        };
        CustomerLookup::Found(CustomerSegmentDetail {
            customer_id: customer_id.to_string(),
            segment:     *segment,
            cluster_id:  *cluster_id,
            metrics:     v.into(),
            thresholds:  self.thresholds,
        })
    }

    pub fn report(&self) -> SegmentationReport {
        let customers: Vec<CustomerSegment> = self
            .features
            .iter()
            .filter_map(|v| {
                Some(CustomerSegment {
                    customer_id: v.customer_id.clone(),
                    cluster_id:  *self.clusters.assignments.get(&v.customer_id)?,
                    segment:     *self.labels.get(&v.customer_id)?,
                    metrics:     v.into(),
                })
            })
            .collect();

        let segments = segment_stats(&customers);
        SegmentationReport {
            summary: SegmentationSummary {
                total_customers:    customers.len(),
                number_of_segments: segments.len(),
                cluster_count:      self.config.cluster_count,
                analysis_date:      Local::now().to_rfc3339(),
                reference_date:     self.features.reference_date,
                thresholds:         self.thresholds,
            },
            segments,
            customers,
        }
    }
}

/// Per-segment averages, in decision-list order, skipping empty segments.
fn segment_stats(customers: &[CustomerSegment]) -> Vec<SegmentStats> {
    SegmentLabel::ALL
        .iter()
        .filter_map(|label| {
            let members: Vec<&CustomerMetrics> = customers
                .iter()
                .filter(|c| c.segment == *label)
                .map(|c| &c.metrics)
                .collect();
            if members.is_empty() {
                return None;
            }
            let n = members.len() as f64;
            let avg = |f: fn(&CustomerMetrics) -> f64| members.iter().map(|m| f(m)).sum::<f64>() / n;
            Some(SegmentStats {
                segment_name:            *label,
                customer_count:          members.len(),
                avg_spending:            avg(|m| m.total_spending),
                avg_frequency:           avg(|m| m.purchase_frequency as f64),
                avg_order_value:         avg(|m| m.average_order_value),
                avg_days_since_purchase: avg(|m| m.days_since_last_purchase as f64),
            })
        })
        .collect()
}

/// Run the whole segmentation pipeline with explicit knobs and default
/// seed, iteration limits and wall-clock reference date.
pub fn run_segmentation(
    store: &TransactionStore,
    k: usize,
    high_pct: f64,
    medium_pct: f64,
    recency_mult: f64,
) -> InsightResult<SegmentationReport> {
    let config = SegmentationConfig {
        cluster_count: k,
        high_percentile: high_pct,
        medium_percentile: medium_pct,
        recency_multiplier: recency_mult,
        ..SegmentationConfig::default()
    };
    Ok(CustomerSegmentation::run(store, &config)?.report())
}
