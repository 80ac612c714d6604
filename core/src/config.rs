use crate::{
    clock::ReferenceClock,
    error::{InsightError, InsightResult},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Segmentation ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub cluster_count:      usize,
    pub high_percentile:    f64,
    pub medium_percentile:  f64,
    pub recency_multiplier: f64,
    pub seed:               u64,
    pub max_iterations:     usize,
    pub tolerance:          f64,
    /// Independent k-means++ starts; the lowest-inertia fit wins.
    pub restarts:           usize,
    /// Pin the recency reference date. None reads today's date at run time.
    pub reference_date:     Option<NaiveDate>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            cluster_count:      5,
            high_percentile:    0.75,
            medium_percentile:  0.50,
            recency_multiplier: 1.0,
            seed:               42,
            max_iterations:     300,
            tolerance:          1e-4,
            restarts:           10,
            reference_date:     None,
        }
    }
}

impl SegmentationConfig {
    pub fn clock(&self) -> ReferenceClock {
        ReferenceClock::from_option(self.reference_date)
    }

    pub fn validate(&self) -> InsightResult<()> {
        check_fraction("high_percentile", self.high_percentile)?;
        check_fraction("medium_percentile", self.medium_percentile)?;
        if self.high_percentile < self.medium_percentile {
            return Err(InsightError::InvalidParameter {
                name:   "high_percentile",
                reason: format!(
                    "{} is below medium_percentile {}",
                    self.high_percentile, self.medium_percentile
                ),
            });
        }
        if !self.recency_multiplier.is_finite() {
            return Err(InsightError::InvalidParameter {
                name:   "recency_multiplier",
                reason: "must be finite".into(),
            });
        }
        if self.cluster_count == 0 {
            return Err(InsightError::InvalidParameter {
                name:   "cluster_count",
                reason: "must be at least 1".into(),
            });
        }
        if self.restarts == 0 || self.max_iterations == 0 {
            return Err(InsightError::InvalidParameter {
                name:   "restarts",
                reason: "restarts and max_iterations must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn check_fraction(name: &'static str, value: f64) -> InsightResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(InsightError::InvalidParameter {
            name,
            reason: format!("{value} is outside [0, 1]"),
        });
    }
    Ok(())
}

// ── Recommendation ─────────────────────────────────────────────────

/// What to do when the requested factor count does not fit the matrix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FactorOverflow {
    /// Reject the run with `InvalidFactorCount`.
    Fail,
    /// Reduce to `min(customers, products) - 1`.
    Clamp,
}

/// Which (customer, product) cells count as never purchased.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnpurchasedRule {
    /// Cell total equals exactly 0. A $0 purchase looks unpurchased.
    ZeroAmount,
    /// No transaction exists for the pair, whatever its amount.
    NoRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub factor_count:     usize,
    pub default_count:    usize,
    pub factor_overflow:  FactorOverflow,
    pub unpurchased_rule: UnpurchasedRule,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            factor_count:     10,
            default_count:    5,
            factor_overflow:  FactorOverflow::Fail,
            unpurchased_rule: UnpurchasedRule::ZeroAmount,
        }
    }
}

impl RecommendationConfig {
    pub fn validate(&self) -> InsightResult<()> {
        if self.factor_count == 0 {
            return Err(InsightError::InvalidParameter {
                name:   "factor_count",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

// ── Synthetic dataset ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRange {
    pub category:   String,
    pub min_amount: f64,
    pub max_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub seed:          u64,
    pub customers:     usize,
    pub products:      usize,
    pub records:       usize,
    pub start_date:    NaiveDate,
    pub end_date:      NaiveDate,
    pub categories:    Vec<CategoryRange>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        let ranges: [(&str, f64, f64); 9] = [
            ("Electronics", 100.0, 1000.0),
            ("Furniture",    50.0,  500.0),
            ("Clothing",     10.0,  200.0),
            ("Books",         5.0,   50.0),
            ("Grocery",       1.0,  100.0),
            ("Beauty",       10.0,  100.0),
            ("Kitchen",      20.0,  300.0),
            ("Sports",       20.0,  500.0),
            ("Appliances",   50.0, 2000.0),
        ];
        Self {
            seed:       42,
            customers:  500,
            products:   50,
            records:    5000,
            start_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap_or_default(),
            end_date:   NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            categories: ranges
                .iter()
                .map(|(c, lo, hi)| CategoryRange {
                    category:   (*c).into(),
                    min_amount: *lo,
                    max_amount: *hi,
                })
                .collect(),
        }
    }
}

impl DatasetConfig {
    pub fn validate(&self) -> InsightResult<()> {
        if self.customers == 0 || self.products == 0 || self.categories.is_empty() {
            return Err(InsightError::InvalidParameter {
                name:   "dataset",
                reason: "customers, products and categories must be non-empty".into(),
            });
        }
        if self.end_date < self.start_date {
            return Err(InsightError::InvalidParameter {
                name:   "end_date",
                reason: format!("{} precedes start_date {}", self.end_date, self.start_date),
            });
        }
        if let Some(bad) = self.categories.iter().find(|c| {
            !(c.min_amount >= 0.0 && c.max_amount >= c.min_amount)
        }) {
            return Err(InsightError::InvalidParameter {
                name:   "categories",
                reason: format!("bad amount range for {}", bad.category),
            });
        }
        Ok(())
    }
}

// ── Root ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    pub segmentation:   SegmentationConfig,
    pub recommendation: RecommendationConfig,
    pub dataset:        DatasetConfig,
}

impl InsightConfig {
    /// Load from a JSON file. Missing sections and fields take defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: InsightConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> InsightResult<()> {
        self.segmentation.validate()?;
        self.recommendation.validate()?;
        self.dataset.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = InsightConfig::default();
        assert_eq!(c.segmentation.cluster_count, 5);
        assert_eq!(c.segmentation.high_percentile, 0.75);
        assert_eq!(c.segmentation.medium_percentile, 0.50);
        assert_eq!(c.segmentation.recency_multiplier, 1.0);
        assert_eq!(c.recommendation.factor_count, 10);
        assert_eq!(c.recommendation.factor_overflow, FactorOverflow::Fail);
        assert_eq!(c.recommendation.unpurchased_rule, UnpurchasedRule::ZeroAmount);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: InsightConfig = serde_json::from_str(
            r#"{ "segmentation": { "cluster_count": 3, "reference_date": "2025-01-15" } }"#,
        )
        .unwrap();
        assert_eq!(c.segmentation.cluster_count, 3);
        assert_eq!(c.segmentation.high_percentile, 0.75);
        assert_eq!(
            c.segmentation.reference_date,
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(c.recommendation.factor_count, 10);
    }

    #[test]
    fn inverted_percentiles_rejected() {
        let c = SegmentationConfig {
            high_percentile: 0.4,
            medium_percentile: 0.6,
            ..Default::default()
        };
        assert!(matches!(
            c.validate(),
            Err(InsightError::InvalidParameter { name: "high_percentile", .. })
        ));
    }
}
