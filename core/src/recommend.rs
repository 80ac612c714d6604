//! Recommendation Ranker.
//!
//! For one customer: keep never-purchased products, rank by predicted
//! affinity (descending, ties by product id ascending), return the top N
//! with each product's first-seen category.

use crate::{
    config::{RecommendationConfig, UnpurchasedRule},
    error::InsightResult,
    matrix::{build_purchase_matrix, PurchaseMatrix},
    predictor::{fit_predictor_with, PredictedAffinityMatrix},
    store::TransactionStore,
    types::{CustomerId, CustomerLookup, ProductId},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product_id:      ProductId,
    pub category:        String,
    pub predicted_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationList {
    pub customer_id:     CustomerId,
    pub recommendations: Vec<Recommendation>,
}

/// Purchase matrix, fitted predictions and the category catalog for one run.
pub struct RecommendationEngine {
    matrix:      PurchaseMatrix,
    predictions: PredictedAffinityMatrix,
    categories:  HashMap<ProductId, String>,
    rule:        UnpurchasedRule,
}

impl RecommendationEngine {
    pub fn fit(store: &TransactionStore, config: &RecommendationConfig) -> InsightResult<Self> {
        config.validate()?;
        let matrix = build_purchase_matrix(store);
        let predictions = fit_predictor_with(&matrix, config)?;
        let categories = matrix
            .products()
            .iter()
            .filter_map(|p| Some((p.clone(), store.product_category(p)?.to_string())))
            .collect();
        Ok(Self {
            matrix,
            predictions,
            categories,
            rule: config.unpurchased_rule,
        })
    }

    pub fn matrix(&self) -> &PurchaseMatrix {
        &self.matrix
    }

    pub fn predictions(&self) -> &PredictedAffinityMatrix {
        &self.predictions
    }

    fn unpurchased(&self, row: usize, col: usize) -> bool {
        match self.rule {
            UnpurchasedRule::ZeroAmount => self.matrix.values()[[row, col]] == 0.0,
            UnpurchasedRule::NoRecord   => !self.matrix.has_record(row, col),
        }
    }

    pub fn recommend(&self, customer_id: &str, n: usize) -> CustomerLookup<RecommendationList> {
        let Some(row) = self.matrix.customer_row(customer_id) else {
            log::debug!("recommend: customer {customer_id} not in purchase matrix");
            return CustomerLookup::not_found(customer_id);
        };

        let mut candidates: Vec<(usize, f64)> = (0..self.matrix.products().len())
            .filter(|&col| self.unpurchased(row, col))
            .map(|col| (col, self.predictions.score(row, col)))
            .collect();

        let products = self.matrix.products();
        candidates.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| products[a.0].cmp(&products[b.0]))
        });

        let recommendations = candidates
            .into_iter()
            .take(n)
            .map(|(col, score)| {
                let product_id = products[col].clone();
                Recommendation {
                    category: self.categories.get(&product_id).cloned().unwrap_or_default(),
                    product_id,
                    predicted_score: score,
                }
            })
            .collect();

        CustomerLookup::Found(RecommendationList {
            customer_id: customer_id.to_string(),
            recommendations,
        })
    }
}
