//! Segment Labeler: a first-match decision list over raw metrics.
//!
//! Rule order is fixed. All comparisons are strict: a value equal to a
//! threshold falls through to the next rule.

use crate::{features::CustomerFeatureVector, thresholds::SegmentationThresholds};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SegmentLabel {
    #[serde(rename = "Inactive Customers")]
    InactiveCustomers,
    #[serde(rename = "High-Value Frequent Buyers")]
    HighValueFrequentBuyers,
    #[serde(rename = "Big Spenders")]
    BigSpenders,
    #[serde(rename = "Frequent Low-Value Buyers")]
    FrequentLowValueBuyers,
    #[serde(rename = "Regular Customers")]
    RegularCustomers,
    #[serde(rename = "Occasional Buyers")]
    OccasionalBuyers,
}

impl SegmentLabel {
    /// Every label, in decision-list order.
    pub const ALL: [SegmentLabel; 6] = [
        Self::InactiveCustomers,
        Self::HighValueFrequentBuyers,
        Self::BigSpenders,
        Self::FrequentLowValueBuyers,
        Self::RegularCustomers,
        Self::OccasionalBuyers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::InactiveCustomers       => "Inactive Customers",
            Self::HighValueFrequentBuyers => "High-Value Frequent Buyers",
            Self::BigSpenders             => "Big Spenders",
            Self::FrequentLowValueBuyers  => "Frequent Low-Value Buyers",
            Self::RegularCustomers        => "Regular Customers",
            Self::OccasionalBuyers        => "Occasional Buyers",
        }
    }
}

impl fmt::Display for SegmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn label_segment(v: &CustomerFeatureVector, t: &SegmentationThresholds) -> SegmentLabel {
    let spend = v.total_spending;
    let freq = v.purchase_frequency as f64;
    let days = v.days_since_last_purchase as f64;

    if days > t.recency_cutoff {
        SegmentLabel::InactiveCustomers
    } else if spend > t.spending_high && freq > t.frequency_high {
        SegmentLabel::HighValueFrequentBuyers
    } else if spend > t.spending_high {
        SegmentLabel::BigSpenders
    } else if freq > t.frequency_high {
        SegmentLabel::FrequentLowValueBuyers
    } else if spend > t.spending_medium && freq > t.frequency_medium {
        SegmentLabel::RegularCustomers
    } else {
        SegmentLabel::OccasionalBuyers
    }
}
