//! Reference clock: owns the "now" that recency is measured against.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", content = "date", rename_all = "snake_case")]
pub enum ReferenceClock {
    /// Today's local date, read when the pipeline runs.
    Wall,
    /// A pinned date, for reproducible runs.
    Fixed(NaiveDate),
}

impl ReferenceClock {
    pub fn from_option(date: Option<NaiveDate>) -> Self {
        match date {
            Some(d) => Self::Fixed(d),
            None    => Self::Wall,
        }
    }

    pub fn today(&self) -> NaiveDate {
        match self {
            Self::Wall     => Local::now().date_naive(),
            Self::Fixed(d) => *d,
        }
    }

    /// Whole days from `date` to the reference date.
    pub fn days_since(&self, date: NaiveDate) -> i64 {
        (self.today() - date).num_days()
    }
}

impl Default for ReferenceClock {
    fn default() -> Self {
        Self::Wall
    }
}
