use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("Transaction store is empty")]
    EmptyStore,

    #[error("At least 2 customers are required for threshold statistics, found {found}")]
    InsufficientCustomers { found: usize },

    #[error("Cannot form {requested} clusters from {customers} customers")]
    InvalidClusterCount { requested: usize, customers: usize },

    #[error("Factor count {requested} exceeds the largest feasible rank {max}")]
    InvalidFactorCount { requested: usize, max: usize },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type InsightResult<T> = Result<T, InsightError>;
