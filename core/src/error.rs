use crate::types::{AssessmentScore, Cohort, SportCategory};
use thiserror::Error;

/// Problems with the generator configuration. Always fatal, always raised
/// before any generation stage runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Correlation matrix is not square: {rows} rows, row {row} has {len} columns")]
    NotSquare { rows: usize, row: usize, len: usize },

    #[error("Correlation matrix is not symmetric at ({row}, {col})")]
    NotSymmetric { row: usize, col: usize },

    #[error("Correlation matrix diagonal at {index} is {value}, expected 1.0")]
    NonUnitDiagonal { index: usize, value: f64 },

    #[error("Covariance matrix is not positive-definite (pivot {pivot})")]
    NotPositiveDefinite { pivot: usize },

    #[error("{what}: expected length {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Distribution '{table}' sums to {total}, expected 1.0")]
    DistributionSum { table: &'static str, total: f64 },

    #[error("Table '{table}' has no entry for cohort {cohort}")]
    MissingCohort { table: &'static str, cohort: Cohort },

    #[error("Table '{table}' has no entry for category {category}")]
    MissingCategory {
        table: &'static str,
        category: SportCategory,
    },

    #[error("Invalid range for {what}: [{min}, {max}]")]
    InvalidRange { what: String, min: f64, max: f64 },

    #[error("Invalid value for {what}: {value}")]
    InvalidParameter { what: String, value: f64 },

    #[error("{what} cannot follow {factor}: it has no latent factor")]
    UnsupportedCoupling {
        what: String,
        factor: AssessmentScore,
    },
}

#[derive(Error, Debug)]
pub enum GenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot parse {file} line {line}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },
}

pub type GenResult<T> = Result<T, GenError>;
