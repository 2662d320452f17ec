//! Error handling for the stock ledger
//!
//! Defines the fatal error taxonomy and the non-fatal load warnings, and
//! establishes a unified Result type using anyhow for context chaining.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Fatal errors raised while loading or configuring a reconciliation run
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Required columns are absent from a ledger or manifest header
    #[error("missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("unsupported file format: {0} (supported: .csv, .txt, .xlsx, .xls)")]
    UnsupportedFormat(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    pub fn schema<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LedgerError::Schema {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, LedgerError::Schema { .. })
    }
}

/// Anomalies that are reported but never halt computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadWarning {
    /// Movement kinds outside ENTRY/EXIT/TRANSFER; those rows feed no bucket
    NonStandardMovements { values: Vec<String> },
    /// Initial-lot products the manifest has no row for; their weights stay as recorded
    UnmatchedManifestProducts { products: Vec<String> },
    /// The aggregation produced no stock positions
    EmptyResult,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::NonStandardMovements { values } => {
                write!(f, "non-standard movement kinds found: {}", values.join(", "))
            }
            LoadWarning::UnmatchedManifestProducts { products } => {
                write!(f, "initial-lot products missing from manifest: {}", products.join(", "))
            }
            LoadWarning::EmptyResult => write!(f, "no stock positions to show"),
        }
    }
}

/// Result type alias for ledger operations
pub type Result<T> = anyhow::Result<T>;
