use thiserror::Error;

/// Errors raised by the perception map pipeline.
///
/// Every variant is terminal for the current run; nothing is recovered internally.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The active filters left no rows.
    #[error("no data matches the selected filters ({filters})")]
    EmptyFilterResult {
        /// Human readable summary of the active filters.
        filters: String,
    },

    /// No numeric column is left to embed.
    #[error("no numeric rating columns found in the data")]
    InsufficientFeatures,

    /// No row is left to embed.
    #[error("no rows left to analyse")]
    InsufficientRows,

    /// The embedding engine refused its input.
    #[error("cannot build the perception map: {reason}")]
    Embedding {
        /// What was wrong with the feature matrix.
        reason: String,
    },

    /// More clusters were requested than there are brands.
    #[error("requested {requested} groups but only {available} brands are available; lower the number of groups")]
    ClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of embedded points.
        available: usize,
    },

    /// A parameter is outside its allowed range.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: String,
    },

    /// A dataset was built from rows that do not fit its columns.
    #[error("malformed dataset: {0}")]
    Schema(String),
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
