//! Error types for grid query translation and collection access.

use thiserror::Error;

/// Result type alias for mongo-grid operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// The request's filter/sort/pagination payload could not be translated
    #[error("Query formation failed: {0}")]
    QueryFormation(#[from] QueryError),

    /// Inbound request payload did not match the grid request schema
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection to the document store failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation rejected or failed inside the document store
    #[error("Database error: {0}")]
    Database(String),

    /// BSON/JSON conversion error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure kinds raised while turning a grid request into pipeline stages.
///
/// These never leave the builder on their own; `build` wraps them in
/// [`Error::QueryFormation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Operator has no mapping for the given filter type
    #[error("given {filter_type} search is not supported: {operator}")]
    UnsupportedOperator {
        operator: String,
        filter_type: String,
    },

    /// `filterType` is not one of text, number, date or set
    #[error("Invalid filter type: {0}")]
    UnsupportedFilterType(String),

    /// Compound filter operator is neither AND nor OR
    #[error("Invalid operator: {0}")]
    InvalidLogicalOperator(String),

    /// Filter object carries neither `operator` nor `filterType`
    #[error("Filter for column '{0}' has no filterType or operator")]
    MissingDiscriminator(String),

    /// A field required by the filter shape is absent
    #[error("Filter for column '{column}' is missing '{field}'")]
    MissingField { column: String, field: String },

    /// A field is present but has the wrong shape
    #[error("Filter for column '{column}' is invalid: {reason}")]
    InvalidValue { column: String, reason: String },

    /// Filter value could not be represented as BSON
    #[error("Conversion error: {0}")]
    Conversion(String),
}

impl Error {
    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ConnectionFailed(_) | Error::Io(_))
    }
}
