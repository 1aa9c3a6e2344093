use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The ledger key has not been created yet (scope not activated or
    /// partially configured). Accountants treat this as "nothing to do".
    #[error("Ledger not initialized: {scope}.{key}")]
    LedgerNotInitialized { scope: String, key: String },

    #[error("Ledger type mismatch at {scope}.{key}: expected {expected}")]
    TypeMismatch {
        scope: String,
        key: String,
        expected: &'static str,
    },

    #[error("Value {value} for {field} is out of range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub(crate) fn not_initialized(scope: &str, key: &str) -> Self {
        AppError::LedgerNotInitialized {
            scope: scope.to_string(),
            key: key.to_string(),
        }
    }

    /// Whether this error only reports a missing ledger key
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, AppError::LedgerNotInitialized { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
