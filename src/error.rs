// error.rs - Error types for configuration and store access

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got `{value}`")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A required relation came back empty while hydrating an include
    #[error("Inconsistent query result: Field {field} is required to return data, got `null` instead.")]
    InconsistentResult { field: &'static str },
}

impl StoreError {
    pub fn inconsistent_result(field: &'static str) -> Self {
        StoreError::InconsistentResult { field }
    }
}
