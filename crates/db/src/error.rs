use hackpsu_core::error::CoreError;

use crate::store::StoreError;

/// Error type returned by every data mapper operation.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Validation failures, unsupported operations and classified store
    /// errors.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A store failure outside the known error-code table, passed through
    /// unchanged.
    #[error(transparent)]
    Store(StoreError),

    /// A row did not match the entity shape.
    #[error("Failed to decode row: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DbError {
    /// HTTP-class status a caller should report.
    pub fn status(&self) -> u16 {
        match self {
            DbError::Core(core) => core.status(),
            DbError::Store(_) | DbError::Decode(_) => 500,
        }
    }
}
