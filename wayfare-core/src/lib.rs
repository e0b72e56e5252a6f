pub mod identity;
pub mod verification;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Error type shared by all repository traits. Conflicts carry the violated
/// constraint name so callers can tell a duplicate reference from a duplicate
/// review.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflict on {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}
