use socialforge_common::{Platform, PlatformState};

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A job already exists for external key: {0}")]
    Conflict(String),

    #[error("No job found: {0}")]
    NotFound(String),

    /// The requested sub-status change would move backwards or skip a state.
    /// The row is left untouched.
    #[error("Illegal {platform} transition from {from} to {to} for job {job_id}")]
    IllegalTransition {
        job_id: String,
        platform: Platform,
        from: PlatformState,
        to: PlatformState,
    },

    #[error("Corrupt row: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
