use thiserror::Error;

/// Errors surfaced by the recorder and the reporting queries
#[derive(Debug, Error)]
pub enum StatsError {
    /// A caller-supplied argument was rejected before any query ran
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The backing store was unavailable or rejected the operation
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type StatsResult<T> = Result<T, StatsError>;
