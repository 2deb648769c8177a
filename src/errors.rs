use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProgressError {
    #[error("Curve evaluation error: {0}")]
    CurveEvaluation(String),

    #[error("Invalid curve parameters: {0}")]
    InvalidParameters(String),

    #[error("Point count must be at least 2, got {0}")]
    InvalidPointCount(usize),

    #[error("Subscriber {subscriber_id} is already subscribed to pool {pool_id}")]
    AlreadySubscribed { pool_id: String, subscriber_id: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Progress controller has been disposed")]
    ControllerDisposed,
}
