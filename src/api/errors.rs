use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend answered with `success: false`.
    #[error("{message}")]
    Rejected { message: String },

    #[error("Response missing data: {message}")]
    MissingData { message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Whether a manual retry by the user could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}
