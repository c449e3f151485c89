use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedError>;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Invalid query signature: {0}")]
    InvalidSignature(String),

    #[error("Store error: {0}")]
    Store(#[from] kalem_store::StoreError),

    #[error("Model error: {0}")]
    Model(#[from] kalem_model::ModelError),
}

impl FeedError {
    /// Whether the caller may retry the same operation. Store failures are
    /// transient; a bad signature or a malformed row will not fix itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FeedError::Store(_))
    }
}
