use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Session serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
