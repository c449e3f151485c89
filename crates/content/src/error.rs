use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContentError>;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Store error: {0}")]
    Store(#[from] kalem_store::StoreError),

    #[error("Model error: {0}")]
    Model(#[from] kalem_model::ModelError),

    #[error("No {collection} record with id '{id}'")]
    NotFound {
        collection: &'static str,
        id: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unrecognized video URL: {0}")]
    InvalidVideoUrl(String),
}
