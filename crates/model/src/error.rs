use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid {collection} row: {source}")]
    InvalidRow {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
}
