// Errors shared across the crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The object store rejected or failed a request.
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// A record could not be serialized or deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
