use thiserror::Error;

/// Errors surfaced by the catalog store.
///
/// Nothing is masked: every operation reports failure as one of these
/// variants instead of logging and handing back an empty result.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be reached or a statement failed.
    #[error("database error: {0}")]
    Connection(#[from] rusqlite::Error),

    /// The store file or its directory could not be created.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document did not match the expected shape.
    #[error("malformed document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// A referenced entity does not exist.
    #[error("{collection} {id} not found")]
    NotFound {
        collection: &'static str,
        id: i64,
    },

    /// Input was rejected before it reached the store.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Result type alias using the store error.
pub type Result<T> = std::result::Result<T, StoreError>;
