use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored rate whose type or numeric fields cannot be interpreted.
    #[error("Invalid rate record: {0}")]
    InvalidRate(String),

    #[error("Malformed rate row: {0}")]
    Decode(String),

    #[error("Rate store not available: {0}")]
    Unavailable(String),
}
