use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch for {key} version {version}")]
    ChecksumMismatch { key: String, version: String },

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
