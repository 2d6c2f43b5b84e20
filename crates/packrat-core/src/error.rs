use thiserror::Error;

pub type Result<T> = std::result::Result<T, PackratError>;

#[derive(Debug, Error)]
pub enum PackratError {
    #[error("failed to copy files from '{source_name}': {message}")]
    Retrieval { source_name: String, message: String },

    #[error("archive build failed: {0}")]
    Archive(String),

    #[error("staging cleanup failed: {0}")]
    Cleanup(String),

    #[error("malformed archive filename '{name}': {reason}")]
    RetentionParse { name: String, reason: String },

    #[error("email delivery failed: {0}")]
    Delivery(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
