use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Narrative error: {0}")]
    Narrative(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
