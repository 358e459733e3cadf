use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskerError {
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("E-mail already registered")]
    DuplicateEmail,

    #[error("Token error: {message}")]
    Token { message: String },

    #[error("Hashing error: {message}")]
    Hash { message: String },

    #[error("Mail error: {message}")]
    Mail { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl TaskerError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskerError>;
