use thiserror::Error;

#[derive(Error, Debug)]
pub enum BiError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("API Error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed API response: {0}")]
    Response(String),

    #[error("Table error: {0}")]
    Table(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for BiError {
    fn from(e: polars::error::PolarsError) -> Self {
        BiError::Table(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BiError>;
