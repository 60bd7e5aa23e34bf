use thiserror::Error;

#[derive(Error, Debug)]
pub enum GleanerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Sink rejected batch with status {status}: {body}")]
    SinkStatus { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl GleanerError {
    /// Configuration errors are fatal: the process refuses to start on them.
    pub fn is_config(&self) -> bool {
        matches!(self, GleanerError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, GleanerError>;
