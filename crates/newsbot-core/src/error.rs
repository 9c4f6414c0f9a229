use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Feed fetch error: {0}")]
    FeedFetch(String),

    #[error("Content extraction error: {0}")]
    Extract(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Source not found: {0}")]
    SourceNotFound(i64),

    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// True when the error is the shutdown outcome rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
