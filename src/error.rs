use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No catalog ID in product URL: {url}")]
    InvalidProductUrl { url: String },

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Product not found: {id}")]
    ProductNotFound { id: i64 },
}

impl TrackerError {
    /// Fetch failures are recoverable at the per-product level; the
    /// monitoring pass logs them and moves on to the next product.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::Fetch { .. } | TrackerError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
