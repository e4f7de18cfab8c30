//! Error types for benchview

use thiserror::Error;

/// Result type alias for benchview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for benchview
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] benchview_core::Error),

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Server returned {status} for {url}")]
    ServerError { status: u16, url: String },

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),
}
