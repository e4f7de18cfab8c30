//! Error types for benchview-core (WASM-compatible)

use thiserror::Error;

/// Result type alias for benchview-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that work in both native and WASM environments
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to parse results table: {0}")]
    TableParseError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Invalid selection value for '{param}': {value}")]
    SelectionError { param: String, value: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
