/**
* filename : error
* author : HAMA
* date: 2025. 6. 2.
* description:
**/

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Telegram error: {0}")]
    TelegramError(String),

    #[error("Chart error: {0}")]
    ChartError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}
