use thiserror::Error;
use url::ParseError;

pub mod config;
pub mod telemetry;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Please log in first")]
    NotAuthenticated,

    #[error("Transport error: {0}")]
    Transport(#[from] rquest::Error),

    #[error("Graph API call failed: {status} {status_text}")]
    RemoteApi { status: u16, status_text: String },

    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(String),

    #[error("No data available to report")]
    NothingToReport,

    #[error("Please provide a recipient email address")]
    InvalidRecipient,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::InvalidInput(format!("URL parse error: {}", err))
    }
}
