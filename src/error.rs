use actix_web::http::StatusCode;
use actix_web::ResponseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CspError {
    #[error("Invalid directive value: {0}")]
    InvalidDirectiveValue(String),

    #[error("Invalid directive name: {0}")]
    InvalidDirectiveName(String),

    #[error("Invalid hash algorithm: {0}")]
    InvalidHashAlgorithm(String),

    #[error("Invalid report URI: {0}")]
    InvalidReportUri(String),

    #[error("Render context for route '{0}' carries no nonce")]
    MissingNonce(String),

    #[error("Crypto error: {0}")]
    CryptoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Header processing error: {0}")]
    HeaderError(String),

    #[error("Response body error: {0}")]
    BodyError(String),

    #[error("Policy validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ResponseError for CspError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidDirectiveValue(_)
            | Self::InvalidDirectiveName(_)
            | Self::InvalidHashAlgorithm(_)
            | Self::InvalidReportUri(_)
            | Self::ValidationError(_)
            | Self::ConfigError(_) => StatusCode::BAD_REQUEST,

            Self::MissingNonce(_)
            | Self::CryptoError(_)
            | Self::SerializationError(_)
            | Self::HeaderError(_)
            | Self::BodyError(_)
            | Self::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
