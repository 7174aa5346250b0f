use thiserror::Error;

pub type Result<T> = std::result::Result<T, OtpError>;

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Vendor error: {0}")]
    Vendor(String),

    #[error("No verification code received before the deadline")]
    CodeTimeout,

    #[error("Unknown OTP provider: {0}")]
    UnknownProvider(String),
}

impl From<reqwest::Error> for OtpError {
    fn from(err: reqwest::Error) -> Self {
        OtpError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for OtpError {
    fn from(err: serde_json::Error) -> Self {
        OtpError::Parse(err.to_string())
    }
}
