use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeelarkError>;

#[derive(Debug, Error)]
pub enum GeelarkError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Phone {0} did not reach running state in time")]
    PhoneNotReady(String),

    #[error("Automation task failed with status: {0}")]
    TaskFailed(String),
}

impl From<reqwest::Error> for GeelarkError {
    fn from(err: reqwest::Error) -> Self {
        GeelarkError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for GeelarkError {
    fn from(err: serde_json::Error) -> Self {
        GeelarkError::Parse(err.to_string())
    }
}
