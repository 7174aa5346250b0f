use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserbotError>;

#[derive(Debug, Error)]
pub enum BrowserbotError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The sidecar's logged-in browser session is no longer valid. Needs a
    /// manual re-login before any more page/channel creation can succeed.
    #[error("Browser session expired: {0}")]
    SessionExpired(String),

    /// The automation script could not find an expected page element. Usually
    /// means the platform shipped a UI change and the script needs updating.
    #[error("Page control not found: {0}")]
    ControlNotFound(String),
}

impl From<reqwest::Error> for BrowserbotError {
    fn from(err: reqwest::Error) -> Self {
        BrowserbotError::Network(err.to_string())
    }
}
