//! Client for the browser-automation sidecar that drives logged-in Facebook
//! and YouTube sessions. Page and channel creation cannot go through official
//! APIs (Facebook requires an approved Business app; YouTube channel creation
//! has no API at all), so a headless browser holding real sessions does it.

pub mod error;

pub use error::{BrowserbotError, Result};

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct CreatePageInput {
    pub display_name: String,
    pub username: String,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPage {
    pub page_id: String,
    pub page_url: String,
    pub page_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateChannelInput {
    pub channel_name: String,
    pub handle: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedChannel {
    pub channel_id: String,
    pub channel_url: String,
    pub handle: Option<String>,
}

/// Error body the sidecar returns on automation failures.
#[derive(Debug, Deserialize)]
struct SidecarError {
    kind: Option<String>,
    error: Option<String>,
}

pub struct BrowserbotClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserbotClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        // Browser automation runs for minutes, not seconds.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    /// Create a Facebook Page through the sidecar's logged-in session.
    pub async fn create_facebook_page(&self, input: &CreatePageInput) -> Result<CreatedPage> {
        tracing::info!(username = %input.username, "Creating Facebook page via sidecar");
        self.post("/facebook/page", input).await
    }

    /// Create a YouTube channel through the sidecar's logged-in session.
    pub async fn create_youtube_channel(
        &self,
        input: &CreateChannelInput,
    ) -> Result<CreatedChannel> {
        tracing::info!(handle = %input.handle, "Creating YouTube channel via sidecar");
        self.post("/youtube/channel", input).await
    }

    async fn post<I, O>(&self, path: &str, input: &I) -> Result<O>
    where
        I: Serialize,
        O: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(input);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), body));
        }

        Ok(resp.json().await?)
    }
}

/// Map a sidecar error body to a typed failure where the kind is recognized.
fn classify_failure(status: u16, body: String) -> BrowserbotError {
    if let Ok(parsed) = serde_json::from_str::<SidecarError>(&body) {
        let message = parsed.error.unwrap_or_else(|| body.clone());
        match parsed.kind.as_deref() {
            Some("session_expired") => return BrowserbotError::SessionExpired(message),
            Some("control_not_found") => return BrowserbotError::ControlNotFound(message),
            _ => {}
        }
    }
    BrowserbotError::Api {
        status,
        message: body,
    }
}
