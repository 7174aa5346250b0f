//! Terminal callback delivery.

use async_trait::async_trait;
use socialforge_common::JobSummary;
use std::time::Duration;

/// Delivers the terminal job summary to the CMS. The store's callback claim
/// guarantees at most one delivery attempt per terminal run; delivery itself
/// is best-effort and failures are logged, not retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, url: &str, summary: &JobSummary);
}

pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, url: &str, summary: &JobSummary) {
        match self.client.post(url).json(summary).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(job_id = %summary.job_id, url, "Delivered terminal callback");
            }
            Ok(resp) => {
                tracing::warn!(
                    job_id = %summary.job_id,
                    url,
                    status = resp.status().as_u16(),
                    "Terminal callback rejected"
                );
            }
            Err(e) => {
                tracing::warn!(job_id = %summary.job_id, url, error = %e, "Terminal callback failed");
            }
        }
    }
}
