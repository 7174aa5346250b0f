pub mod error;
pub mod types;

pub use error::{GeelarkError, Result};
pub use types::{ApiResponse, LaunchPhoneInput, PhoneInfo, StartTaskInput, TaskData};

use std::time::Duration;

const BASE_URL: &str = "https://api.geelark.com";

/// Client for the GeeLark cloud-phone API. Covers phone lifecycle plus
/// automation-marketplace tasks (account signup flows, warmup templates).
pub struct GeelarkClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GeelarkClient {
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, BASE_URL)
    }

    /// Point the client at a different host. Used by tests against a stub server.
    pub fn with_base_url(token: String, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Create and launch a new cloud phone. Returns immediately with phone
    /// metadata; the phone boots in the background.
    pub async fn create_phone(
        &self,
        name: &str,
        proxy_url: &str,
        android_version: &str,
    ) -> Result<PhoneInfo> {
        let input = LaunchPhoneInput {
            name: name.to_string(),
            os: android_version.to_string(),
            proxy: proxy_url.to_string(),
        };

        let url = format!("{}/devices/launch", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeelarkError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<PhoneInfo> = resp.json().await?;
        Ok(api_resp.data)
    }

    pub async fn get_phone(&self, phone_id: &str) -> Result<PhoneInfo> {
        let url = format!("{}/devices/{}", self.base_url, phone_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeelarkError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<PhoneInfo> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Poll until the phone reports a running state. Boot usually takes well
    /// under two minutes; callers pick the deadline.
    pub async fn wait_until_running(&self, phone_id: &str, max_wait: Duration) -> Result<PhoneInfo> {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            match self.get_phone(phone_id).await {
                Ok(info) if info.is_running() => return Ok(info),
                Ok(info) => {
                    tracing::debug!(phone_id, status = %info.status, "Phone still booting");
                }
                Err(e) => {
                    tracing::warn!(phone_id, error = %e, "Phone status poll failed");
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(GeelarkError::PhoneNotReady(phone_id.to_string()));
            }
        }
    }

    /// Install an app on the phone by package name, e.g. "com.instagram.android".
    pub async fn install_app(&self, phone_id: &str, package: &str) -> Result<()> {
        let url = format!("{}/devices/{}/install", self.base_url, phone_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "package": package }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeelarkError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    /// Start an automation-marketplace template on a phone. Returns immediately
    /// with task metadata.
    pub async fn start_task(
        &self,
        device_id: &str,
        template_id: &str,
        params: serde_json::Value,
    ) -> Result<TaskData> {
        let input = StartTaskInput {
            device_id: device_id.to_string(),
            template_id: template_id.to_string(),
            params,
        };

        let url = format!("{}/tasks", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeelarkError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<TaskData> = resp.json().await?;
        Ok(api_resp.data)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<TaskData> {
        let url = format!("{}/tasks/{}", self.base_url, task_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeelarkError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<TaskData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Push a named input into a running task. Signup templates pause in
    /// "waiting_input" until the verification code arrives this way.
    pub async fn push_task_input(&self, task_id: &str, name: &str, value: &str) -> Result<()> {
        let url = format!("{}/tasks/{}/input", self.base_url, task_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "name": name, "value": value }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeelarkError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    /// Poll until a task finishes. Completed tasks come back with their output;
    /// failed or cancelled tasks become an error.
    pub async fn wait_for_task(&self, task_id: &str, max_wait: Duration) -> Result<TaskData> {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            let task = self.get_task(task_id).await?;
            if task.status == "completed" {
                return Ok(task);
            }
            if task.is_finished() {
                return Err(GeelarkError::TaskFailed(
                    task.error.unwrap_or(task.status),
                ));
            }
            tracing::debug!(task_id, status = %task.status, "Task still in progress");
            if tokio::time::Instant::now() >= deadline {
                return Err(GeelarkError::TaskFailed(format!(
                    "task {task_id} still {} at deadline",
                    task.status
                )));
            }
        }
    }

    /// Kick off a warmup template on the phone. Fire-and-forget: the template
    /// runs for days and nothing downstream waits on it.
    pub async fn trigger_warmup(&self, device_id: &str, template_id: &str) -> Result<TaskData> {
        tracing::info!(device_id, template_id, "Triggering warmup template");
        self.start_task(device_id, template_id, serde_json::Value::Null)
            .await
    }

    pub async fn stop_phone(&self, phone_id: &str) -> Result<()> {
        let url = format!("{}/devices/{}/stop", self.base_url, phone_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeelarkError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_running_states() {
        let mut info = PhoneInfo {
            id: "p1".into(),
            status: "starting".into(),
            name: None,
            adb_host: None,
            adb_port: None,
        };
        assert!(!info.is_running());
        info.status = "running".into();
        assert!(info.is_running());
        info.status = "online".into();
        assert!(info.is_running());
    }

    #[test]
    fn task_state_predicates() {
        let task = |status: &str| TaskData {
            id: "t1".into(),
            status: status.into(),
            output: None,
            error: None,
        };
        assert!(task("completed").is_finished());
        assert!(task("failed").is_finished());
        assert!(!task("running").is_finished());
        assert!(task("waiting_input").wants_input());
        assert!(!task("waiting_input").is_finished());
    }
}
