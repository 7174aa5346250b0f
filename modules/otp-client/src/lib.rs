//! Virtual phone numbers for SMS verification codes.
//!
//! Two vendors behind one interface: SMS-Man (primary) and 5sim. Both follow
//! the same lease → poll → confirm/cancel lifecycle; `OtpClient` dispatches to
//! whichever the deployment configured.

pub mod error;

pub use error::{OtpError, Result};

use serde::Deserialize;
use std::time::Duration;

/// A leased virtual number. The lease must end in either `confirm` (code was
/// used) or `cancel` (give the number back), otherwise the vendor bills it.
#[derive(Debug, Clone)]
pub struct NumberLease {
    pub request_id: String,
    pub phone: String,
}

/// India on SMS-Man's country list.
const SMSMAN_COUNTRY_INDIA: u32 = 14;

// --- SMS-Man ---

const SMSMAN_BASE: &str = "https://api.sms-man.com/control";

#[derive(Debug, Deserialize)]
struct SmsManNumber {
    request_id: serde_json::Value,
    number: String,
}

#[derive(Debug, Deserialize)]
struct SmsManSms {
    sms_code: Option<serde_json::Value>,
    error_code: Option<String>,
    error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SmsManApplication {
    id: serde_json::Value,
    name: Option<String>,
}

pub struct SmsManClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SmsManClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, SMSMAN_BASE)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn get(&self, action: &str, params: &[(&str, String)]) -> Result<serde_json::Value> {
        let url = format!("{}/{}", self.base_url, action);
        let mut query: Vec<(&str, String)> = vec![("token", self.api_key.clone())];
        query.extend_from_slice(params);

        let resp = self.client.get(&url).query(&query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OtpError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp.json().await?)
    }

    /// Look up the application id for a service name ("instagram").
    async fn application_id(&self, service: &str) -> Result<String> {
        let apps: Vec<SmsManApplication> =
            serde_json::from_value(self.get("applications", &[]).await?)?;
        apps.into_iter()
            .find(|a| {
                a.name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(service))
            })
            .map(|a| a.id.to_string().trim_matches('"').to_string())
            .ok_or_else(|| OtpError::Vendor(format!("{service} not in SMS-Man application list")))
    }

    pub async fn lease_number(&self, service: &str) -> Result<NumberLease> {
        let app_id = self.application_id(service).await?;
        let raw = self
            .get(
                "get-number",
                &[
                    ("country_id", SMSMAN_COUNTRY_INDIA.to_string()),
                    ("application_id", app_id),
                ],
            )
            .await?;
        if let Some(msg) = raw.get("error_msg").and_then(|v| v.as_str()) {
            return Err(OtpError::Vendor(msg.to_string()));
        }
        let number: SmsManNumber = serde_json::from_value(raw)?;
        Ok(NumberLease {
            request_id: number.request_id.to_string().trim_matches('"').to_string(),
            phone: number.number,
        })
    }

    /// One poll attempt. Ok(None) means the SMS has not arrived yet.
    pub async fn check_code(&self, request_id: &str) -> Result<Option<String>> {
        let raw = self
            .get("get-sms", &[("request_id", request_id.to_string())])
            .await?;
        let sms: SmsManSms = serde_json::from_value(raw)?;
        if let Some(code) = sms.sms_code {
            return Ok(Some(code.to_string().trim_matches('"').to_string()));
        }
        match sms.error_code.as_deref() {
            None | Some("wait_sms") | Some("") => Ok(None),
            Some(other) => Err(OtpError::Vendor(
                sms.error_msg.unwrap_or_else(|| other.to_string()),
            )),
        }
    }

    pub async fn confirm(&self, request_id: &str) -> Result<()> {
        self.set_status(request_id, "success").await
    }

    pub async fn cancel(&self, request_id: &str) -> Result<()> {
        self.set_status(request_id, "reject").await
    }

    async fn set_status(&self, request_id: &str, status: &str) -> Result<()> {
        self.get(
            "set-status",
            &[
                ("request_id", request_id.to_string()),
                ("status", status.to_string()),
            ],
        )
        .await?;
        Ok(())
    }
}

// --- 5sim ---

const FIVESIM_BASE: &str = "https://5sim.net/v1";

#[derive(Debug, Deserialize)]
struct FiveSimOrder {
    id: serde_json::Value,
    phone: String,
}

#[derive(Debug, Deserialize)]
struct FiveSimCheck {
    status: String,
    #[serde(default)]
    sms: Vec<FiveSimSms>,
}

#[derive(Debug, Deserialize)]
struct FiveSimSms {
    code: Option<String>,
}

pub struct FiveSimClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FiveSimClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, FIVESIM_BASE)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OtpError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp)
    }

    pub async fn lease_number(&self, service: &str) -> Result<NumberLease> {
        let order: FiveSimOrder = self
            .get(&format!("/user/buy/activation/india/any/{service}"))
            .await?
            .json()
            .await?;
        Ok(NumberLease {
            request_id: order.id.to_string().trim_matches('"').to_string(),
            phone: order.phone,
        })
    }

    pub async fn check_code(&self, order_id: &str) -> Result<Option<String>> {
        let check: FiveSimCheck = self
            .get(&format!("/user/check/{order_id}"))
            .await?
            .json()
            .await?;
        match check.status.as_str() {
            "RECEIVED" | "FINISHED" => Ok(check.sms.into_iter().find_map(|s| s.code)),
            "CANCELED" | "TIMEOUT" | "BANNED" => {
                Err(OtpError::Vendor(format!("order ended: {}", check.status)))
            }
            _ => Ok(None),
        }
    }

    pub async fn confirm(&self, order_id: &str) -> Result<()> {
        self.get(&format!("/user/finish/{order_id}")).await?;
        Ok(())
    }

    pub async fn cancel(&self, order_id: &str) -> Result<()> {
        self.get(&format!("/user/cancel/{order_id}")).await?;
        Ok(())
    }
}

// --- Unified interface ---

pub enum OtpClient {
    SmsMan(SmsManClient),
    FiveSim(FiveSimClient),
}

impl OtpClient {
    /// Build a client for the configured provider name ("smsman" or "fivesim").
    pub fn from_provider(provider: &str, api_key: String) -> Result<Self> {
        match provider {
            "smsman" => Ok(OtpClient::SmsMan(SmsManClient::new(api_key))),
            "fivesim" => Ok(OtpClient::FiveSim(FiveSimClient::new(api_key))),
            other => Err(OtpError::UnknownProvider(other.to_string())),
        }
    }

    pub async fn lease_number(&self, service: &str) -> Result<NumberLease> {
        match self {
            OtpClient::SmsMan(c) => c.lease_number(service).await,
            OtpClient::FiveSim(c) => c.lease_number(service).await,
        }
    }

    /// Poll for the verification code until it arrives or `max_wait` passes.
    pub async fn wait_for_code(
        &self,
        request_id: &str,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Result<String> {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            tokio::time::sleep(poll_interval).await;
            let attempt = match self {
                OtpClient::SmsMan(c) => c.check_code(request_id).await,
                OtpClient::FiveSim(c) => c.check_code(request_id).await,
            };
            match attempt {
                Ok(Some(code)) => return Ok(code),
                Ok(None) => {
                    tracing::debug!(request_id, "No SMS yet");
                }
                Err(OtpError::Vendor(msg)) => return Err(OtpError::Vendor(msg)),
                Err(e) => {
                    tracing::warn!(request_id, error = %e, "OTP poll failed, will retry");
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(OtpError::CodeTimeout);
            }
        }
    }

    pub async fn confirm(&self, request_id: &str) -> Result<()> {
        match self {
            OtpClient::SmsMan(c) => c.confirm(request_id).await,
            OtpClient::FiveSim(c) => c.confirm(request_id).await,
        }
    }

    pub async fn cancel(&self, request_id: &str) -> Result<()> {
        match self {
            OtpClient::SmsMan(c) => c.cancel(request_id).await,
            OtpClient::FiveSim(c) => c.cancel(request_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_dispatch() {
        assert!(matches!(
            OtpClient::from_provider("smsman", "k".into()),
            Ok(OtpClient::SmsMan(_))
        ));
        assert!(matches!(
            OtpClient::from_provider("fivesim", "k".into()),
            Ok(OtpClient::FiveSim(_))
        ));
        assert!(matches!(
            OtpClient::from_provider("twilio", "k".into()),
            Err(OtpError::UnknownProvider(_))
        ));
    }

    #[test]
    fn fivesim_check_parses_received_sms() {
        let check: FiveSimCheck = serde_json::from_str(
            r#"{"status":"RECEIVED","sms":[{"code":"123456"}]}"#,
        )
        .unwrap();
        assert_eq!(check.status, "RECEIVED");
        assert_eq!(check.sms[0].code.as_deref(), Some("123456"));
    }

    #[test]
    fn smsman_number_parses_numeric_request_id() {
        let n: SmsManNumber =
            serde_json::from_str(r#"{"request_id":98765,"number":"+919876543210"}"#).unwrap();
        assert_eq!(n.request_id.to_string(), "98765");
        assert_eq!(n.number, "+919876543210");
    }
}
