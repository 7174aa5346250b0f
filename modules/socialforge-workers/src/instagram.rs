use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geelark_client::{GeelarkClient, GeelarkError};
use otp_client::{OtpClient, OtpError};
use rand::Rng;
use socialforge_common::{FailureReason, Platform, PlatformIdentifiers, PlatformResult};
use socialforge_orchestrator::{PlatformTask, TaskInput};
use tracing::{info, warn};

/// How long a cloud phone gets to boot.
const PHONE_BOOT_WAIT: Duration = Duration::from_secs(120);
/// How long the signup flow gets per step (reach the OTP prompt, then finish).
const SIGNUP_STEP_WAIT: Duration = Duration::from_secs(240);

const INSTAGRAM_PACKAGE: &str = "com.instagram.android";

#[derive(Debug, Clone)]
pub struct InstagramWorkerConfig {
    pub proxy_url: String,
    pub android_version: String,
    pub signup_flow: String,
    pub warmup_template: String,
    pub otp_poll_interval: Duration,
    pub otp_max_wait: Duration,
}

/// Creates fresh Instagram accounts on GeeLark cloud phones.
///
/// Flow: launch a phone behind the 4G proxy, install Instagram, lease a
/// virtual number, run the signup automation template, feed it the OTP when
/// the SMS lands, then kick off the warmup template. The phone keeps running
/// to host the warmup; it is only stopped when the flow fails.
pub struct InstagramWorker {
    geelark: Arc<GeelarkClient>,
    otp: Arc<OtpClient>,
    config: InstagramWorkerConfig,
}

impl InstagramWorker {
    pub fn new(
        geelark: Arc<GeelarkClient>,
        otp: Arc<OtpClient>,
        config: InstagramWorkerConfig,
    ) -> Self {
        Self {
            geelark,
            otp,
            config,
        }
    }

    async fn run(&self, input: &TaskInput) -> Result<PlatformIdentifiers, FailureReason> {
        let device_name = format!("stage-{}", input.handles.slug);

        let phone = self
            .geelark
            .create_phone(&device_name, &self.config.proxy_url, &self.config.android_version)
            .await
            .map_err(map_geelark_error)?;
        let phone_id = phone.id.clone();
        info!(job_id = %input.job_id, phone_id, "Cloud phone launched");

        let result = self.signup_on_phone(input, &phone_id).await;
        if result.is_err() {
            let _ = self.geelark.stop_phone(&phone_id).await;
        }
        result
    }

    async fn signup_on_phone(
        &self,
        input: &TaskInput,
        phone_id: &str,
    ) -> Result<PlatformIdentifiers, FailureReason> {
        let handle = &input.handles.ig_handle;

        self.geelark
            .wait_until_running(phone_id, PHONE_BOOT_WAIT)
            .await
            .map_err(map_geelark_error)?;
        self.geelark
            .install_app(phone_id, INSTAGRAM_PACKAGE)
            .await
            .map_err(map_geelark_error)?;

        let lease = self
            .otp
            .lease_number("instagram")
            .await
            .map_err(map_otp_error)?;
        info!(job_id = %input.job_id, phone = %lease.phone, "Leased verification number");

        let password = generate_password();
        let task = self
            .geelark
            .start_task(
                phone_id,
                &self.config.signup_flow,
                serde_json::json!({
                    "username": handle,
                    "password": password,
                    "phone_number": lease.phone,
                }),
            )
            .await
            .map_err(map_geelark_error)?;

        // The template pauses at the verification screen and waits for a code.
        if let Err(e) = self.wait_for_input_prompt(&task.id).await {
            let _ = self.otp.cancel(&lease.request_id).await;
            return Err(e);
        }

        let code = match self
            .otp
            .wait_for_code(
                &lease.request_id,
                self.config.otp_poll_interval,
                self.config.otp_max_wait,
            )
            .await
        {
            Ok(code) => code,
            Err(e) => {
                let _ = self.otp.cancel(&lease.request_id).await;
                return Err(map_otp_error(e));
            }
        };
        let _ = self.otp.confirm(&lease.request_id).await;

        self.geelark
            .push_task_input(&task.id, "otp_code", &code)
            .await
            .map_err(map_geelark_error)?;
        self.geelark
            .wait_for_task(&task.id, SIGNUP_STEP_WAIT)
            .await
            .map_err(map_geelark_error)?;
        info!(job_id = %input.job_id, %handle, "Instagram account created");

        // Warmup is desirable but never fatal: a fresh account without warmup
        // still exists and is reported as such.
        let warmup_triggered = match self
            .geelark
            .trigger_warmup(phone_id, &self.config.warmup_template)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(job_id = %input.job_id, error = %e, "Warmup trigger failed");
                false
            }
        };

        Ok(PlatformIdentifiers::Instagram {
            username: Some(handle.clone()),
            password: Some(password),
            phone: Some(lease.phone),
            device_id: Some(phone_id.to_string()),
            url: Some(format!("https://instagram.com/{handle}")),
            warmup_triggered,
        })
    }

    /// Poll until the signup task asks for its OTP input. A template that
    /// finishes without asking is fine too.
    async fn wait_for_input_prompt(&self, task_id: &str) -> Result<(), FailureReason> {
        let deadline = tokio::time::Instant::now() + SIGNUP_STEP_WAIT;
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            let task = self
                .geelark
                .get_task(task_id)
                .await
                .map_err(map_geelark_error)?;
            if task.wants_input() || task.status == "completed" {
                return Ok(());
            }
            if task.is_finished() {
                return Err(FailureReason::AutomationDrift(
                    task.error.unwrap_or(task.status),
                ));
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(FailureReason::AutomationDrift(
                    "signup flow never reached the verification step".into(),
                ));
            }
        }
    }
}

#[async_trait]
impl PlatformTask for InstagramWorker {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn create(&self, input: &TaskInput) -> PlatformResult {
        match self.run(input).await {
            Ok(identifiers) => PlatformResult::Success(identifiers),
            Err(reason) => PlatformResult::Failure(reason),
        }
    }
}

fn map_geelark_error(e: GeelarkError) -> FailureReason {
    match e {
        GeelarkError::Network(msg) => FailureReason::Network(msg),
        GeelarkError::PhoneNotReady(id) => {
            FailureReason::ResourceExhausted(format!("cloud phone {id} never came up"))
        }
        GeelarkError::TaskFailed(msg) => FailureReason::AutomationDrift(msg),
        GeelarkError::Api { status, message } => {
            FailureReason::Other(format!("geelark error {status}: {message}"))
        }
        GeelarkError::Parse(msg) => FailureReason::Other(msg),
    }
}

fn map_otp_error(e: OtpError) -> FailureReason {
    match e {
        OtpError::CodeTimeout => FailureReason::ResourceExhausted("OTP not received".into()),
        OtpError::Vendor(msg) => FailureReason::ResourceExhausted(msg),
        OtpError::Network(msg) => FailureReason::Network(msg),
        OtpError::Api { status, message } => {
            FailureReason::Other(format!("otp vendor error {status}: {message}"))
        }
        OtpError::Parse(msg) | OtpError::UnknownProvider(msg) => FailureReason::Other(msg),
    }
}

/// 16 chars, mixed case + digits, plus a fixed symbol tail so every platform
/// password rule is satisfied.
fn generate_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789";
    let mut rng = rand::rng();
    let core: String = (0..13)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    format!("{core}!7a")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_shape() {
        let pw = generate_password();
        assert_eq!(pw.chars().count(), 16);
        assert!(pw.ends_with("!7a"));
        assert_ne!(generate_password(), generate_password());
    }

    #[test]
    fn otp_timeout_maps_to_the_stored_error_string() {
        let reason = map_otp_error(OtpError::CodeTimeout);
        assert_eq!(reason.to_string(), "OTP not received");
    }

    #[test]
    fn geelark_task_failure_is_automation_drift() {
        let reason = map_geelark_error(GeelarkError::TaskFailed("element missing".into()));
        assert!(matches!(reason, FailureReason::AutomationDrift(_)));
    }
}
