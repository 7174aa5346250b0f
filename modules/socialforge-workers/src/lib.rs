//! Platform workers: the `PlatformTask` implementations behind the
//! orchestrator. Facebook and YouTube delegate to the browser sidecar;
//! Instagram composes GeeLark cloud phones with OTP number leasing.

mod facebook;
mod instagram;
mod youtube;

pub use facebook::FacebookWorker;
pub use instagram::{InstagramWorker, InstagramWorkerConfig};
pub use youtube::YoutubeWorker;

use browserbot_client::BrowserbotError;
use socialforge_common::FailureReason;

/// Fold sidecar errors into the bounded failure taxonomy the store keeps.
pub(crate) fn map_sidecar_error(e: BrowserbotError) -> FailureReason {
    match e {
        BrowserbotError::SessionExpired(msg) => FailureReason::SessionExpired(msg),
        BrowserbotError::ControlNotFound(msg) => FailureReason::AutomationDrift(msg),
        BrowserbotError::Network(msg) => FailureReason::Network(msg),
        BrowserbotError::Api { status, message } => {
            FailureReason::Other(format!("sidecar error {status}: {message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_errors_map_to_triage_categories() {
        assert!(matches!(
            map_sidecar_error(BrowserbotError::SessionExpired("cookie".into())),
            FailureReason::SessionExpired(_)
        ));
        assert!(matches!(
            map_sidecar_error(BrowserbotError::ControlNotFound("button".into())),
            FailureReason::AutomationDrift(_)
        ));
        assert!(matches!(
            map_sidecar_error(BrowserbotError::Network("dns".into())),
            FailureReason::Network(_)
        ));
    }
}
