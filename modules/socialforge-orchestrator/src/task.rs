//! The seam between orchestration and platform automation.

use async_trait::async_trait;
use socialforge_common::{Platform, PlatformResult, SocialHandles};
use uuid::Uuid;

/// Everything a platform task needs to create one account/page/channel.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub job_id: Uuid,
    pub title: String,
    pub handles: SocialHandles,
}

/// One platform's creation routine.
///
/// `create` is a total function over its input: every internal error must be
/// folded into `PlatformResult::Failure` rather than returned. The
/// orchestrator additionally wraps each call in a deadline and panic
/// containment, so a wedged or crashing task becomes a platform failure,
/// never a stuck job.
#[async_trait]
pub trait PlatformTask: Send + Sync + 'static {
    fn platform(&self) -> Platform;

    async fn create(&self, input: &TaskInput) -> PlatformResult;
}
