use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use socialforge_common::{FailureReason, Platform, PlatformResult, PlatformState};
use socialforge_store::{Job, JobStore, NewJob, StoreError};
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::callback::Notifier;
use crate::error::{OrchestratorError, Result};
use crate::task::{PlatformTask, TaskInput};

/// A profile-creation request, normally arriving via the webhook.
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub title: String,
    /// Idempotency key; defaults to the title slug.
    pub external_key: Option<String>,
    /// Defaults to all three platforms.
    pub platforms: Option<Vec<Platform>>,
    pub callback_url: Option<String>,
}

/// Outcome of a submission: the job, plus whether this call created it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub job: Job,
    pub created: bool,
}

pub struct Orchestrator {
    store: JobStore,
    tasks: HashMap<Platform, Arc<dyn PlatformTask>>,
    notifier: Arc<dyn Notifier>,
    /// Bounds concurrently running jobs. Each job holds one permit for its
    /// whole run, platform fan-out included.
    permits: Arc<Semaphore>,
    brand_prefix: String,
    default_callback_url: Option<String>,
    task_deadline_secs: u64,
}

impl Orchestrator {
    pub fn new(
        store: JobStore,
        tasks: Vec<Arc<dyn PlatformTask>>,
        notifier: Arc<dyn Notifier>,
        brand_prefix: String,
        default_callback_url: Option<String>,
        max_concurrent_jobs: usize,
        task_deadline_secs: u64,
    ) -> Arc<Self> {
        let tasks = tasks.into_iter().map(|t| (t.platform(), t)).collect();
        Arc::new(Self {
            store,
            tasks,
            notifier,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs)),
            brand_prefix,
            default_callback_url,
            task_deadline_secs,
        })
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Accept a request, create the job if its key is new, and kick off the
    /// run in the background. Re-submitting an existing key returns that job
    /// untouched, whatever state it is in.
    pub async fn submit(self: &Arc<Self>, req: SubmitRequest) -> Result<Submission> {
        let title = req.title.trim().to_string();
        if title.is_empty() {
            return Err(OrchestratorError::Validation("title must not be empty".into()));
        }

        let mut platforms: Vec<Platform> = Vec::new();
        for p in req.platforms.unwrap_or_else(|| Platform::ALL.to_vec()) {
            if !platforms.contains(&p) {
                platforms.push(p);
            }
        }
        if platforms.is_empty() {
            return Err(OrchestratorError::Validation(
                "at least one platform must be selected".into(),
            ));
        }

        let handles = socialforge_naming::generate(&title, &self.brand_prefix);
        if handles.slug.is_empty() {
            return Err(OrchestratorError::Validation(format!(
                "title produces no usable handle: {title}"
            )));
        }

        let external_key = req
            .external_key
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| handles.slug.clone());

        if let Some(existing) = self.store.find_by_external_key(&external_key).await? {
            info!(job_id = %existing.id, external_key, "Submission matched an existing job");
            return Ok(Submission {
                job: existing,
                created: false,
            });
        }

        let created = self
            .store
            .create(NewJob {
                external_key: external_key.clone(),
                title,
                platforms,
                handles,
                callback_url: req.callback_url,
            })
            .await;

        let job = match created {
            Ok(job) => job,
            // Lost a race with a concurrent identical submission.
            Err(StoreError::Conflict(key)) => {
                let existing = self
                    .store
                    .find_by_external_key(&key)
                    .await?
                    .ok_or(OrchestratorError::NotFound(key))?;
                return Ok(Submission {
                    job: existing,
                    created: false,
                });
            }
            Err(e) => return Err(e.into()),
        };

        self.store.record_event(job.id, "job_created", None).await;
        info!(job_id = %job.id, external_key, "Job created");

        self.spawn_run(job.id);
        Ok(Submission { job, created: true })
    }

    /// Re-run only the failed platforms of a settled job.
    pub async fn retry(self: &Arc<Self>, job_id: Uuid) -> Result<Job> {
        let job = self.store.get(job_id).await?;
        if !job.status.is_terminal() {
            return Err(OrchestratorError::Validation(format!(
                "job {job_id} is still {}; retry applies to settled jobs",
                job.status
            )));
        }

        let reset = self.store.reset_failed_platforms(job_id).await?;
        if reset.is_empty() {
            return Err(OrchestratorError::NothingToRetry(job_id.to_string()));
        }

        let detail: Vec<String> = reset.iter().map(|p| p.to_string()).collect();
        self.store
            .record_event(job_id, "retry_requested", Some(&detail.join(",")))
            .await;
        info!(job_id = %job_id, platforms = ?reset, "Retrying failed platforms");

        self.spawn_run(job_id);
        self.store.get(job_id).await.map_err(Into::into)
    }

    /// Run the job in the background, gated by the concurrency permit.
    fn spawn_run(self: &Arc<Self>, job_id: Uuid) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _permit = match Arc::clone(&this.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return, // semaphore closed, shutting down
            };
            if let Err(e) = this.run_job(job_id).await {
                warn!(job_id = %job_id, error = %e, "Job run aborted");
            }
        });
    }

    /// Facebook and YouTube run concurrently; Instagram starts only after
    /// both of them settle, whatever their outcomes.
    async fn run_job(&self, job_id: Uuid) -> Result<()> {
        let job = self.store.get(job_id).await?;
        let input = TaskInput {
            job_id,
            title: job.title.clone(),
            handles: job.handles.clone(),
        };

        let runnable = |platform: Platform| {
            job.wants(platform) && job.slot(platform).status == PlatformState::Pending
        };

        let fb = async {
            if runnable(Platform::Facebook) {
                self.run_platform(Platform::Facebook, &input).await;
            }
        };
        let yt = async {
            if runnable(Platform::Youtube) {
                self.run_platform(Platform::Youtube, &input).await;
            }
        };
        tokio::join!(fb, yt);

        if runnable(Platform::Instagram) {
            self.run_platform(Platform::Instagram, &input).await;
        }
        Ok(())
    }

    /// Run one platform task inside the deadline and panic fence, then fold
    /// the outcome into the job.
    async fn run_platform(&self, platform: Platform, input: &TaskInput) {
        let job_id = input.job_id;
        match self
            .store
            .update_platform(job_id, platform, PlatformState::InProgress, None, None)
            .await
        {
            Ok(()) => {}
            Err(StoreError::IllegalTransition { from, .. }) => {
                // Another run already claimed this platform.
                warn!(job_id = %job_id, %platform, %from, "Platform not pending, skipping");
                return;
            }
            Err(e) => {
                warn!(job_id = %job_id, %platform, error = %e, "Could not claim platform");
                return;
            }
        }
        self.store
            .record_event(job_id, "platform_started", Some(&platform.to_string()))
            .await;

        let result = self.execute_fenced(platform, input).await;
        if let Err(e) = self.on_platform_result(job_id, platform, result).await {
            warn!(job_id = %job_id, %platform, error = %e, "Failed to record platform result");
        }
    }

    /// Execute the task on its own tokio task so a panic is contained, and
    /// under the hard deadline so a wedged automation cannot hold the job
    /// permit forever.
    async fn execute_fenced(&self, platform: Platform, input: &TaskInput) -> PlatformResult {
        let Some(task) = self.tasks.get(&platform) else {
            return PlatformResult::Failure(FailureReason::Other(format!(
                "no task registered for {platform}"
            )));
        };

        let task = Arc::clone(task);
        let input = input.clone();
        let mut handle = tokio::spawn(async move { task.create(&input).await });
        let deadline = Duration::from_secs(self.task_deadline_secs);

        match tokio::time::timeout(deadline, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                warn!(%platform, error = %join_err, "Platform task panicked");
                PlatformResult::Failure(FailureReason::Other(format!(
                    "task crashed: {join_err}"
                )))
            }
            Err(_elapsed) => {
                handle.abort();
                warn!(%platform, deadline_secs = self.task_deadline_secs, "Platform task hit deadline");
                PlatformResult::Failure(FailureReason::TaskTimeout(self.task_deadline_secs))
            }
        }
    }

    /// Fold one platform outcome into the job: advance the sub-status,
    /// re-derive the overall status, and fire the terminal callback if this
    /// result settled the job.
    pub async fn on_platform_result(
        &self,
        job_id: Uuid,
        platform: Platform,
        result: PlatformResult,
    ) -> Result<()> {
        match &result {
            PlatformResult::Success(identifiers) => {
                // Instagram success lands in warmup rather than done.
                let next = if platform == Platform::Instagram {
                    PlatformState::WarmingUp
                } else {
                    PlatformState::Done
                };
                self.store
                    .update_platform(job_id, platform, next, Some(identifiers), None)
                    .await?;
                self.store
                    .record_event(job_id, "platform_done", Some(&platform.to_string()))
                    .await;
                info!(job_id = %job_id, %platform, "Platform created");
            }
            PlatformResult::Failure(reason) => {
                self.store
                    .update_platform(
                        job_id,
                        platform,
                        PlatformState::Failed,
                        None,
                        Some(&reason.to_string()),
                    )
                    .await?;
                self.store
                    .record_event(job_id, "platform_failed", Some(&reason.to_string()))
                    .await;
                warn!(job_id = %job_id, %platform, reason = %reason, "Platform failed");
            }
        }

        // The store derives and writes the overall status in one statement,
        // so a concurrent sibling completion cannot be overwritten by a stale
        // view of the job.
        let overall = self.store.recompute_overall(job_id).await?;

        if overall.is_terminal() {
            self.finish(job_id).await?;
        }
        Ok(())
    }

    /// Deliver the terminal callback at most once per terminal run.
    async fn finish(&self, job_id: Uuid) -> Result<()> {
        if !self.store.mark_callback_sent(job_id).await? {
            return Ok(());
        }
        let job = self.store.get(job_id).await?;
        info!(job_id = %job_id, status = %job.status, "Job settled");

        let url = job
            .callback_url
            .clone()
            .or_else(|| self.default_callback_url.clone());
        if let Some(url) = url {
            self.notifier.notify(&url, &job.summary()).await;
            self.store
                .record_event(job_id, "callback_sent", Some(&url))
                .await;
        }
        Ok(())
    }
}
