use chrono::Utc;
use socialforge_common::{
    FacebookSummary, InstagramSummary, JobState, JobSummary, Platform, PlatformIdentifiers,
    PlatformState, SocialHandles, YoutubeSummary,
};
use uuid::Uuid;

use crate::error::StoreError;

/// One platform's slice of a job: sub-status plus whatever the creation
/// attempt produced.
#[derive(Debug, Clone)]
pub struct PlatformSlot {
    pub status: PlatformState,
    pub identifiers: Option<PlatformIdentifiers>,
    pub error: Option<String>,
}

/// A presence-creation job as stored.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    /// Idempotency key, unique across jobs. Defaults to the title slug.
    pub external_key: String,
    pub title: String,
    pub status: JobState,
    /// Which platforms this job was asked to create.
    pub platforms: Vec<Platform>,
    pub handles: SocialHandles,
    pub callback_url: Option<String>,
    pub facebook: PlatformSlot,
    pub youtube: PlatformSlot,
    pub instagram: PlatformSlot,
    /// Unix epoch seconds.
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,
    pub callback_sent_at: Option<i64>,
}

impl Job {
    pub fn slot(&self, platform: Platform) -> &PlatformSlot {
        match platform {
            Platform::Facebook => &self.facebook,
            Platform::Youtube => &self.youtube,
            Platform::Instagram => &self.instagram,
        }
    }

    pub fn wants(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }

    /// Project the job into the external status/callback shape. Passwords
    /// never leave the store this way.
    pub fn summary(&self) -> JobSummary {
        let mut facebook = FacebookSummary {
            status: self.facebook.status.to_string(),
            error: self.facebook.error.clone(),
            ..Default::default()
        };
        if let Some(PlatformIdentifiers::Facebook {
            page_id,
            page_url,
            page_name,
        }) = &self.facebook.identifiers
        {
            facebook.page_id = page_id.clone();
            facebook.page_name = page_name.clone();
            facebook.url = page_url.clone();
        }

        let mut youtube = YoutubeSummary {
            status: self.youtube.status.to_string(),
            error: self.youtube.error.clone(),
            ..Default::default()
        };
        if let Some(PlatformIdentifiers::Youtube {
            channel_id,
            channel_url,
            channel_name,
            handle,
        }) = &self.youtube.identifiers
        {
            youtube.channel_id = channel_id.clone();
            youtube.channel_name = channel_name.clone();
            youtube.handle = handle.clone();
            youtube.url = channel_url.clone();
        }

        let mut instagram = InstagramSummary {
            status: self.instagram.status.to_string(),
            handle: Some(self.handles.ig_handle.clone()),
            error: self.instagram.error.clone(),
            ..Default::default()
        };
        if let Some(PlatformIdentifiers::Instagram {
            username,
            phone,
            device_id,
            url,
            warmup_triggered,
            ..
        }) = &self.instagram.identifiers
        {
            instagram.username = username.clone();
            instagram.phone = phone.clone();
            instagram.device_id = device_id.clone();
            instagram.url = url.clone();
            if *warmup_triggered {
                if let Some(completed) = self.completed_at {
                    instagram.warmup_day = ((Utc::now().timestamp() - completed) / 86_400).max(0);
                }
            }
        }

        JobSummary {
            job_id: self.id.to_string(),
            external_key: self.external_key.clone(),
            title: self.title.clone(),
            status: self.status.to_string(),
            handles: self.handles.clone(),
            facebook,
            youtube,
            instagram,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        }
    }
}

/// Parameters for inserting a new job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub external_key: String,
    pub title: String,
    pub platforms: Vec<Platform>,
    pub handles: SocialHandles,
    pub callback_url: Option<String>,
}

/// An audit-trail entry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobEvent {
    pub id: i64,
    pub job_id: String,
    pub kind: String,
    pub detail: Option<String>,
    pub created_at: i64,
}

/// Raw row from the jobs table. Statuses and JSON blobs are parsed into
/// domain types on the way out.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct JobRow {
    pub id: String,
    pub external_key: String,
    pub title: String,
    pub status: String,
    pub platforms: String,
    pub handles: String,
    pub callback_url: Option<String>,
    pub fb_status: String,
    pub fb_identifiers: Option<String>,
    pub fb_error: Option<String>,
    pub yt_status: String,
    pub yt_identifiers: Option<String>,
    pub yt_error: Option<String>,
    pub ig_status: String,
    pub ig_identifiers: Option<String>,
    pub ig_error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,
    pub callback_sent_at: Option<i64>,
}

fn parse_slot(
    status: &str,
    identifiers: Option<&str>,
    error: Option<&String>,
) -> Result<PlatformSlot, StoreError> {
    Ok(PlatformSlot {
        status: status.parse().map_err(StoreError::Parse)?,
        identifiers: identifiers
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| StoreError::Parse(e.to_string()))?,
        error: error.cloned(),
    })
}

impl TryFrom<JobRow> for Job {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Job {
            id: Uuid::parse_str(&row.id).map_err(|e| StoreError::Parse(e.to_string()))?,
            status: row.status.parse().map_err(StoreError::Parse)?,
            platforms: serde_json::from_str(&row.platforms)
                .map_err(|e| StoreError::Parse(e.to_string()))?,
            handles: serde_json::from_str(&row.handles)
                .map_err(|e| StoreError::Parse(e.to_string()))?,
            facebook: parse_slot(
                &row.fb_status,
                row.fb_identifiers.as_deref(),
                row.fb_error.as_ref(),
            )?,
            youtube: parse_slot(
                &row.yt_status,
                row.yt_identifiers.as_deref(),
                row.yt_error.as_ref(),
            )?,
            instagram: parse_slot(
                &row.ig_status,
                row.ig_identifiers.as_deref(),
                row.ig_error.as_ref(),
            )?,
            external_key: row.external_key,
            title: row.title,
            callback_url: row.callback_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
            callback_sent_at: row.callback_sent_at,
        })
    }
}
