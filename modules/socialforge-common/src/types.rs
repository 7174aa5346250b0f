use serde::{Deserialize, Serialize};
use std::fmt;

// --- Platforms ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Facebook,
    Youtube,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Facebook, Platform::Youtube, Platform::Instagram];

    /// Column prefix in the jobs table (`fb_status`, `yt_status`, `ig_status`).
    pub fn column_prefix(&self) -> &'static str {
        match self {
            Platform::Facebook => "fb",
            Platform::Youtube => "yt",
            Platform::Instagram => "ig",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Facebook => write!(f, "facebook"),
            Platform::Youtube => write!(f, "youtube"),
            Platform::Instagram => write!(f, "instagram"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "facebook" | "fb" => Ok(Platform::Facebook),
            "youtube" | "yt" => Ok(Platform::Youtube),
            "instagram" | "ig" => Ok(Platform::Instagram),
            _ => Err(format!("unknown platform: {s}")),
        }
    }
}

// --- Per-platform status ---

/// Sub-status of one platform within a job. Transitions are strictly forward:
/// pending → in_progress → done | failed. Instagram continues past success:
/// in_progress → warming_up → ready (the account is aged before use).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformState {
    Pending,
    InProgress,
    Done,
    Failed,
    WarmingUp,
    Ready,
}

impl PlatformState {
    /// No further automatic transitions happen from this state.
    /// Warming-up counts: the creation attempt itself has settled.
    pub fn is_settled(&self) -> bool {
        !matches!(self, PlatformState::Pending | PlatformState::InProgress)
    }

    /// The creation attempt produced a live account/page/channel.
    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            PlatformState::Done | PlatformState::WarmingUp | PlatformState::Ready
        )
    }

    /// States a row may be in immediately before moving to `next`.
    /// Backward transitions are rejected by the store using this set.
    pub fn allowed_predecessors(next: PlatformState) -> &'static [PlatformState] {
        match next {
            PlatformState::Pending => &[],
            PlatformState::InProgress => &[PlatformState::Pending],
            PlatformState::Done | PlatformState::Failed => &[PlatformState::InProgress],
            // Instagram success lands on warming_up directly from in_progress;
            // done → warming_up is kept for accounts promoted later.
            PlatformState::WarmingUp => &[PlatformState::InProgress, PlatformState::Done],
            PlatformState::Ready => &[PlatformState::WarmingUp],
        }
    }
}

impl fmt::Display for PlatformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformState::Pending => write!(f, "pending"),
            PlatformState::InProgress => write!(f, "in_progress"),
            PlatformState::Done => write!(f, "done"),
            PlatformState::Failed => write!(f, "failed"),
            PlatformState::WarmingUp => write!(f, "warming_up"),
            PlatformState::Ready => write!(f, "ready"),
        }
    }
}

impl std::str::FromStr for PlatformState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PlatformState::Pending),
            "in_progress" => Ok(PlatformState::InProgress),
            "done" => Ok(PlatformState::Done),
            "failed" => Ok(PlatformState::Failed),
            "warming_up" => Ok(PlatformState::WarmingUp),
            "ready" => Ok(PlatformState::Ready),
            _ => Err(format!("unknown platform state: {s}")),
        }
    }
}

// --- Overall job status ---

/// Overall job status. Always derived from the per-platform sub-statuses,
/// never set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    InProgress,
    Partial,
    Done,
    Failed,
}

impl JobState {
    /// Every selected platform has settled; nothing further happens without
    /// an explicit retry. Partial (mixed outcomes) settles a job too.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed | JobState::Partial)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::InProgress => write!(f, "in_progress"),
            JobState::Partial => write!(f, "partial"),
            JobState::Done => write!(f, "done"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobState::Pending),
            "in_progress" => Ok(JobState::InProgress),
            "partial" => Ok(JobState::Partial),
            "done" => Ok(JobState::Done),
            "failed" => Ok(JobState::Failed),
            _ => Err(format!("unknown job state: {s}")),
        }
    }
}

// --- Generated naming data ---

/// All platform handles generated for one title. Immutable after job creation;
/// every platform task derives its naming input from this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialHandles {
    pub input_title: String,
    /// Clean Roman transliteration of the title.
    pub roman_form: String,
    /// Kebab-case slug, also the default idempotency key.
    pub slug: String,

    /// Instagram username, e.g. "stage.banswara" (without the @).
    pub ig_handle: String,
    /// Facebook Page display name, e.g. "STAGE Banswara".
    pub fb_page_name: String,
    /// Facebook vanity username, e.g. "StageBanswara".
    pub fb_username: String,
    /// YouTube channel display name (Devanagari preserved for regional SEO).
    pub yt_channel_name: String,
    /// YouTube handle without the @, e.g. "StageBanswara".
    pub yt_handle: String,
}

// --- Platform task results ---

/// Identifiers extracted from a successful creation attempt. Every field is
/// optional on its own: a task can succeed yet fail to extract some of them,
/// and the orchestrator must tolerate partial sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "snake_case")]
pub enum PlatformIdentifiers {
    Facebook {
        page_id: Option<String>,
        page_url: Option<String>,
        page_name: Option<String>,
    },
    Youtube {
        channel_id: Option<String>,
        channel_url: Option<String>,
        channel_name: Option<String>,
        handle: Option<String>,
    },
    Instagram {
        username: Option<String>,
        password: Option<String>,
        phone: Option<String>,
        device_id: Option<String>,
        url: Option<String>,
        /// False when the warmup template could not be triggered (non-fatal).
        warmup_triggered: bool,
    },
}

/// Bounded failure categories for operator triage. The orchestrator branches
/// only on success/failure; the category is for humans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The underlying FB/YT session is stale; an operator must re-login.
    SessionExpired(String),
    /// An expected UI control could not be located; the target site changed.
    AutomationDrift(String),
    /// No OTP number / device pool exhausted. Retryable with a fresh attempt.
    ResourceExhausted(String),
    /// The task exceeded the orchestrator deadline (seconds).
    TaskTimeout(u64),
    Network(String),
    Other(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::SessionExpired(msg) => write!(f, "session expired: {msg}"),
            FailureReason::AutomationDrift(msg) => {
                write!(f, "automation control not found: {msg}")
            }
            FailureReason::ResourceExhausted(msg) => write!(f, "{msg}"),
            FailureReason::TaskTimeout(secs) => write!(f, "task timeout after {secs}s"),
            FailureReason::Network(msg) => write!(f, "network error: {msg}"),
            FailureReason::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Outcome of one platform creation attempt. The task boundary converts every
/// internal error into a `Failure` — nothing propagates past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformResult {
    Success(PlatformIdentifiers),
    Failure(FailureReason),
}

impl PlatformResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PlatformResult::Success(_))
    }
}

// --- Status summaries (API responses + terminal callback body) ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacebookSummary {
    pub status: String,
    pub page_id: Option<String>,
    pub page_name: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YoutubeSummary {
    pub status: String,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub handle: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
}

/// Instagram summary. Credentials stay in the store; the password is never
/// part of a summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstagramSummary {
    pub status: String,
    pub username: Option<String>,
    pub handle: Option<String>,
    pub phone: Option<String>,
    pub device_id: Option<String>,
    pub warmup_day: i64,
    pub url: Option<String>,
    pub error: Option<String>,
}

/// The consolidated job view returned by the status endpoints and POSTed to
/// the terminal callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub external_key: String,
    pub title: String,
    pub status: String,
    pub handles: SocialHandles,
    pub facebook: FacebookSummary,
    pub youtube: YoutubeSummary,
    pub instagram: InstagramSummary,
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,
}
