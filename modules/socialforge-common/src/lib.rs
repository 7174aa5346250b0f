pub mod config;
pub mod types;

pub use config::Config;
pub use types::{
    FacebookSummary, FailureReason, InstagramSummary, JobState, JobSummary, Platform,
    PlatformIdentifiers, PlatformResult, PlatformState, SocialHandles, YoutubeSummary,
};
