use std::sync::Arc;

use async_trait::async_trait;
use browserbot_client::{BrowserbotClient, CreateChannelInput};
use socialforge_common::{Platform, PlatformIdentifiers, PlatformResult};
use socialforge_orchestrator::{PlatformTask, TaskInput};
use tracing::info;

use crate::map_sidecar_error;

/// Creates YouTube channels through the browser sidecar. YouTube has no API
/// for channel creation, so this is browser automation or nothing.
pub struct YoutubeWorker {
    client: Arc<BrowserbotClient>,
}

impl YoutubeWorker {
    pub fn new(client: Arc<BrowserbotClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PlatformTask for YoutubeWorker {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    async fn create(&self, input: &TaskInput) -> PlatformResult {
        let request = CreateChannelInput {
            channel_name: input.handles.yt_channel_name.clone(),
            handle: input.handles.yt_handle.clone(),
        };

        match self.client.create_youtube_channel(&request).await {
            Ok(channel) => {
                info!(job_id = %input.job_id, channel_id = %channel.channel_id, "YouTube channel created");
                PlatformResult::Success(PlatformIdentifiers::Youtube {
                    channel_id: Some(channel.channel_id),
                    channel_url: Some(channel.channel_url),
                    channel_name: Some(request.channel_name),
                    handle: channel.handle.or(Some(request.handle)),
                })
            }
            Err(e) => PlatformResult::Failure(map_sidecar_error(e)),
        }
    }
}
