use std::sync::Arc;

use async_trait::async_trait;
use browserbot_client::{BrowserbotClient, CreatePageInput};
use socialforge_common::{Platform, PlatformIdentifiers, PlatformResult};
use socialforge_orchestrator::{PlatformTask, TaskInput};
use tracing::info;

use crate::map_sidecar_error;

/// Creates Facebook Pages through the browser sidecar.
pub struct FacebookWorker {
    client: Arc<BrowserbotClient>,
    category: String,
}

impl FacebookWorker {
    pub fn new(client: Arc<BrowserbotClient>, category: String) -> Self {
        Self { client, category }
    }
}

#[async_trait]
impl PlatformTask for FacebookWorker {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn create(&self, input: &TaskInput) -> PlatformResult {
        let request = CreatePageInput {
            display_name: input.handles.fb_page_name.clone(),
            username: input.handles.fb_username.clone(),
            category: self.category.clone(),
        };

        match self.client.create_facebook_page(&request).await {
            Ok(page) => {
                info!(job_id = %input.job_id, page_id = %page.page_id, "Facebook page created");
                PlatformResult::Success(PlatformIdentifiers::Facebook {
                    page_id: Some(page.page_id),
                    page_url: Some(page.page_url),
                    page_name: page.page_name.or(Some(request.display_name)),
                })
            }
            Err(e) => PlatformResult::Failure(map_sidecar_error(e)),
        }
    }
}
