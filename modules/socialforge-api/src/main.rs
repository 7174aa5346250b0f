use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use browserbot_client::BrowserbotClient;
use geelark_client::GeelarkClient;
use otp_client::OtpClient;
use socialforge_api::{app, AppState};
use socialforge_common::Config;
use socialforge_orchestrator::{HttpNotifier, Orchestrator, PlatformTask};
use socialforge_store::JobStore;
use socialforge_workers::{
    FacebookWorker, InstagramWorker, InstagramWorkerConfig, YoutubeWorker,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("socialforge=info".parse()?))
        .init();

    let config = Config::from_env();

    let store = JobStore::connect(&config.db_path).await?;
    info!(db_path = %config.db_path, "Job store ready");

    let browserbot = Arc::new(BrowserbotClient::new(
        &config.browserbot_url,
        config.browserbot_token.as_deref(),
    ));
    let geelark = Arc::new(GeelarkClient::new(config.geelark_api_token.clone()));
    let otp_key = match config.otp_provider.as_str() {
        "fivesim" => config.fivesim_api_key.clone(),
        _ => config.smsman_api_key.clone(),
    };
    let otp = Arc::new(OtpClient::from_provider(&config.otp_provider, otp_key)?);

    let tasks: Vec<Arc<dyn PlatformTask>> = vec![
        Arc::new(FacebookWorker::new(
            browserbot.clone(),
            config.fb_category.clone(),
        )),
        Arc::new(YoutubeWorker::new(browserbot)),
        Arc::new(InstagramWorker::new(
            geelark,
            otp,
            InstagramWorkerConfig {
                proxy_url: config.proxy_url.clone(),
                android_version: config.geelark_android_version.clone(),
                signup_flow: config.geelark_signup_flow.clone(),
                warmup_template: config.geelark_warmup_template.clone(),
                otp_poll_interval: Duration::from_secs(config.otp_poll_interval_secs),
                otp_max_wait: Duration::from_secs(config.otp_max_wait_secs),
            },
        )),
    ];

    let orchestrator = Orchestrator::new(
        store,
        tasks,
        Arc::new(HttpNotifier::new()),
        config.brand_prefix.clone(),
        config.default_callback_url.clone(),
        config.max_concurrent_jobs,
        config.task_deadline_secs,
    );

    let state = Arc::new(AppState {
        orchestrator,
        webhook_secret: config.webhook_secret.clone(),
    });

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("SocialForge API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
